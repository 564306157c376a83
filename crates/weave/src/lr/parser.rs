use crate::error::TableError;
use crate::grammar::{Grammar, Matched, Terminal};
use crate::lr::{Action, LrConfig, LrTable};
use std::fmt;
use std::sync::Arc;

/// A terminal-tagged raw token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lexeme<T> {
    pub terminal: Terminal,
    pub token: T,
}

impl<T> Lexeme<T> {
    #[must_use]
    pub const fn new(terminal: Terminal, token: T) -> Self {
        Self { terminal, token }
    }
}

/// Table-driven LR parser.
///
/// Holds the grammar and its table behind `Arc`s so every editor using the
/// same language shares one immutable table. Parsing never fails loudly: an
/// input the table rejects yields `None`.
pub struct LrParser<T, V> {
    grammar: Arc<Grammar<T, V>>,
    table: Arc<LrTable>,
}

impl<T, V> Clone for LrParser<T, V> {
    fn clone(&self) -> Self {
        Self {
            grammar: Arc::clone(&self.grammar),
            table: Arc::clone(&self.table),
        }
    }
}

impl<T, V> fmt::Debug for LrParser<T, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LrParser")
            .field("grammar", &self.grammar)
            .field("states", &self.table.state_count())
            .finish()
    }
}

impl<T, V> LrParser<T, V> {
    #[must_use]
    pub const fn new(grammar: Arc<Grammar<T, V>>, table: Arc<LrTable>) -> Self {
        Self { grammar, table }
    }

    /// Build the table for `grammar` and wrap both.
    ///
    /// # Errors
    ///
    /// Returns a [`TableError`] if the grammar has an unresolvable conflict.
    pub fn from_grammar(grammar: Grammar<T, V>, config: &LrConfig) -> Result<Self, TableError> {
        let table = LrTable::generate(&grammar, config)?;
        Ok(Self::new(Arc::new(grammar), Arc::new(table)))
    }

    #[must_use]
    pub fn grammar(&self) -> &Arc<Grammar<T, V>> {
        &self.grammar
    }

    #[must_use]
    pub fn table(&self) -> &Arc<LrTable> {
        &self.table
    }

    /// Terminals the parser can accept next in `state`.
    #[must_use]
    pub fn expected_terminals(&self, state: usize) -> Vec<Terminal> {
        self.table.expected_terminals(state)
    }

    /// Parse a lexeme stream into the start symbol's value.
    ///
    /// Returns `None` when the table reports an error.
    pub fn parse<I>(&self, lexemes: I) -> Option<V>
    where
        I: IntoIterator<Item = Lexeme<T>>,
    {
        let end = self.grammar.end();
        let mut input = lexemes.into_iter();
        let mut lookahead = input.next();
        let mut states: Vec<usize> = vec![0];
        let mut values: Vec<Matched<T, V>> = Vec::new();

        loop {
            let state = *states.last()?;
            let terminal = lookahead.as_ref().map_or(end, |lexeme| lexeme.terminal);
            match self.table.action(state, terminal) {
                Action::Shift(next) => {
                    let lexeme = lookahead.take()?;
                    values.push(Matched::Lexeme(lexeme.token));
                    states.push(next);
                    lookahead = input.next();
                }
                Action::Reduce(rule_id) => {
                    let rule = self.grammar.rule(rule_id);
                    let len = rule.rhs().len();
                    let matched = values.split_off(values.len() - len);
                    states.truncate(states.len() - len);
                    let top = *states.last()?;
                    let next = self.table.goto(top, rule.lhs())?;
                    values.push(Matched::Value(self.grammar.reduce(rule_id, matched)));
                    states.push(next);
                }
                Action::Accept => {
                    // An explicit `$end` lexeme followed by more input is not an accept.
                    if lookahead.is_some() {
                        return None;
                    }
                    return match values.pop() {
                        Some(Matched::Value(value)) => Some(value),
                        _ => None,
                    };
                }
                Action::Error => {
                    tracing::trace!(
                        state,
                        terminal = self.grammar.terminal_name(terminal),
                        depth = states.len(),
                        "parse error"
                    );
                    return None;
                }
            }
        }
    }
}
