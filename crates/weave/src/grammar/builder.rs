use crate::error::GrammarError;
use crate::grammar::{
    validate, Associativity, Grammar, Matched, NonTerminal, Rule, RuleContext, RuleHandler,
    RuleId, Symbol, Terminal,
};
use lasso::{Rodeo, Spur};
use smallvec::SmallVec;

/// Name of the end-of-input terminal every grammar gets.
pub const END_TERMINAL: &str = "$end";

/// Name of the synthetic non-terminal of the augmented start rule.
pub const AUGMENTED_START: &str = "$start";

/// A rule under construction.
///
/// Returned by [`GrammarBuilder::rule`] so priority and associativity can be
/// chained onto the declaration.
pub struct RuleDecl<T, V> {
    lhs: NonTerminal,
    rhs: SmallVec<[Symbol; 4]>,
    priority: i32,
    associativity: Option<Associativity>,
    handler: RuleHandler<T, V>,
}

impl<T, V> RuleDecl<T, V> {
    /// Set the conflict-resolution priority (higher binds tighter).
    pub fn priority(&mut self, priority: i32) -> &mut Self {
        self.priority = priority;
        self
    }

    pub fn associativity(&mut self, associativity: Associativity) -> &mut Self {
        self.associativity = Some(associativity);
        self
    }

    pub fn left(&mut self) -> &mut Self {
        self.associativity(Associativity::Left)
    }

    pub fn right(&mut self) -> &mut Self {
        self.associativity(Associativity::Right)
    }
}

/// Builder for [`Grammar`].
///
/// Symbols are declared by name and interned; declaring the same name twice
/// is reported by [`build`](Self::build).
pub struct GrammarBuilder<T, V> {
    names: Rodeo,
    terminals: Vec<Spur>,
    non_terminals: Vec<Spur>,
    rules: Vec<RuleDecl<T, V>>,
    start: Option<NonTerminal>,
    duplicates: Vec<String>,
}

impl<T, V> Default for GrammarBuilder<T, V>
where
    T: 'static,
    V: 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T, V> GrammarBuilder<T, V>
where
    T: 'static,
    V: 'static,
{
    #[must_use]
    pub fn new() -> Self {
        let mut builder = Self {
            names: Rodeo::default(),
            terminals: Vec::new(),
            non_terminals: Vec::new(),
            rules: Vec::new(),
            start: None,
            duplicates: Vec::new(),
        };
        builder.terminal(END_TERMINAL);
        builder
    }

    /// The end-of-input terminal (always terminal 0).
    #[must_use]
    pub const fn end(&self) -> Terminal {
        Terminal(0)
    }

    /// Declare a terminal.
    pub fn terminal(&mut self, name: &str) -> Terminal {
        let spur = self.declare(name);
        self.terminals.push(spur);
        Terminal((self.terminals.len() - 1) as u32)
    }

    /// Declare a non-terminal.
    pub fn non_terminal(&mut self, name: &str) -> NonTerminal {
        let spur = self.declare(name);
        self.non_terminals.push(spur);
        NonTerminal((self.non_terminals.len() - 1) as u32)
    }

    fn declare(&mut self, name: &str) -> Spur {
        if self.names.contains(name) {
            self.duplicates.push(name.to_owned());
        }
        self.names.get_or_intern(name)
    }

    /// Set the start symbol.
    pub fn start(&mut self, start: NonTerminal) -> &mut Self {
        self.start = Some(start);
        self
    }

    /// Add a rule `lhs -> rhs` with its semantic action.
    pub fn rule<I, F>(&mut self, lhs: NonTerminal, rhs: I, handler: F) -> &mut RuleDecl<T, V>
    where
        I: IntoIterator<Item = Symbol>,
        F: Fn(&mut RuleContext<'_, T, V>) -> V + Send + Sync + 'static,
    {
        self.rules.push(RuleDecl {
            lhs,
            rhs: rhs.into_iter().collect(),
            priority: 0,
            associativity: None,
            handler: Box::new(handler),
        });
        let last = self.rules.len() - 1;
        &mut self.rules[last]
    }

    /// Validate and freeze the grammar.
    ///
    /// # Errors
    ///
    /// Returns a [`GrammarError`] if the start symbol is missing, a name is
    /// declared twice, a non-terminal has no rules or cannot be reached from
    /// the start symbol, or a rule mentions the end-of-input terminal.
    pub fn build(mut self) -> Result<Grammar<T, V>, GrammarError> {
        if let Some(name) = self.duplicates.first() {
            return Err(GrammarError::DuplicateSymbol(name.clone()));
        }
        let start = self.start.ok_or(GrammarError::MissingStart)?;

        let augmented = self.non_terminal(AUGMENTED_START);
        if let Some(name) = self.duplicates.first() {
            return Err(GrammarError::DuplicateSymbol(name.clone()));
        }

        let mut rules = Vec::with_capacity(self.rules.len() + 1);
        rules.push(Rule {
            id: RuleId(0),
            lhs: augmented,
            rhs: SmallVec::from_slice(&[Symbol::NonTerminal(start)]),
            priority: 0,
            associativity: None,
            handler: Box::new(take_first::<T, V>),
        });
        for (i, decl) in self.rules.into_iter().enumerate() {
            rules.push(Rule {
                id: RuleId((i + 1) as u32),
                lhs: decl.lhs,
                rhs: decl.rhs,
                priority: decl.priority,
                associativity: decl.associativity,
                handler: decl.handler,
            });
        }

        let grammar = Grammar {
            names: self.names.into_reader(),
            terminals: self.terminals,
            non_terminals: self.non_terminals,
            rules,
            start,
            end: Terminal(0),
        };
        validate::validate(&grammar)?;
        Ok(grammar)
    }
}

fn take_first<T, V>(ctx: &mut RuleContext<'_, T, V>) -> V {
    ctx.take(0)
}

impl<T, V> Grammar<T, V> {
    /// Reduce `rule` over already-matched symbols; used by the LR driver.
    pub(crate) fn reduce(&self, rule: RuleId, matched: Vec<Matched<T, V>>) -> V {
        let rule = self.rule(rule);
        let mut ctx = RuleContext::new(rule, matched);
        rule.handle(&mut ctx)
    }
}
