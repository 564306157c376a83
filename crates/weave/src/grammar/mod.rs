//! # Grammar Module
//!
//! Context-free grammar representation used by the LR table generator.
//!
//! ## Overview
//!
//! A [`Grammar`] owns insertion-ordered terminals and non-terminals plus a
//! list of [`Rule`]s. Each rule carries:
//!
//! - a left-hand non-terminal and an ordered right-hand side of [`Symbol`]s,
//! - an integer `priority` (higher binds tighter when conflicts are resolved),
//! - an optional [`Associativity`] consulted when priorities tie,
//! - a semantic [`RuleHandler`] building the output value from matched symbols.
//!
//! Symbols are small interned ids, so a built grammar is an immutable registry
//! that can be shared by reference between tables, parsers and editors.
//!
//! ## Usage
//!
//! ```rust
//! use weave::grammar::{GrammarBuilder, Symbol};
//!
//! let mut builder = GrammarBuilder::<char, i64>::new();
//! let num = builder.terminal("num");
//! let plus = builder.terminal("+");
//! let expr = builder.non_terminal("expr");
//!
//! builder
//!     .rule(expr, [Symbol::from(expr), plus.into(), expr.into()], |ctx| {
//!         ctx.take(0) + ctx.take(2)
//!     })
//!     .priority(4)
//!     .left();
//! builder.rule(expr, [num.into()], |ctx| {
//!     i64::from(ctx.lexeme(0).to_digit(10).unwrap_or(0))
//! });
//! builder.start(expr);
//!
//! let grammar = builder.build()?;
//! assert_eq!(grammar.rules().len(), 3);
//! # Ok::<(), weave::error::GrammarError>(())
//! ```

pub mod analysis;
pub mod builder;
pub mod validate;

pub use analysis::GrammarAnalysis;
pub use builder::{GrammarBuilder, RuleDecl};

use lasso::{RodeoReader, Spur};
use smallvec::SmallVec;
use std::fmt;

/// A terminal symbol id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct Terminal(pub(crate) u32);

/// A non-terminal symbol id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct NonTerminal(pub(crate) u32);

/// A rule index; rule 0 is always the augmented start rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct RuleId(pub(crate) u32);

impl Terminal {
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl NonTerminal {
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl RuleId {
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Grammar symbol (terminal or non-terminal).
///
/// Terminals order before non-terminals, which fixes the order in which the
/// table generator explores transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub enum Symbol {
    Terminal(Terminal),
    NonTerminal(NonTerminal),
}

impl From<Terminal> for Symbol {
    fn from(t: Terminal) -> Self {
        Self::Terminal(t)
    }
}

impl From<NonTerminal> for Symbol {
    fn from(nt: NonTerminal) -> Self {
        Self::NonTerminal(nt)
    }
}

/// Associativity used to break shift/reduce ties between equal priorities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub enum Associativity {
    Left,
    Right,
}

/// Semantic action run when a rule is reduced.
pub type RuleHandler<T, V> = Box<dyn Fn(&mut RuleContext<'_, T, V>) -> V + Send + Sync>;

/// Production rule
pub struct Rule<T, V> {
    pub(crate) id: RuleId,
    pub(crate) lhs: NonTerminal,
    pub(crate) rhs: SmallVec<[Symbol; 4]>,
    pub(crate) priority: i32,
    pub(crate) associativity: Option<Associativity>,
    pub(crate) handler: RuleHandler<T, V>,
}

impl<T, V> Rule<T, V> {
    #[must_use]
    pub const fn id(&self) -> RuleId {
        self.id
    }

    #[must_use]
    pub const fn lhs(&self) -> NonTerminal {
        self.lhs
    }

    #[must_use]
    pub fn rhs(&self) -> &[Symbol] {
        &self.rhs
    }

    #[must_use]
    pub const fn priority(&self) -> i32 {
        self.priority
    }

    #[must_use]
    pub const fn associativity(&self) -> Option<Associativity> {
        self.associativity
    }

    /// Run the semantic action over the matched right-hand side.
    pub fn handle(&self, ctx: &mut RuleContext<'_, T, V>) -> V {
        (self.handler)(ctx)
    }
}

impl<T, V> fmt::Debug for Rule<T, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rule")
            .field("id", &self.id)
            .field("lhs", &self.lhs)
            .field("rhs", &self.rhs)
            .field("priority", &self.priority)
            .field("associativity", &self.associativity)
            .finish_non_exhaustive()
    }
}

/// A matched right-hand-side element handed to a rule handler.
#[derive(Debug)]
pub enum Matched<T, V> {
    /// A shifted terminal with its raw token
    Lexeme(T),
    /// The value of a reduced non-terminal
    Value(V),
}

/// Access to the symbols matched by a rule during a reduction.
///
/// Indexes follow the rule's right-hand side. Asking for a lexeme where a
/// value was matched (or the reverse), or taking a value twice, is a bug in
/// the handler and panics.
pub struct RuleContext<'r, T, V> {
    rule: &'r Rule<T, V>,
    matched: Vec<Option<Matched<T, V>>>,
}

impl<'r, T, V> RuleContext<'r, T, V> {
    pub(crate) fn new(rule: &'r Rule<T, V>, matched: Vec<Matched<T, V>>) -> Self {
        Self {
            rule,
            matched: matched.into_iter().map(Some).collect(),
        }
    }

    #[must_use]
    pub const fn rule(&self) -> &'r Rule<T, V> {
        self.rule
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.matched.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.matched.is_empty()
    }

    /// The raw token shifted for the terminal at `index`.
    ///
    /// # Panics
    /// Panics if `index` does not hold a lexeme.
    #[must_use]
    pub fn lexeme(&self, index: usize) -> &T {
        match self.matched.get(index) {
            Some(Some(Matched::Lexeme(token))) => token,
            other => panic!(
                "rule {:?}: symbol {index} is not an available lexeme ({})",
                self.rule.id,
                describe(other)
            ),
        }
    }

    /// The value reduced for the non-terminal at `index`.
    ///
    /// # Panics
    /// Panics if `index` does not hold a value.
    #[must_use]
    pub fn value(&self, index: usize) -> &V {
        match self.matched.get(index) {
            Some(Some(Matched::Value(value))) => value,
            other => panic!(
                "rule {:?}: symbol {index} is not an available value ({})",
                self.rule.id,
                describe(other)
            ),
        }
    }

    /// Move the value at `index` out of the context.
    ///
    /// # Panics
    /// Panics if `index` does not hold a value or it was already taken.
    pub fn take(&mut self, index: usize) -> V {
        let rule = self.rule.id;
        match self.matched.get_mut(index).map(Option::take) {
            Some(Some(Matched::Value(value))) => value,
            Some(Some(lexeme @ Matched::Lexeme(_))) => {
                self.matched[index] = Some(lexeme);
                panic!("rule {rule:?}: symbol {index} is a lexeme, not a value")
            }
            _ => panic!("rule {rule:?}: value {index} is missing or already taken"),
        }
    }

    /// Move the lexeme at `index` out of the context.
    ///
    /// # Panics
    /// Panics if `index` does not hold a lexeme or it was already taken.
    pub fn take_lexeme(&mut self, index: usize) -> T {
        let rule = self.rule.id;
        match self.matched.get_mut(index).map(Option::take) {
            Some(Some(Matched::Lexeme(token))) => token,
            Some(Some(value @ Matched::Value(_))) => {
                self.matched[index] = Some(value);
                panic!("rule {rule:?}: symbol {index} is a value, not a lexeme")
            }
            _ => panic!("rule {rule:?}: lexeme {index} is missing or already taken"),
        }
    }
}

fn describe<T, V>(slot: Option<&Option<Matched<T, V>>>) -> &'static str {
    match slot {
        None => "out of range",
        Some(None) => "already taken",
        Some(Some(Matched::Lexeme(_))) => "lexeme",
        Some(Some(Matched::Value(_))) => "value",
    }
}

/// An immutable context-free grammar.
///
/// Built once through [`GrammarBuilder`] and shared afterwards; nothing in a
/// grammar changes after [`GrammarBuilder::build`] returns.
pub struct Grammar<T, V> {
    names: RodeoReader,
    terminals: Vec<Spur>,
    non_terminals: Vec<Spur>,
    rules: Vec<Rule<T, V>>,
    start: NonTerminal,
    end: Terminal,
}

impl<T, V> Grammar<T, V> {
    /// The user-declared start symbol.
    #[must_use]
    pub const fn start(&self) -> NonTerminal {
        self.start
    }

    /// The end-of-input terminal.
    #[must_use]
    pub const fn end(&self) -> Terminal {
        self.end
    }

    /// The synthetic `$start` non-terminal of the augmented rule.
    #[must_use]
    pub fn augmented_start(&self) -> NonTerminal {
        self.rules[0].lhs
    }

    #[must_use]
    pub fn rules(&self) -> &[Rule<T, V>] {
        &self.rules
    }

    #[must_use]
    pub fn rule(&self, id: RuleId) -> &Rule<T, V> {
        &self.rules[id.index()]
    }

    pub fn rules_for(&self, lhs: NonTerminal) -> impl Iterator<Item = &Rule<T, V>> + '_ {
        self.rules.iter().filter(move |rule| rule.lhs == lhs)
    }

    #[must_use]
    pub fn terminal_count(&self) -> usize {
        self.terminals.len()
    }

    #[must_use]
    pub fn non_terminal_count(&self) -> usize {
        self.non_terminals.len()
    }

    pub fn terminals(&self) -> impl Iterator<Item = Terminal> + '_ {
        (0..self.terminals.len()).map(|i| Terminal(i as u32))
    }

    pub fn non_terminals(&self) -> impl Iterator<Item = NonTerminal> + '_ {
        (0..self.non_terminals.len()).map(|i| NonTerminal(i as u32))
    }

    #[must_use]
    pub fn terminal_name(&self, t: Terminal) -> &str {
        self.names.resolve(&self.terminals[t.index()])
    }

    #[must_use]
    pub fn non_terminal_name(&self, nt: NonTerminal) -> &str {
        self.names.resolve(&self.non_terminals[nt.index()])
    }

    #[must_use]
    pub fn symbol_name(&self, symbol: Symbol) -> &str {
        match symbol {
            Symbol::Terminal(t) => self.terminal_name(t),
            Symbol::NonTerminal(nt) => self.non_terminal_name(nt),
        }
    }

    /// Look a terminal up by name.
    #[must_use]
    pub fn terminal(&self, name: &str) -> Option<Terminal> {
        let spur = self.names.get(name)?;
        self.terminals
            .iter()
            .position(|s| *s == spur)
            .map(|i| Terminal(i as u32))
    }

    /// Look a non-terminal up by name.
    #[must_use]
    pub fn non_terminal(&self, name: &str) -> Option<NonTerminal> {
        let spur = self.names.get(name)?;
        self.non_terminals
            .iter()
            .position(|s| *s == spur)
            .map(|i| NonTerminal(i as u32))
    }

    /// Render a rule as `lhs -> a b c`.
    #[must_use]
    pub fn display_rule(&self, id: RuleId) -> String {
        let rule = self.rule(id);
        let mut out = String::from(self.non_terminal_name(rule.lhs));
        out.push_str(" ->");
        if rule.rhs.is_empty() {
            out.push_str(" ε");
        }
        for symbol in &rule.rhs {
            out.push(' ');
            out.push_str(self.symbol_name(*symbol));
        }
        out
    }
}

impl<T, V> fmt::Debug for Grammar<T, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Grammar")
            .field("terminals", &self.terminals.len())
            .field("non_terminals", &self.non_terminals.len())
            .field("rules", &self.rules.len())
            .field("start", &self.non_terminal_name(self.start))
            .finish()
    }
}
