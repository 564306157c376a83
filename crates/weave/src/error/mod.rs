//! # Error Types
//!
//! Error types for grammar construction, table generation, token editing and
//! mapper lifecycles.
//!
//! ## Taxonomy
//!
//! - [`GrammarError`]: the grammar itself is malformed (missing start symbol,
//!   undefined or unreachable non-terminals, duplicate names).
//! - [`TableError`]: LR table generation met a conflict that priorities and
//!   associativity cannot settle.
//! - [`LanguageError`]: either of the above, from a constructor that builds a
//!   grammar and its table in one go.
//! - [`EditorError`]: a token operation was addressed at a token or neighbour
//!   that does not exist (usually a stale id coming from the presentation layer).
//! - [`MapperError`]: a mapper was attached or detached out of order.
//!
//! Parse failures are not errors: the LR parser returns `None` and the hybrid
//! editor records the failure in its `valid` flag. Programming errors such as a
//! printer/parser mismatch or rotating around a leaf panic at the call site.
//!
//! ## Diagnostics Support
//!
//! When the `diagnostics` feature is enabled, errors integrate with [`miette`]
//! for rich error reporting.

use crate::hybrid::TokenId;
use thiserror::Error;

#[cfg(feature = "diagnostics")]
use miette::Diagnostic;

/// Errors detected while building a [`Grammar`](crate::grammar::Grammar).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[cfg_attr(feature = "diagnostics", derive(Diagnostic))]
pub enum GrammarError {
    #[error("grammar has no start symbol")]
    #[cfg_attr(
        feature = "diagnostics",
        diagnostic(code(grammar::missing_start), help("call `GrammarBuilder::start`"))
    )]
    MissingStart,

    #[error("symbol `{0}` is declared more than once")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(grammar::duplicate_symbol)))]
    DuplicateSymbol(String),

    #[error("non-terminal `{0}` has no rules")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(grammar::undefined_non_terminal)))]
    UndefinedNonTerminal(String),

    #[error("non-terminal `{0}` is not reachable from the start symbol")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(grammar::unreachable_non_terminal)))]
    UnreachableNonTerminal(String),

    #[error("rule {rule} uses the end-of-input terminal")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(grammar::end_in_rule)))]
    EndInRule { rule: usize },
}

/// Conflicts that LR table generation could not resolve.
///
/// The generator never drops a rule silently: if neither priority nor
/// associativity decides a conflict, the whole table is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[cfg_attr(feature = "diagnostics", derive(Diagnostic))]
pub enum TableError {
    #[error(
        "reduce/reduce conflict in state {state} on `{terminal}`: `{first}` and `{second}` share priority {priority}"
    )]
    #[cfg_attr(
        feature = "diagnostics",
        diagnostic(
            code(lr::reduce_reduce),
            help("give one of the rules a higher priority")
        )
    )]
    ReduceReduce {
        state: usize,
        terminal: String,
        first: String,
        second: String,
        priority: i32,
    },

    #[error(
        "shift/reduce conflict in state {state} on `{terminal}`: `{rule}` ties the shift at priority {priority} and has no associativity"
    )]
    #[cfg_attr(
        feature = "diagnostics",
        diagnostic(
            code(lr::shift_reduce),
            help("declare the rule left or right associative, or change its priority")
        )
    )]
    ShiftReduce {
        state: usize,
        terminal: String,
        rule: String,
        priority: i32,
    },
}

/// Failure to assemble a ready-to-parse language.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[cfg_attr(feature = "diagnostics", derive(Diagnostic))]
pub enum LanguageError {
    #[error(transparent)]
    #[cfg_attr(feature = "diagnostics", diagnostic(transparent))]
    Grammar(#[from] GrammarError),

    #[error(transparent)]
    #[cfg_attr(feature = "diagnostics", diagnostic(transparent))]
    Table(#[from] TableError),
}

/// Errors reported by token operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[cfg_attr(feature = "diagnostics", derive(Diagnostic))]
pub enum EditorError {
    #[error("token {0:?} is not in the token list")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(editor::unknown_token)))]
    UnknownToken(TokenId),

    #[error("no token at offset {delta} from index {index}")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(editor::no_neighbor)))]
    NoNeighbor { index: usize, delta: isize },

    #[error("tokens at {left} and {right} cannot be merged")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(editor::not_mergeable)))]
    NotMergeable { left: usize, right: usize },

    #[error("delta {0} is not valid for this operation")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(editor::invalid_delta)))]
    InvalidDelta(isize),

    #[error("caret {caret} is outside of a {len}-character text")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(editor::invalid_caret)))]
    InvalidCaret { caret: usize, len: usize },
}

/// Mapper lifecycle violations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[cfg_attr(feature = "diagnostics", derive(Diagnostic))]
pub enum MapperError {
    #[error("mapper {0} does not exist")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(mapper::unknown)))]
    UnknownMapper(usize),

    #[error("mapper {0} is not attached")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(mapper::not_attached)))]
    NotAttached(usize),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_errors_name_the_conflict() {
        let err = TableError::ShiftReduce {
            state: 7,
            terminal: "+".into(),
            rule: "expr -> expr + expr".into(),
            priority: 4,
        };
        let message = err.to_string();
        assert!(message.contains("state 7"));
        assert!(message.contains("`+`"));
        assert!(message.contains("expr -> expr + expr"));
    }

    #[test]
    fn editor_errors_display_offsets() {
        let err = EditorError::NoNeighbor { index: 0, delta: -1 };
        assert_eq!(err.to_string(), "no token at offset -1 from index 0");
    }
}
