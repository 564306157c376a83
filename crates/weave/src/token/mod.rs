//! # Tokens
//!
//! The leaf units of hybrid textual notation.
//!
//! A [`Token`] is immutable. Besides plain identifiers, literals and symbols
//! there are two special kinds:
//!
//! - [`Token::Value`] wraps an already-built sub-value. It is atomic: it is
//!   never split or merged as text, and reconciliation never overwrites it.
//! - [`Token::Error`] keeps text that did not complete to anything the
//!   language knows, so it stays visible and editable.
//!
//! Token texts never contain whitespace; spacing between tokens is decided
//! by [`render`] from the symbol spacing flags.

pub mod completion;

pub use completion::{complete_unique, CompletionItem};

use compact_str::CompactString;
use std::borrow::Cow;

/// A symbol token (operator, bracket, keyword) with its spacing rules.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct SymbolToken {
    text: CompactString,
    no_space_to_left: bool,
    no_space_to_right: bool,
}

impl SymbolToken {
    #[must_use]
    pub fn new(text: impl Into<CompactString>) -> Self {
        Self {
            text: text.into(),
            no_space_to_left: false,
            no_space_to_right: false,
        }
    }

    /// Render glued to the previous token (`)`, `,`).
    #[must_use]
    pub const fn no_space_left(mut self) -> Self {
        self.no_space_to_left = true;
        self
    }

    /// Render glued to the next token (`(`, `\`).
    #[must_use]
    pub const fn no_space_right(mut self) -> Self {
        self.no_space_to_right = true;
        self
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub const fn no_space_to_left(&self) -> bool {
        self.no_space_to_left
    }

    #[must_use]
    pub const fn no_space_to_right(&self) -> bool {
        self.no_space_to_right
    }
}

/// A token of hybrid notation
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub enum Token<V> {
    Identifier(CompactString),
    Int(i64),
    Bool(bool),
    Str(CompactString),
    Symbol(SymbolToken),
    /// An opaque, already-built sub-value
    Value(V),
    /// Text that did not complete to a known token
    Error(CompactString),
}

impl<V> Token<V> {
    #[must_use]
    pub fn identifier(name: impl Into<CompactString>) -> Self {
        Self::Identifier(name.into())
    }

    #[must_use]
    pub fn symbol(text: impl Into<CompactString>) -> Self {
        Self::Symbol(SymbolToken::new(text))
    }

    #[must_use]
    pub fn error(text: impl Into<CompactString>) -> Self {
        Self::Error(text.into())
    }

    /// The text shown for this token.
    ///
    /// String literals are quoted; value tokens show a placeholder since their
    /// content is structural.
    #[must_use]
    pub fn text(&self) -> Cow<'_, str> {
        match self {
            Self::Identifier(text) | Self::Error(text) => Cow::Borrowed(text.as_str()),
            Self::Symbol(symbol) => Cow::Borrowed(symbol.text()),
            Self::Int(value) => Cow::Owned(value.to_string()),
            Self::Bool(value) => Cow::Borrowed(if *value { "true" } else { "false" }),
            Self::Str(text) => Cow::Owned(format!("\"{text}\"")),
            Self::Value(_) => Cow::Borrowed("<value>"),
        }
    }

    #[must_use]
    pub const fn is_value(&self) -> bool {
        matches!(self, Self::Value(_))
    }

    #[must_use]
    pub const fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }

    #[must_use]
    pub const fn no_space_to_left(&self) -> bool {
        match self {
            Self::Symbol(symbol) => symbol.no_space_to_left,
            _ => false,
        }
    }

    #[must_use]
    pub const fn no_space_to_right(&self) -> bool {
        match self {
            Self::Symbol(symbol) => symbol.no_space_to_right,
            _ => false,
        }
    }
}

/// Join token texts into display text.
///
/// Adjacent tokens are separated by one space unless the left token forbids
/// space to its right or the right token forbids space to its left.
#[must_use]
pub fn render<V>(tokens: &[Token<V>]) -> String {
    let mut out = String::new();
    for (i, token) in tokens.iter().enumerate() {
        if i > 0 && !tokens[i - 1].no_space_to_right() && !token.no_space_to_left() {
            out.push(' ');
        }
        out.push_str(&token.text());
    }
    out
}
