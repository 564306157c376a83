//! # Hybrid Editing
//!
//! Keeps an editable token list and a parsed value in lockstep.
//!
//! A language plugs in through [`HybridSpec`]: how to parse tokens, how to
//! print a value, and how typed text completes to tokens. On top of that:
//!
//! - [`TokenListEditor`] owns the live tokens, reparses after every token
//!   mutation and reprints after every value mutation.
//! - [`TokenOperations`] implements caret-aware edits (typing, deleting,
//!   merging) on the editor's tokens.
//! - [`TokenView`] projects the tokens into presentation cells through the
//!   [`mapper`](crate::mapper) framework.
//!
//! All of it is synchronous: a mutation is fully reconciled before the
//! mutating call returns.

pub mod editor;
pub mod ops;
pub mod view;

pub use editor::{EditorEvent, SyncState, TokenListEditor};
pub use ops::{Caret, Focus, TokenOperations};
pub use view::{TokenCell, TokenView};

use crate::grammar::Terminal;
use crate::lr::{Lexeme, LrParser};
use crate::pretty::{PrettyPrinter, PrettyPrinterContext};
use crate::token::{CompletionItem, Token};
use std::fmt;

/// Stable identity of a live token in a [`TokenListEditor`].
///
/// Ids are never reused within one editor, so an id held by the presentation
/// layer either resolves to the same token or to nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TokenId(pub(crate) u64);

/// A language the hybrid editor can edit.
pub trait HybridSpec {
    type Value: Clone + PartialEq + fmt::Debug;

    /// Parse a token list; `None` means the tokens do not form a value.
    fn parse(&self, tokens: &[Token<Self::Value>]) -> Option<Self::Value>;

    /// Print a value. Must be the inverse of [`parse`](Self::parse) token for token.
    fn print(&self, value: &Self::Value, ctx: &mut PrettyPrinterContext<'_, Self::Value>);

    /// Completion candidates for a piece of typed text.
    fn token_completion(&self, text: &str) -> Vec<CompletionItem<Self::Value>>;
}

/// [`PrettyPrinter`] view of a [`HybridSpec`].
pub struct SpecPrinter<'s, S>(pub &'s S);

impl<S: HybridSpec> PrettyPrinter<S::Value> for SpecPrinter<'_, S> {
    fn print(&self, value: &S::Value, ctx: &mut PrettyPrinterContext<'_, S::Value>) {
        self.0.print(value, ctx);
    }
}

type Classifier<V> = Box<dyn Fn(&Token<V>) -> Option<Terminal> + Send + Sync>;

/// Adapts an [`LrParser`] over tokens to [`HybridSpec::parse`].
///
/// The classifier maps each token to its grammar terminal; a token it cannot
/// classify (typically an error token) makes the whole parse fail.
pub struct LrHybridParser<V> {
    parser: LrParser<Token<V>, V>,
    classify: Classifier<V>,
}

impl<V> fmt::Debug for LrHybridParser<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LrHybridParser")
            .field("parser", &self.parser)
            .finish_non_exhaustive()
    }
}

impl<V: Clone> LrHybridParser<V> {
    pub fn new<F>(parser: LrParser<Token<V>, V>, classify: F) -> Self
    where
        F: Fn(&Token<V>) -> Option<Terminal> + Send + Sync + 'static,
    {
        Self {
            parser,
            classify: Box::new(classify),
        }
    }

    #[must_use]
    pub const fn parser(&self) -> &LrParser<Token<V>, V> {
        &self.parser
    }

    #[must_use]
    pub fn parse(&self, tokens: &[Token<V>]) -> Option<V> {
        let lexemes = tokens
            .iter()
            .map(|token| {
                let terminal = (self.classify)(token);
                if terminal.is_none() {
                    tracing::trace!(token = %token.text(), "token has no terminal");
                }
                terminal.map(|terminal| Lexeme::new(terminal, token.clone()))
            })
            .collect::<Option<Vec<_>>>()?;
        self.parser.parse(lexemes)
    }
}
