//! # Pretty-Printer
//!
//! Turns a value into tokens while recording which sub-value produced which
//! tokens.
//!
//! A printer appends tokens for the value it is given and delegates
//! sub-values with [`PrettyPrinterContext::append_child`]. Every delegation
//! opens a [`ParseNode`] covering the tokens printed for that sub-value, so a
//! selection made on the value (for example "this sub-expression") maps back
//! to a contiguous token range.
//!
//! ```rust
//! use weave::pretty::{print, PrettyPrinter, PrettyPrinterContext};
//! use weave::token::Token;
//!
//! #[derive(Debug, Clone, PartialEq)]
//! enum List {
//!     Item(i64),
//!     Pair(Box<List>, Box<List>),
//! }
//!
//! struct ListPrinter;
//!
//! impl PrettyPrinter<List> for ListPrinter {
//!     fn print(&self, value: &List, ctx: &mut PrettyPrinterContext<'_, List>) {
//!         match value {
//!             List::Item(n) => ctx.append(Token::Int(*n)),
//!             List::Pair(a, b) => {
//!                 ctx.append_child(a);
//!                 ctx.append(Token::symbol(","));
//!                 ctx.append_child(b);
//!             }
//!         }
//!     }
//! }
//!
//! let value = List::Pair(Box::new(List::Item(1)), Box::new(List::Item(2)));
//! let printed = print(&ListPrinter, &value);
//! assert_eq!(printed.tokens.len(), 3);
//! assert_eq!(printed.parse_node.token_range_of(&List::Item(2)), Some(2..3));
//! ```

use crate::token::Token;
use std::ops::Range;

/// Prints values of type `V` into a [`PrettyPrinterContext`].
pub trait PrettyPrinter<V> {
    fn print(&self, value: &V, ctx: &mut PrettyPrinterContext<'_, V>);
}

/// Provenance node: the tokens in `range` were printed from `value`.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseNode<V> {
    value: V,
    range: Range<usize>,
    children: Vec<ParseNode<V>>,
}

impl<V> ParseNode<V> {
    #[must_use]
    pub const fn value(&self) -> &V {
        &self.value
    }

    #[must_use]
    pub fn range(&self) -> Range<usize> {
        self.range.clone()
    }

    #[must_use]
    pub fn children(&self) -> &[ParseNode<V>] {
        &self.children
    }

    /// Deepest node whose range contains token `index`.
    #[must_use]
    pub fn innermost_at(&self, index: usize) -> Option<&ParseNode<V>> {
        if !self.range.contains(&index) {
            return None;
        }
        self.children
            .iter()
            .find_map(|child| child.innermost_at(index))
            .or(Some(self))
    }

    /// First node, in pre-order, printed from a value equal to `value`.
    #[must_use]
    pub fn find(&self, value: &V) -> Option<&ParseNode<V>>
    where
        V: PartialEq,
    {
        if self.value == *value {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.find(value))
    }

    /// Token range printed for `value`.
    #[must_use]
    pub fn token_range_of(&self, value: &V) -> Option<Range<usize>>
    where
        V: PartialEq,
    {
        self.find(value).map(ParseNode::range)
    }
}

/// Output of [`print`].
#[derive(Debug, Clone, PartialEq)]
pub struct Printed<V> {
    pub tokens: Vec<Token<V>>,
    pub parse_node: ParseNode<V>,
}

/// Sink handed to a [`PrettyPrinter`].
pub struct PrettyPrinterContext<'p, V> {
    printer: &'p dyn PrettyPrinter<V>,
    tokens: Vec<Token<V>>,
    open: Vec<ParseNode<V>>,
}

impl<V: Clone> PrettyPrinterContext<'_, V> {
    pub fn append(&mut self, token: Token<V>) {
        self.tokens.push(token);
    }

    /// Print a sub-value through the same printer, recording its node.
    pub fn append_child(&mut self, value: &V) {
        self.open.push(ParseNode {
            value: value.clone(),
            range: self.tokens.len()..self.tokens.len(),
            children: Vec::new(),
        });
        let printer = self.printer;
        printer.print(value, self);
        if let Some(mut node) = self.open.pop() {
            node.range.end = self.tokens.len();
            if let Some(parent) = self.open.last_mut() {
                parent.children.push(node);
            }
        }
    }

    /// Number of tokens appended so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

/// Print `value`, returning its tokens and the provenance tree rooted at it.
pub fn print<V: Clone>(printer: &dyn PrettyPrinter<V>, value: &V) -> Printed<V> {
    let mut ctx = PrettyPrinterContext {
        printer,
        tokens: Vec::new(),
        open: vec![ParseNode {
            value: value.clone(),
            range: 0..0,
            children: Vec::new(),
        }],
    };
    printer.print(value, &mut ctx);
    let tokens = ctx.tokens;
    let mut parse_node = ctx.open.swap_remove(0);
    parse_node.range.end = tokens.len();
    Printed { tokens, parse_node }
}
