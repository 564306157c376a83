//! # LR Backend
//!
//! Table generation and the table-driven parser.
//!
//! [`LrTable::generate`] turns a [`Grammar`](crate::grammar::Grammar) into an
//! immutable action/goto table; [`LrParser`] drives that table over a stream
//! of [`Lexeme`]s and runs each rule's handler on reduction. Tables are plain
//! data, so one table can back any number of parsers through an `Arc`.
//!
//! The grammars this crate is built for are deliberately ambiguous (a single
//! `expr -> expr op expr` shape for every operator), so conflict resolution is
//! part of the contract. See [`table`] for the exact rules.

mod config;
pub mod item;
pub mod parser;
pub mod table;

pub use config::{LrConfig, TableAlgorithm};
pub use item::Item;
pub use parser::{Lexeme, LrParser};
pub use table::{generate, Action, ConflictKind, LrTable, Resolution};
