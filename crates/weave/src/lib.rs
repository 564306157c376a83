//! # Weave
//!
//! The core of a hybrid text/structure editor: an editable token list kept in
//! lockstep with the value parsed from it.
//!
//! ## Overview
//!
//! - **LR tables**: canonical LR(1), LALR(1) or SLR tables generated from a
//!   grammar whose ambiguities are settled by rule priority and associativity
//! - **Hybrid editing**: a token-list editor that reparses after every token
//!   edit and reprints after every value edit, keeping invalid text editable
//! - **Token operations**: caret-aware typing, splitting, merging and deleting
//!   driven by token completion
//! - **Mappers**: a small framework for keeping target trees (such as
//!   presentation cells) in step with a source
//! - **Rebalancing**: rotation-based repair of binary operator trees after an
//!   edit, without reparsing
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use weave::demo::arith::{ArithSpec, BinOp, Expr};
//! use weave::hybrid::TokenListEditor;
//! use weave::token::{render, Token};
//!
//! let spec = Arc::new(ArithSpec::new().expect("arith grammar builds"));
//! let mut editor = TokenListEditor::new(spec);
//!
//! // Typing produces tokens; every change reparses.
//! editor.set_tokens(vec![
//!     Token::identifier("a"),
//!     Token::symbol("+"),
//!     Token::identifier("b"),
//!     Token::symbol("*"),
//!     Token::Int(2),
//! ]);
//! assert!(editor.is_valid());
//! assert_eq!(
//!     editor.value(),
//!     Some(&Expr::binary(
//!         BinOp::Add,
//!         Expr::id("a"),
//!         Expr::binary(BinOp::Mul, Expr::id("b"), Expr::Int(2)),
//!     ))
//! );
//!
//! // Half-typed input keeps its tokens and the last good value.
//! editor.insert_token(5, Token::symbol("-"));
//! assert!(!editor.is_valid());
//! assert_eq!(render(editor.tokens()), "a + b * 2 -");
//! ```
//!
//! ## Modules
//!
//! - [`grammar`] - Grammar definition, validation and analysis
//! - [`lr`] - LR table generation and the table-driven parser
//! - [`token`] - Tokens and token completion
//! - [`pretty`] - Pretty-printing with token provenance
//! - [`hybrid`] - The hybrid token-list editor, token operations and views
//! - [`mapper`] - Mapper/synchronizer framework
//! - [`rebalance`] - Binary-operator rebalancing
//! - [`observable`] - Listener registrations
//! - [`demo`] - Arithmetic and lambda-calculus languages
//! - [`error`] - Error types and diagnostics

pub mod demo;
pub mod error;
pub mod grammar;
pub mod hybrid;
pub mod lr;
pub mod mapper;
pub mod observable;
pub mod pretty;
pub mod rebalance;
pub mod token;

// Re-export commonly used types
pub use error::{EditorError, GrammarError, LanguageError, MapperError, TableError};
pub use grammar::{Associativity, Grammar, GrammarBuilder, NonTerminal, RuleId, Symbol, Terminal};
pub use hybrid::{HybridSpec, LrHybridParser, TokenId, TokenListEditor, TokenOperations};
pub use lr::{LrConfig, LrParser, LrTable, TableAlgorithm};
pub use token::{SymbolToken, Token};
