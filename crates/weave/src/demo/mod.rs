//! Ready-made hybrid languages.
//!
//! - [`arith`]: arithmetic with five binary operators over identifiers,
//!   integers and embedded values.
//! - [`lambda`]: untyped lambda calculus with juxtaposition application.
//! - [`binexpr`]: an arena tree of arithmetic expressions implementing
//!   [`BinaryTree`](crate::rebalance::BinaryTree).

pub mod arith;
pub mod binexpr;
pub mod lambda;

pub use arith::{ArithSpec, BinOp, Expr};
pub use binexpr::{ExprTree, NodeId};
pub use lambda::{LambdaSpec, Term};
