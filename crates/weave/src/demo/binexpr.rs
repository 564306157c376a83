//! Arena tree of arithmetic expressions for operator rebalancing.

use crate::demo::arith::{BinOp, Expr};
use crate::grammar::Associativity;
use crate::rebalance::{self, BinaryTree, Side};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

#[derive(Debug, Clone, PartialEq)]
enum NodeKind {
    /// Any non-binary expression, kept whole.
    Leaf(Expr),
    Binary {
        op: BinOp,
        left: NodeId,
        right: NodeId,
    },
}

#[derive(Debug, Clone, PartialEq)]
struct Node {
    kind: NodeKind,
    parent: Option<NodeId>,
}

/// Binary expressions with parent links, edited in place.
#[derive(Debug, Clone, PartialEq)]
pub struct ExprTree {
    nodes: Vec<Node>,
    root: NodeId,
}

impl ExprTree {
    /// A tree holding a single leaf.
    #[must_use]
    pub fn leaf(expr: Expr) -> Self {
        Self {
            nodes: vec![Node {
                kind: NodeKind::Leaf(expr),
                parent: None,
            }],
            root: NodeId(0),
        }
    }

    /// Build a tree with the exact shape of `expr`. Parenthesized and
    /// embedded expressions become leaves.
    #[must_use]
    pub fn from_expr(expr: &Expr) -> Self {
        let mut tree = Self {
            nodes: Vec::new(),
            root: NodeId(0),
        };
        tree.root = tree.add_expr(expr);
        tree
    }

    fn add_expr(&mut self, expr: &Expr) -> NodeId {
        match expr {
            Expr::Binary { op, left, right } => {
                let left = self.add_expr(left);
                let right = self.add_expr(right);
                self.add_binary(*op, left, right)
            }
            other => self.push(NodeKind::Leaf(other.clone())),
        }
    }

    fn push(&mut self, kind: NodeKind) -> NodeId {
        self.nodes.push(Node { kind, parent: None });
        NodeId(self.nodes.len() - 1)
    }

    fn add_binary(&mut self, op: BinOp, left: NodeId, right: NodeId) -> NodeId {
        let id = self.push(NodeKind::Binary { op, left, right });
        self.nodes[left.0].parent = Some(id);
        self.nodes[right.0].parent = Some(id);
        id
    }

    #[must_use]
    pub const fn root(&self) -> NodeId {
        self.root
    }

    #[must_use]
    pub fn op(&self, node: NodeId) -> Option<BinOp> {
        match self.nodes[node.0].kind {
            NodeKind::Binary { op, .. } => Some(op),
            NodeKind::Leaf(_) => None,
        }
    }

    /// Leaves in order, left to right.
    #[must_use]
    pub fn leaves(&self) -> Vec<NodeId> {
        let mut out = Vec::new();
        self.collect_leaves(self.root, &mut out);
        out
    }

    fn collect_leaves(&self, node: NodeId, out: &mut Vec<NodeId>) {
        match self.nodes[node.0].kind {
            NodeKind::Leaf(_) => out.push(node),
            NodeKind::Binary { left, right, .. } => {
                self.collect_leaves(left, out);
                self.collect_leaves(right, out);
            }
        }
    }

    /// Binary nodes in order of their operators, left to right.
    #[must_use]
    pub fn operators(&self) -> Vec<NodeId> {
        let mut out = Vec::new();
        self.collect_operators(self.root, &mut out);
        out
    }

    fn collect_operators(&self, node: NodeId, out: &mut Vec<NodeId>) {
        if let NodeKind::Binary { left, right, .. } = self.nodes[node.0].kind {
            self.collect_operators(left, out);
            out.push(node);
            self.collect_operators(right, out);
        }
    }

    /// Replace `leaf` with `leaf op operand` (or `operand op leaf` when
    /// `side` is [`Side::Left`]) and rebalance. Returns the new binary node.
    ///
    /// # Panics
    /// Panics if `leaf` is a binary node.
    pub fn insert_operator(&mut self, leaf: NodeId, op: BinOp, operand: Expr, side: Side) -> NodeId {
        assert!(
            matches!(self.nodes[leaf.0].kind, NodeKind::Leaf(_)),
            "insert_operator needs a leaf, got {leaf:?}"
        );
        let operand = self.push(NodeKind::Leaf(operand));
        let parent = self.nodes[leaf.0].parent;
        let (left, right) = match side {
            Side::Right => (leaf, operand),
            Side::Left => (operand, leaf),
        };
        let node = self.add_binary(op, left, right);
        self.relink(parent, leaf, node);
        rebalance::balance_up(self, node);
        node
    }

    /// Put `new` in the slot `old` holds under `parent` (or at the root).
    fn relink(&mut self, parent: Option<NodeId>, old: NodeId, new: NodeId) {
        match parent {
            None => self.root = new,
            Some(parent) => {
                if let NodeKind::Binary { left, right, .. } = &mut self.nodes[parent.0].kind {
                    if *left == old {
                        *left = new;
                    } else if *right == old {
                        *right = new;
                    }
                }
            }
        }
        self.nodes[new.0].parent = parent;
    }

    /// Change the operator of `node` and rebalance.
    ///
    /// # Panics
    /// Panics if `node` is a leaf.
    pub fn set_op(&mut self, node: NodeId, op: BinOp) {
        match &mut self.nodes[node.0].kind {
            NodeKind::Binary { op: current, .. } => *current = op,
            NodeKind::Leaf(_) => panic!("set_op needs a binary node, got {node:?}"),
        }
        rebalance::balance_on_operation_change(self, node);
    }

    /// The expression this tree spells.
    #[must_use]
    pub fn to_expr(&self) -> Expr {
        self.expr_at(self.root)
    }

    fn expr_at(&self, node: NodeId) -> Expr {
        match &self.nodes[node.0].kind {
            NodeKind::Leaf(expr) => expr.clone(),
            NodeKind::Binary { op, left, right } => {
                Expr::binary(*op, self.expr_at(*left), self.expr_at(*right))
            }
        }
    }

    #[must_use]
    pub fn is_balanced(&self) -> bool {
        rebalance::is_balanced(self, self.root)
    }
}

impl BinaryTree for ExprTree {
    type Node = NodeId;

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes[node.0].parent
    }

    fn is_binary(&self, node: NodeId) -> bool {
        matches!(self.nodes[node.0].kind, NodeKind::Binary { .. })
    }

    fn left(&self, node: NodeId) -> Option<NodeId> {
        match self.nodes[node.0].kind {
            NodeKind::Binary { left, .. } => Some(left),
            NodeKind::Leaf(_) => None,
        }
    }

    fn right(&self, node: NodeId) -> Option<NodeId> {
        match self.nodes[node.0].kind {
            NodeKind::Binary { right, .. } => Some(right),
            NodeKind::Leaf(_) => None,
        }
    }

    fn set_left(&mut self, node: NodeId, child: NodeId) {
        if let NodeKind::Binary { left, .. } = &mut self.nodes[node.0].kind {
            *left = child;
            self.nodes[child.0].parent = Some(node);
        }
    }

    fn set_right(&mut self, node: NodeId, child: NodeId) {
        if let NodeKind::Binary { right, .. } = &mut self.nodes[node.0].kind {
            *right = child;
            self.nodes[child.0].parent = Some(node);
        }
    }

    fn replace(&mut self, old: NodeId, new: NodeId) {
        let parent = self.nodes[old.0].parent;
        self.relink(parent, old, new);
    }

    fn priority(&self, node: NodeId) -> i32 {
        self.op(node).map_or(i32::MAX, BinOp::priority)
    }

    fn associativity(&self, node: NodeId) -> Associativity {
        self.op(node).map_or(Associativity::Left, BinOp::associativity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_expr_round_trips() {
        let expr = Expr::binary(
            BinOp::Add,
            Expr::id("a"),
            Expr::binary(BinOp::Mul, Expr::id("b"), Expr::paren(Expr::id("c"))),
        );
        let tree = ExprTree::from_expr(&expr);
        assert_eq!(tree.to_expr(), expr);
        assert_eq!(tree.leaves().len(), 3);
        assert_eq!(tree.operators().len(), 2);
        assert!(tree.is_balanced());
    }

    #[test]
    #[should_panic(expected = "not a binary node")]
    fn rotating_around_a_leaf_panics() {
        let mut tree = ExprTree::from_expr(&Expr::binary(BinOp::Add, Expr::id("a"), Expr::id("b")));
        let root = tree.root();
        rebalance::rotate_left(&mut tree, root);
    }
}
