//! # Binary-Operator Rebalancing
//!
//! Restores the tree shape implied by operator priority and associativity
//! after an edit, using rotations only.
//!
//! An edit that replaces a leaf with a new binary node, or swaps the operator
//! of an existing node, can leave parent/child pairs in the wrong order. An
//! edge is *loose* when the child binds less tightly than its parent allows:
//!
//! | side  | parent `Left`            | parent `Right`           |
//! |-------|--------------------------|--------------------------|
//! | left  | `child < parent`         | `child <= parent`        |
//! | right | `child <= parent`        | `child < parent`         |
//!
//! Rotating a loose edge swaps exactly that parent/child pair and keeps every
//! other ancestor relation, so repeatedly rotating loose edges terminates in
//! the unique tree where no loose edge remains.
//!
//! The functions work on any tree through the [`BinaryTree`] trait; see
//! [`ExprTree`](crate::demo::binexpr::ExprTree) for an arena implementation.

use crate::grammar::Associativity;
use std::fmt;

/// Which child slot of its parent a node occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Left,
    Right,
}

/// Mutable access to a binary-expression tree through node handles.
///
/// `set_left`, `set_right` and `replace` must keep parent links consistent:
/// after `set_left(node, child)`, `parent(child) == Some(node)`.
///
/// Binary nodes of equal priority must share one associativity. Rebalancing
/// panics on an edge that breaks this.
pub trait BinaryTree {
    type Node: Copy + Eq + fmt::Debug;

    fn parent(&self, node: Self::Node) -> Option<Self::Node>;

    fn is_binary(&self, node: Self::Node) -> bool;

    /// Left operand of a binary node, `None` for other nodes.
    fn left(&self, node: Self::Node) -> Option<Self::Node>;

    /// Right operand of a binary node, `None` for other nodes.
    fn right(&self, node: Self::Node) -> Option<Self::Node>;

    fn set_left(&mut self, node: Self::Node, child: Self::Node);

    fn set_right(&mut self, node: Self::Node, child: Self::Node);

    /// Put `new` where `old` is: in `old`'s parent slot, or at the root.
    fn replace(&mut self, old: Self::Node, new: Self::Node);

    /// Operator priority of a binary node; higher binds tighter.
    fn priority(&self, node: Self::Node) -> i32;

    fn associativity(&self, node: Self::Node) -> Associativity;
}

/// Whether a child on `side` of its parent sits too high for its priority.
#[must_use]
pub fn is_loose(child: i32, parent: i32, parent_assoc: Associativity, side: Side) -> bool {
    match (side, parent_assoc) {
        (Side::Left, Associativity::Left) | (Side::Right, Associativity::Right) => child < parent,
        (Side::Left, Associativity::Right) | (Side::Right, Associativity::Left) => child <= parent,
    }
}

fn side_of<T: BinaryTree>(tree: &T, node: T::Node, parent: T::Node) -> Option<Side> {
    if tree.left(parent) == Some(node) {
        Some(Side::Left)
    } else if tree.right(parent) == Some(node) {
        Some(Side::Right)
    } else {
        None
    }
}

fn is_loose_edge<T: BinaryTree>(tree: &T, child: T::Node, parent: T::Node, side: Side) -> bool {
    if !tree.is_binary(child) || !tree.is_binary(parent) {
        return false;
    }
    let (child_priority, parent_priority) = (tree.priority(child), tree.priority(parent));
    let parent_assoc = tree.associativity(parent);
    assert!(
        child_priority != parent_priority || tree.associativity(child) == parent_assoc,
        "{child:?} and {parent:?} share priority {parent_priority} but not associativity"
    );
    is_loose(child_priority, parent_priority, parent_assoc, side)
}

#[must_use]
pub fn can_rotate_left<T: BinaryTree>(tree: &T, node: T::Node) -> bool {
    tree.is_binary(node) && tree.right(node).is_some_and(|right| tree.is_binary(right))
}

#[must_use]
pub fn can_rotate_right<T: BinaryTree>(tree: &T, node: T::Node) -> bool {
    tree.is_binary(node) && tree.left(node).is_some_and(|left| tree.is_binary(left))
}

/// Rotate `node` down to the left; its right child takes its place.
///
/// Returns the node now in `node`'s position.
///
/// # Panics
/// Panics if the right child of `node` is not a binary node.
pub fn rotate_left<T: BinaryTree>(tree: &mut T, node: T::Node) -> T::Node {
    assert!(
        can_rotate_left(tree, node),
        "cannot rotate {node:?} left: right child is not a binary node"
    );
    let (Some(pivot), Some(inner)) = (tree.right(node), tree.right(node).and_then(|r| tree.left(r)))
    else {
        unreachable!("binary nodes have both operands")
    };
    tree.replace(node, pivot);
    tree.set_right(node, inner);
    tree.set_left(pivot, node);
    pivot
}

/// Rotate `node` down to the right; its left child takes its place.
///
/// Returns the node now in `node`'s position.
///
/// # Panics
/// Panics if the left child of `node` is not a binary node.
pub fn rotate_right<T: BinaryTree>(tree: &mut T, node: T::Node) -> T::Node {
    assert!(
        can_rotate_right(tree, node),
        "cannot rotate {node:?} right: left child is not a binary node"
    );
    let (Some(pivot), Some(inner)) = (tree.left(node), tree.left(node).and_then(|l| tree.right(l)))
    else {
        unreachable!("binary nodes have both operands")
    };
    tree.replace(node, pivot);
    tree.set_left(node, inner);
    tree.set_right(pivot, node);
    pivot
}

/// Move `node` up past every ancestor it binds more loosely than.
///
/// Used after `node` was inserted in place of a leaf.
pub fn balance_up<T: BinaryTree>(tree: &mut T, node: T::Node) {
    while let Some(parent) = tree.parent(node) {
        match side_of(tree, node, parent) {
            Some(Side::Left) if is_loose_edge(tree, node, parent, Side::Left) => {
                rotate_right(tree, parent);
            }
            Some(Side::Right) if is_loose_edge(tree, node, parent, Side::Right) => {
                rotate_left(tree, parent);
            }
            _ => break,
        }
        tracing::trace!(?node, "rotated up");
    }
}

/// Push `node` down until no edge in its subtree is loose.
///
/// Returns the node now at the top of the subtree.
///
/// # Panics
/// Panics if two adjacent binary nodes share a priority but not an
/// associativity.
pub fn balance_down<T: BinaryTree>(tree: &mut T, node: T::Node) -> T::Node {
    let mut top = node;
    while let Some((child, parent, side)) = find_loose(tree, top) {
        let promoted = match side {
            Side::Left => rotate_right(tree, parent),
            Side::Right => rotate_left(tree, parent),
        };
        if parent == top {
            top = promoted;
        }
        tracing::trace!(?child, ?parent, "rotated down");
    }
    top
}

/// Rebalance after the operator of `node` changed: first its subtree, then
/// its position among its ancestors.
pub fn balance_on_operation_change<T: BinaryTree>(tree: &mut T, node: T::Node) {
    let top = balance_down(tree, node);
    balance_up(tree, top);
}

/// First loose edge below `root`, in pre-order.
fn find_loose<T: BinaryTree>(tree: &T, root: T::Node) -> Option<(T::Node, T::Node, Side)> {
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        if !tree.is_binary(node) {
            continue;
        }
        let children = [(tree.left(node), Side::Left), (tree.right(node), Side::Right)];
        for (child, side) in children {
            if child.is_some_and(|child| is_loose_edge(tree, child, node, side)) {
                return child.map(|child| (child, node, side));
            }
        }
        stack.extend(tree.right(node));
        stack.extend(tree.left(node));
    }
    None
}

/// Whether any edge in the subtree of `root` is loose.
#[must_use]
pub fn is_balanced<T: BinaryTree>(tree: &T, root: T::Node) -> bool {
    find_loose(tree, root).is_none()
}
