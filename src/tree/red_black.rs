//! Colour-balanced ordered map.
//!
//! Each node is red or black. The root is black, a red node never has a red
//! child, and every path from a node down to an absent link crosses the same
//! number of black nodes. Absent links count as black, so the `NIL` handle
//! plays the part of the shared black sentinel without being stored anywhere.

use super::KeyOwnership;
use super::Owned;
use super::node::{Arena, Node, NodeIndex, Side};
use crate::error::InvariantViolation;
use static_assertions::{assert_impl_all, assert_not_impl_any, const_assert_eq};
use std::borrow::Borrow;
use std::cmp::Ordering;
use std::marker::PhantomData;

/// Colour of a red-black node.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Color {
    /// A red node.
    Red,
    /// A black node. Absent children are black too.
    Black,
}

const_assert_eq!(std::mem::size_of::<Color>(), 1);

/// An ordered map kept balanced by node colours.
///
/// The longest root-to-leaf path is at most twice the shortest, so the
/// height stays below `2 * log2(N + 1)`. Insertion performs at most two
/// rotations and deletion at most three.
///
/// # Examples
///
/// ```rust
/// use counterpoise::tree::RedBlackTree;
///
/// let mut tree: RedBlackTree<str, u32> = RedBlackTree::new();
/// tree.insert("delta", 4);
/// tree.insert("alpha", 1);
/// tree.insert("charlie", 3);
///
/// assert!(tree.replace("alpha", 10));
/// assert_eq!(tree.find("alpha", 0), 10);
/// assert_eq!(tree.first(), Some(("alpha", &10)));
/// assert!(tree.check_invariants().is_ok());
/// ```
pub struct RedBlackTree<K: ?Sized, V, O: KeyOwnership<K> = Owned> {
    arena: Arena<O::Stored, V, Color>,
    root: NodeIndex,
    size: usize,
    ownership: PhantomData<(fn(&K), O)>,
}

ordered_tree_api!(RedBlackTree, Color, "red-black");

assert_impl_all!(RedBlackTree<str, String>: Send, Sync);
assert_not_impl_any!(RedBlackTree<i32, std::rc::Rc<i32>>: Send, Sync);

// =============================================================================
// Colour Repair
// =============================================================================

impl<K, V, O> RedBlackTree<K, V, O>
where
    K: ?Sized,
    O: KeyOwnership<K>,
{
    #[inline]
    fn color(&self, index: NodeIndex) -> Color {
        self.arena.get(index).map_or(Color::Black, |node| node.meta)
    }

    #[inline]
    fn set_color(&mut self, index: NodeIndex, color: Color) {
        self.arena.node_mut(index).meta = color;
    }

    fn rotate(&mut self, index: NodeIndex, direction: Side) {
        trace_event!(trace, tree = "red-black", ?direction, "rotation");
        let parent = self.arena.parent(index);
        let top = self.arena.rotate(index, direction);
        self.arena.replace_child(&mut self.root, parent, index, top);
    }

    /// Removes a red-red conflict between `node` and its parent.
    fn insert_fixup(&mut self, mut node: NodeIndex) {
        loop {
            let mut parent = self.arena.parent(node);
            if self.color(parent) == Color::Black {
                break;
            }
            let grandparent = self.arena.parent(parent);
            debug_assert!(!grandparent.is_nil(), "red-black root is red during insert fix-up");
            let side = self.arena.side_of(grandparent, parent);
            let uncle = self.arena.child(grandparent, side.opposite());

            if self.color(uncle) == Color::Red {
                self.set_color(parent, Color::Black);
                self.set_color(uncle, Color::Black);
                self.set_color(grandparent, Color::Red);
                node = grandparent;
                continue;
            }

            if node == self.arena.child(parent, side.opposite()) {
                node = parent;
                self.rotate(node, side);
                parent = self.arena.parent(node);
            }
            self.set_color(parent, Color::Black);
            self.set_color(grandparent, Color::Red);
            self.rotate(grandparent, side.opposite());
            trace_event!(trace, tree = "red-black", "insert fix-up finished by rotation");
            break;
        }
        let root = self.root;
        self.set_color(root, Color::Black);
    }

    /// Restores black heights after a black node was unlinked.
    ///
    /// `node` took the unlinked node's place below `parent` and carries one
    /// black too few. `node` may be `NIL`, hence the explicit parent.
    fn delete_fixup(&mut self, mut node: NodeIndex, mut parent: NodeIndex) {
        while node != self.root && self.color(node) == Color::Black {
            let side = if self.arena.child(parent, Side::Left) == node {
                Side::Left
            } else {
                Side::Right
            };
            let mut sibling = self.arena.child(parent, side.opposite());

            if self.color(sibling) == Color::Red {
                self.set_color(sibling, Color::Black);
                self.set_color(parent, Color::Red);
                self.rotate(parent, side);
                sibling = self.arena.child(parent, side.opposite());
            }
            // A doubly black node always has a real sibling.
            debug_assert!(!sibling.is_nil(), "red-black sibling of a doubly black node is missing");

            let near = self.arena.child(sibling, side);
            let far = self.arena.child(sibling, side.opposite());
            if self.color(near) == Color::Black && self.color(far) == Color::Black {
                self.set_color(sibling, Color::Red);
                node = parent;
                parent = self.arena.parent(node);
                continue;
            }

            if self.color(far) == Color::Black {
                self.set_color(near, Color::Black);
                self.set_color(sibling, Color::Red);
                self.rotate(sibling, side.opposite());
                sibling = self.arena.child(parent, side.opposite());
            }
            let parent_color = self.color(parent);
            self.set_color(sibling, parent_color);
            self.set_color(parent, Color::Black);
            let far = self.arena.child(sibling, side.opposite());
            self.set_color(far, Color::Black);
            self.rotate(parent, side);
            trace_event!(trace, tree = "red-black", "delete fix-up finished by rotation");
            node = self.root;
        }
        if !node.is_nil() {
            self.set_color(node, Color::Black);
        }
    }
}

// =============================================================================
// Updates
// =============================================================================

impl<K, V, O> RedBlackTree<K, V, O>
where
    K: Ord + ?Sized,
    O: KeyOwnership<K>,
{
    /// Links a new red leaf for `key`, or hands `value` back if the key exists.
    fn insert_entry(&mut self, key: &K, value: V) -> Result<(), V> {
        let mut parent = NodeIndex::NIL;
        let mut side = Side::Left;
        let mut current = self.root;
        while let Some(node) = self.arena.get(current) {
            side = match key.cmp(node.key.borrow()) {
                Ordering::Less => Side::Left,
                Ordering::Greater => Side::Right,
                Ordering::Equal => return Err(value),
            };
            parent = current;
            current = node.child(side);
        }

        let leaf = self
            .arena
            .allocate(O::duplicate(key), value, parent, Color::Red);
        if parent.is_nil() {
            self.root = leaf;
        } else {
            self.arena.set_child(parent, side, leaf);
        }
        self.insert_fixup(leaf);
        Ok(())
    }

    /// Unlinks the entry for `key` if `accept` approves its value.
    ///
    /// A node with two children takes over its in-order successor's entry,
    /// and the successor's node is unlinked instead.
    fn remove_entry<F>(&mut self, key: &K, accept: &F) -> Option<(O::Stored, V)>
    where
        F: Fn(&V) -> bool,
    {
        let target = self.arena.search(self.root, key);
        let node = self.arena.get(target)?;
        if !accept(&node.value) {
            return None;
        }

        let removed = if node.left.is_nil() || node.right.is_nil() {
            target
        } else {
            let successor = self.arena.extreme(node.right, Side::Left);
            self.arena.swap_entries(target, successor);
            successor
        };

        let node = self.arena.node(removed);
        let child = if node.left.is_nil() { node.right } else { node.left };
        let parent = node.parent;
        let color = node.meta;
        self.arena.replace_child(&mut self.root, parent, removed, child);
        self.arena.set_parent(child, parent);
        let Node { key, value, .. } = self.arena.free(removed);

        if color == Color::Black {
            self.delete_fixup(child, parent);
        }
        Some((key, value))
    }

    /// Checks the root colour, red-red adjacency and black heights.
    fn validate_balance(&self) -> Result<(), InvariantViolation> {
        if self.color(self.root) == Color::Red {
            return Err(InvariantViolation::RedRoot);
        }
        let mut position = 0;
        self.black_height(self.root, &mut position).map(|_| ())
    }

    fn black_height(
        &self,
        index: NodeIndex,
        position: &mut usize,
    ) -> Result<usize, InvariantViolation> {
        let Some(node) = self.arena.get(index) else {
            return Ok(1);
        };
        let left = self.black_height(node.left, position)?;
        let here = *position;
        *position += 1;
        if node.meta == Color::Red
            && (self.color(node.left) == Color::Red || self.color(node.right) == Color::Red)
        {
            return Err(InvariantViolation::RedChildOfRed { position: here });
        }
        let right = self.black_height(node.right, position)?;

        if left != right {
            return Err(InvariantViolation::BlackHeightMismatch {
                position: here,
                left,
                right,
            });
        }
        Ok(left + usize::from(node.meta == Color::Black))
    }
}

// =============================================================================
// Tests
// =============================================================================
