//! Height-balanced ordered map.
//!
//! Every node records which of its subtrees is taller, if either. Updates walk
//! back up the parent links from the changed leaf, adjusting those records and
//! rotating wherever a node would lean by two levels. The walk stops as soon
//! as a subtree's height is known not to have changed.
//!
//! # Time Complexity
//!
//! | Operation | Complexity |
//! |-----------|------------|
//! | `insert`  | O(log N), at most one single or double rotation |
//! | `erase`   | O(log N), at most O(log N) rotations |
//! | `find`    | O(log N)   |
//! | `clear`   | O(N)       |

use super::KeyOwnership;
use super::Owned;
use super::node::{Arena, Node, NodeIndex, Side};
use crate::error::InvariantViolation;
use static_assertions::{assert_impl_all, assert_not_impl_any, const_assert_eq};
use std::borrow::Borrow;
use std::cmp::Ordering;
use std::marker::PhantomData;

// =============================================================================
// Balance Metadata
// =============================================================================

/// Which subtree of an AVL node is taller.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub enum Balance {
    /// The left subtree is one level taller.
    LeftHeavy,
    /// Both subtrees have the same height.
    #[default]
    Balanced,
    /// The right subtree is one level taller.
    RightHeavy,
}

/// How a node leans relative to one of its sides.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum Lean {
    Toward,
    Level,
    Away,
}

impl Balance {
    const fn heavy(side: Side) -> Self {
        match side {
            Side::Left => Self::LeftHeavy,
            Side::Right => Self::RightHeavy,
        }
    }

    const fn lean(self, side: Side) -> Lean {
        match (self, side) {
            (Self::Balanced, _) => Lean::Level,
            (Self::LeftHeavy, Side::Left) | (Self::RightHeavy, Side::Right) => Lean::Toward,
            (Self::LeftHeavy, Side::Right) | (Self::RightHeavy, Side::Left) => Lean::Away,
        }
    }
}

/// Whether a subtree's height changed during an update.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum Height {
    Changed,
    Unchanged,
}

const_assert_eq!(std::mem::size_of::<Balance>(), 1);

// =============================================================================
// AvlTree Definition
// =============================================================================

/// An ordered map kept balanced by subtree heights.
///
/// For every node the heights of its two subtrees differ by at most one, so
/// the tree height never exceeds about `1.44 * log2(N + 2)`.
///
/// `K` is the key type the tree is queried with. `O` chooses how keys are
/// stored; see [`KeyOwnership`].
///
/// # Examples
///
/// ```rust
/// use counterpoise::tree::AvlTree;
///
/// let mut tree: AvlTree<i32, &str> = AvlTree::new();
/// for key in [50, 30, 70, 20, 40, 60, 80] {
///     tree.insert(key, "value");
/// }
///
/// assert!(tree.erase(&50));
/// assert!(!tree.exists(&50));
/// assert_eq!(tree.keys_to_vec(), vec![20, 30, 40, 60, 70, 80]);
/// assert!(tree.check_invariants().is_ok());
/// ```
pub struct AvlTree<K: ?Sized, V, O: KeyOwnership<K> = Owned> {
    arena: Arena<O::Stored, V, Balance>,
    root: NodeIndex,
    size: usize,
    ownership: PhantomData<(fn(&K), O)>,
}

ordered_tree_api!(AvlTree, Balance, "avl");

assert_impl_all!(AvlTree<str, String>: Send, Sync);
assert_not_impl_any!(AvlTree<i32, std::rc::Rc<i32>>: Send, Sync);

// =============================================================================
// Rebalancing
// =============================================================================

impl<K, V, O> AvlTree<K, V, O>
where
    K: ?Sized,
    O: KeyOwnership<K>,
{
    #[inline]
    fn balance(&self, index: NodeIndex) -> Balance {
        self.arena.node(index).meta
    }

    #[inline]
    fn set_balance(&mut self, index: NodeIndex, balance: Balance) {
        self.arena.node_mut(index).meta = balance;
    }

    /// Restores balance at `index` after the subtree on `side` grew by one.
    ///
    /// Returns the root of the rebalanced subtree and whether its height grew.
    fn balance_grown(&mut self, index: NodeIndex, side: Side) -> (NodeIndex, Height) {
        match self.balance(index).lean(side) {
            Lean::Away => {
                self.set_balance(index, Balance::Balanced);
                (index, Height::Unchanged)
            }
            Lean::Level => {
                self.set_balance(index, Balance::heavy(side));
                (index, Height::Changed)
            }
            Lean::Toward => {
                let child = self.arena.child(index, side);
                // The grown child cannot be level: a fresh leaf would mean
                // `index` had nothing on this side to lean towards.
                debug_assert_ne!(
                    self.balance(child),
                    Balance::Balanced,
                    "avl grown child is level under a node already leaning towards it"
                );
                let top = if self.balance(child).lean(side) == Lean::Toward {
                    // The child's inner subtree and the light side of `index`
                    // have the same height, so they are empty together.
                    debug_assert_eq!(
                        self.arena.child(child, side.opposite()).is_nil(),
                        self.arena.child(index, side.opposite()).is_nil(),
                        "avl subtrees meeting in a single rotation differ in height"
                    );
                    self.rotate_single(index, side.opposite(), Balance::Balanced, Balance::Balanced)
                } else {
                    self.rotate_double(index, side)
                };
                (top, Height::Unchanged)
            }
        }
    }

    /// Restores balance at `index` after the subtree on `side` shrank by one.
    ///
    /// Returns the root of the rebalanced subtree and whether its height shrank.
    fn balance_shrunk(&mut self, index: NodeIndex, side: Side) -> (NodeIndex, Height) {
        let opposite = side.opposite();
        match self.balance(index).lean(side) {
            Lean::Toward => {
                self.set_balance(index, Balance::Balanced);
                (index, Height::Changed)
            }
            Lean::Level => {
                self.set_balance(index, Balance::heavy(opposite));
                (index, Height::Unchanged)
            }
            Lean::Away => {
                let sibling = self.arena.child(index, opposite);
                debug_assert!(!sibling.is_nil(), "avl node leans towards a missing sibling");
                match self.balance(sibling).lean(side) {
                    Lean::Toward => (self.rotate_double(index, opposite), Height::Changed),
                    Lean::Level => {
                        let top = self.rotate_single(
                            index,
                            side,
                            Balance::heavy(opposite),
                            Balance::heavy(side),
                        );
                        (top, Height::Unchanged)
                    }
                    Lean::Away => (
                        self.rotate_single(index, side, Balance::Balanced, Balance::Balanced),
                        Height::Changed,
                    ),
                }
            }
        }
    }

    /// Rotates `index` towards `direction`, then records `lowered` on `index`
    /// and `raised` on the child that took its place.
    fn rotate_single(
        &mut self,
        index: NodeIndex,
        direction: Side,
        lowered: Balance,
        raised: Balance,
    ) -> NodeIndex {
        trace_event!(trace, tree = "avl", ?direction, "single rotation");
        let top = self.arena.rotate(index, direction);
        self.set_balance(index, lowered);
        self.set_balance(top, raised);
        top
    }

    /// Lifts the inner grandchild on the `heavy` side of `index` to the top.
    fn rotate_double(&mut self, index: NodeIndex, heavy: Side) -> NodeIndex {
        trace_event!(trace, tree = "avl", ?heavy, "double rotation");
        let light = heavy.opposite();
        let child = self.arena.child(index, heavy);
        let grandchild = self.arena.child(child, light);
        debug_assert!(!grandchild.is_nil(), "avl double rotation without an inner grandchild");

        let (outer, inner) = match self.balance(grandchild).lean(heavy) {
            Lean::Toward => (Balance::heavy(light), Balance::Balanced),
            Lean::Level => (Balance::Balanced, Balance::Balanced),
            Lean::Away => (Balance::Balanced, Balance::heavy(heavy)),
        };
        self.set_balance(index, outer);
        self.set_balance(child, inner);
        self.set_balance(grandchild, Balance::Balanced);

        let lifted = self.arena.rotate(child, heavy);
        self.arena.set_child(index, heavy, lifted);
        self.arena.rotate(index, light)
    }

    /// Walks up from `index`, whose subtree on `side` changed height, applying
    /// `step` until a subtree reports an unchanged height or the root is done.
    fn retrace<F>(&mut self, mut index: NodeIndex, mut side: Side, step: F)
    where
        F: Fn(&mut Self, NodeIndex, Side) -> (NodeIndex, Height),
    {
        while !index.is_nil() {
            let (top, height) = step(self, index, side);
            let above = self.arena.parent(top);
            self.arena.replace_child(&mut self.root, above, index, top);
            if height == Height::Unchanged || above.is_nil() {
                break;
            }
            side = self.arena.side_of(above, top);
            index = above;
        }
    }
}

// =============================================================================
// Updates
// =============================================================================

impl<K, V, O> AvlTree<K, V, O>
where
    K: Ord + ?Sized,
    O: KeyOwnership<K>,
{
    /// Links a new leaf for `key`, or hands `value` back if the key exists.
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
            .allocate(O::duplicate(key), value, parent, Balance::Balanced);
        if parent.is_nil() {
            self.root = leaf;
        } else {
            self.arena.set_child(parent, side, leaf);
            self.retrace(parent, side, Self::balance_grown);
        }
        Ok(())
    }

    /// Unlinks the entry for `key` if `accept` approves its value.
    ///
    /// A node with two children takes over the entry with the highest key in
    /// its left subtree, and that entry's node is unlinked instead.
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
            let highest = self.arena.extreme(node.left, Side::Right);
            self.arena.swap_entries(target, highest);
            highest
        };

        let node = self.arena.node(removed);
        let child = if node.left.is_nil() { node.right } else { node.left };
        let parent = node.parent;
        let side = if parent.is_nil() {
            Side::Left
        } else {
            self.arena.side_of(parent, removed)
        };
        self.arena.replace_child(&mut self.root, parent, removed, child);
        self.arena.set_parent(child, parent);
        let Node { key, value, .. } = self.arena.free(removed);

        self.retrace(parent, side, Self::balance_shrunk);
        Some((key, value))
    }

    /// Checks subtree heights against each node's recorded balance.
    fn validate_balance(&self) -> Result<(), InvariantViolation> {
        let mut position = 0;
        self.validate_subtree(self.root, &mut position).map(|_| ())
    }

    fn validate_subtree(
        &self,
        index: NodeIndex,
        position: &mut usize,
    ) -> Result<usize, InvariantViolation> {
        let Some(node) = self.arena.get(index) else {
            return Ok(0);
        };
        let left = self.validate_subtree(node.left, position)?;
        let here = *position;
        *position += 1;
        let right = self.validate_subtree(node.right, position)?;

        if left.abs_diff(right) > 1 {
            return Err(InvariantViolation::HeightSkew {
                position: here,
                left,
                right,
            });
        }
        let expected = match left.cmp(&right) {
            Ordering::Greater => Balance::LeftHeavy,
            Ordering::Equal => Balance::Balanced,
            Ordering::Less => Balance::RightHeavy,
        };
        if node.meta != expected {
            return Err(InvariantViolation::BalanceFactorMismatch {
                position: here,
                left,
                right,
            });
        }
        Ok(left.max(right) + 1)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn tree_of(keys: &[i32]) -> AvlTree<i32, i32> {
        keys.iter().map(|&key| (key, key)).collect()
    }

    fn root_key(tree: &AvlTree<i32, i32>) -> Option<i32> {
        tree.arena.get(tree.root).map(|node| node.key)
    }

    #[rstest]
    #[case::left_left(&[3, 2, 1], 2)]
    #[case::right_right(&[1, 2, 3], 2)]
    #[case::left_right(&[3, 1, 2], 2)]
    #[case::right_left(&[1, 3, 2], 2)]
    fn test_insert_rotation_cases(#[case] keys: &[i32], #[case] expected_root: i32) {
        let tree = tree_of(keys);
        assert_eq!(root_key(&tree), Some(expected_root));
        assert_eq!(tree.height(), 2);
        assert_eq!(tree.check_invariants(), Ok(()));
    }

    #[rstest]
    fn test_ascending_insert_builds_perfect_tree() {
        let tree = tree_of(&[1, 2, 3, 4, 5, 6, 7]);
        assert_eq!(root_key(&tree), Some(4));
        assert_eq!(tree.height(), 3);
        assert!(tree.iter().all(|(key, _)| {
            let index = tree.arena.search(tree.root, key);
            tree.arena.node(index).meta == Balance::Balanced
        }));
    }

    #[rstest]
    fn test_erase_two_children_uses_left_subtree_maximum() {
        let mut tree = tree_of(&[50, 30, 70, 20, 40, 60, 80]);
        assert!(tree.erase(&50));
        assert_eq!(root_key(&tree), Some(40));
        assert_eq!(tree.check_invariants(), Ok(()));
    }

    #[rstest]
    fn test_erase_rebalances_with_balanced_sibling() {
        //     2
        //    / \
        //   1   4
        //      / \
        //     3   5
        let mut tree = tree_of(&[2, 1, 4, 3, 5]);
        assert!(tree.erase(&1));
        assert_eq!(root_key(&tree), Some(4));
        assert_eq!(tree.arena.node(tree.root).meta, Balance::LeftHeavy);
        assert_eq!(tree.check_invariants(), Ok(()));
    }

    #[rstest]
    fn test_erase_propagates_shrink_to_root() {
        let mut tree = tree_of(&(1..=31).collect::<Vec<_>>());
        for key in 1..=16 {
            assert!(tree.erase(&key));
            assert_eq!(tree.check_invariants(), Ok(()));
        }
        assert_eq!(tree.keys_to_vec(), (17..=31).collect::<Vec<_>>());
    }

    #[rstest]
    fn test_erase_last_entry_empties_tree() {
        let mut tree = tree_of(&[7]);
        assert!(tree.erase(&7));
        assert!(tree.is_empty());
        assert!(tree.root.is_nil());
        assert_eq!(tree.arena.len(), 0);
    }

    #[rstest]
    fn test_validate_detects_wrong_balance() {
        let mut tree = tree_of(&[2, 1, 3]);
        let root = tree.root;
        tree.arena.node_mut(root).meta = Balance::RightHeavy;
        assert_eq!(
            tree.check_invariants(),
            Err(InvariantViolation::BalanceFactorMismatch {
                position: 1,
                left: 1,
                right: 1
            })
        );
    }

    #[rstest]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "differ in height")]
    fn test_insert_into_corrupted_large_tree_panics() {
        // Too large for the whole-tree validation after each mutation.
        let mut tree = tree_of(&(0..100).collect::<Vec<_>>());
        let leaf = tree.arena.extreme(tree.root, Side::Left);
        let parent = tree.arena.parent(leaf);
        assert!(!tree.arena.child(parent, Side::Right).is_nil());

        tree.arena.node_mut(parent).meta = Balance::LeftHeavy;
        tree.insert(-1, 0);
    }

    #[rstest]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "missing sibling")]
    fn test_erase_from_corrupted_large_tree_panics() {
        let mut tree = tree_of(&(0..100).collect::<Vec<_>>());
        let leaf = tree.arena.extreme(tree.root, Side::Left);
        let parent = tree.arena.parent(leaf);
        let sibling = tree.arena.node(tree.arena.child(parent, Side::Right)).key;
        assert!(tree.erase(&sibling));

        // `parent` now truly leans left; claim the opposite.
        tree.arena.node_mut(parent).meta = Balance::RightHeavy;
        tree.erase(&0);
    }

    #[rstest]
    #[case(Balance::LeftHeavy, Side::Left, Lean::Toward)]
    #[case(Balance::LeftHeavy, Side::Right, Lean::Away)]
    #[case(Balance::Balanced, Side::Right, Lean::Level)]
    #[case(Balance::RightHeavy, Side::Right, Lean::Toward)]
    fn test_lean(#[case] balance: Balance, #[case] side: Side, #[case] expected: Lean) {
        assert_eq!(balance.lean(side), expected);
    }
}
