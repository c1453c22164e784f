//! Arena-backed node storage shared by the balancing engines.
//!
//! Every tree owns one [`Arena`]: a [`Slab`] of [`Node`]s addressed through
//! [`NodeIndex`] handles. Child links carry the ownership of a subtree, the
//! parent link is a plain back-reference used by rebalancing and splicing.
//! Absent links hold [`NodeIndex::NIL`], which the red-black engine treats as
//! its black sentinel.

use crate::error::InvariantViolation;
use slab::Slab;
use smallvec::SmallVec;
use std::borrow::Borrow;
use std::cmp::Ordering;

/// Inline capacity of the traversal stacks used across the crate.
///
/// Large enough that trees with a few billion entries never spill to the heap.
pub(crate) const STACK_INLINE_CAPACITY: usize = 48;

// =============================================================================
// Handles
// =============================================================================

/// Handle of a node inside an [`Arena`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub(crate) struct NodeIndex(usize);

impl NodeIndex {
    /// The absent link. Never allocated, so it can never be freed or recoloured.
    ///
    /// Unlike a stored self-looping sentinel node, `NIL` has no links to
    /// follow: callers check `is_nil` (or use `Arena::get`) before reading
    /// through it, and the red-black engine reads its colour as black.
    pub(crate) const NIL: Self = Self(usize::MAX);

    #[inline]
    pub(crate) const fn is_nil(self) -> bool {
        self.0 == usize::MAX
    }
}

/// Which child link of a node.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub(crate) enum Side {
    Left,
    Right,
}

impl Side {
    #[inline]
    pub(crate) const fn opposite(self) -> Self {
        match self {
            Self::Left => Self::Right,
            Self::Right => Self::Left,
        }
    }
}

// =============================================================================
// Node Definition
// =============================================================================

/// A tree node. `S` is the stored key, `M` the balance metadata of the engine.
pub(crate) struct Node<S, V, M> {
    pub(crate) key: S,
    pub(crate) value: V,
    pub(crate) left: NodeIndex,
    pub(crate) right: NodeIndex,
    pub(crate) parent: NodeIndex,
    pub(crate) meta: M,
}

impl<S, V, M> Node<S, V, M> {
    /// Creates a leaf hanging below `parent`.
    const fn leaf(key: S, value: V, parent: NodeIndex, meta: M) -> Self {
        Self {
            key,
            value,
            left: NodeIndex::NIL,
            right: NodeIndex::NIL,
            parent,
            meta,
        }
    }

    #[inline]
    pub(crate) const fn child(&self, side: Side) -> NodeIndex {
        match side {
            Side::Left => self.left,
            Side::Right => self.right,
        }
    }

    #[inline]
    fn set_child(&mut self, side: Side, child: NodeIndex) {
        match side {
            Side::Left => self.left = child,
            Side::Right => self.right = child,
        }
    }
}

// =============================================================================
// Arena Definition
// =============================================================================

/// Slab of nodes belonging to exactly one tree.
pub(crate) struct Arena<S, V, M> {
    nodes: Slab<Node<S, V, M>>,
}

impl<S, V, M> Arena<S, V, M> {
    pub(crate) fn new() -> Self {
        Self { nodes: Slab::new() }
    }

    /// Number of live nodes.
    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Number of node slots currently reserved, live or vacant.
    #[inline]
    pub(crate) fn capacity(&self) -> usize {
        self.nodes.capacity()
    }

    /// Stores a new leaf and returns its handle.
    pub(crate) fn allocate(&mut self, key: S, value: V, parent: NodeIndex, meta: M) -> NodeIndex {
        NodeIndex(self.nodes.insert(Node::leaf(key, value, parent, meta)))
    }

    /// Takes a node out of the arena. Its links are left for the caller to repair.
    pub(crate) fn free(&mut self, index: NodeIndex) -> Node<S, V, M> {
        self.nodes.remove(index.0)
    }

    /// Returns the node behind `index`, or `None` for `NIL`.
    #[inline]
    pub(crate) fn get(&self, index: NodeIndex) -> Option<&Node<S, V, M>> {
        self.nodes.get(index.0)
    }

    /// Returns the live node behind `index`. Panics on `NIL` or a freed handle.
    #[inline]
    pub(crate) fn node(&self, index: NodeIndex) -> &Node<S, V, M> {
        &self.nodes[index.0]
    }

    #[inline]
    pub(crate) fn node_mut(&mut self, index: NodeIndex) -> &mut Node<S, V, M> {
        &mut self.nodes[index.0]
    }

    #[inline]
    pub(crate) fn child(&self, index: NodeIndex, side: Side) -> NodeIndex {
        self.node(index).child(side)
    }

    /// Rewrites one child link of `index`. The child's parent link is untouched.
    #[inline]
    pub(crate) fn set_child(&mut self, index: NodeIndex, side: Side, child: NodeIndex) {
        self.node_mut(index).set_child(side, child);
    }

    #[inline]
    pub(crate) fn parent(&self, index: NodeIndex) -> NodeIndex {
        self.node(index).parent
    }

    /// Points `index` back at `parent`; a no-op for `NIL`.
    #[inline]
    pub(crate) fn set_parent(&mut self, index: NodeIndex, parent: NodeIndex) {
        if let Some(node) = self.nodes.get_mut(index.0) {
            node.parent = parent;
        }
    }

    /// Which side of `parent` holds `child`.
    #[inline]
    pub(crate) fn side_of(&self, parent: NodeIndex, child: NodeIndex) -> Side {
        if self.node(parent).left == child {
            Side::Left
        } else {
            Side::Right
        }
    }

    /// Rotates the subtree rooted at `index` towards `direction` and returns
    /// the new subtree root.
    ///
    /// The three parent links inside the rotated section are rewired. The link
    /// that referenced `index` from above (a parent's child slot or the tree
    /// root) is left to the caller.
    pub(crate) fn rotate(&mut self, index: NodeIndex, direction: Side) -> NodeIndex {
        let rising = direction.opposite();
        let pivot = self.child(index, rising);
        debug_assert!(!pivot.is_nil(), "rotation needs a child on the rising side");
        let inner = self.child(pivot, direction);
        let parent = self.parent(index);

        self.set_child(index, rising, inner);
        self.set_parent(inner, index);
        self.set_child(pivot, direction, index);
        self.node_mut(pivot).parent = parent;
        self.node_mut(index).parent = pivot;
        pivot
    }

    /// Makes `new` take the slot that `old` occupies below `parent`, or the
    /// tree root when `parent` is `NIL`. The parent link of `new` is untouched.
    pub(crate) fn replace_child(
        &mut self,
        root: &mut NodeIndex,
        parent: NodeIndex,
        old: NodeIndex,
        new: NodeIndex,
    ) {
        if parent.is_nil() {
            *root = new;
        } else {
            let side = self.side_of(parent, old);
            self.set_child(parent, side, new);
        }
    }

    /// Exchanges the key and value of two distinct live nodes.
    pub(crate) fn swap_entries(&mut self, first: NodeIndex, second: NodeIndex) {
        debug_assert_ne!(first, second);
        if let Some((first, second)) = self.nodes.get2_mut(first.0, second.0) {
            std::mem::swap(&mut first.key, &mut second.key);
            std::mem::swap(&mut first.value, &mut second.value);
        }
    }

    /// Binary search from `root`; returns `NIL` when the key is absent.
    pub(crate) fn search<K>(&self, root: NodeIndex, key: &K) -> NodeIndex
    where
        S: Borrow<K>,
        K: Ord + ?Sized,
    {
        let mut current = root;
        while let Some(node) = self.get(current) {
            current = match key.cmp(node.key.borrow()) {
                Ordering::Less => node.left,
                Ordering::Greater => node.right,
                Ordering::Equal => return current,
            };
        }
        NodeIndex::NIL
    }

    /// The outermost node on `side` of the subtree at `root`.
    pub(crate) fn extreme(&self, root: NodeIndex, side: Side) -> NodeIndex {
        let mut current = root;
        while let Some(node) = self.get(current) {
            let next = node.child(side);
            if next.is_nil() {
                return current;
            }
            current = next;
        }
        NodeIndex::NIL
    }

    /// Number of nodes on the longest root-to-leaf path.
    pub(crate) fn height(&self, root: NodeIndex) -> usize {
        let mut deepest = 0;
        let mut pending: SmallVec<[(NodeIndex, usize); STACK_INLINE_CAPACITY]> = SmallVec::new();
        if !root.is_nil() {
            pending.push((root, 1));
        }
        while let Some((index, depth)) = pending.pop() {
            deepest = deepest.max(depth);
            let node = self.node(index);
            for child in [node.left, node.right] {
                if !child.is_nil() {
                    pending.push((child, depth + 1));
                }
            }
        }
        deepest
    }

    /// Destroys the subtree at `root` in pre-order, handing each key to
    /// `release` before its children are visited. Returns the number of nodes
    /// destroyed.
    pub(crate) fn release_all<F>(&mut self, root: NodeIndex, mut release: F) -> usize
    where
        F: FnMut(S),
    {
        let mut released = 0;
        let mut pending: SmallVec<[NodeIndex; STACK_INLINE_CAPACITY]> = SmallVec::new();
        if !root.is_nil() {
            pending.push(root);
        }
        while let Some(index) = pending.pop() {
            let Node {
                key, left, right, ..
            } = self.nodes.remove(index.0);
            release(key);
            released += 1;
            for child in [right, left] {
                if !child.is_nil() {
                    pending.push(child);
                }
            }
        }
        debug_assert!(self.nodes.is_empty(), "nodes unreachable from the root");
        self.nodes.clear();
        released
    }
}

impl<S, V, M> Arena<S, V, M> {
    /// Checks the invariants every engine shares: strictly increasing keys in
    /// order, parent links that mirror child links, a parentless root, and a
    /// recorded size equal to both the reachable and the allocated node count.
    pub(crate) fn validate_structure<K>(
        &self,
        root: NodeIndex,
        recorded: usize,
    ) -> Result<(), InvariantViolation>
    where
        S: Borrow<K>,
        K: Ord + ?Sized,
    {
        let mut position = 0;
        let mut previous: Option<&K> = None;
        let mut pending: SmallVec<[NodeIndex; STACK_INLINE_CAPACITY]> = SmallVec::new();
        let mut current = root;

        loop {
            while !current.is_nil() {
                pending.push(current);
                current = self.node(current).left;
            }
            let Some(index) = pending.pop() else {
                break;
            };
            if position > self.len() {
                // A cycle; stop before looping forever.
                return Err(InvariantViolation::SizeMismatch {
                    recorded,
                    reachable: position,
                });
            }

            let node = self.node(index);
            let key: &K = node.key.borrow();
            if previous.is_some_and(|previous| previous >= key) {
                return Err(InvariantViolation::OrderViolated { position });
            }
            let parent_consistent = if index == root {
                node.parent.is_nil()
            } else {
                !node.parent.is_nil() && self.node(node.parent).child(self.side_of(node.parent, index)) == index
            };
            let children_consistent = [node.left, node.right]
                .into_iter()
                .filter(|child| !child.is_nil())
                .all(|child| self.node(child).parent == index);
            if !parent_consistent || !children_consistent {
                return Err(InvariantViolation::ParentLinkBroken { position });
            }

            previous = Some(key);
            position += 1;
            current = node.right;
        }

        if position != recorded || self.len() != recorded {
            return Err(InvariantViolation::SizeMismatch {
                recorded,
                reachable: position,
            });
        }
        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================
