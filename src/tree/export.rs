//! In-order traversal and export into ordered sequences.
//!
//! The walk keeps an explicit stack instead of recursing, and touches nothing
//! but each node's key, value and child links. Exports go through
//! [`SequenceBuilder`], so any growable sequence can receive a tree's keys or
//! values in ascending key order.

use super::node::{Arena, Node, NodeIndex, STACK_INLINE_CAPACITY};
use smallvec::SmallVec;
use std::borrow::Borrow;
use std::collections::VecDeque;
use std::iter::FusedIterator;
use std::marker::PhantomData;

// =============================================================================
// Sequence Builder
// =============================================================================

/// An ordered sequence that can be grown one item at a time.
///
/// # Examples
///
/// ```rust
/// use counterpoise::tree::{AvlTree, SequenceBuilder};
///
/// struct Joined(String);
///
/// impl SequenceBuilder<String> for Joined {
///     fn reserve(&mut self, additional: usize) {
///         self.0.reserve(additional * 4);
///     }
///
///     fn append(&mut self, item: String) {
///         if !self.0.is_empty() {
///             self.0.push(',');
///         }
///         self.0.push_str(&item);
///     }
/// }
///
/// let mut tree: AvlTree<str, u8> = AvlTree::new();
/// tree.insert("pear", 1);
/// tree.insert("apple", 2);
///
/// let mut joined = Joined(String::new());
/// tree.export_keys(&mut joined);
/// assert_eq!(joined.0, "apple,pear");
/// ```
pub trait SequenceBuilder<T> {
    /// Hints that `additional` more items are about to be appended.
    fn reserve(&mut self, additional: usize);

    /// Appends one item at the end.
    fn append(&mut self, item: T);
}

impl<T> SequenceBuilder<T> for Vec<T> {
    #[inline]
    fn reserve(&mut self, additional: usize) {
        Self::reserve(self, additional);
    }

    #[inline]
    fn append(&mut self, item: T) {
        self.push(item);
    }
}

impl<T> SequenceBuilder<T> for VecDeque<T> {
    #[inline]
    fn reserve(&mut self, additional: usize) {
        Self::reserve(self, additional);
    }

    #[inline]
    fn append(&mut self, item: T) {
        self.push_back(item);
    }
}

impl<A: smallvec::Array> SequenceBuilder<A::Item> for SmallVec<A> {
    #[inline]
    fn reserve(&mut self, additional: usize) {
        Self::reserve(self, additional);
    }

    #[inline]
    fn append(&mut self, item: A::Item) {
        self.push(item);
    }
}

// =============================================================================
// In-order Walk
// =============================================================================

/// Walks the nodes of one tree in ascending key order.
pub(crate) struct InOrder<'a, S, V, M> {
    arena: &'a Arena<S, V, M>,
    pending: SmallVec<[NodeIndex; STACK_INLINE_CAPACITY]>,
    remaining: usize,
}

impl<'a, S, V, M> InOrder<'a, S, V, M> {
    pub(crate) fn new(arena: &'a Arena<S, V, M>, root: NodeIndex, length: usize) -> Self {
        let mut walk = Self {
            arena,
            pending: SmallVec::new(),
            remaining: length,
        };
        walk.descend(root);
        walk
    }

    /// Pushes `index` and its chain of left descendants.
    fn descend(&mut self, mut index: NodeIndex) {
        while let Some(node) = self.arena.get(index) {
            self.pending.push(index);
            index = node.left;
        }
    }
}

impl<'a, S, V, M> Iterator for InOrder<'a, S, V, M> {
    type Item = &'a Node<S, V, M>;

    fn next(&mut self) -> Option<Self::Item> {
        let index = self.pending.pop()?;
        let arena = self.arena;
        let node = arena.node(index);
        self.descend(node.right);
        self.remaining = self.remaining.saturating_sub(1);
        Some(node)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

/// Appends clones of the stored keys, pre-sizing the builder first.
pub(crate) fn export_keys<S, V, M, B>(nodes: InOrder<'_, S, V, M>, builder: &mut B)
where
    S: Clone,
    B: SequenceBuilder<S> + ?Sized,
{
    builder.reserve(nodes.remaining);
    for node in nodes {
        builder.append(node.key.clone());
    }
}

/// Appends each value converted into the builder's item type.
pub(crate) fn export_values<S, V, M, T, B>(nodes: InOrder<'_, S, V, M>, builder: &mut B)
where
    V: Clone + Into<T>,
    B: SequenceBuilder<T> + ?Sized,
{
    builder.reserve(nodes.remaining);
    for node in nodes {
        builder.append(node.value.clone().into());
    }
}

// =============================================================================
// Iterator Implementation
// =============================================================================

/// An iterator over the entries of a tree in ascending key order.
///
/// Created by the `iter` method of [`AvlTree`](super::AvlTree) and
/// [`RedBlackTree`](super::RedBlackTree).
pub struct Iter<'a, K: ?Sized, V, S, M> {
    nodes: InOrder<'a, S, V, M>,
    key: PhantomData<fn(&K)>,
}

impl<'a, K: ?Sized, V, S, M> Iter<'a, K, V, S, M> {
    pub(crate) const fn new(nodes: InOrder<'a, S, V, M>) -> Self {
        Self {
            nodes,
            key: PhantomData,
        }
    }
}

impl<'a, K, V, S, M> Iterator for Iter<'a, K, V, S, M>
where
    K: ?Sized + 'a,
    S: Borrow<K>,
{
    type Item = (&'a K, &'a V);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.nodes
            .next()
            .map(|node| (node.key.borrow(), &node.value))
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.nodes.size_hint()
    }
}

impl<'a, K, V, S, M> ExactSizeIterator for Iter<'a, K, V, S, M>
where
    K: ?Sized + 'a,
    S: Borrow<K>,
{
    #[inline]
    fn len(&self) -> usize {
        self.nodes.remaining
    }
}

impl<'a, K, V, S, M> FusedIterator for Iter<'a, K, V, S, M>
where
    K: ?Sized + 'a,
    S: Borrow<K>,
{
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::node::Side;
    use rstest::rstest;

    /// Right-leaning chain 1 -> 2 -> 3 -> 4, the worst shape for a left-spine stack.
    fn chain() -> (Arena<u32, char, ()>, NodeIndex) {
        let mut arena = Arena::new();
        let root = arena.allocate(1, 'a', NodeIndex::NIL, ());
        let mut parent = root;
        for (key, value) in [(2, 'b'), (3, 'c'), (4, 'd')] {
            let child = arena.allocate(key, value, parent, ());
            arena.set_child(parent, Side::Right, child);
            parent = child;
        }
        (arena, root)
    }

    #[rstest]
    fn test_in_order_walk_on_chain() {
        let (arena, root) = chain();
        let keys: Vec<u32> = InOrder::new(&arena, root, 4).map(|node| node.key).collect();
        assert_eq!(keys, vec![1, 2, 3, 4]);
    }

    #[rstest]
    fn test_in_order_walk_on_empty() {
        let arena: Arena<u32, char, ()> = Arena::new();
        assert_eq!(InOrder::new(&arena, NodeIndex::NIL, 0).count(), 0);
    }

    #[rstest]
    fn test_iter_reports_exact_length() {
        let (arena, root) = chain();
        let mut iter: Iter<'_, u32, char, u32, ()> = Iter::new(InOrder::new(&arena, root, 4));
        assert_eq!(iter.len(), 4);
        iter.next();
        assert_eq!(iter.len(), 3);
        assert_eq!(iter.next(), Some((&2, &'b')));
    }

    #[rstest]
    fn test_export_into_vec_deque() {
        let (arena, root) = chain();
        let mut keys = VecDeque::new();
        export_keys(InOrder::new(&arena, root, 4), &mut keys);
        assert_eq!(keys, VecDeque::from(vec![1, 2, 3, 4]));
    }

    #[rstest]
    fn test_export_values_converts() {
        let (arena, root) = chain();
        let mut values: SmallVec<[u32; 4]> = SmallVec::new();
        export_values(InOrder::new(&arena, root, 4), &mut values);
        assert_eq!(values.as_slice(), &[97, 98, 99, 100]);
    }
}
