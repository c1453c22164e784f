//! Self-balancing ordered maps.
//!
//! This module provides two ordered associative containers with the same
//! public contract and different balancing disciplines:
//!
//! - [`AvlTree`]: height-balanced. Sibling subtrees never differ in height by
//!   more than one, which keeps lookups on the shortest possible paths.
//! - [`RedBlackTree`]: colour-balanced. A looser shape with fewer rotations per
//!   update, repaired by bounded fix-up walks.
//!
//! Both store their nodes in an arena addressed by index, keep a parent link
//! per node for rebalancing, reject duplicate keys, and maintain their size
//! incrementally.
//!
//! # Operations
//!
//! | Operation          | Result                     | Complexity |
//! |--------------------|----------------------------|------------|
//! | `insert`           | `false` if the key exists  | O(log N)   |
//! | `erase`            | `false` if the key is absent | O(log N) |
//! | `find`             | value or caller default    | O(log N)   |
//! | `exists`           | `bool`                     | O(log N)   |
//! | `replace`          | `false` if the key is absent | O(log N) |
//! | `len`              | entry count                | O(1)       |
//! | `clear`            | destroys every node        | O(N)       |
//! | `iter`/`export_*`  | ascending key order        | O(N)       |
//!
//! # Key Ownership
//!
//! The third type parameter selects a [`KeyOwnership`] policy. With [`Owned`]
//! (the default) the tree keeps its own copy of each key; with [`Borrowed`]
//! it stores the caller's key value as-is.
//!
//! # Examples
//!
//! ```rust
//! use counterpoise::tree::{AvlTree, RedBlackTree};
//!
//! let mut avl: AvlTree<i32, &str> = AvlTree::new();
//! let mut red_black: RedBlackTree<i32, &str> = RedBlackTree::new();
//!
//! for (key, value) in [(2, "two"), (1, "one"), (3, "three")] {
//!     assert!(avl.insert(key, value));
//!     assert!(red_black.insert(key, value));
//! }
//!
//! assert!(!avl.insert(2, "again"));
//! assert_eq!(avl.keys_to_vec(), vec![1, 2, 3]);
//! assert_eq!(red_black.find(&4, "missing"), "missing");
//! ```

/// Emits a `tracing` event when the `tracing` feature is enabled.
macro_rules! trace_event {
    ($level:ident, $($argument:tt)*) => {
        #[cfg(feature = "tracing")]
        ::tracing::$level!($($argument)*);
    };
}

/// Largest tree that debug builds fully re-validate after every mutation.
#[cfg(debug_assertions)]
const DEBUG_VALIDATION_LIMIT: usize = 64;

/// Implements the API shared by every balancing engine.
///
/// The engine type must have `arena`, `root` and `size` fields and provide
/// `insert_entry`, `remove_entry` and `validate_balance`.
macro_rules! ordered_tree_api {
    ($tree:ident, $meta:ty, $label:literal) => {
        ::paste::paste! {
            impl<K, V, O> $tree<K, V, O>
            where
                K: ?Sized,
                O: $crate::tree::KeyOwnership<K>,
            {
                /// Creates an empty tree.
                #[must_use]
                pub fn new() -> Self {
                    Self {
                        arena: $crate::tree::node::Arena::new(),
                        root: $crate::tree::node::NodeIndex::NIL,
                        size: 0,
                        ownership: ::std::marker::PhantomData,
                    }
                }

                /// Returns the number of entries.
                ///
                /// # Complexity
                ///
                /// O(1)
                #[inline]
                #[must_use]
                pub const fn len(&self) -> usize {
                    self.size
                }

                /// Returns `true` if the tree holds no entries.
                #[inline]
                #[must_use]
                pub const fn is_empty(&self) -> bool {
                    self.size == 0
                }

                /// Destroys every node and resets the size to zero.
                ///
                /// Each node's key is released through the ownership policy
                /// before the node's children are destroyed. Values are dropped.
                pub fn clear(&mut self) {
                    trace_event!(debug, entries = self.size, tree = $label, "clearing tree");
                    self.arena
                        .release_all(self.root, <O as $crate::tree::KeyOwnership<K>>::dealloc);
                    self.root = $crate::tree::node::NodeIndex::NIL;
                    self.size = 0;
                }

                /// Returns the number of nodes on the longest root-to-leaf path.
                #[must_use]
                pub fn height(&self) -> usize {
                    self.arena.height(self.root)
                }

                /// Returns the bytes held by the tree header and its node storage.
                ///
                /// Storage reserved for freed nodes is included; heap data owned
                /// by keys or values is not.
                #[must_use]
                pub fn memory_usage(&self) -> usize {
                    ::std::mem::size_of::<Self>()
                        + self.arena.capacity()
                            * ::std::mem::size_of::<
                                $crate::tree::node::Node<O::Stored, V, $meta>,
                            >()
                }

                /// Returns the entry with the lowest key.
                #[must_use]
                pub fn first(&self) -> Option<(&K, &V)> {
                    self.entry_at(self.arena.extreme(self.root, $crate::tree::node::Side::Left))
                }

                /// Returns the entry with the highest key.
                #[must_use]
                pub fn last(&self) -> Option<(&K, &V)> {
                    self.entry_at(self.arena.extreme(self.root, $crate::tree::node::Side::Right))
                }

                fn entry_at(&self, index: $crate::tree::node::NodeIndex) -> Option<(&K, &V)> {
                    self.arena
                        .get(index)
                        .map(|node| {
                            let key = <O::Stored as ::std::borrow::Borrow<K>>::borrow(&node.key);
                            (key, &node.value)
                        })
                }

                fn nodes(&self) -> $crate::tree::export::InOrder<'_, O::Stored, V, $meta> {
                    $crate::tree::export::InOrder::new(&self.arena, self.root, self.size)
                }

                /// Returns an iterator over entries in ascending key order.
                #[must_use]
                pub fn iter(&self) -> $crate::tree::Iter<'_, K, V, O::Stored, $meta> {
                    $crate::tree::Iter::new(self.nodes())
                }

                /// Returns an iterator over keys in ascending order.
                pub fn keys(&self) -> impl Iterator<Item = &K> {
                    self.iter().map(|(key, _)| key)
                }

                /// Returns an iterator over values in ascending key order.
                pub fn values(&self) -> impl Iterator<Item = &V> {
                    self.iter().map(|(_, value)| value)
                }

                /// Appends a copy of every stored key to `builder`, in order.
                ///
                /// The builder is asked to reserve room for [`len`](Self::len)
                /// items first.
                pub fn export_keys<B>(&self, builder: &mut B)
                where
                    O::Stored: Clone,
                    B: $crate::tree::SequenceBuilder<O::Stored> + ?Sized,
                {
                    $crate::tree::export::export_keys(self.nodes(), builder);
                }

                /// Appends every value, converted to `T`, to `builder` in key order.
                pub fn export_values_as<T, B>(&self, builder: &mut B)
                where
                    V: Clone + Into<T>,
                    B: $crate::tree::SequenceBuilder<T> + ?Sized,
                {
                    $crate::tree::export::export_values(self.nodes(), builder);
                }

                /// Collects the stored keys into a vector, in order.
                #[must_use]
                pub fn keys_to_vec(&self) -> Vec<O::Stored>
                where
                    O::Stored: Clone,
                {
                    let mut keys = Vec::new();
                    self.export_keys(&mut keys);
                    keys
                }

                /// Collects the values into a vector, in key order.
                #[must_use]
                pub fn values_to_vec(&self) -> Vec<V>
                where
                    V: Clone,
                {
                    let mut values = Vec::new();
                    self.export_values_as::<V, _>(&mut values);
                    values
                }
            }

            impl<K, V, O> $tree<K, V, O>
            where
                K: Ord + ?Sized,
                O: $crate::tree::KeyOwnership<K>,
            {
                /// Inserts a new entry.
                ///
                /// Returns `false`, leaving the tree untouched, if the key is
                /// already present. The stored key is produced by the ownership
                /// policy from `key.borrow()`.
                ///
                /// # Complexity
                ///
                /// O(log N)
                pub fn insert<Q>(&mut self, key: Q, value: V) -> bool
                where
                    Q: ::std::borrow::Borrow<K>,
                {
                    self.try_insert(key, value).is_ok()
                }

                /// Inserts a new entry, handing the value back if the key exists.
                ///
                /// # Errors
                ///
                /// Returns [`InsertError`]($crate::error::InsertError) carrying
                /// `value` when the key is already present.
                pub fn try_insert<Q>(
                    &mut self,
                    key: Q,
                    value: V,
                ) -> Result<(), $crate::error::InsertError<V>>
                where
                    Q: ::std::borrow::Borrow<K>,
                {
                    self.insert_entry(key.borrow(), value)
                        .map_err($crate::error::InsertError::new)?;
                    self.size += 1;
                    self.debug_validate();
                    Ok(())
                }

                /// Removes the entry for `key`. Returns `false` if it is absent.
                ///
                /// # Complexity
                ///
                /// O(log N)
                pub fn erase(&mut self, key: &K) -> bool {
                    self.remove(key).is_some()
                }

                /// Removes the entry for `key` only if its value equals `value`.
                pub fn erase_matching(&mut self, key: &K, value: &V) -> bool
                where
                    V: PartialEq,
                {
                    self.take(key, |stored| stored == value).is_some()
                }

                /// Removes the entry for `key` and returns its value.
                pub fn remove(&mut self, key: &K) -> Option<V> {
                    self.take(key, |_| true)
                }

                fn take<F>(&mut self, key: &K, accept: F) -> Option<V>
                where
                    F: Fn(&V) -> bool,
                {
                    let (stored, value) = self.remove_entry(key, &accept)?;
                    self.size -= 1;
                    <O as $crate::tree::KeyOwnership<K>>::dealloc(stored);
                    self.debug_validate();
                    Some(value)
                }

                /// Returns a reference to the value stored under `key`.
                #[must_use]
                pub fn get(&self, key: &K) -> Option<&V> {
                    self.arena
                        .get(self.arena.search(self.root, key))
                        .map(|node| &node.value)
                }

                /// Returns a copy of the value stored under `key`, or `default`
                /// when the key is absent.
                #[must_use]
                pub fn find(&self, key: &K, default: V) -> V
                where
                    V: Clone,
                {
                    self.get(key).cloned().unwrap_or(default)
                }

                /// Returns `true` if `key` is present. Never restructures the tree.
                #[must_use]
                pub fn exists(&self, key: &K) -> bool {
                    !self.arena.search(self.root, key).is_nil()
                }

                /// Overwrites the value stored under `key`.
                ///
                /// Returns `false` if the key is absent. The tree's shape and
                /// balance metadata are untouched.
                pub fn replace(&mut self, key: &K, value: V) -> bool {
                    let index = self.arena.search(self.root, key);
                    if index.is_nil() {
                        return false;
                    }
                    self.arena.node_mut(index).value = value;
                    true
                }

                /// Verifies every structural invariant of the tree.
                ///
                /// # Errors
                ///
                /// Returns the first [`InvariantViolation`]($crate::error::InvariantViolation)
                /// found.
                pub fn check_invariants(&self) -> Result<(), $crate::error::InvariantViolation> {
                    self.arena.validate_structure::<K>(self.root, self.size)?;
                    self.validate_balance()
                }

                #[inline]
                fn debug_validate(&self) {
                    #[cfg(debug_assertions)]
                    if self.size <= $crate::tree::DEBUG_VALIDATION_LIMIT
                        && let Err(violation) = self.check_invariants()
                    {
                        panic!(concat!($label, " invariant broken: {}"), violation);
                    }
                }
            }

            impl<K, V, O> Default for $tree<K, V, O>
            where
                K: ?Sized,
                O: $crate::tree::KeyOwnership<K>,
            {
                fn default() -> Self {
                    Self::new()
                }
            }

            impl<K, V, O> Drop for $tree<K, V, O>
            where
                K: ?Sized,
                O: $crate::tree::KeyOwnership<K>,
            {
                fn drop(&mut self) {
                    self.clear();
                }
            }

            impl<K, V, O> ::std::fmt::Debug for $tree<K, V, O>
            where
                K: ::std::fmt::Debug + ?Sized,
                V: ::std::fmt::Debug,
                O: $crate::tree::KeyOwnership<K>,
            {
                fn fmt(&self, formatter: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                    formatter.debug_map().entries(self.iter()).finish()
                }
            }

            impl<K, V, O> PartialEq for $tree<K, V, O>
            where
                K: PartialEq + ?Sized,
                V: PartialEq,
                O: $crate::tree::KeyOwnership<K>,
            {
                fn eq(&self, other: &Self) -> bool {
                    self.len() == other.len() && self.iter().eq(other.iter())
                }
            }

            impl<K, V, O> Eq for $tree<K, V, O>
            where
                K: Eq + ?Sized,
                V: Eq,
                O: $crate::tree::KeyOwnership<K>,
            {
            }

            /// Inserts every pair; a pair whose key is already present is skipped.
            impl<K, V, O, Q> Extend<(Q, V)> for $tree<K, V, O>
            where
                K: Ord + ?Sized,
                O: $crate::tree::KeyOwnership<K>,
                Q: ::std::borrow::Borrow<K>,
            {
                fn extend<I: IntoIterator<Item = (Q, V)>>(&mut self, iter: I) {
                    for (key, value) in iter {
                        self.insert(key, value);
                    }
                }
            }

            /// Builds a tree from pairs; the first occurrence of a key wins.
            impl<K, V, O, Q> FromIterator<(Q, V)> for $tree<K, V, O>
            where
                K: Ord + ?Sized,
                O: $crate::tree::KeyOwnership<K>,
                Q: ::std::borrow::Borrow<K>,
            {
                fn from_iter<I: IntoIterator<Item = (Q, V)>>(iter: I) -> Self {
                    let mut tree = Self::new();
                    tree.extend(iter);
                    tree
                }
            }

            impl<'a, K, V, O> IntoIterator for &'a $tree<K, V, O>
            where
                K: ?Sized + 'a,
                O: $crate::tree::KeyOwnership<K>,
            {
                type Item = (&'a K, &'a V);
                type IntoIter = $crate::tree::Iter<'a, K, V, O::Stored, $meta>;

                fn into_iter(self) -> Self::IntoIter {
                    self.iter()
                }
            }

            #[cfg(feature = "serde")]
            impl<K, V, O> ::serde::Serialize for $tree<K, V, O>
            where
                K: ::serde::Serialize + ?Sized,
                V: ::serde::Serialize,
                O: $crate::tree::KeyOwnership<K>,
            {
                fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
                where
                    S: ::serde::Serializer,
                {
                    use ::serde::ser::SerializeMap;
                    let mut map = serializer.serialize_map(Some(self.len()))?;
                    for (key, value) in self {
                        map.serialize_entry(key, value)?;
                    }
                    map.end()
                }
            }

            #[cfg(feature = "serde")]
            struct [<$tree Visitor>]<K: ?Sized, V, O> {
                marker: ::std::marker::PhantomData<(fn(&K), V, O)>,
            }

            #[cfg(feature = "serde")]
            impl<'de, K, V, O> ::serde::de::Visitor<'de> for [<$tree Visitor>]<K, V, O>
            where
                K: Ord + ?Sized,
                V: ::serde::Deserialize<'de>,
                O: $crate::tree::KeyOwnership<K>,
                O::Stored: ::serde::Deserialize<'de>,
            {
                type Value = $tree<K, V, O>;

                fn expecting(&self, formatter: &mut ::std::fmt::Formatter) -> ::std::fmt::Result {
                    formatter.write_str("a map with unique keys")
                }

                fn visit_map<A>(self, mut access: A) -> Result<Self::Value, A::Error>
                where
                    A: ::serde::de::MapAccess<'de>,
                {
                    let mut tree = $tree::new();
                    while let Some((key, value)) = access.next_entry::<O::Stored, V>()? {
                        if tree.try_insert(key, value).is_err() {
                            return Err(::serde::de::Error::custom("duplicate key in map"));
                        }
                    }
                    Ok(tree)
                }
            }

            #[cfg(feature = "serde")]
            impl<'de, K, V, O> ::serde::Deserialize<'de> for $tree<K, V, O>
            where
                K: Ord + ?Sized,
                V: ::serde::Deserialize<'de>,
                O: $crate::tree::KeyOwnership<K>,
                O::Stored: ::serde::Deserialize<'de>,
            {
                fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
                where
                    D: ::serde::Deserializer<'de>,
                {
                    deserializer.deserialize_map([<$tree Visitor>] {
                        marker: ::std::marker::PhantomData,
                    })
                }
            }
        }
    };
}

mod export;
mod node;
mod ownership;

#[cfg(feature = "avl")]
mod avl;
#[cfg(feature = "red_black")]
mod red_black;

#[cfg(feature = "avl")]
pub use avl::{AvlTree, Balance};
pub use export::{Iter, SequenceBuilder};
pub use ownership::{Borrowed, KeyOwnership, Owned};
#[cfg(feature = "red_black")]
pub use red_black::{Color, RedBlackTree};

// =============================================================================
// Tests
// =============================================================================
