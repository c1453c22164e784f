//! Key ownership policies.
//!
//! A tree either keeps its own copy of every key ([`Owned`]) or stores the
//! caller's key value bitwise ([`Borrowed`]). The policy is a type parameter,
//! so both modes share the same balancing code and the choice costs nothing
//! at runtime.

use std::borrow::Borrow;

/// Strategy for how a tree acquires and releases the keys it stores.
///
/// The tree calls [`duplicate`](Self::duplicate) exactly once when a key
/// enters it and [`dealloc`](Self::dealloc) exactly once when that key leaves
/// it, whether through an erase, a `clear` or the tree being dropped. Moving
/// an entry between nodes during a two-child deletion is neither.
///
/// # Examples
///
/// ```rust
/// use counterpoise::tree::{AvlTree, Borrowed, Owned};
///
/// // The tree allocates its own `String` for every `&str` it is given.
/// let mut owned: AvlTree<str, i32, Owned> = AvlTree::new();
/// owned.insert("alpha", 1);
///
/// // The tree keeps the caller's `&'static str` as-is.
/// let mut borrowed: AvlTree<&'static str, i32, Borrowed> = AvlTree::new();
/// borrowed.insert("alpha", 1);
///
/// assert!(owned.exists("alpha"));
/// assert!(borrowed.exists(&"alpha"));
/// ```
pub trait KeyOwnership<K: ?Sized> {
    /// The representation held inside a node.
    type Stored: Borrow<K>;

    /// Produces the stored form of a key being inserted.
    fn duplicate(key: &K) -> Self::Stored;

    /// Releases a stored key that is leaving the tree.
    #[inline]
    fn dealloc(key: Self::Stored) {
        drop(key);
    }
}

/// The tree owns an independent copy of each key, made with [`ToOwned`].
///
/// This is the default policy. For `K = str` the tree stores `String`s; for
/// `Clone` keys it stores clones.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub struct Owned;

impl<K: ToOwned + ?Sized> KeyOwnership<K> for Owned {
    type Stored = K::Owned;

    #[inline]
    fn duplicate(key: &K) -> Self::Stored {
        key.to_owned()
    }
}

/// The tree stores the caller's key value bitwise and never allocates for it.
///
/// Intended for references and small scalars. The borrow checker ties the
/// tree's lifetime to any referenced key data.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub struct Borrowed;

impl<K: Copy> KeyOwnership<K> for Borrowed {
    type Stored = K;

    #[inline]
    fn duplicate(key: &K) -> Self::Stored {
        *key
    }
}
