//! # counterpoise
//!
//! Self-balancing ordered maps with a shared node model and an in-order
//! export bridge.
//!
//! ## Overview
//!
//! Two engines implement one contract for unique-key ordered storage:
//!
//! - **AVL** ([`tree::AvlTree`]): strict height balance, shortest lookups.
//! - **Red-black** ([`tree::RedBlackTree`]): colour balance, cheap updates.
//!
//! Both keep their nodes in a per-tree arena, take a [`tree::KeyOwnership`]
//! policy that decides whether keys are copied into the tree or stored as
//! given, and export their keys or values in ascending order into any
//! [`tree::SequenceBuilder`].
//!
//! ## Feature Flags
//!
//! - `avl`: the AVL engine (default)
//! - `red_black`: the red-black engine (default)
//! - `serde`: `Serialize`/`Deserialize` as key-ordered maps
//! - `tracing`: trace events for rotations, fix-ups and clears
//! - `full`: Enable all features
//!
//! ## Example
//!
//! ```rust
//! use counterpoise::prelude::*;
//!
//! let mut tree: AvlTree<i32, &str> = AvlTree::new();
//! assert!(tree.insert(10, "a"));
//! assert!(!tree.insert(10, "b"));
//!
//! assert_eq!(tree.find(&10, "none"), "a");
//! assert_eq!(tree.find(&5, "none"), "none");
//! assert_eq!(tree.len(), 1);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Prelude module for convenient imports.
///
/// # Usage
///
/// ```rust
/// use counterpoise::prelude::*;
/// ```
pub mod prelude {
    pub use crate::error::{InsertError, InvariantViolation};

    #[cfg(any(feature = "avl", feature = "red_black"))]
    pub use crate::tree::{Borrowed, KeyOwnership, Owned, SequenceBuilder};

    #[cfg(feature = "avl")]
    pub use crate::tree::AvlTree;

    #[cfg(feature = "red_black")]
    pub use crate::tree::RedBlackTree;
}

pub mod error;

#[cfg(any(feature = "avl", feature = "red_black"))]
pub mod tree;
