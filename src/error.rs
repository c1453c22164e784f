//! Error types.
//!
//! Ordinary outcomes (a duplicate key, a missing key) are reported as `bool`s
//! or caller-supplied defaults. The types here carry the few cases where a
//! richer answer is useful: handing a rejected value back to the caller and
//! describing a broken structural invariant.

use thiserror::Error;

/// Returned by `try_insert` when the key is already present.
///
/// The tree is left untouched and the rejected value is handed back.
///
/// # Examples
///
/// ```rust
/// use counterpoise::tree::AvlTree;
///
/// let mut tree: AvlTree<i32, String> = AvlTree::new();
/// tree.insert(10, "a".to_string());
///
/// let error = tree.try_insert(10, "b".to_string()).unwrap_err();
/// assert_eq!(error.into_value(), "b");
/// assert_eq!(tree.get(&10).map(String::as_str), Some("a"));
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("key already present; value not inserted")]
pub struct InsertError<V> {
    /// The value that was not inserted.
    pub value: V,
}

impl<V> InsertError<V> {
    /// Creates an error carrying the rejected value.
    #[must_use]
    pub const fn new(value: V) -> Self {
        Self { value }
    }

    /// Returns the rejected value.
    #[must_use]
    pub fn into_value(self) -> V {
        self.value
    }
}

/// A structural invariant found broken by `check_invariants`.
///
/// Positions are in-order ranks (0 is the lowest key). Any of these means the
/// balancing code itself is wrong, not that the input was bad.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum InvariantViolation {
    /// A key does not compare greater than its in-order predecessor.
    #[error("key at position {position} is not greater than its predecessor")]
    OrderViolated {
        /// In-order rank of the offending key.
        position: usize,
    },

    /// A child does not point back at its parent, or the root has a parent.
    #[error("node at position {position} has a broken parent link")]
    ParentLinkBroken {
        /// In-order rank of the node with the bad link.
        position: usize,
    },

    /// The cached size disagrees with the number of reachable nodes.
    #[error("tree records {recorded} entries but {reachable} are reachable")]
    SizeMismatch {
        /// Value of the maintained counter.
        recorded: usize,
        /// Nodes found by traversal.
        reachable: usize,
    },

    /// An AVL subtree pair differs in height by more than one.
    #[error("subtree heights {left} and {right} at position {position} differ by more than one")]
    HeightSkew {
        /// In-order rank of the unbalanced node.
        position: usize,
        /// Height of the left subtree.
        left: usize,
        /// Height of the right subtree.
        right: usize,
    },

    /// An AVL balance factor disagrees with the actual subtree heights.
    #[error("balance factor at position {position} does not match subtree heights {left} and {right}")]
    BalanceFactorMismatch {
        /// In-order rank of the node.
        position: usize,
        /// Height of the left subtree.
        left: usize,
        /// Height of the right subtree.
        right: usize,
    },

    /// The red-black root is red.
    #[error("red-black root is red")]
    RedRoot,

    /// A red node has a red child.
    #[error("red node at position {position} has a red child")]
    RedChildOfRed {
        /// In-order rank of the parent.
        position: usize,
    },

    /// Two paths below one node cross different numbers of black nodes.
    #[error("black heights {left} and {right} differ below position {position}")]
    BlackHeightMismatch {
        /// In-order rank of the node.
        position: usize,
        /// Black height through the left child.
        left: usize,
        /// Black height through the right child.
        right: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn test_insert_error_display() {
        let error = InsertError::new(42);
        assert_eq!(error.to_string(), "key already present; value not inserted");
    }

    #[rstest]
    fn test_insert_error_returns_value() {
        let error = InsertError::new("payload".to_string());
        assert_eq!(error.into_value(), "payload");
    }

    #[rstest]
    fn test_insert_error_error_trait() {
        let error = InsertError::new(1_u8);
        let _: &dyn std::error::Error = &error;
    }

    #[rstest]
    #[case(InvariantViolation::RedRoot, "red-black root is red")]
    #[case(
        InvariantViolation::SizeMismatch { recorded: 3, reachable: 2 },
        "tree records 3 entries but 2 are reachable"
    )]
    #[case(
        InvariantViolation::HeightSkew { position: 4, left: 3, right: 1 },
        "subtree heights 3 and 1 at position 4 differ by more than one"
    )]
    fn test_invariant_violation_display(
        #[case] violation: InvariantViolation,
        #[case] expected: &str,
    ) {
        assert_eq!(violation.to_string(), expected);
    }
}
