#![cfg(all(feature = "avl", feature = "red_black"))]
//! Property-based tests for both balancing engines.
//!
//! Random operation sequences are applied to a tree and to a `BTreeMap`
//! model; after every step the tree must agree with the model and pass its
//! own structural checks.

use counterpoise::tree::{AvlTree, RedBlackTree};
use proptest::prelude::*;
use std::collections::BTreeMap;

// =============================================================================
// Strategies for Generating Test Data
// =============================================================================

#[derive(Clone, Debug)]
enum Operation {
    Insert(u8, i32),
    Erase(u8),
    Replace(u8, i32),
    Clear,
}

/// Small key space so that duplicates and hits on erase are common.
fn operation() -> impl Strategy<Value = Operation> {
    prop_oneof![
        6 => (any::<u8>(), any::<i32>()).prop_map(|(key, value)| Operation::Insert(key, value)),
        4 => any::<u8>().prop_map(Operation::Erase),
        2 => (any::<u8>(), any::<i32>()).prop_map(|(key, value)| Operation::Replace(key, value)),
        1 => Just(Operation::Clear),
    ]
}

fn operations() -> impl Strategy<Value = Vec<Operation>> {
    prop::collection::vec(operation(), 0..200)
}

fn entries() -> impl Strategy<Value = Vec<(i32, i32)>> {
    prop::collection::vec((any::<i32>(), any::<i32>()), 0..100)
}

/// Unique keys in random order.
fn shuffled_keys() -> impl Strategy<Value = Vec<i32>> {
    prop::collection::btree_set(any::<i32>(), 0..100)
        .prop_map(|keys| keys.into_iter().collect::<Vec<_>>())
        .prop_shuffle()
}

/// log2 of `length + 2`, rounded up.
fn ceil_log2(length: usize) -> usize {
    (usize::BITS - (length + 1).leading_zeros()) as usize
}

// =============================================================================
// Model Laws
// =============================================================================

macro_rules! model_laws {
    ($module:ident, $tree:ident, $height_percent:literal) => {
        mod $module {
            use super::*;

            proptest! {
                /// Law: every step agrees with the model, and the tree's
                /// structure stays valid.
                #[test]
                fn prop_matches_btree_map_model(operations in operations()) {
                    let mut tree: $tree<u8, i32> = $tree::new();
                    let mut model: BTreeMap<u8, i32> = BTreeMap::new();

                    for operation in operations {
                        match operation {
                            Operation::Insert(key, value) => {
                                let fresh = !model.contains_key(&key);
                                if fresh {
                                    model.insert(key, value);
                                }
                                prop_assert_eq!(tree.insert(key, value), fresh);
                            }
                            Operation::Erase(key) => {
                                prop_assert_eq!(tree.erase(&key), model.remove(&key).is_some());
                            }
                            Operation::Replace(key, value) => {
                                let present = match model.get_mut(&key) {
                                    Some(slot) => {
                                        *slot = value;
                                        true
                                    }
                                    None => false,
                                };
                                prop_assert_eq!(tree.replace(&key, value), present);
                            }
                            Operation::Clear => {
                                tree.clear();
                                model.clear();
                            }
                        }
                        prop_assert_eq!(tree.len(), model.len());
                        prop_assert_eq!(tree.check_invariants(), Ok(()));
                    }

                    prop_assert!(tree.iter().map(|(key, value)| (*key, *value)).eq(model.into_iter()));
                }

                /// Law: the height stays within the engine's logarithmic bound.
                #[test]
                fn prop_height_is_logarithmic(entries in entries()) {
                    let tree: $tree<i32, i32> = entries.into_iter().collect();
                    prop_assert!(tree.height() * 100 <= $height_percent * ceil_log2(tree.len()));
                }

                /// Law: keys come out strictly increasing and unique.
                #[test]
                fn prop_keys_strictly_increase(entries in entries()) {
                    let tree: $tree<i32, i32> = entries.iter().copied().collect();
                    let keys = tree.keys_to_vec();
                    prop_assert!(keys.windows(2).all(|pair| pair[0] < pair[1]));

                    let mut expected: Vec<i32> = entries.iter().map(|(key, _)| *key).collect();
                    expected.sort_unstable();
                    expected.dedup();
                    prop_assert_eq!(keys, expected);
                }

                /// Law: the first occurrence of a key wins when collecting.
                #[test]
                fn prop_first_occurrence_wins(entries in entries()) {
                    let tree: $tree<i32, i32> = entries.iter().copied().collect();
                    for (key, _) in &entries {
                        let first = entries.iter().find(|(other, _)| other == key).map(|(_, value)| value);
                        prop_assert_eq!(tree.get(key), first);
                        prop_assert!(tree.exists(key));
                    }
                }

                /// Law: erasing every key in any order empties the tree.
                #[test]
                fn prop_erase_all_empties(keys in shuffled_keys()) {
                    let mut tree: $tree<i32, i32> = keys.iter().map(|&key| (key, key)).collect();
                    prop_assert_eq!(tree.len(), keys.len());
                    for key in keys {
                        prop_assert!(tree.erase(&key));
                        prop_assert_eq!(tree.check_invariants(), Ok(()));
                    }
                    prop_assert!(tree.is_empty());
                    prop_assert_eq!(tree.height(), 0);
                }

                /// Law: find returns the stored value or the supplied default.
                #[test]
                fn prop_find_or_default(entries in entries(), lookup: i32, default: i32) {
                    let tree: $tree<i32, i32> = entries.iter().copied().collect();
                    let expected = tree.get(&lookup).copied().unwrap_or(default);
                    prop_assert_eq!(tree.find(&lookup, default), expected);
                }
            }
        }
    };
}

// AVL height is below 1.45 * log2(N + 2); red-black height below 2 * log2(N + 1).
model_laws!(avl, AvlTree, 145);
model_laws!(red_black, RedBlackTree, 200);

// =============================================================================
// Cross-Engine Laws
// =============================================================================

proptest! {
    /// Law: both engines hold the same entries for the same input.
    #[test]
    fn prop_engines_agree(entries in entries()) {
        let avl: AvlTree<i32, i32> = entries.iter().copied().collect();
        let red_black: RedBlackTree<i32, i32> = entries.into_iter().collect();
        prop_assert!(avl.iter().eq(red_black.iter()));
    }
}
