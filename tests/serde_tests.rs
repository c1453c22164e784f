#![cfg(feature = "serde")]

//! Integration tests for serde support.
//!
//! Both trees serialize as maps in ascending key order.

use counterpoise::tree::{AvlTree, Borrowed, RedBlackTree};
use rstest::rstest;

// =============================================================================
// AvlTree Integration Tests
// =============================================================================

#[rstest]
fn test_avl_serializes_in_key_order() {
    let tree: AvlTree<i32, &str> = [(3, "c"), (1, "a"), (2, "b")].into_iter().collect();
    let json = serde_json::to_string(&tree).unwrap();
    assert_eq!(json, r#"{"1":"a","2":"b","3":"c"}"#);
}

#[rstest]
fn test_avl_json_roundtrip() {
    let tree: AvlTree<str, Vec<u8>> = [("beta", vec![2]), ("alpha", vec![1, 1])]
        .into_iter()
        .collect();
    let json = serde_json::to_string(&tree).unwrap();
    let restored: AvlTree<str, Vec<u8>> = serde_json::from_str(&json).unwrap();
    assert_eq!(tree, restored);
    assert_eq!(restored.check_invariants(), Ok(()));
}

#[rstest]
fn test_avl_empty_roundtrip() {
    let tree: AvlTree<i32, i32> = AvlTree::new();
    let json = serde_json::to_string(&tree).unwrap();
    assert_eq!(json, "{}");
    let restored: AvlTree<i32, i32> = serde_json::from_str(&json).unwrap();
    assert!(restored.is_empty());
}

// =============================================================================
// RedBlackTree Integration Tests
// =============================================================================

#[rstest]
fn test_red_black_json_roundtrip() {
    let tree: RedBlackTree<u32, String> = (0..50_u32).map(|key| (key, key.to_string())).collect();
    let json = serde_json::to_string(&tree).unwrap();
    let restored: RedBlackTree<u32, String> = serde_json::from_str(&json).unwrap();
    assert_eq!(tree, restored);
    assert_eq!(restored.check_invariants(), Ok(()));
}

#[rstest]
fn test_red_black_borrowed_keys_deserialize_from_input() {
    let json = r#"{"x":1,"y":2}"#;
    let tree: RedBlackTree<&str, i32, Borrowed> = serde_json::from_str(json).unwrap();
    assert_eq!(tree.find(&"y", 0), 2);
    assert_eq!(tree.len(), 2);
}

// =============================================================================
// Error Cases
// =============================================================================

#[rstest]
fn test_duplicate_key_is_an_error() {
    let json = r#"{"1":"a","1":"b"}"#;
    let result: Result<AvlTree<i32, String>, _> = serde_json::from_str(json);
    let error = result.unwrap_err();
    assert!(error.to_string().contains("duplicate key"));
}

#[rstest]
fn test_non_map_input_is_an_error() {
    let result: Result<RedBlackTree<i32, i32>, _> = serde_json::from_str("[1, 2, 3]");
    assert!(result.is_err());
}
