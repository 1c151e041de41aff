use super::*;

define_id! {
    pub struct TestId("tst-");
}

#[test]
fn new_id_has_prefix_and_length() {
    let id = TestId::new();
    assert!(id.as_str().starts_with("tst-"));
    assert_eq!(id.as_str().len(), ID_MAX_LEN);
}

#[test]
fn from_string_roundtrips() {
    let id = TestId::from_string("tst-abc");
    assert_eq!(id.as_str(), "tst-abc");
    assert_eq!(id.suffix(), "abc");
}

#[test]
fn short_truncates_suffix() {
    let id = TestId::from_string("tst-abcdefgh");
    assert_eq!(id.short(3), "abc");
}

#[test]
fn equality_and_hash_match_str() {
    use std::collections::HashSet;
    let a = TestId::from_string("tst-one");
    let b = TestId::from_string("tst-one");
    assert_eq!(a, b);
    let mut set = HashSet::new();
    set.insert(a);
    assert!(set.contains(&b));
}

#[test]
fn serde_roundtrip() {
    let id = TestId::from_string("tst-serde");
    let json = serde_json::to_string(&id).unwrap();
    assert_eq!(json, "\"tst-serde\"");
    let back: TestId = serde_json::from_str(&json).unwrap();
    assert_eq!(back, id);
}

#[test]
fn two_new_ids_are_distinct() {
    assert_ne!(TestId::new(), TestId::new());
}
