use super::*;
use serde_json::json;

#[test]
fn canonical_json_sorts_object_keys() {
    let v = json!({"b": 1, "a": 2});
    let out = canonical_json(&v);
    assert_eq!(String::from_utf8(out).unwrap(), r#"{"a":2,"b":1}"#);
}

#[test]
fn canonical_json_is_idempotent() {
    let v = json!({"z": [3, 2, 1], "a": {"nested": true}});
    let once = canonical_json(&v);
    let reparsed: Value = serde_json::from_slice(&once).unwrap();
    let twice = canonical_json(&reparsed);
    assert_eq!(once, twice);
}

#[test]
fn canonical_json_normalizes_integral_floats() {
    let v = json!({"n": 5.0});
    let out = canonical_json(&v);
    assert_eq!(String::from_utf8(out).unwrap(), r#"{"n":5}"#);
}

#[test]
fn fingerprint_stable_across_equivalent_param_orderings() {
    let a = canonical_json(&json!({"x": 1, "y": 2}));
    let b = canonical_json(&json!({"y": 2, "x": 1}));
    assert_eq!(fingerprint("kv.set", &a, 0), fingerprint("kv.set", &b, 0));
}

#[test]
fn fingerprint_differs_on_op_index() {
    let params = canonical_json(&json!({"x": 1}));
    assert_ne!(
        fingerprint("kv.set", &params, 0),
        fingerprint("kv.set", &params, 1)
    );
}

#[test]
fn fingerprint_hex_roundtrip() {
    let fp = fingerprint("kv.set", b"{}", 0);
    let hex = fp.to_hex();
    assert_eq!(Fingerprint::from_hex(&hex), Some(fp));
}

#[test]
fn strip_insignificant_removes_named_fields_only() {
    let v = json!({"result": 1, "observed_at": "now"});
    let stripped = strip_insignificant(v, &["observed_at"]);
    assert_eq!(stripped, json!({"result": 1}));
}
