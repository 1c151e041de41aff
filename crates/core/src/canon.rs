// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Canonical JSON encoding and content fingerprinting.
//!
//! Every idempotency key, replay hash, and outbox downstream key is derived
//! from the canonical encoding defined here: sorted object keys, normalised
//! numeric encoding, no insignificant whitespace. Pure functions only — no
//! `.await` belongs anywhere near this module.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::fmt;

/// A stable content hash, hex-encoded for display.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Fingerprint(pub [u8; 32]);

impl Fingerprint {
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn from_hex(s: &str) -> Option<Self> {
        let bytes = hex::decode(s).ok()?;
        if bytes.len() != 32 {
            return None;
        }
        let mut out = [0u8; 32];
        out.copy_from_slice(&bytes);
        Some(Self(out))
    }
}

impl fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fingerprint({})", self.to_hex())
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

/// Produce a canonical byte encoding of a JSON value: object keys sorted,
/// numbers normalised (integral floats collapse to integer form), no
/// insignificant whitespace. Idempotent: `canonical_json(v) == canonical_json(parse(canonical_json(v)))`.
pub fn canonical_json(value: &Value) -> Vec<u8> {
    let normalized = normalize(value);
    // serde_json's default Display has no insignificant whitespace and (as of
    // the Map implementation used here) preserves insertion order, so
    // inserting in sorted order is sufficient for determinism.
    normalized.to_string().into_bytes()
}

fn normalize(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            let mut out = serde_json::Map::new();
            for k in keys {
                out.insert(k.clone(), normalize(&map[k]));
            }
            Value::Object(out)
        }
        Value::Array(items) => Value::Array(items.iter().map(normalize).collect()),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::Number(i.into())
            } else if let Some(u) = n.as_u64() {
                Value::Number(u.into())
            } else {
                value.clone()
            }
        }
        other => other.clone(),
    }
}

/// Compute the fingerprint of an operation: a hash of (skill name, canonical
/// params, op index). Stable across retries of the same logical op.
pub fn fingerprint(skill: &str, canonical_params: &[u8], op_index: u32) -> Fingerprint {
    let mut hasher = Sha256::new();
    hasher.update((skill.len() as u64).to_le_bytes());
    hasher.update(skill.as_bytes());
    hasher.update((canonical_params.len() as u64).to_le_bytes());
    hasher.update(canonical_params);
    hasher.update(op_index.to_le_bytes());
    let digest = hasher.finalize();
    let mut out = [0u8; 32];
    out.copy_from_slice(&digest);
    Fingerprint(out)
}

/// Hash a canonical result for replay comparison. Separate from
/// [`fingerprint`] because results and inputs are compared independently.
pub fn result_hash(canonical_result: &[u8]) -> Fingerprint {
    let digest = Sha256::digest(canonical_result);
    let mut out = [0u8; 32];
    out.copy_from_slice(&digest);
    Fingerprint(out)
}

/// Strip a set of top-level object keys before hashing a result, so fields
/// like wall-clock timestamps don't defeat replay comparison. Declared per
/// skill via `SkillAdapter::replay_insignificant_fields`.
pub fn strip_insignificant(mut value: Value, insignificant: &[&str]) -> Value {
    if let Value::Object(map) = &mut value {
        for key in insignificant {
            map.remove(*key);
        }
    }
    value
}

#[cfg(test)]
#[path = "canon_tests.rs"]
mod tests;
