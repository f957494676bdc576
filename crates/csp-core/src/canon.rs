//! Canonical JSON serialization and summary hashing.
//!
//! Differs from a strict RFC 8785 canonicalizer in one deliberate way: object
//! keys are sorted by plain `str` order rather than UTF-16 code units (the
//! domain's keys are all ASCII identifiers, so the two orders coincide), and
//! numbers are serialized in their standard printable form rather than
//! coerced to integers when integer-valued — `0.8` must stay `0.8`, since
//! several fields here (truth scores, density ranges) are meaningfully
//! fractional and a reader diffing two summaries should see the real value.
//! Array order is always preserved. NaN/Infinity are rejected, matching
//! `serde_json`'s own inability to represent them.

use sha2::{Digest, Sha256};

use crate::domain::error::{Result, WorkflowError};

fn sort_keys(value: &serde_json::Value) -> serde_json::Value {
    match value {
        serde_json::Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            let mut sorted = serde_json::Map::new();
            for key in keys {
                sorted.insert(key.clone(), sort_keys(&map[key]));
            }
            serde_json::Value::Object(sorted)
        }
        serde_json::Value::Array(arr) => {
            serde_json::Value::Array(arr.iter().map(sort_keys).collect())
        }
        other => other.clone(),
    }
}

fn check_finite(value: &serde_json::Value) -> Result<()> {
    match value {
        serde_json::Value::Object(map) => {
            for v in map.values() {
                check_finite(v)?;
            }
            Ok(())
        }
        serde_json::Value::Array(arr) => {
            for v in arr {
                check_finite(v)?;
            }
            Ok(())
        }
        serde_json::Value::Number(n) => {
            if let Some(f) = n.as_f64() {
                if !f.is_finite() {
                    return Err(WorkflowError::InvalidConfig(
                        "NaN/Infinity not permitted in canonical JSON".to_string(),
                    ));
                }
            }
            Ok(())
        }
        _ => Ok(()),
    }
}

/// Sorted-key, array-order-preserving, compact JSON rendering of `value`.
pub fn canonical_json(value: &serde_json::Value) -> Result<String> {
    check_finite(value)?;
    let sorted = sort_keys(value);
    Ok(serde_json::to_string(&sorted)?)
}

/// SHA-256 hex digest of `canonical_json(value)`.
pub fn summary_hash(value: &serde_json::Value) -> Result<String> {
    let canonical = canonical_json(value)?;
    let mut hasher = Sha256::new();
    hasher.update(canonical.as_bytes());
    Ok(hex::encode(hasher.finalize()))
}
