//! Hashing System - SHA-256 Deck Fingerprints
//!
//! Same inputs, same deck, same hash. Lets a printed deck be matched back to
//! the export that produced it.

use sha2::{Sha256, Digest};
use serde::Serialize;
use serde_json::{Value, to_string};

/// Compute SHA-256 hash of bytes, return hex string
pub fn sha256_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    let result = hasher.finalize();
    hex::encode(result)
}

/// Convert to canonical JSON (sorted keys, no whitespace)
pub fn canonical_json<T: Serialize>(value: &T) -> Result<String, serde_json::Error> {
    let v: Value = serde_json::to_value(value)?;
    to_string(&sort_value(&v))
}

fn sort_value(v: &Value) -> Value {
    match v {
        Value::Object(map) => {
            let mut sorted: Vec<_> = map.iter().collect();
            sorted.sort_by(|a, b| a.0.cmp(b.0));
            Value::Object(
                sorted
                    .into_iter()
                    .map(|(k, v)| (k.clone(), sort_value(v)))
                    .collect(),
            )
        }
        Value::Array(arr) => Value::Array(arr.iter().map(sort_value).collect()),
        _ => v.clone(),
    }
}

/// Hash of the paginated deck content
pub fn compute_deck_hash<T: Serialize>(pages: &T) -> Result<String, serde_json::Error> {
    let canonical = canonical_json(pages)?;
    Ok(sha256_hex(canonical.as_bytes()))
}

/// Hash of the export job
/// job_hash = sha256(canonical_request + engine_version)
///
/// The engine version is part of the job: a newer engine may page the same
/// request differently.
pub fn compute_job_hash(
    request: &impl Serialize,
    engine_version: &str,
) -> Result<String, serde_json::Error> {
    let canonical_request = canonical_json(request)?;
    let combined = format!("{}:{}", canonical_request, engine_version);
    Ok(sha256_hex(combined.as_bytes()))
}

mod hex {
    pub fn encode(bytes: impl AsRef<[u8]>) -> String {
        bytes.as_ref().iter().map(|b| format!("{:02x}", b)).collect()
    }
}
