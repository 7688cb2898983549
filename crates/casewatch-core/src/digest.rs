//! Fingerprints for snapshots, sections and arbitrary content.
//!
//! Provides deterministic SHA256 digests used to short-circuit "did anything
//! change" before paying for a text diff. Not for any security purpose.
//!
//! ## Digest Types
//!
//! - **Text**: hash of the raw bytes (order-sensitive)
//! - **Mapping**: hash of canonical JSON with sorted object keys
//!   (insertion-order independent)
//! - **Section**: text plus structured fields
//! - **Snapshot**: core fields plus sections in source order; excludes
//!   `captured_at`
//!
//! ## Determinism Guarantees
//!
//! - Same input → same digest
//! - Map key order never matters; section order and line order do

use crate::errors::Result;
use crate::model::snapshot::{Section, Snapshot};
use crate::model::summary::Fingerprint;
use serde::Serialize;
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

/// Fingerprint of a text body. Order-sensitive: swapping two lines changes it.
pub fn fingerprint_text(text: &str) -> Fingerprint {
    hash_bytes(text.as_bytes())
}

/// Fingerprint of any serializable mapping, canonicalized by sorting keys.
///
/// ## Errors
///
/// Returns `CaseWatchError::Serialization` if the value cannot be
/// represented as JSON (e.g. a map with non-string keys).
///
/// ## Example
///
/// ```
/// use casewatch_core::digest::fingerprint_mapping;
/// use std::collections::HashMap;
///
/// let mut a = HashMap::new();
/// a.insert("judge", "A. Ivanov");
/// a.insert("instance", "first");
/// let mut b = HashMap::new();
/// b.insert("instance", "first");
/// b.insert("judge", "A. Ivanov");
/// assert_eq!(fingerprint_mapping(&a).unwrap(), fingerprint_mapping(&b).unwrap());
/// ```
pub fn fingerprint_mapping<T: Serialize + ?Sized>(mapping: &T) -> Result<Fingerprint> {
    let value = serde_json::to_value(mapping)?;
    Ok(hash_value(&value))
}

/// Fingerprint of one section: raw text plus its structured fields, if any.
pub fn fingerprint_section(section: &Section) -> Fingerprint {
    hash_value(&section_value(section))
}

/// Whole-snapshot fingerprint.
///
/// Two snapshots captured at different times with identical content share
/// the same fingerprint. Reordering sections changes it.
pub fn fingerprint_snapshot(snapshot: &Snapshot) -> Fingerprint {
    let mut core = Map::new();
    for (name, value) in snapshot.core_fields.iter() {
        core.insert(name.as_str().to_string(), optional_string(value));
    }

    let sections: Vec<Value> = snapshot
        .sections
        .iter()
        .map(|(id, section)| {
            Value::Array(vec![Value::String(id.to_string()), section_value(section)])
        })
        .collect();

    let mut root = Map::new();
    root.insert("core_fields".to_string(), Value::Object(core));
    root.insert("sections".to_string(), Value::Array(sections));
    hash_value(&Value::Object(root))
}

fn section_value(section: &Section) -> Value {
    let mut obj = Map::new();
    obj.insert(
        "raw_text".to_string(),
        Value::String(section.raw_text.clone()),
    );
    if let Some(fields) = &section.fields {
        obj.insert("fields".to_string(), fields_value(fields));
    }
    Value::Object(obj)
}

fn fields_value(fields: &BTreeMap<String, Option<String>>) -> Value {
    Value::Object(
        fields
            .iter()
            .map(|(k, v)| (k.clone(), optional_string(v.as_deref())))
            .collect(),
    )
}

fn optional_string(value: Option<&str>) -> Value {
    value.map_or(Value::Null, |v| Value::String(v.to_string()))
}

fn hash_value(value: &Value) -> Fingerprint {
    hash_bytes(canonical(value).to_string().as_bytes())
}

/// Rebuild `value` with every object's keys inserted in sorted order, so the
/// encoding does not depend on whether serde_json preserves insertion order.
fn canonical(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            let mut sorted = Map::new();
            for key in keys {
                sorted.insert(key.clone(), canonical(&map[key]));
            }
            Value::Object(sorted)
        }
        Value::Array(items) => Value::Array(items.iter().map(canonical).collect()),
        other => other.clone(),
    }
}

/// Hash bytes using SHA256.
fn hash_bytes(input: &[u8]) -> Fingerprint {
    let mut hasher = Sha256::new();
    hasher.update(input);
    Fingerprint::from_hex(hex::encode(hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::fields::FieldName;
    use crate::model::snapshot::SectionId;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_text_hash_deterministic() {
        let a = fingerprint_text("line 1\nline 2");
        let b = fingerprint_text("line 1\nline 2");
        assert_eq!(a, b);
        assert_eq!(a.as_str().len(), 64);
    }

    #[test]
    fn test_text_hash_order_sensitive() {
        assert_ne!(
            fingerprint_text("line 1\nline 2"),
            fingerprint_text("line 2\nline 1")
        );
    }

    #[test]
    fn test_section_hash_covers_fields() {
        let plain = Section::text("body");
        let mut fields = BTreeMap::new();
        fields.insert("Судья".to_string(), Some("A. Ivanov".to_string()));
        let structured = Section::text("body").with_fields(fields);
        assert_ne!(fingerprint_section(&plain), fingerprint_section(&structured));
    }

    #[test]
    fn test_snapshot_hash_ignores_captured_at() {
        let a = Snapshot::new(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap())
            .with_field(FieldName::Judge, "A. Ivanov");
        let mut b = a.clone();
        b.captured_at = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        assert_eq!(fingerprint_snapshot(&a), fingerprint_snapshot(&b));
    }

    #[test]
    fn test_snapshot_hash_sees_section_reordering() {
        let at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let a = Snapshot::new(at)
            .with_section(SectionId::from_index(1), Section::text("x"))
            .with_section(SectionId::from_index(2), Section::text("y"));
        let b = Snapshot::new(at)
            .with_section(SectionId::from_index(2), Section::text("y"))
            .with_section(SectionId::from_index(1), Section::text("x"));
        assert_ne!(fingerprint_snapshot(&a), fingerprint_snapshot(&b));
    }
}
