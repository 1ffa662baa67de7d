//! Identity keys for deduplicating mapped objects.
//!
//! Two rows describe the same object when the value tuple of the object's
//! identity columns is equal. Equality here is strict: `Int(1)` and
//! `BigInt(1)` are different keys, and floats compare by bit pattern so
//! hashing and equality always agree. A JSON column holding JSON `null`
//! counts as NULL, since drivers report an unmatched JSON join that way.

use crate::value::Value;
use std::hash::{Hash, Hasher};

/// The value tuple identifying one mapped object within its list.
#[derive(Debug, Clone)]
pub struct IdentityKey(Vec<Value>);

impl IdentityKey {
    /// Build a key, or `None` when any component is NULL.
    ///
    /// A NULL identity component means the join matched no related record,
    /// so there is no object to identify.
    pub fn from_values(values: Vec<Value>) -> Option<Self> {
        if values.iter().any(is_missing) {
            None
        } else {
            Some(Self(values))
        }
    }

    /// The key components, in idProperty order.
    pub fn values(&self) -> &[Value] {
        &self.0
    }
}

impl PartialEq for IdentityKey {
    fn eq(&self, other: &Self) -> bool {
        self.0.len() == other.0.len()
            && self
                .0
                .iter()
                .zip(other.0.iter())
                .all(|(a, b)| value_eq(a, b))
    }
}

impl Eq for IdentityKey {}

impl Hash for IdentityKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.len().hash(state);
        for value in &self.0 {
            hash_value(value, state);
        }
    }
}

/// SQL NULL, or a JSON column holding JSON `null`.
pub fn is_missing(value: &Value) -> bool {
    matches!(value, Value::Null | Value::Json(serde_json::Value::Null))
}

fn value_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Float(x), Value::Float(y)) => x.to_bits() == y.to_bits(),
        (Value::Double(x), Value::Double(y)) => x.to_bits() == y.to_bits(),
        (Value::Array(x), Value::Array(y)) => {
            x.len() == y.len() && x.iter().zip(y).all(|(a, b)| value_eq(a, b))
        }
        _ => a == b,
    }
}

/// Variant tag, then payload. Must agree with [`value_eq`].
fn hash_value<H: Hasher>(value: &Value, state: &mut H) {
    std::mem::discriminant(value).hash(state);
    match value {
        Value::Null => {}
        Value::Bool(b) => b.hash(state),
        Value::TinyInt(n) => n.hash(state),
        Value::SmallInt(n) => n.hash(state),
        Value::Int(n) | Value::Date(n) => n.hash(state),
        Value::BigInt(n) | Value::Time(n) | Value::Timestamp(n) | Value::TimestampTz(n) => {
            n.hash(state);
        }
        Value::Float(x) => x.to_bits().hash(state),
        Value::Double(x) => x.to_bits().hash(state),
        Value::Decimal(text) | Value::Text(text) => text.hash(state),
        Value::Bytes(bytes) => bytes.hash(state),
        Value::Uuid(bytes) => bytes.hash(state),
        Value::Json(json) => hash_json(json, state),
        Value::Array(items) => {
            items.len().hash(state);
            for item in items {
                hash_value(item, state);
            }
        }
    }
}

/// Hash JSON in a canonical form: object keys sorted, so documents that
/// compare equal regardless of key order hash alike.
fn hash_json<H: Hasher>(json: &serde_json::Value, state: &mut H) {
    use serde_json::Value as Json;

    std::mem::discriminant(json).hash(state);
    match json {
        Json::Null => {}
        Json::Bool(b) => b.hash(state),
        Json::Number(n) => {
            if let Some(u) = n.as_u64() {
                0u8.hash(state);
                u.hash(state);
            } else if let Some(i) = n.as_i64() {
                1u8.hash(state);
                i.hash(state);
            } else if let Some(x) = n.as_f64() {
                2u8.hash(state);
                // 0.0 == -0.0 for JSON numbers.
                let x = if x == 0.0 { 0.0 } else { x };
                x.to_bits().hash(state);
            }
        }
        Json::String(text) => text.hash(state),
        Json::Array(items) => {
            items.len().hash(state);
            for item in items {
                hash_json(item, state);
            }
        }
        Json::Object(map) => {
            let mut entries: Vec<_> = map.iter().collect();
            entries.sort_unstable_by(|a, b| a.0.cmp(b.0));
            entries.len().hash(state);
            for (key, value) in entries {
                key.hash(state);
                hash_json(value, state);
            }
        }
    }
}
