//! Mapped objects.
//!
//! A [`Record`] is the untyped object the mapper populates from rows. Each
//! field is either a scalar copied from a column, a single nested record
//! (an association, possibly null), or a list of nested records (a
//! collection). Fields keep the order in which they were first written.
//!
//! Records are plain data: once a mapping call returns, the caller owns the
//! whole graph. Use [`Record::deserialize_into`] to turn it into typed
//! structs.

use crate::Result;
use crate::error::{Error, TypeError};
use crate::identity::IdentityKey;
use crate::row::{FromValue, NULL, with_field};
use crate::value::Value;
use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde::{Serialize, Serializer};
use std::collections::HashMap;

/// One field of a mapped record.
#[derive(Debug, Clone, PartialEq)]
pub enum Field {
    /// Scalar column value
    Value(Value),
    /// Single nested object; `None` when the join matched nothing
    Object(Option<Box<Record>>),
    /// Ordered, deduplicated nested objects
    List(RecordList),
}

impl Field {
    /// Does this field hold a scalar NULL or a null association?
    pub fn is_null(&self) -> bool {
        match self {
            Field::Value(v) => v.is_null(),
            Field::Object(o) => o.is_none(),
            Field::List(_) => false,
        }
    }

    /// Render this field as plain JSON.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Field::Value(v) => v.to_json(),
            Field::Object(None) => serde_json::Value::Null,
            Field::Object(Some(record)) => record.to_json(),
            Field::List(list) => {
                serde_json::Value::Array(list.iter().map(Record::to_json).collect())
            }
        }
    }
}

/// An untyped object populated by the mapper.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    fields: IndexMap<String, Field>,
}

impl Record {
    /// Create an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a scalar field, builder style.
    ///
    /// Useful in factories: a seeded field counts as already set and is
    /// never overwritten by row data.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(name.into(), Field::Value(value.into()));
        self
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Whether the field has been written, NULL included.
    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&Field> {
        self.fields.get(name)
    }

    /// Scalar value of a field.
    pub fn value(&self, name: &str) -> Option<&Value> {
        match self.fields.get(name) {
            Some(Field::Value(v)) => Some(v),
            _ => None,
        }
    }

    /// Nested object of an association field, if present and non-null.
    pub fn object(&self, name: &str) -> Option<&Record> {
        match self.fields.get(name) {
            Some(Field::Object(Some(record))) => Some(record.as_ref()),
            _ => None,
        }
    }

    /// Members of a collection field.
    pub fn list(&self, name: &str) -> Option<&[Record]> {
        match self.fields.get(name) {
            Some(Field::List(list)) => Some(list.as_slice()),
            _ => None,
        }
    }

    /// Get a typed scalar value by field name.
    pub fn get_as<T: FromValue>(&self, name: &str) -> Result<T> {
        let value = match self.fields.get(name) {
            Some(Field::Value(v)) => v,
            Some(Field::Object(None)) => &NULL,
            Some(other) => {
                return Err(Error::Type(TypeError {
                    expected: std::any::type_name::<T>(),
                    actual: match other {
                        Field::List(_) => "collection".to_string(),
                        _ => "object".to_string(),
                    },
                    field: Some(name.to_string()),
                }));
            }
            None => {
                return Err(Error::Type(TypeError {
                    expected: std::any::type_name::<T>(),
                    actual: format!("field '{}' not set", name),
                    field: Some(name.to_string()),
                }));
            }
        };
        with_field(T::from_value(value), name)
    }

    /// Iterate over `(name, field)` pairs in first-write order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Field)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Insert or replace a field, returning the previous one.
    pub fn insert(&mut self, name: impl Into<String>, field: Field) -> Option<Field> {
        self.fields.insert(name.into(), field)
    }

    /// Write a scalar only if the field has never been written.
    ///
    /// Returns `true` when the value was stored.
    pub fn set_value_if_absent(&mut self, name: &str, value: Value) -> bool {
        if self.fields.contains_key(name) {
            return false;
        }
        self.fields.insert(name.to_string(), Field::Value(value));
        true
    }

    /// Mutable access to a non-null association object.
    pub fn object_mut(&mut self, name: &str) -> Option<&mut Record> {
        match self.fields.get_mut(name) {
            Some(Field::Object(Some(record))) => Some(record.as_mut()),
            _ => None,
        }
    }

    /// Mutable access to a collection, creating an empty one when the field
    /// is unset or holds something other than a list.
    ///
    /// The second element reports whether a non-list field was replaced.
    pub fn list_mut_or_default(&mut self, name: &str) -> (&mut RecordList, bool) {
        let field = self
            .fields
            .entry(name.to_string())
            .or_insert_with(|| Field::List(RecordList::new()));
        let replaced = !matches!(field, Field::List(_));
        if replaced {
            *field = Field::List(RecordList::new());
        }
        let Field::List(list) = field else {
            unreachable!("field '{name}' was just set to a list");
        };
        (list, replaced)
    }

    /// Render the record as a JSON object.
    pub fn to_json(&self) -> serde_json::Value {
        let map = self
            .fields
            .iter()
            .map(|(name, field)| (name.clone(), field.to_json()))
            .collect();
        serde_json::Value::Object(map)
    }

    /// Convert the record graph into a typed value through serde.
    ///
    /// # Example
    ///
    /// ```
    /// use joinmap_core::{Record, Value};
    /// use serde::Deserialize;
    ///
    /// #[derive(Deserialize)]
    /// struct Team {
    ///     id: i64,
    ///     name: String,
    /// }
    ///
    /// let record = Record::new().with("id", 1_i64).with("name", "Avengers");
    /// let team: Team = record.deserialize_into().unwrap();
    /// assert_eq!(team.id, 1);
    /// assert_eq!(team.name, "Avengers");
    /// ```
    pub fn deserialize_into<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_value(self.to_json()).map_err(Error::from)
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

/// Ordered list of records, unique by identity key.
///
/// Members keep first-occurrence order. The identity index is derived
/// data: two lists are equal when their records are.
#[derive(Debug, Clone, Default)]
pub struct RecordList {
    records: Vec<Record>,
    index: HashMap<IdentityKey, usize>,
}

impl RecordList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn as_slice(&self) -> &[Record] {
        &self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Record> {
        self.records.iter()
    }

    /// Look up a member by identity key.
    pub fn find(&self, key: &IdentityKey) -> Option<&Record> {
        self.index.get(key).map(|&i| &self.records[i])
    }

    /// Return the member with `key`, appending `create()` if there is none.
    ///
    /// The boolean is `true` when a new member was appended.
    pub fn get_or_insert_with(
        &mut self,
        key: IdentityKey,
        create: impl FnOnce() -> Record,
    ) -> (&mut Record, bool) {
        if let Some(&i) = self.index.get(&key) {
            return (&mut self.records[i], false);
        }
        let i = self.records.len();
        self.records.push(create());
        self.index.insert(key, i);
        (&mut self.records[i], true)
    }

    pub fn into_vec(self) -> Vec<Record> {
        self.records
    }
}

impl PartialEq for RecordList {
    fn eq(&self, other: &Self) -> bool {
        self.records == other.records
    }
}

impl From<RecordList> for Vec<Record> {
    fn from(list: RecordList) -> Self {
        list.records
    }
}

impl IntoIterator for RecordList {
    type Item = Record;
    type IntoIter = std::vec::IntoIter<Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.into_iter()
    }
}

impl<'a> IntoIterator for &'a RecordList {
    type Item = &'a Record;
    type IntoIter = std::slice::Iter<'a, Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
