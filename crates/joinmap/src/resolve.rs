//! Identity-key and property resolution.

use crate::config::{IdPropertySpec, PropertySpec};
use crate::map::PropertyMapping;
use joinmap_core::{ColumnInfo, IdentityKey, Row, Value, is_missing};

/// Identity column used when a definition declares none.
pub const DEFAULT_ID_PROPERTY: &str = "id";

/// Normalize an idProperty specification into ordered `{name, column}` pairs.
///
/// - absent: a single `{id, id}` pair
/// - bare string: name and column are that string
/// - object or list of objects: a missing column defaults to the name
///
/// An explicitly empty list stays empty; [`MapSet`](crate::MapSet) rejects
/// it when the definition is loaded.
pub fn resolve_id_property(spec: Option<&IdPropertySpec>) -> Vec<PropertyMapping> {
    match spec {
        None => vec![PropertyMapping::named(DEFAULT_ID_PROPERTY)],
        Some(IdPropertySpec::Name(name)) => vec![PropertyMapping::named(name.as_str())],
        Some(IdPropertySpec::One(spec)) => vec![resolve_property(spec)],
        Some(IdPropertySpec::Many(specs)) => specs.iter().map(resolve_property).collect(),
    }
}

/// Normalize one property specification.
pub fn resolve_property(spec: &PropertySpec) -> PropertyMapping {
    match spec {
        PropertySpec::Name(name) => PropertyMapping::named(name.as_str()),
        PropertySpec::Mapped { name, column } => {
            PropertyMapping::new(name.as_str(), column.as_deref().unwrap_or(name))
        }
    }
}

/// Infer scalar properties from the columns of a result set.
///
/// Every column starting with `column_prefix` becomes a property named
/// after the column with the prefix stripped. A column equal to the prefix
/// itself has no name left and is skipped.
pub fn infer_properties(columns: &ColumnInfo, column_prefix: &str) -> Vec<PropertyMapping> {
    columns
        .names_with_prefix(column_prefix)
        .filter(|name| !name.is_empty())
        .map(PropertyMapping::named)
        .collect()
}

/// Full column name of `column` under `column_prefix`.
pub fn prefixed(column_prefix: &str, column: &str) -> String {
    let mut name = String::with_capacity(column_prefix.len() + column.len());
    name.push_str(column_prefix);
    name.push_str(column);
    name
}

/// Read the value of `column` under `column_prefix`; absent columns are NULL.
pub fn column_value<'r>(row: &'r Row, column_prefix: &str, column: &str) -> &'r Value {
    row.value_or_null(&prefixed(column_prefix, column))
}

/// Identity key of the object described by `row`, or `None` when any
/// identity column is NULL (JSON `null` included).
pub fn identity_key(
    row: &Row,
    identity: &[PropertyMapping],
    column_prefix: &str,
) -> Option<IdentityKey> {
    let mut values = Vec::with_capacity(identity.len());
    for id in identity {
        let value = column_value(row, column_prefix, &id.column);
        if is_missing(value) {
            return None;
        }
        values.push(value.clone());
    }
    IdentityKey::from_values(values)
}
