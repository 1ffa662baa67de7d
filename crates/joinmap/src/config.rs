//! Raw mapping configuration, as written by hand or loaded from JSON.
//!
//! These types accept every shape a mapping document may use: a property
//! may be a bare column name or a `{name, column}` object, and an
//! idProperty may be a bare name, one object, or a list. They are
//! normalized once, when loaded into a [`MapSet`](crate::MapSet), into the
//! canonical [`ResultMap`](crate::ResultMap) the mapper consumes.
//!
//! # Example
//!
//! ```
//! use joinmap::config::ResultMapConfig;
//!
//! let configs: Vec<ResultMapConfig> = serde_json::from_str(r#"[
//!     {
//!         "mapId": "team",
//!         "idProperty": "team_id",
//!         "properties": ["name", {"name": "city", "column": "hq_city"}],
//!         "collections": [{"name": "heroes", "mapId": "hero", "columnPrefix": "hero_"}]
//!     },
//!     {"mapId": "hero", "properties": ["name"]}
//! ]"#).unwrap();
//!
//! assert_eq!(configs.len(), 2);
//! assert_eq!(configs[0].collections[0].column_prefix, "hero_");
//! ```

use crate::map::PropertyMapping;
use serde::Deserialize;

/// A scalar property: shorthand column name or explicit mapping.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum PropertySpec {
    /// Property and column share this name.
    Name(String),
    /// Explicit mapping; `column` defaults to `name`.
    Mapped {
        name: String,
        #[serde(default)]
        column: Option<String>,
    },
}

/// The identity columns of a definition, in any accepted shape.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum IdPropertySpec {
    /// Single identity column; name and column are equal.
    Name(String),
    /// Composite identity.
    Many(Vec<PropertySpec>),
    /// Single identity given in object form.
    One(PropertySpec),
}

/// An association or collection entry.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelationConfig {
    /// Field name on the owning object.
    pub name: String,
    /// Definition used to build the nested object(s).
    pub map_id: String,
    /// Full prefix of the nested entity's columns.
    #[serde(default)]
    pub column_prefix: String,
}

/// One mapping definition in raw form.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultMapConfig {
    pub map_id: String,
    #[serde(default)]
    pub id_property: Option<IdPropertySpec>,
    /// `None` means "infer from the row's columns".
    #[serde(default)]
    pub properties: Option<Vec<PropertySpec>>,
    #[serde(default)]
    pub associations: Vec<RelationConfig>,
    #[serde(default)]
    pub collections: Vec<RelationConfig>,
}

impl ResultMapConfig {
    pub fn new(map_id: impl Into<String>) -> Self {
        Self {
            map_id: map_id.into(),
            id_property: None,
            properties: None,
            associations: Vec::new(),
            collections: Vec::new(),
        }
    }
}

impl From<&str> for PropertySpec {
    fn from(name: &str) -> Self {
        PropertySpec::Name(name.to_string())
    }
}

impl From<String> for PropertySpec {
    fn from(name: String) -> Self {
        PropertySpec::Name(name)
    }
}

/// `(name, column)`
impl From<(&str, &str)> for PropertySpec {
    fn from((name, column): (&str, &str)) -> Self {
        PropertySpec::Mapped {
            name: name.to_string(),
            column: Some(column.to_string()),
        }
    }
}

impl From<PropertyMapping> for PropertySpec {
    fn from(mapping: PropertyMapping) -> Self {
        PropertySpec::Mapped {
            name: mapping.name,
            column: Some(mapping.column),
        }
    }
}

impl From<&str> for IdPropertySpec {
    fn from(name: &str) -> Self {
        IdPropertySpec::Name(name.to_string())
    }
}

impl From<String> for IdPropertySpec {
    fn from(name: String) -> Self {
        IdPropertySpec::Name(name)
    }
}

/// `(name, column)`
impl From<(&str, &str)> for IdPropertySpec {
    fn from(pair: (&str, &str)) -> Self {
        IdPropertySpec::One(pair.into())
    }
}

impl From<PropertySpec> for IdPropertySpec {
    fn from(spec: PropertySpec) -> Self {
        IdPropertySpec::One(spec)
    }
}

impl From<Vec<PropertySpec>> for IdPropertySpec {
    fn from(specs: Vec<PropertySpec>) -> Self {
        IdPropertySpec::Many(specs)
    }
}

/// Composite identity given as column names.
impl<const N: usize> From<[&str; N]> for IdPropertySpec {
    fn from(names: [&str; N]) -> Self {
        IdPropertySpec::Many(names.iter().map(|n| PropertySpec::from(*n)).collect())
    }
}
