//! Canonical mapping definitions.
//!
//! A [`ResultMap`] describes how to build one kind of object from the
//! columns of a row: which columns identify it, which columns become scalar
//! fields, and which other definitions supply its nested association and
//! collection fields. Definitions refer to each other by mapId and are
//! resolved through the [`MapSet`](crate::MapSet) they are loaded into.

use crate::config::{IdPropertySpec, PropertySpec, ResultMapConfig};
use crate::resolve::{resolve_id_property, resolve_property};
use joinmap_core::Record;
use std::fmt;
use std::sync::Arc;

/// Factory producing the record that receives a new object's fields.
pub type Factory = Arc<dyn Fn() -> Record + Send + Sync>;

/// A scalar field and the (unprefixed) column it is read from.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PropertyMapping {
    pub name: String,
    pub column: String,
}

impl PropertyMapping {
    pub fn new(name: impl Into<String>, column: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            column: column.into(),
        }
    }

    /// A mapping whose column has the same name as the field.
    pub fn named(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            column: name.clone(),
            name,
        }
    }
}

/// A nested association or collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relation {
    /// Field name on the owning object.
    pub name: String,
    /// Definition used to build the nested object(s).
    pub map_id: String,
    /// Full prefix of the nested entity's columns; never composed with the
    /// owner's prefix.
    pub column_prefix: String,
}

impl Relation {
    pub fn new(
        name: impl Into<String>,
        map_id: impl Into<String>,
        column_prefix: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            map_id: map_id.into(),
            column_prefix: column_prefix.into(),
        }
    }
}

/// One mapping definition, normalized.
///
/// # Example
///
/// ```
/// use joinmap::ResultMap;
///
/// let team = ResultMap::new("team")
///     .id_property("id")
///     .property("name")
///     .property(("city", "hq_city"))
///     .collection("heroes", "hero", "hero_");
///
/// assert_eq!(team.map_id(), "team");
/// assert_eq!(team.identity()[0].column, "id");
/// assert_eq!(team.explicit_properties().map(<[_]>::len), Some(2));
/// ```
#[derive(Clone)]
pub struct ResultMap {
    map_id: String,
    id_property: Vec<PropertyMapping>,
    properties: Option<Vec<PropertyMapping>>,
    associations: Vec<Relation>,
    collections: Vec<Relation>,
    create_new: Option<Factory>,
}

impl ResultMap {
    /// Create a definition with the default `id` identity column and
    /// inferred properties.
    pub fn new(map_id: impl Into<String>) -> Self {
        Self {
            map_id: map_id.into(),
            id_property: resolve_id_property(None),
            properties: None,
            associations: Vec::new(),
            collections: Vec::new(),
            create_new: None,
        }
    }

    /// Normalize a raw configuration entry.
    pub fn from_config(config: ResultMapConfig) -> Self {
        Self {
            map_id: config.map_id,
            id_property: resolve_id_property(config.id_property.as_ref()),
            properties: config
                .properties
                .map(|specs| specs.iter().map(resolve_property).collect()),
            associations: config
                .associations
                .into_iter()
                .map(|r| Relation::new(r.name, r.map_id, r.column_prefix))
                .collect(),
            collections: config
                .collections
                .into_iter()
                .map(|r| Relation::new(r.name, r.map_id, r.column_prefix))
                .collect(),
            create_new: None,
        }
    }

    /// Set the identity columns.
    #[must_use]
    pub fn id_property(mut self, spec: impl Into<IdPropertySpec>) -> Self {
        self.id_property = resolve_id_property(Some(&spec.into()));
        self
    }

    /// Add a scalar property. The first call turns off inference.
    #[must_use]
    pub fn property(mut self, spec: impl Into<PropertySpec>) -> Self {
        let mapping = resolve_property(&spec.into());
        self.properties.get_or_insert_with(Vec::new).push(mapping);
        self
    }

    /// Add several scalar properties at once.
    #[must_use]
    pub fn properties<I, P>(mut self, specs: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PropertySpec>,
    {
        let list = self.properties.get_or_insert_with(Vec::new);
        list.extend(specs.into_iter().map(|s| resolve_property(&s.into())));
        self
    }

    /// Add a single-valued nested object.
    #[must_use]
    pub fn association(
        mut self,
        name: impl Into<String>,
        map_id: impl Into<String>,
        column_prefix: impl Into<String>,
    ) -> Self {
        self.associations
            .push(Relation::new(name, map_id, column_prefix));
        self
    }

    /// Add a multi-valued nested list.
    #[must_use]
    pub fn collection(
        mut self,
        name: impl Into<String>,
        map_id: impl Into<String>,
        column_prefix: impl Into<String>,
    ) -> Self {
        self.collections
            .push(Relation::new(name, map_id, column_prefix));
        self
    }

    /// Use `factory` to create the records of this definition.
    #[must_use]
    pub fn create_new<F>(mut self, factory: F) -> Self
    where
        F: Fn() -> Record + Send + Sync + 'static,
    {
        self.create_new = Some(Arc::new(factory));
        self
    }

    pub fn map_id(&self) -> &str {
        &self.map_id
    }

    /// Identity columns, in key order.
    pub fn identity(&self) -> &[PropertyMapping] {
        &self.id_property
    }

    /// Explicit properties; `None` when they are inferred from rows.
    pub fn explicit_properties(&self) -> Option<&[PropertyMapping]> {
        self.properties.as_deref()
    }

    pub fn associations(&self) -> &[Relation] {
        &self.associations
    }

    pub fn collections(&self) -> &[Relation] {
        &self.collections
    }

    /// Associations followed by collections.
    pub fn relations(&self) -> impl Iterator<Item = &Relation> {
        self.associations.iter().chain(self.collections.iter())
    }

    pub(crate) fn set_factory(&mut self, factory: Factory) {
        self.create_new = Some(factory);
    }

    /// Create an empty record for a newly seen object.
    pub fn create(&self) -> Record {
        match &self.create_new {
            Some(factory) => factory(),
            None => Record::new(),
        }
    }
}

impl fmt::Debug for ResultMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResultMap")
            .field("map_id", &self.map_id)
            .field("id_property", &self.id_property)
            .field("properties", &self.properties)
            .field("associations", &self.associations)
            .field("collections", &self.collections)
            .field("create_new", &self.create_new.is_some())
            .finish()
    }
}
