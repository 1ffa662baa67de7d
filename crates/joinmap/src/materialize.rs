//! Row-to-object materialization.
//!
//! A joined query returns one row per combination of parent and child
//! records. The mapper folds those rows back into a nested graph:
//!
//! - each row locates (or creates) its top-level object by identity key,
//! - scalar fields are copied the first time they are seen and never
//!   overwritten afterwards,
//! - associations become a single nested object, or null when the joined
//!   identity columns are null,
//! - collections accumulate one member per distinct identity key, in
//!   first-occurrence order.
//!
//! # Example
//!
//! ```
//! use joinmap::prelude::*;
//!
//! let maps = MapSet::builder()
//!     .map(ResultMap::new("team").property("name").collection("heroes", "hero", "hero_"))
//!     .map(ResultMap::new("hero").property("name"))
//!     .build()
//!     .unwrap();
//!
//! let rows = vec![
//!     Row::from_pairs([("id", Value::Int(1)), ("name", "Avengers".into()),
//!                      ("hero_id", Value::Int(10)), ("hero_name", "Thor".into())]),
//!     Row::from_pairs([("id", Value::Int(1)), ("name", "Avengers".into()),
//!                      ("hero_id", Value::Int(11)), ("hero_name", "Hulk".into())]),
//! ];
//!
//! let teams = map_collection(&rows, &maps, "team", "").unwrap();
//! assert_eq!(teams.len(), 1);
//! assert_eq!(teams[0].list("heroes").unwrap().len(), 2);
//! ```

use crate::map::{PropertyMapping, ResultMap};
use crate::map_set::MapSet;
use crate::resolve::{column_value, identity_key, infer_properties};
use joinmap_core::{
    DEFAULT_NOT_FOUND_MESSAGE, Field, NotFoundError, Record, RecordList, Result, Row,
};
use std::collections::HashMap;

/// Map every row into a deduplicated list of top-level objects.
///
/// Returns an empty list when there are no rows or no row carries a
/// non-null identity for `map_id`.
pub fn map_collection(
    rows: &[Row],
    maps: &MapSet,
    map_id: &str,
    column_prefix: &str,
) -> Result<Vec<Record>> {
    Mapper::new(maps, map_id)
        .column_prefix(column_prefix)
        .collection(rows)
}

/// Map rows expecting at most one top-level object.
///
/// Returns the first object produced. When none is produced, fails with
/// [`Error::NotFound`](joinmap_core::Error::NotFound) if `required`, and
/// returns `Ok(None)` otherwise.
pub fn map_single(
    rows: &[Row],
    maps: &MapSet,
    map_id: &str,
    column_prefix: &str,
    required: bool,
) -> Result<Option<Record>> {
    Mapper::new(maps, map_id)
        .column_prefix(column_prefix)
        .required(required)
        .single(rows)
}

/// Configures one mapping call.
///
/// ```
/// use joinmap::prelude::*;
///
/// let maps = MapSet::builder().map(ResultMap::new("hero")).build().unwrap();
///
/// let err = Mapper::new(&maps, "hero")
///     .not_found_message("no such hero")
///     .single(&[])
///     .unwrap_err();
/// assert_eq!(err.to_string(), "no such hero");
///
/// let none = Mapper::new(&maps, "hero").required(false).single(&[]).unwrap();
/// assert!(none.is_none());
/// ```
#[derive(Debug, Clone)]
pub struct Mapper<'a> {
    maps: &'a MapSet,
    map_id: String,
    column_prefix: String,
    required: bool,
    not_found_message: Option<String>,
}

impl<'a> Mapper<'a> {
    pub fn new(maps: &'a MapSet, map_id: impl Into<String>) -> Self {
        Self {
            maps,
            map_id: map_id.into(),
            column_prefix: String::new(),
            required: true,
            not_found_message: None,
        }
    }

    /// Prefix of the top-level entity's columns.
    #[must_use]
    pub fn column_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.column_prefix = prefix.into();
        self
    }

    /// Whether [`single`](Self::single) fails when nothing is mapped.
    #[must_use]
    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    /// Message carried by the not-found error instead of `EmptyResponse`.
    #[must_use]
    pub fn not_found_message(mut self, message: impl Into<String>) -> Self {
        self.not_found_message = Some(message.into());
        self
    }

    /// Map every row into a deduplicated list of top-level objects.
    #[tracing::instrument(
        level = "debug",
        skip(self, rows),
        fields(map_id = %self.map_id, rows = rows.len())
    )]
    pub fn collection(&self, rows: &[Row]) -> Result<Vec<Record>> {
        let root = self.maps.require(&self.map_id)?;
        let mut injector = Injector::new(self.maps);
        let mut objects = RecordList::new();

        for row in rows {
            injector.inject_into_list(row, &mut objects, root, &self.column_prefix)?;
        }

        tracing::debug!(objects = objects.len(), "Mapped result set");
        Ok(objects.into_vec())
    }

    /// Map rows expecting at most one top-level object.
    #[tracing::instrument(
        level = "debug",
        skip(self, rows),
        fields(map_id = %self.map_id, required = self.required)
    )]
    pub fn single(&self, rows: &[Row]) -> Result<Option<Record>> {
        let objects = self.collection(rows)?;
        if objects.len() > 1 {
            tracing::trace!(
                discarded = objects.len() - 1,
                "Single result requested; keeping the first object"
            );
        }

        match objects.into_iter().next() {
            Some(object) => Ok(Some(object)),
            None if self.required => {
                let message = self
                    .not_found_message
                    .as_deref()
                    .unwrap_or(DEFAULT_NOT_FOUND_MESSAGE);
                tracing::debug!(reason = message, "No object mapped for required result");
                Err(NotFoundError::new(message).into())
            }
            None => Ok(None),
        }
    }
}

/// Per-call injection state.
///
/// Properties inferred for definitions without explicit ones are cached
/// here, keyed by mapId, so the shared [`MapSet`] is never written to.
struct Injector<'a> {
    maps: &'a MapSet,
    inferred: HashMap<&'a str, Vec<PropertyMapping>>,
}

impl<'a> Injector<'a> {
    fn new(maps: &'a MapSet) -> Self {
        Self {
            maps,
            inferred: HashMap::new(),
        }
    }

    /// Locate or create the object `row` describes in `list`, then inject
    /// the row into it. Rows with a null identity are skipped.
    fn inject_into_list(
        &mut self,
        row: &Row,
        list: &mut RecordList,
        map: &'a ResultMap,
        column_prefix: &str,
    ) -> Result<()> {
        let Some(key) = identity_key(row, map.identity(), column_prefix) else {
            return Ok(());
        };

        let (record, created) = list.get_or_insert_with(key, || map.create());
        if created {
            tracing::trace!(map_id = map.map_id(), "Created object");
        }
        self.inject_into_record(row, record, map, column_prefix)
    }

    /// Apply one row to one object, recursing into its relations.
    fn inject_into_record(
        &mut self,
        row: &Row,
        record: &mut Record,
        map: &'a ResultMap,
        column_prefix: &str,
    ) -> Result<()> {
        for id in map.identity() {
            copy_scalar(row, record, id, column_prefix);
        }

        self.infer_if_needed(row, map, column_prefix);
        let properties = map
            .explicit_properties()
            .or_else(|| self.inferred.get(map.map_id()).map(Vec::as_slice))
            .unwrap_or_default();
        for property in properties {
            copy_scalar(row, record, property, column_prefix);
        }

        for association in map.associations() {
            let target = self.maps.require(&association.map_id)?;

            if let Some(existing) = record.object_mut(&association.name) {
                self.inject_into_record(row, existing, target, &association.column_prefix)?;
                continue;
            }

            let has_identity =
                identity_key(row, target.identity(), &association.column_prefix).is_some();
            let slot = if has_identity {
                let mut object = target.create();
                tracing::trace!(map_id = target.map_id(), "Created associated object");
                self.inject_into_record(row, &mut object, target, &association.column_prefix)?;
                Field::Object(Some(Box::new(object)))
            } else {
                Field::Object(None)
            };

            let previous = record.insert(association.name.clone(), slot);
            if matches!(previous, Some(Field::Value(ref v)) if !v.is_null()) {
                tracing::warn!(
                    map_id = map.map_id(),
                    field = %association.name,
                    "Association replaced a scalar field of the same name"
                );
            }
        }

        for collection in map.collections() {
            let target = self.maps.require(&collection.map_id)?;
            let (list, replaced) = record.list_mut_or_default(&collection.name);
            if replaced {
                tracing::warn!(
                    map_id = map.map_id(),
                    field = %collection.name,
                    "Collection replaced a non-list field of the same name"
                );
            }
            self.inject_into_list(row, list, target, &collection.column_prefix)?;
        }

        Ok(())
    }

    /// Infer properties for a definition without explicit ones.
    ///
    /// Inference happens on the first row that reaches the definition and
    /// uses that row's columns and active prefix; later rows reuse it.
    fn infer_if_needed(&mut self, row: &Row, map: &'a ResultMap, column_prefix: &str) {
        if map.explicit_properties().is_some() || self.inferred.contains_key(map.map_id()) {
            return;
        }
        let inferred = infer_properties(&row.column_info(), column_prefix);
        tracing::trace!(
            map_id = map.map_id(),
            column_prefix,
            properties = inferred.len(),
            "Inferred properties"
        );
        self.inferred.insert(map.map_id(), inferred);
    }
}

/// Copy one scalar column into `record` unless the field is already set.
fn copy_scalar(row: &Row, record: &mut Record, property: &PropertyMapping, column_prefix: &str) {
    if record.contains(&property.name) {
        return;
    }
    let value = column_value(row, column_prefix, &property.column).clone();
    record.set_value_if_absent(&property.name, value);
}
