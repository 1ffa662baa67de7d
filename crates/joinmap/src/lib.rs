//! joinmap - map flat SQL join result sets into nested object graphs.
//!
//! A query that joins a parent table with its children returns one flat row
//! per child, repeating the parent's columns on every row. joinmap folds
//! those rows back into nested objects, driven by a set of mapping
//! definitions:
//!
//! - `idProperty` columns identify an object and deduplicate it across rows
//! - `properties` become scalar fields (inferred from the columns when omitted)
//! - `associations` become a single nested object, or null
//! - `collections` become a list of nested objects, in first-occurrence order
//!
//! Nested entities are read from columns carrying their own prefix, such as
//! `child_id` and `child_name` for a collection prefixed with `child_`.
//!
//! # Quick Start
//!
//! ```
//! use joinmap::prelude::*;
//!
//! let maps = MapSet::from_json(r#"[
//!     {"mapId": "parent", "properties": ["name"],
//!      "collections": [{"name": "children", "mapId": "child", "columnPrefix": "child_"}]},
//!     {"mapId": "child", "properties": ["name"]}
//! ]"#).unwrap();
//!
//! let rows = vec![
//!     Row::from_pairs([("id", Value::Int(1)), ("name", "A".into()),
//!                      ("child_id", Value::Int(10)), ("child_name", "X".into())]),
//!     Row::from_pairs([("id", Value::Int(1)), ("name", "A".into()),
//!                      ("child_id", Value::Int(11)), ("child_name", "Y".into())]),
//!     Row::from_pairs([("id", Value::Int(2)), ("name", "B".into()),
//!                      ("child_id", Value::Null), ("child_name", Value::Null)]),
//! ];
//!
//! let parents = map_collection(&rows, &maps, "parent", "").unwrap();
//! assert_eq!(parents.len(), 2);
//! assert_eq!(parents[0].list("children").unwrap().len(), 2);
//! assert!(parents[1].list("children").unwrap().is_empty());
//!
//! let first = map_single(&rows, &maps, "parent", "", true).unwrap().unwrap();
//! assert_eq!(first.to_json()["children"][1]["name"], "Y");
//! ```
//!
//! # Errors
//!
//! Configuration problems (duplicate or unknown mapIds, reference cycles,
//! conflicting field names) are reported when a [`MapSet`] is built.
//! [`map_single`] fails with [`Error::NotFound`] when a required result is
//! empty.

pub mod config;
pub mod map;
pub mod map_set;
pub mod materialize;
pub mod resolve;

pub use joinmap_core::{
    ColumnInfo, ConfigError, ConfigErrorKind, DEFAULT_NOT_FOUND_MESSAGE, Error, Field, FromValue,
    IdentityKey, NotFoundError, Record, RecordList, Result, Row, TypeError, Value,
};

pub use config::{IdPropertySpec, PropertySpec, RelationConfig, ResultMapConfig};
pub use map::{Factory, PropertyMapping, Relation, ResultMap};
pub use map_set::{MapSet, MapSetBuilder};
pub use materialize::{Mapper, map_collection, map_single};

/// Common imports.
pub mod prelude {
    pub use crate::{
        Error, Field, MapSet, Mapper, Record, Result, ResultMap, Row, Value, map_collection,
        map_single,
    };
}
