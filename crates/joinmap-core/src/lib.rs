//! Core types for joinmap.
//!
//! This crate provides the data the mapper reads and produces:
//!
//! - `Value` for dynamically typed column values
//! - `Row` for one row of a flat, joined result set
//! - `Record` for the nested objects built from those rows
//! - `IdentityKey` for deduplicating records by identity columns
//! - `Error` and `Result`

pub mod error;
pub mod identity;
pub mod record;
pub mod row;
pub mod value;

pub use error::{
    ConfigError, ConfigErrorKind, DEFAULT_NOT_FOUND_MESSAGE, Error, NotFoundError, Result,
    TypeError,
};
pub use identity::{IdentityKey, is_missing};
pub use record::{Field, Record, RecordList};
pub use row::{ColumnInfo, FromValue, Row};
pub use value::Value;
