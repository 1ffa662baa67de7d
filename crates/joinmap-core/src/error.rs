//! Error types for mapping operations.

use std::fmt;

/// Message carried by [`NotFoundError`] unless the caller supplies one.
pub const DEFAULT_NOT_FOUND_MESSAGE: &str = "EmptyResponse";

/// The primary error type for all mapping operations.
#[derive(Debug)]
pub enum Error {
    /// A single result was required but the rows produced none
    NotFound(NotFoundError),
    /// Mapping configuration is invalid or references unknown maps
    Config(ConfigError),
    /// Typed access to a mapped value failed
    Type(TypeError),
    /// Serialization/deserialization errors
    Serde(String),
}

/// Raised by the single-object entry point when nothing was mapped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotFoundError {
    pub message: String,
}

impl NotFoundError {
    /// Create a not-found error with a caller-supplied message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl Default for NotFoundError {
    fn default() -> Self {
        Self::new(DEFAULT_NOT_FOUND_MESSAGE)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError {
    pub kind: ConfigErrorKind,
    /// The mapId the problem was found on, when there is one.
    pub map_id: Option<String>,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigErrorKind {
    /// Two definitions share a mapId
    DuplicateMap,
    /// A mapId is referenced but never defined
    UnknownMap,
    /// Associations/collections reference each other in a loop
    Cycle,
    /// Two fields of one definition claim the same name
    FieldConflict,
    /// An idProperty list with no entries
    EmptyIdProperty,
    /// The configuration document could not be parsed
    Parse,
}

impl ConfigError {
    pub fn new(kind: ConfigErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            map_id: None,
            message: message.into(),
        }
    }

    /// Attach the mapId the error refers to.
    #[must_use]
    pub fn on_map(mut self, map_id: impl Into<String>) -> Self {
        self.map_id = Some(map_id.into());
        self
    }
}

#[derive(Debug)]
pub struct TypeError {
    pub expected: &'static str,
    pub actual: String,
    /// Record field the value was read from.
    pub field: Option<String>,
}

impl Error {
    /// Is this the not-found signal of the single-object entry point?
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }

    /// Get the configuration error kind, if this is a configuration error.
    pub fn config_kind(&self) -> Option<ConfigErrorKind> {
        match self {
            Error::Config(e) => Some(e.kind),
            _ => None,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::NotFound(e) => write!(f, "{}", e.message),
            Error::Config(e) => {
                if let Some(map_id) = &e.map_id {
                    write!(f, "Configuration error in map '{}': {}", map_id, e.message)
                } else {
                    write!(f, "Configuration error: {}", e.message)
                }
            }
            Error::Type(e) => {
                if let Some(field) = &e.field {
                    write!(
                        f,
                        "Type error in field '{}': expected {}, found {}",
                        field, e.expected, e.actual
                    )
                } else {
                    write!(f, "Type error: expected {}, found {}", e.expected, e.actual)
                }
            }
            Error::Serde(msg) => write!(f, "Serialization error: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

impl fmt::Display for NotFoundError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl fmt::Display for TypeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(field) = &self.field {
            write!(
                f,
                "expected {} for field '{}', found {}",
                self.expected, field, self.actual
            )
        } else {
            write!(f, "expected {}, found {}", self.expected, self.actual)
        }
    }
}

impl From<NotFoundError> for Error {
    fn from(err: NotFoundError) -> Self {
        Error::NotFound(err)
    }
}

impl From<ConfigError> for Error {
    fn from(err: ConfigError) -> Self {
        Error::Config(err)
    }
}

impl From<TypeError> for Error {
    fn from(err: TypeError) -> Self {
        Error::Type(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serde(err.to_string())
    }
}

/// Result type alias for mapping operations.
pub type Result<T> = std::result::Result<T, Error>;
