//! Error types for the Tabula store.

use crate::value::Value;
use thiserror::Error;

/// Result type alias for Tabula operations.
pub type Result<T> = core::result::Result<T, Error>;

/// Error kinds surfaced to the integration layer.
///
/// `SchemaViolation` and `UnsupportedPredicate` are raised eagerly, before
/// anything is buffered or mutated. The remaining kinds can only be detected
/// while committing.
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid schema, or a reference to an unknown table or column.
    #[error("schema violation: {message}")]
    SchemaViolation { message: String },

    /// Commit-time insert whose primary key already exists.
    #[error("duplicate primary key {key:?} in table {table}")]
    DuplicateKey { table: String, key: Value },

    /// Commit-time update or delete of a primary key that is not present.
    #[error("no record with primary key {key:?} in table {table}")]
    MissingRecord { table: String, key: Value },

    /// A predicate node, operator or function the engine does not implement.
    #[error("unsupported predicate: {message}")]
    UnsupportedPredicate { message: String },

    /// A non-nullable column is still null after defaults were applied.
    #[error("column {table}.{column} cannot be null")]
    NullConstraint { table: String, column: String },

    /// The auto-increment counter of a table has no next key.
    #[error("auto-increment keys exhausted in table {table}")]
    KeyExhausted { table: String },
}

impl Error {
    /// Creates a schema violation error.
    pub fn schema(message: impl Into<String>) -> Self {
        Error::SchemaViolation {
            message: message.into(),
        }
    }

    /// Creates a schema violation for an unknown table.
    pub fn unknown_table(table: &str) -> Self {
        Error::schema(format!("unknown table: {}", table))
    }

    /// Creates a schema violation for an unknown column.
    pub fn unknown_column(table: &str, column: &str) -> Self {
        Error::schema(format!("unknown column {} in table {}", column, table))
    }

    /// Creates a duplicate key error.
    pub fn duplicate_key(table: impl Into<String>, key: Value) -> Self {
        Error::DuplicateKey {
            table: table.into(),
            key,
        }
    }

    /// Creates a missing record error.
    pub fn missing_record(table: impl Into<String>, key: Value) -> Self {
        Error::MissingRecord {
            table: table.into(),
            key,
        }
    }

    /// Creates an unsupported predicate error.
    pub fn unsupported(message: impl Into<String>) -> Self {
        Error::UnsupportedPredicate {
            message: message.into(),
        }
    }

    /// Creates a null constraint error.
    pub fn null_constraint(table: impl Into<String>, column: impl Into<String>) -> Self {
        Error::NullConstraint {
            table: table.into(),
            column: column.into(),
        }
    }

    /// Creates a key exhausted error.
    pub fn key_exhausted(table: impl Into<String>) -> Self {
        Error::KeyExhausted {
            table: table.into(),
        }
    }
}
