//! Data type definitions for the Tabula store.

/// Supported column types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DataType {
    /// Boolean type (true/false)
    Boolean,
    /// 64-bit signed integer
    Integer,
    /// 64-bit floating point number
    Float,
    /// UTF-8 string
    String,
    /// Calendar date stored as days since the Unix epoch
    Date,
    /// Date and time stored as Unix timestamp (milliseconds)
    DateTime,
    /// Binary data
    Bytes,
    /// Structured value (nested objects and arrays)
    Json,
}

impl DataType {
    /// Returns whether this type is nullable by default.
    pub fn is_nullable_by_default(&self) -> bool {
        matches!(self, DataType::Bytes | DataType::Json)
    }

    /// Returns whether this type can be used as an index key.
    pub fn is_indexable(&self) -> bool {
        !matches!(self, DataType::Bytes | DataType::Json)
    }

    /// Returns whether values of this type can be auto-incremented.
    pub fn is_auto_increment(&self) -> bool {
        matches!(self, DataType::Integer)
    }
}
