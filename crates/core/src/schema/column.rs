//! Column definition for the Tabula schema.

use crate::types::DataType;
use crate::value::Value;
use core::fmt;
use std::sync::Arc;

/// Client-side default of a column, applied at commit to fields left null.
#[derive(Clone)]
pub enum ColumnDefault {
    /// A fixed value.
    Value(Value),
    /// A generator invoked once per inserted record.
    Generator(Arc<dyn Fn() -> Value + Send + Sync>),
}

impl ColumnDefault {
    /// Produces the default value.
    pub fn produce(&self) -> Value {
        match self {
            ColumnDefault::Value(v) => v.clone(),
            ColumnDefault::Generator(f) => f(),
        }
    }
}

impl fmt::Debug for ColumnDefault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnDefault::Value(v) => f.debug_tuple("Value").field(v).finish(),
            ColumnDefault::Generator(_) => f.write_str("Generator(..)"),
        }
    }
}

/// A column definition in a table schema.
#[derive(Clone, Debug)]
pub struct Column {
    /// Column name.
    name: String,
    /// Data type of the column.
    data_type: DataType,
    /// Whether this column allows null values.
    nullable: bool,
    /// Client-side default.
    default: Option<ColumnDefault>,
    /// Server-side default, applied after the client-side default.
    server_default: Option<Value>,
    /// Column position in the table (0-based).
    index: usize,
}

impl Column {
    /// Creates a new column definition.
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
            nullable: data_type.is_nullable_by_default(),
            default: None,
            server_default: None,
            index: 0,
        }
    }

    /// Sets whether this column is nullable.
    pub fn nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }

    /// Sets a fixed default value for this column.
    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(ColumnDefault::Value(value.into()));
        self
    }

    /// Sets a default generator for this column.
    pub fn default_with<F>(mut self, generator: F) -> Self
    where
        F: Fn() -> Value + Send + Sync + 'static,
    {
        self.default = Some(ColumnDefault::Generator(Arc::new(generator)));
        self
    }

    /// Sets the server-side default for this column.
    pub fn server_default(mut self, value: impl Into<Value>) -> Self {
        self.server_default = Some(value.into());
        self
    }

    pub(crate) fn with_index(mut self, index: usize) -> Self {
        self.index = index;
        self
    }

    /// Returns the column name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the data type.
    #[inline]
    pub fn data_type(&self) -> DataType {
        self.data_type
    }

    /// Returns whether this column is nullable.
    #[inline]
    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    /// Returns the client-side default, if any.
    pub fn default(&self) -> Option<&ColumnDefault> {
        self.default.as_ref()
    }

    /// Returns the server-side default, if any.
    pub fn get_server_default(&self) -> Option<&Value> {
        self.server_default.as_ref()
    }

    /// Resolves the value an unset field takes on insert: the client default
    /// first, then the server default. Returns None if neither applies.
    pub fn fill_value(&self) -> Option<Value> {
        self.default
            .as_ref()
            .map(ColumnDefault::produce)
            .filter(|v| !v.is_null())
            .or_else(|| self.server_default.clone())
    }

    /// Returns the column position.
    #[inline]
    pub fn index(&self) -> usize {
        self.index
    }

    /// Returns whether this column can be used as an index key.
    #[inline]
    pub fn is_indexable(&self) -> bool {
        self.data_type.is_indexable()
    }
}

impl PartialEq for Column {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.data_type == other.data_type
    }
}
