//! Row structure for the Tabula store.
//!
//! A `Row` is a record of one table: its field values by column position and
//! a process-unique handle used for identity inside the store and indexes.

use crate::value::Value;
use std::sync::atomic::{AtomicU64, Ordering};

/// Unique identifier for a row.
pub type RowId = u64;

/// Global row ID counter for generating unique row IDs.
static NEXT_ROW_ID: AtomicU64 = AtomicU64::new(1);

/// Gets the next unique row ID.
pub fn next_row_id() -> RowId {
    NEXT_ROW_ID.fetch_add(1, Ordering::Relaxed)
}

/// A record of a table.
#[derive(Clone, Debug)]
pub struct Row {
    /// Unique identifier for this row.
    id: RowId,
    /// Values stored in this row, indexed by column position.
    values: Vec<Value>,
}

impl Row {
    /// Creates a new row with an automatically assigned ID.
    pub fn new(values: Vec<Value>) -> Self {
        Self {
            id: next_row_id(),
            values,
        }
    }

    /// Creates a row with `width` null fields.
    pub fn empty(width: usize) -> Self {
        Self::new(vec![Value::Null; width])
    }

    /// Returns the row ID.
    #[inline]
    pub fn id(&self) -> RowId {
        self.id
    }

    /// Returns a reference to the values.
    #[inline]
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Gets a value at the given column index.
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    /// Sets a value at the given column index and returns the previous one.
    /// Returns None when the index is out of range.
    pub fn replace(&mut self, index: usize, value: Value) -> Option<Value> {
        self.values
            .get_mut(index)
            .map(|slot| core::mem::replace(slot, value))
    }

    /// Sets a value at the given column index.
    pub fn set(&mut self, index: usize, value: Value) -> bool {
        self.replace(index, value).is_some()
    }

    /// Returns the number of values in this row.
    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if this row has no values.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl PartialEq for Row {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.values == other.values
    }
}
