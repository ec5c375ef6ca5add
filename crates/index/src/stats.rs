//! Index statistics for Tabula.
//!
//! Counters kept alongside every index, read by the selectivity estimator.

/// Statistics for an index.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct IndexStats {
    /// Total number of rows in the index.
    total_rows: usize,
    /// Number of distinct keys with at least one row.
    distinct_keys: usize,
}

impl IndexStats {
    /// Creates a new empty stats instance.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the total number of rows.
    #[inline]
    pub fn total_rows(&self) -> usize {
        self.total_rows
    }

    /// Returns the number of distinct keys.
    #[inline]
    pub fn distinct_keys(&self) -> usize {
        self.distinct_keys
    }

    /// Records one row added under a key. `new_key` is true if the key had
    /// no rows before.
    pub fn add_row(&mut self, new_key: bool) {
        self.total_rows += 1;
        if new_key {
            self.distinct_keys += 1;
        }
    }

    /// Records one row removed from a key. `key_emptied` is true if the key
    /// has no rows left.
    pub fn remove_row(&mut self, key_emptied: bool) {
        self.total_rows = self.total_rows.saturating_sub(1);
        if key_emptied {
            self.distinct_keys = self.distinct_keys.saturating_sub(1);
        }
    }

    /// Average rows per key, the estimate used when no exact bucket applies.
    pub fn rows_per_key(&self) -> f64 {
        if self.distinct_keys == 0 {
            0.0
        } else {
            self.total_rows as f64 / self.distinct_keys as f64
        }
    }

    /// Resets all counters.
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}
