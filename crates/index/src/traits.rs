//! Index trait definitions for Tabula.
//!
//! This module defines the `Index` trait both index kinds satisfy, the
//! `RangeIndex` extension for ordered scans, and the `KeyRange` used to
//! describe a scan.

use crate::ordered_set::OrderedSet;
use core::ops::Bound;
use tabula_core::RowId;

/// A key range for index queries.
#[derive(Clone, Debug, PartialEq)]
pub enum KeyRange<K> {
    /// All keys
    All,
    /// A single key (equality)
    Only(K),
    /// Keys >= lower bound
    LowerBound { value: K, exclusive: bool },
    /// Keys <= upper bound
    UpperBound { value: K, exclusive: bool },
    /// Keys between lower and upper bounds
    Bound {
        lower: K,
        upper: K,
        lower_exclusive: bool,
        upper_exclusive: bool,
    },
}

impl<K: Ord> KeyRange<K> {
    /// Creates a range with a lower bound.
    pub fn lower_bound(value: K, exclusive: bool) -> Self {
        KeyRange::LowerBound { value, exclusive }
    }

    /// Creates a range with an upper bound.
    pub fn upper_bound(value: K, exclusive: bool) -> Self {
        KeyRange::UpperBound { value, exclusive }
    }

    /// Creates a range with both bounds.
    pub fn bound(lower: K, upper: K, lower_exclusive: bool, upper_exclusive: bool) -> Self {
        KeyRange::Bound {
            lower,
            upper,
            lower_exclusive,
            upper_exclusive,
        }
    }

    /// Returns true if no key can fall inside this range.
    pub fn is_empty(&self) -> bool {
        match self {
            KeyRange::Bound {
                lower,
                upper,
                lower_exclusive,
                upper_exclusive,
            } => lower > upper || (lower == upper && (*lower_exclusive || *upper_exclusive)),
            _ => false,
        }
    }

    /// Converts the range to the bound pair ordered maps scan with.
    pub fn as_bounds(&self) -> (Bound<&K>, Bound<&K>) {
        fn edge<K>(value: &K, exclusive: bool) -> Bound<&K> {
            if exclusive {
                Bound::Excluded(value)
            } else {
                Bound::Included(value)
            }
        }

        match self {
            KeyRange::All => (Bound::Unbounded, Bound::Unbounded),
            KeyRange::Only(k) => (Bound::Included(k), Bound::Included(k)),
            KeyRange::LowerBound { value, exclusive } => (edge(value, *exclusive), Bound::Unbounded),
            KeyRange::UpperBound { value, exclusive } => (Bound::Unbounded, edge(value, *exclusive)),
            KeyRange::Bound {
                lower,
                upper,
                lower_exclusive,
                upper_exclusive,
            } => (edge(lower, *lower_exclusive), edge(upper, *upper_exclusive)),
        }
    }
}

/// Core trait for all index implementations.
///
/// An index maps a key to the ordered bucket of rows holding that key.
/// Indexes are never unique; uniqueness of primary keys is enforced by the
/// store.
pub trait Index<K> {
    /// Adds a row under a key. Returns false if it was already there.
    fn add(&mut self, key: K, row: RowId) -> bool;

    /// Removes a row from a key's bucket. Returns false if it was absent.
    fn remove(&mut self, key: &K, row: RowId) -> bool;

    /// Gets the bucket of a key.
    fn get(&self, key: &K) -> Option<&OrderedSet<RowId>>;

    /// Returns the number of rows stored under a key.
    fn bucket_len(&self, key: &K) -> usize {
        self.get(key).map_or(0, OrderedSet::len)
    }

    /// Checks if the index contains the given key.
    fn contains_key(&self, key: &K) -> bool {
        self.bucket_len(key) > 0
    }

    /// Returns the number of rows in the index.
    fn len(&self) -> usize;

    /// Returns true if the index is empty.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the number of distinct keys.
    fn distinct_keys(&self) -> usize;

    /// Clears all entries from the index.
    fn clear(&mut self);
}

/// Trait for indexes that support range queries.
pub trait RangeIndex<K>: Index<K> {
    /// Iterates the buckets whose key falls inside the range, in key order.
    fn range_buckets<'a>(
        &'a self,
        range: &'a KeyRange<K>,
    ) -> Box<dyn Iterator<Item = (&'a K, &'a OrderedSet<RowId>)> + 'a>;

    /// Gets all row IDs within the given key range. Ties within a key keep
    /// insertion order.
    fn get_range(&self, range: &KeyRange<K>) -> Vec<RowId> {
        self.range_buckets(range)
            .flat_map(|(_, rows)| rows.iter().copied())
            .collect()
    }
}
