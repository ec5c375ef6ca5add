//! Ordered range index for Tabula.
//!
//! Keys are kept in a `BTreeMap`, so bound scans (`<`, `<=`, `>`, `>=`,
//! `between`) walk only the buckets inside the range, in key order.

use crate::ordered_set::OrderedSet;
use crate::stats::IndexStats;
use crate::traits::{Index, KeyRange, RangeIndex};
use std::collections::BTreeMap;
use tabula_core::RowId;

/// An ordered index for range queries.
#[derive(Clone, Debug)]
pub struct BTreeIndex<K> {
    /// Ordered map from keys to row buckets.
    tree: BTreeMap<K, OrderedSet<RowId>>,
    /// Statistics for this index.
    stats: IndexStats,
}

impl<K: Ord + Clone> BTreeIndex<K> {
    /// Creates a new range index.
    pub fn new() -> Self {
        Self {
            tree: BTreeMap::new(),
            stats: IndexStats::new(),
        }
    }

    /// Returns the statistics for this index.
    pub fn stats(&self) -> &IndexStats {
        &self.stats
    }
}

impl<K: Ord + Clone> Default for BTreeIndex<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Ord + Clone> Index<K> for BTreeIndex<K> {
    fn add(&mut self, key: K, row: RowId) -> bool {
        let bucket = self.tree.entry(key).or_default();
        let new_key = bucket.is_empty();
        if !bucket.insert(row) {
            return false;
        }
        self.stats.add_row(new_key);
        true
    }

    fn remove(&mut self, key: &K, row: RowId) -> bool {
        let Some(bucket) = self.tree.get_mut(key) else {
            return false;
        };
        if !bucket.remove(&row) {
            return false;
        }
        let emptied = bucket.is_empty();
        if emptied {
            self.tree.remove(key);
        }
        self.stats.remove_row(emptied);
        true
    }

    fn get(&self, key: &K) -> Option<&OrderedSet<RowId>> {
        self.tree.get(key)
    }

    fn len(&self) -> usize {
        self.stats.total_rows()
    }

    fn distinct_keys(&self) -> usize {
        self.stats.distinct_keys()
    }

    fn clear(&mut self) {
        self.tree.clear();
        self.stats.clear();
    }
}

impl<K: Ord + Clone> RangeIndex<K> for BTreeIndex<K> {
    fn range_buckets<'a>(
        &'a self,
        range: &'a KeyRange<K>,
    ) -> Box<dyn Iterator<Item = (&'a K, &'a OrderedSet<RowId>)> + 'a> {
        // BTreeMap::range panics on inverted bounds.
        if range.is_empty() {
            return Box::new(core::iter::empty());
        }
        Box::new(self.tree.range::<K, _>(range.as_bounds()))
    }
}
