//! Hash index implementation for Tabula.
//!
//! Answers equality and membership lookups (`=`, `!=`, `in`, `not in`) with a
//! single bucket probe per key.

use crate::ordered_set::OrderedSet;
use crate::stats::IndexStats;
use crate::traits::Index;
use core::hash::Hash;
use hashbrown::HashMap;
use tabula_core::RowId;

/// A hash-based index for O(1) point queries.
///
/// Each key maps to the insertion-ordered bucket of rows holding it. Range
/// queries are not supported efficiently; use `BTreeIndex` for those.
#[derive(Clone, Debug)]
pub struct HashIndex<K> {
    /// The underlying map from keys to row buckets.
    map: HashMap<K, OrderedSet<RowId>>,
    /// Statistics for this index.
    stats: IndexStats,
}

impl<K: Eq + Hash + Clone> HashIndex<K> {
    /// Creates a new hash index.
    pub fn new() -> Self {
        Self {
            map: HashMap::new(),
            stats: IndexStats::new(),
        }
    }

    /// Returns the statistics for this index.
    pub fn stats(&self) -> &IndexStats {
        &self.stats
    }

    /// Iterates the rows of a key in insertion order.
    pub fn rows<'a>(&'a self, key: &K) -> impl Iterator<Item = RowId> + 'a {
        self.map
            .get(key)
            .into_iter()
            .flat_map(|bucket| bucket.iter().copied())
    }
}

impl<K: Eq + Hash + Clone> Default for HashIndex<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Eq + Hash + Clone> Index<K> for HashIndex<K> {
    fn add(&mut self, key: K, row: RowId) -> bool {
        let bucket = self.map.entry(key).or_default();
        let new_key = bucket.is_empty();
        if !bucket.insert(row) {
            return false;
        }
        self.stats.add_row(new_key);
        true
    }

    fn remove(&mut self, key: &K, row: RowId) -> bool {
        let Some(bucket) = self.map.get_mut(key) else {
            return false;
        };
        if !bucket.remove(&row) {
            return false;
        }
        let emptied = bucket.is_empty();
        if emptied {
            self.map.remove(key);
        }
        self.stats.remove_row(emptied);
        true
    }

    fn get(&self, key: &K) -> Option<&OrderedSet<RowId>> {
        self.map.get(key)
    }

    fn len(&self) -> usize {
        self.stats.total_rows()
    }

    fn distinct_keys(&self) -> usize {
        self.stats.distinct_keys()
    }

    fn clear(&mut self) {
        self.map.clear();
        self.stats.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(index: &HashIndex<i32>, key: i32) -> Vec<RowId> {
        index.rows(&key).collect()
    }

    #[test]
    fn test_hash_index_buckets() {
        let mut index: HashIndex<i32> = HashIndex::new();

        assert!(index.add(1, 100));
        assert!(index.add(1, 101));
        assert!(index.add(2, 200));

        assert_eq!(rows(&index, 1), vec![100, 101]);
        assert_eq!(rows(&index, 2), vec![200]);
        assert!(rows(&index, 3).is_empty());
    }

    #[test]
    fn test_hash_index_add_is_idempotent() {
        let mut index: HashIndex<i32> = HashIndex::new();
        assert!(index.add(1, 100));
        assert!(!index.add(1, 100));
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn test_hash_index_remove_specific_value() {
        let mut index: HashIndex<i32> = HashIndex::new();

        index.add(1, 100);
        index.add(1, 200);
        index.add(1, 300);

        assert!(index.remove(&1, 200));
        assert_eq!(rows(&index, 1), vec![100, 300]);
        assert_eq!(index.len(), 2);
    }

    #[test]
    fn test_hash_index_remove_nonexistent() {
        let mut index: HashIndex<i32> = HashIndex::new();
        index.add(1, 100);

        assert!(!index.remove(&999, 100));
        assert!(!index.remove(&1, 999));
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn test_hash_index_empty_bucket_dropped() {
        let mut index: HashIndex<i32> = HashIndex::new();
        index.add(1, 100);
        index.remove(&1, 100);

        assert!(!index.contains_key(&1));
        assert!(index.get(&1).is_none());
        assert_eq!(index.distinct_keys(), 0);
    }

    #[test]
    fn test_hash_index_stats() {
        let mut index: HashIndex<i32> = HashIndex::new();

        index.add(1, 100);
        index.add(1, 101);
        index.add(2, 200);

        assert_eq!(index.stats().total_rows(), 3);
        assert_eq!(index.distinct_keys(), 2);

        index.remove(&1, 100);
        assert_eq!(index.stats().total_rows(), 2);

        index.clear();
        assert!(index.is_empty());
        assert_eq!(index.distinct_keys(), 0);
    }

    #[test]
    fn test_hash_index_large_scale() {
        let mut index: HashIndex<i32> = HashIndex::new();

        for i in 0..1000 {
            index.add(i, i as u64);
        }
        assert_eq!(index.len(), 1000);

        for i in (0..1000).step_by(2) {
            index.remove(&i, i as u64);
        }
        assert_eq!(index.len(), 500);
        assert_eq!(index.distinct_keys(), 500);
        assert!(index.contains_key(&1));
        assert!(!index.contains_key(&0));
    }
}
