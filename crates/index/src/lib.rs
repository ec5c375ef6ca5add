//! Tabula Index - Secondary indexes for the Tabula store.
//!
//! This crate provides the index structures the store maintains on commit
//! and the query engine consults while filtering:
//!
//! - `HashIndex`: O(1) equality and membership lookups
//! - `BTreeIndex`: ordered bound scans for range comparisons
//! - `OrderedSet`: insertion-ordered bucket both index kinds share
//! - `IndexManager`: per-table bookkeeping, lookups and selectivity estimates
//!
//! # Example
//!
//! ```rust
//! use tabula_index::{BTreeIndex, HashIndex, Index, KeyRange, RangeIndex};
//!
//! let mut btree: BTreeIndex<i32> = BTreeIndex::new();
//! btree.add(10, 100);
//! btree.add(20, 200);
//! btree.add(5, 50);
//!
//! // Range query
//! let range = KeyRange::lower_bound(10, false);
//! assert_eq!(btree.get_range(&range), vec![100, 200]);
//!
//! // Point query
//! let mut hash: HashIndex<i32> = HashIndex::new();
//! hash.add(10, 100);
//! hash.add(10, 101);
//! assert_eq!(hash.bucket_len(&10), 2);
//! ```

pub mod btree;
pub mod hash;
pub mod manager;
pub mod ordered_set;
pub mod stats;
pub mod traits;

pub use btree::BTreeIndex;
pub use hash::HashIndex;
pub use manager::{ColumnIndex, IndexLookup, IndexManager, TableIndexes};
pub use ordered_set::OrderedSet;
pub use stats::IndexStats;
pub use traits::{Index, KeyRange, RangeIndex};
