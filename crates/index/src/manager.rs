//! Per-table index bookkeeping.
//!
//! The `IndexManager` owns one `HashIndex` and one `BTreeIndex` for every
//! indexed column of every registered table: the primary key plus each
//! declared single-column index. The store keeps it in step with committed
//! data; queries ask it for candidate rows and selectivity estimates.

use crate::btree::BTreeIndex;
use crate::hash::HashIndex;
use crate::ordered_set::OrderedSet;
use crate::traits::{Index, KeyRange, RangeIndex};
use hashbrown::{HashMap, HashSet};
use tabula_core::schema::Table;
use tabula_core::{CompareOp, Row, RowId, Value};

static NULL: Value = Value::Null;

/// Result of answering a comparison from an index.
#[derive(Clone, Debug, PartialEq)]
pub enum IndexLookup {
    /// Exactly these rows match, in index order.
    Include(Vec<RowId>),
    /// Every candidate except these rows matches.
    Exclude(HashSet<RowId>),
}

/// Both index kinds over one column.
#[derive(Clone, Debug)]
pub struct ColumnIndex {
    name: String,
    position: usize,
    hash: HashIndex<Value>,
    range: BTreeIndex<Value>,
}

impl ColumnIndex {
    fn new(name: &str, position: usize) -> Self {
        Self {
            name: name.to_string(),
            position,
            hash: HashIndex::new(),
            range: BTreeIndex::new(),
        }
    }

    /// Returns the column name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the column position in the table.
    pub fn position(&self) -> usize {
        self.position
    }

    /// Returns the equality index.
    pub fn hash(&self) -> &HashIndex<Value> {
        &self.hash
    }

    /// Returns the range index.
    pub fn range(&self) -> &BTreeIndex<Value> {
        &self.range
    }

    fn add(&mut self, key: &Value, row: RowId) {
        self.hash.add(key.clone(), row);
        self.range.add(key.clone(), row);
    }

    fn remove(&mut self, key: &Value, row: RowId) {
        self.hash.remove(key, row);
        self.range.remove(key, row);
    }

    fn key_of<'a>(&self, row: &'a Row) -> &'a Value {
        row.get(self.position).unwrap_or(&NULL)
    }

    /// Rows of every listed key, deduplicated, in key then bucket order.
    fn union_of(&self, keys: &[Value]) -> OrderedSet<RowId> {
        keys.iter()
            .flat_map(|k| self.hash.rows(k))
            .collect()
    }

    fn lookup(&self, op: CompareOp, operand: &[Value]) -> Option<IndexLookup> {
        let lookup = match (op, operand) {
            (CompareOp::Eq, [v]) => IndexLookup::Include(self.hash.rows(v).collect()),
            (CompareOp::Ne, [v]) => IndexLookup::Exclude(self.hash.rows(v).collect()),
            (CompareOp::In, keys) => {
                IndexLookup::Include(self.union_of(keys).iter().copied().collect())
            }
            (CompareOp::NotIn, keys) => {
                IndexLookup::Exclude(self.union_of(keys).iter().copied().collect())
            }
            (CompareOp::Lt | CompareOp::Le | CompareOp::Gt | CompareOp::Ge, [v]) => {
                match range_for(op, v) {
                    Some(range) => IndexLookup::Include(self.range.get_range(&range)),
                    None => IndexLookup::Include(Vec::new()),
                }
            }
            (CompareOp::Between, [lo, hi]) => {
                IndexLookup::Include(self.between(lo, hi).collect())
            }
            (CompareOp::NotBetween, [lo, hi]) => {
                IndexLookup::Exclude(self.between(lo, hi).collect())
            }
            _ => return None,
        };
        Some(lookup)
    }

    fn between(&self, lo: &Value, hi: &Value) -> Box<dyn Iterator<Item = RowId> + '_> {
        if lo.is_null() || hi.is_null() {
            return Box::new(core::iter::empty());
        }
        let range = KeyRange::bound(lo.clone(), hi.clone(), false, false);
        Box::new(self.range.get_range(&range).into_iter())
    }

    fn selectivity(&self, op: CompareOp, operand: &[Value], total: usize) -> f64 {
        let matched = || -> usize { operand.iter().map(|v| self.hash.bucket_len(v)).sum() };
        match (op, operand) {
            (CompareOp::Eq, [v]) => self.hash.bucket_len(v) as f64,
            (CompareOp::Ne, [v]) => total.saturating_sub(self.hash.bucket_len(v)) as f64,
            (CompareOp::In, _) => matched() as f64,
            (CompareOp::NotIn, _) => total.saturating_sub(matched()) as f64,
            _ => self.hash.stats().rows_per_key(),
        }
    }
}

/// Builds the scan range of an ordering comparison. Null keys sort lowest
/// and never satisfy an ordering comparison, so every range starts above
/// Null. Returns None when nothing can match.
fn range_for(op: CompareOp, v: &Value) -> Option<KeyRange<Value>> {
    if v.is_null() {
        return None;
    }
    let range = match op {
        CompareOp::Gt => KeyRange::lower_bound(v.clone(), true),
        CompareOp::Ge => KeyRange::lower_bound(v.clone(), false),
        CompareOp::Lt => KeyRange::bound(Value::Null, v.clone(), true, true),
        CompareOp::Le => KeyRange::bound(Value::Null, v.clone(), true, false),
        _ => return None,
    };
    Some(range)
}

/// Indexes of a single table.
#[derive(Clone, Debug, Default)]
pub struct TableIndexes {
    columns: Vec<ColumnIndex>,
}

impl TableIndexes {
    /// Returns the index over a column, if the column is indexed.
    pub fn column(&self, name: &str) -> Option<&ColumnIndex> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Iterates the indexed columns.
    pub fn columns(&self) -> impl Iterator<Item = &ColumnIndex> {
        self.columns.iter()
    }
}

/// Owner of every table's indexes.
#[derive(Clone, Debug, Default)]
pub struct IndexManager {
    tables: HashMap<String, TableIndexes>,
}

impl IndexManager {
    /// Creates an empty manager.
    pub fn new() -> Self {
        Self::default()
    }

    /// Discovers the indexed columns of a table: the primary key and every
    /// declared single-column index. Registering a table again resets its
    /// indexes.
    pub fn register_table(&mut self, table: &Table) {
        let columns = table
            .indexed_columns()
            .map(|c| ColumnIndex::new(c.name(), c.index()))
            .collect();
        self.tables
            .insert(table.name().to_string(), TableIndexes { columns });
    }

    /// Returns the indexes of a table.
    pub fn table(&self, table: &str) -> Option<&TableIndexes> {
        self.tables.get(table)
    }

    /// Returns the index over a column, if any.
    pub fn column(&self, table: &str, column: &str) -> Option<&ColumnIndex> {
        self.tables.get(table)?.column(column)
    }

    /// Returns true if the column is indexed.
    pub fn is_indexed(&self, table: &str, column: &str) -> bool {
        self.column(table, column).is_some()
    }

    /// Adds a row to every index of its table.
    pub fn on_insert(&mut self, table: &str, row: &Row) {
        if let Some(indexes) = self.tables.get_mut(table) {
            for index in &mut indexes.columns {
                let key = index.key_of(row);
                index.add(key, row.id());
            }
        }
    }

    /// Removes a row from every index of its table.
    pub fn on_delete(&mut self, table: &str, row: &Row) {
        if let Some(indexes) = self.tables.get_mut(table) {
            for index in &mut indexes.columns {
                let key = index.key_of(row);
                index.remove(key, row.id());
            }
        }
    }

    /// Moves a row between buckets for every indexed column among `deltas`,
    /// given as (column position, old value, new value).
    pub fn on_update<'a, I>(&mut self, table: &str, row: RowId, deltas: I)
    where
        I: IntoIterator<Item = (usize, &'a Value, &'a Value)>,
    {
        let Some(indexes) = self.tables.get_mut(table) else {
            return;
        };
        for (position, old, new) in deltas {
            if old == new {
                continue;
            }
            if let Some(index) = indexes.columns.iter_mut().find(|c| c.position == position) {
                index.remove(old, row);
                index.add(new, row);
            }
        }
    }

    /// Answers a comparison from the index over `column`.
    ///
    /// `operand` holds one value for scalar operators, the members for
    /// `in`/`not in`, and the two bounds for `between`/`not between`.
    /// Returns None when the column is not indexed or the operator cannot be
    /// answered by an index; the caller then evaluates by scanning.
    pub fn query(
        &self,
        table: &str,
        column: &str,
        op: CompareOp,
        operand: &[Value],
    ) -> Option<IndexLookup> {
        if !op.is_index_capable() {
            return None;
        }
        self.column(table, column)?.lookup(op, operand)
    }

    /// Estimates how many of `total` rows a comparison keeps. Lower is more
    /// selective. Unindexed columns estimate `total`.
    pub fn estimate_selectivity(
        &self,
        table: &str,
        column: &str,
        op: CompareOp,
        operand: &[Value],
        total: usize,
    ) -> f64 {
        match self.column(table, column) {
            Some(index) => index.selectivity(op, operand, total),
            None => total as f64,
        }
    }
}
