//! Committed contents of a single table.
//!
//! Records are owned once, as `Rc<Row>` keyed by their handle. The live
//! sequence and the primary-key map refer to them by handle, so the three
//! structures cannot disagree about who owns a record.

use hashbrown::HashMap;
use std::rc::Rc;
use tabula_core::schema::Table;
use tabula_core::{Row, RowId, Value};
use tabula_index::OrderedSet;

/// Live data of one table.
#[derive(Clone, Debug)]
pub struct TableData {
    schema: Rc<Table>,
    /// Record storage by handle.
    rows: HashMap<RowId, Rc<Row>>,
    /// Handles in live order (commit order of insertion).
    live: OrderedSet<RowId>,
    /// Primary-key value to handle.
    by_pk: HashMap<Value, RowId>,
    /// Last auto-assigned (or highest explicit) primary key.
    counter: i64,
}

impl TableData {
    pub(crate) fn new(schema: Table) -> Self {
        Self {
            schema: Rc::new(schema),
            rows: HashMap::new(),
            live: OrderedSet::new(),
            by_pk: HashMap::new(),
            counter: 0,
        }
    }

    /// Returns the table schema.
    pub fn schema(&self) -> &Table {
        &self.schema
    }

    pub(crate) fn schema_rc(&self) -> Rc<Table> {
        Rc::clone(&self.schema)
    }

    /// Returns the number of live records.
    #[inline]
    pub fn len(&self) -> usize {
        self.live.len()
    }

    /// Returns true if the table has no live records.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }

    /// Returns the auto-increment counter.
    pub fn counter(&self) -> i64 {
        self.counter
    }

    /// Gets a record by handle.
    pub fn get(&self, row_id: RowId) -> Option<&Rc<Row>> {
        self.rows.get(&row_id)
    }

    /// Gets a record by primary key.
    pub fn get_by_pk(&self, pk: &Value) -> Option<&Rc<Row>> {
        self.by_pk.get(pk).and_then(|id| self.rows.get(id))
    }

    /// Resolves a primary key to the handle of its record.
    pub fn row_id_of(&self, pk: &Value) -> Option<RowId> {
        self.by_pk.get(pk).copied()
    }

    /// Returns true if a live record holds this handle.
    pub fn contains(&self, row_id: RowId) -> bool {
        self.live.contains(&row_id)
    }

    /// Iterates handles in live order.
    pub fn row_ids(&self) -> impl DoubleEndedIterator<Item = RowId> + '_ {
        self.live.iter().copied()
    }

    /// Iterates records in live order.
    pub fn scan(&self) -> impl Iterator<Item = &Rc<Row>> + '_ {
        self.live.iter().filter_map(|id| self.rows.get(id))
    }

    pub(crate) fn primary_keys(&self) -> &HashMap<Value, RowId> {
        &self.by_pk
    }

    pub(crate) fn set_counter(&mut self, counter: i64) {
        self.counter = counter;
    }

    /// Appends a record to the live sequence. Returns the shared snapshot.
    pub(crate) fn insert(&mut self, row: Row) -> Rc<Row> {
        let pk = self.pk_of(&row);
        let id = row.id();
        let row = Rc::new(row);
        self.by_pk.insert(pk, id);
        self.live.insert(id);
        self.rows.insert(id, Rc::clone(&row));
        row
    }

    /// Removes a record from every structure.
    pub(crate) fn remove(&mut self, row_id: RowId) -> Option<Rc<Row>> {
        let row = self.rows.remove(&row_id)?;
        self.live.remove(&row_id);
        let pk = self.pk_of(&row);
        if self.by_pk.get(&pk) == Some(&row_id) {
            self.by_pk.remove(&pk);
        }
        Some(row)
    }

    /// Gives copy-on-write access to a record. Snapshots handed out earlier
    /// keep their values.
    pub(crate) fn row_mut(&mut self, row_id: RowId) -> Option<&mut Row> {
        self.rows.get_mut(&row_id).map(Rc::make_mut)
    }

    /// Moves a record from one primary key to another.
    pub(crate) fn rekey(&mut self, row_id: RowId, old: &Value, new: Value) {
        if self.by_pk.get(old) == Some(&row_id) {
            self.by_pk.remove(old);
        }
        self.by_pk.insert(new, row_id);
    }

    fn pk_of(&self, row: &Row) -> Value {
        row.get(self.schema.primary_key_index())
            .cloned()
            .unwrap_or(Value::Null)
    }
}
