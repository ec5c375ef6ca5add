//! Pending-change buffer.
//!
//! Everything a transaction does before `commit` lands here, grouped by
//! table: inserts, deletions by primary key, field-level updates by primary
//! key, and in-place field mutations of committed records. Nothing in the
//! buffer is visible to live data or indexes until commit.

use hashbrown::HashMap;
use std::collections::BTreeMap;
use tabula_core::{Row, RowId, Value};
use tabula_index::OrderedSet;

/// Field writes keyed by column position.
pub type FieldUpdates = Vec<(usize, Value)>;

/// First old value and latest new value of a mutated field.
pub type FieldChange = (Value, Value);

/// Buffered changes of a single table.
#[derive(Clone, Debug, Default)]
pub struct TableChanges {
    inserts: Vec<Row>,
    insert_pos: HashMap<RowId, usize>,
    deletes: OrderedSet<Value>,
    updates: Vec<(Value, FieldUpdates)>,
    modifications: BTreeMap<RowId, BTreeMap<usize, FieldChange>>,
}

impl TableChanges {
    /// Buffered inserts in the order they were added.
    pub fn inserts(&self) -> &[Row] {
        &self.inserts
    }

    /// Primary keys buffered for deletion.
    pub fn deletes(&self) -> impl Iterator<Item = &Value> + '_ {
        self.deletes.iter()
    }

    /// Buffered field-level updates.
    pub fn updates(&self) -> &[(Value, FieldUpdates)] {
        &self.updates
    }

    /// In-place mutations: record handle to column position to (old, new).
    pub fn modifications(&self) -> &BTreeMap<RowId, BTreeMap<usize, FieldChange>> {
        &self.modifications
    }

    /// Returns true if nothing is buffered for this table.
    pub fn is_empty(&self) -> bool {
        self.inserts.is_empty()
            && self.deletes.is_empty()
            && self.updates.is_empty()
            && self.modifications.is_empty()
    }

    fn add(&mut self, row: Row) -> bool {
        if self.insert_pos.contains_key(&row.id()) {
            return false;
        }
        self.insert_pos.insert(row.id(), self.inserts.len());
        self.inserts.push(row);
        true
    }

    fn cancel_insert(&mut self, row_id: RowId) -> bool {
        let Some(pos) = self.insert_pos.remove(&row_id) else {
            return false;
        };
        self.inserts.remove(pos);
        for (i, row) in self.inserts.iter().enumerate().skip(pos) {
            self.insert_pos.insert(row.id(), i);
        }
        true
    }
}

/// The buffer of one transaction.
#[derive(Clone, Debug, Default)]
pub struct PendingChanges {
    tables: BTreeMap<String, TableChanges>,
}

impl PendingChanges {
    /// Creates an empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    fn table_mut(&mut self, table: &str) -> &mut TableChanges {
        self.tables.entry(table.to_string()).or_default()
    }

    /// Buffers an insert. Returns false if the same record is already
    /// buffered.
    pub fn add(&mut self, table: &str, row: Row) -> bool {
        self.table_mut(table).add(row)
    }

    /// Drops a buffered insert. Returns false if the record was not buffered.
    pub fn cancel_insert(&mut self, table: &str, row_id: RowId) -> bool {
        self.tables
            .get_mut(table)
            .is_some_and(|t| t.cancel_insert(row_id))
    }

    /// Returns true if the record is a buffered insert.
    pub fn is_pending_insert(&self, table: &str, row_id: RowId) -> bool {
        self.tables
            .get(table)
            .is_some_and(|t| t.insert_pos.contains_key(&row_id))
    }

    /// Gives mutable access to a buffered insert.
    pub fn pending_insert_mut(&mut self, table: &str, row_id: RowId) -> Option<&mut Row> {
        let changes = self.tables.get_mut(table)?;
        let pos = *changes.insert_pos.get(&row_id)?;
        changes.inserts.get_mut(pos)
    }

    /// Buffers the deletion of the record with the given primary key.
    pub fn delete(&mut self, table: &str, pk: Value) {
        self.table_mut(table).deletes.insert(pk);
    }

    /// Buffers a field-level update of the record with the given primary key.
    pub fn update(&mut self, table: &str, pk: Value, fields: FieldUpdates) {
        self.table_mut(table).updates.push((pk, fields));
    }

    /// Records an in-place mutation. Only the first old value seen for a
    /// field in this transaction is kept; later calls replace the new value.
    pub fn mark_mutated(&mut self, table: &str, row_id: RowId, column: usize, old: Value, new: Value) {
        self.table_mut(table)
            .modifications
            .entry(row_id)
            .or_default()
            .entry(column)
            .and_modify(|change| change.1 = new.clone())
            .or_insert((old, new));
    }

    /// Returns the changes buffered for a table.
    pub fn table(&self, table: &str) -> Option<&TableChanges> {
        self.tables.get(table)
    }

    /// Iterates tables with buffered changes, by table name.
    pub fn tables(&self) -> impl Iterator<Item = (&str, &TableChanges)> + '_ {
        self.tables
            .iter()
            .filter(|(_, c)| !c.is_empty())
            .map(|(name, c)| (name.as_str(), c))
    }

    /// Returns true iff anything is buffered.
    pub fn dirty(&self) -> bool {
        self.tables.values().any(|c| !c.is_empty())
    }

    /// Discards everything.
    pub fn clear(&mut self) {
        self.tables.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_buffer_is_clean() {
        let pending = PendingChanges::new();
        assert!(!pending.dirty());
        assert_eq!(pending.tables().count(), 0);
    }

    #[test]
    fn test_add_is_idempotent_per_record() {
        let mut pending = PendingChanges::new();
        let row = Row::new(vec![Value::Null]);
        assert!(pending.add("items", row.clone()));
        assert!(!pending.add("items", row.clone()));
        assert_eq!(pending.table("items").unwrap().inserts().len(), 1);
        assert!(pending.is_pending_insert("items", row.id()));
        assert!(pending.dirty());
    }

    #[test]
    fn test_cancel_insert_keeps_positions() {
        let mut pending = PendingChanges::new();
        let rows: Vec<Row> = (0..3).map(|i| Row::new(vec![Value::Integer(i)])).collect();
        for r in &rows {
            pending.add("items", r.clone());
        }

        assert!(pending.cancel_insert("items", rows[0].id()));
        assert!(!pending.cancel_insert("items", rows[0].id()));

        let last = pending.pending_insert_mut("items", rows[2].id()).unwrap();
        assert_eq!(last.get(0), Some(&Value::Integer(2)));
    }

    #[test]
    fn test_mark_mutated_keeps_first_old_value() {
        let mut pending = PendingChanges::new();
        pending.mark_mutated("items", 7, 1, "a".into(), "b".into());
        pending.mark_mutated("items", 7, 1, "b".into(), "c".into());

        let changes = pending.table("items").unwrap().modifications();
        assert_eq!(changes[&7][&1], (Value::from("a"), Value::from("c")));
    }

    #[test]
    fn test_deletes_are_deduplicated() {
        let mut pending = PendingChanges::new();
        pending.delete("items", 1.into());
        pending.delete("items", 1.into());
        pending.delete("items", 2.into());
        let pks: Vec<&Value> = pending.table("items").unwrap().deletes().collect();
        assert_eq!(pks, vec![&Value::Integer(1), &Value::Integer(2)]);
    }

    #[test]
    fn test_clear_is_reusable() {
        let mut pending = PendingChanges::new();
        pending.update("items", 1.into(), vec![(1, "x".into())]);
        assert!(pending.dirty());
        pending.clear();
        assert!(!pending.dirty());
        pending.delete("items", 3.into());
        assert!(pending.dirty());
    }
}
