//! The transactional store.
//!
//! A `Store` owns the committed data of every table, the index manager that
//! covers it, and the single writer buffer. Writes are buffered in
//! [`PendingChanges`] and become visible only through [`Store::commit`].
//! The only exception is [`Store::set_field`], which writes a live record in
//! place and defers the index effect to commit, so [`Store::rollback`] can
//! restore the old value.
//!
//! A commit first plans every buffered change against a read-only view of
//! the store, then applies the plans. Planning is where every commit-time
//! error is detected, so applying never fails.

use crate::config::StoreConfig;
use crate::outcome::CommitOutcome;
use crate::pending::{FieldUpdates, PendingChanges, TableChanges};
use crate::table_data::TableData;
use hashbrown::{HashMap, HashSet};
use std::collections::BTreeMap;
use std::mem;
use std::rc::Rc;
use tabula_core::schema::{Column, Table};
use tabula_core::{Error, Result, Row, RowId, Value};
use tabula_index::IndexManager;
use tracing::{debug, trace, warn};

/// Field delta of an in-place mutation: (column position, old, new).
type Delta = (usize, Value, Value);

/// A field-level update located to its record.
#[derive(Debug)]
struct PlannedUpdate {
    row_id: RowId,
    fields: FieldUpdates,
}

/// Validated changes of one table, in apply order.
#[derive(Debug, Default)]
struct TablePlan {
    mutations: Vec<(RowId, Vec<Delta>)>,
    rekeys: Vec<(RowId, Value, Value)>,
    deletes: Vec<RowId>,
    inserts: Vec<Row>,
    updates: Vec<PlannedUpdate>,
    counter: i64,
}

/// Primary-key map as it will look after the changes planned so far.
struct PkOverlay<'a> {
    base: &'a HashMap<Value, RowId>,
    removed: HashSet<Value>,
    added: HashMap<Value, RowId>,
}

impl<'a> PkOverlay<'a> {
    fn new(base: &'a HashMap<Value, RowId>) -> Self {
        Self {
            base,
            removed: HashSet::new(),
            added: HashMap::new(),
        }
    }

    fn get(&self, pk: &Value) -> Option<RowId> {
        if let Some(id) = self.added.get(pk) {
            return Some(*id);
        }
        if self.removed.contains(pk) {
            return None;
        }
        self.base.get(pk).copied()
    }

    fn remove(&mut self, pk: &Value) {
        self.added.remove(pk);
        self.removed.insert(pk.clone());
    }

    fn insert(&mut self, pk: Value, row_id: RowId) {
        self.added.insert(pk, row_id);
    }
}

/// Converts a value to its column type when that is lossless.
fn conform(column: &Column, value: Value) -> Value {
    value.coerce(column.data_type()).unwrap_or(value)
}

/// In-memory relational store with buffered, all-or-nothing commits.
#[derive(Debug, Default)]
pub struct Store {
    config: StoreConfig,
    tables: BTreeMap<String, TableData>,
    indexes: IndexManager,
    pending: PendingChanges,
}

impl Store {
    /// Creates an empty store with the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty store with the given configuration.
    pub fn with_config(config: StoreConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Returns the store configuration.
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Registers a table and its indexes.
    pub fn create_table(&mut self, table: Table) -> Result<()> {
        if self.tables.contains_key(table.name()) {
            return Err(Error::schema(format!(
                "table already exists: {}",
                table.name()
            )));
        }
        self.indexes.register_table(&table);
        debug!(
            target: "tabula::store",
            table = %table.name(),
            columns = table.width(),
            indexed = table.indexed_columns().count(),
            "table created"
        );
        self.tables
            .insert(table.name().to_string(), TableData::new(table));
        Ok(())
    }

    fn data_or_err(&self, table: &str) -> Result<&TableData> {
        self.tables
            .get(table)
            .ok_or_else(|| Error::unknown_table(table))
    }

    // ---------------------------------------------------------------------
    // Reads
    // ---------------------------------------------------------------------

    /// Returns the schema of a table.
    pub fn table(&self, name: &str) -> Option<&Table> {
        self.tables.get(name).map(TableData::schema)
    }

    /// Iterates every table schema, by name.
    pub fn tables(&self) -> impl Iterator<Item = &Table> + '_ {
        self.tables.values().map(TableData::schema)
    }

    /// Returns the committed data of a table.
    pub fn data(&self, name: &str) -> Option<&TableData> {
        self.tables.get(name)
    }

    /// Returns the index manager.
    pub fn index_manager(&self) -> &IndexManager {
        &self.indexes
    }

    /// Returns the pending-change buffer.
    pub fn pending(&self) -> &PendingChanges {
        &self.pending
    }

    /// Gets a live record by handle.
    pub fn get(&self, table: &str, row_id: RowId) -> Option<&Rc<Row>> {
        self.tables.get(table)?.get(row_id)
    }

    /// Gets a live record by primary key.
    pub fn get_by_pk(&self, table: &str, pk: &Value) -> Option<&Rc<Row>> {
        self.tables.get(table)?.get_by_pk(pk)
    }

    /// Iterates the live records of a table in live order.
    pub fn scan(&self, table: &str) -> Result<impl Iterator<Item = &Rc<Row>> + '_> {
        Ok(self.data_or_err(table)?.scan())
    }

    /// Returns the number of live records of a table, 0 if it is unknown.
    pub fn len(&self, table: &str) -> usize {
        self.tables.get(table).map_or(0, TableData::len)
    }

    /// Returns true iff anything is buffered.
    pub fn dirty(&self) -> bool {
        self.pending.dirty()
    }

    // ---------------------------------------------------------------------
    // Buffered writes
    // ---------------------------------------------------------------------

    /// Buffers the insertion of a record. Adding a record that is already
    /// live or already buffered does nothing.
    pub fn add(&mut self, table: &str, row: Row) -> Result<()> {
        let data = self.data_or_err(table)?;
        if row.len() != data.schema().width() {
            return Err(Error::schema(format!(
                "record has {} fields, table {} has {} columns",
                row.len(),
                table,
                data.schema().width()
            )));
        }
        if data.contains(row.id()) {
            return Ok(());
        }
        self.pending.add(table, row);
        Ok(())
    }

    /// Buffers the deletion of a record. Deleting a record that is still a
    /// buffered insert cancels the insert.
    pub fn delete(&mut self, table: &str, row: &Row) -> Result<()> {
        let data = self.data_or_err(table)?;
        let pk_pos = data.schema().primary_key_index();
        let pk = data
            .get(row.id())
            .and_then(|live| live.get(pk_pos))
            .or_else(|| row.get(pk_pos))
            .cloned()
            .unwrap_or(Value::Null);
        if self.pending.cancel_insert(table, row.id()) {
            return Ok(());
        }
        self.pending.delete(table, pk);
        Ok(())
    }

    /// Buffers the deletion of the record with the given primary key.
    pub fn delete_by_pk(&mut self, table: &str, pk: Value) -> Result<()> {
        let column = self.data_or_err(table)?.schema().primary_key();
        let pk = conform(column, pk);
        self.pending.delete(table, pk);
        Ok(())
    }

    /// Buffers a field-level update of the record with the given primary
    /// key. Field names are checked now; the record is located at commit.
    pub fn update(&mut self, table: &str, pk: Value, fields: &[(&str, Value)]) -> Result<()> {
        let schema = self.data_or_err(table)?.schema();
        let pk = conform(schema.primary_key(), pk);
        let fields = fields
            .iter()
            .map(|(name, value)| {
                let position = schema.require_column(name)?;
                Ok((position, conform(&schema.columns()[position], value.clone())))
            })
            .collect::<Result<FieldUpdates>>()?;
        self.pending.update(table, pk, fields);
        Ok(())
    }

    /// Writes one field of a record.
    ///
    /// A buffered insert is changed in the buffer. A live record is changed
    /// in place and the change is tracked so that commit can move it between
    /// index buckets and rollback can undo it.
    pub fn set_field(
        &mut self,
        table: &str,
        row_id: RowId,
        column: &str,
        value: Value,
    ) -> Result<()> {
        let data = self
            .tables
            .get_mut(table)
            .ok_or_else(|| Error::unknown_table(table))?;
        let position = data.schema().require_column(column)?;
        let value = conform(&data.schema().columns()[position], value);

        if let Some(row) = self.pending.pending_insert_mut(table, row_id) {
            row.set(position, value);
            return Ok(());
        }

        let row = data.row_mut(row_id).ok_or_else(|| {
            Error::schema(format!("no record with handle {} in table {}", row_id, table))
        })?;
        let old = row.replace(position, value.clone()).unwrap_or(Value::Null);
        self.pending
            .mark_mutated(table, row_id, position, old, value);
        Ok(())
    }

    /// Records that a field of a live record changed from `old` to `new`
    /// outside of [`Store::set_field`]. Only the first old value of a field
    /// is kept within a transaction.
    pub fn mark_mutated(
        &mut self,
        table: &str,
        row_id: RowId,
        column: &str,
        old: Value,
        new: Value,
    ) -> Result<()> {
        let position = self.data_or_err(table)?.schema().require_column(column)?;
        self.pending.mark_mutated(table, row_id, position, old, new);
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Commit / rollback
    // ---------------------------------------------------------------------

    /// Applies every buffered change and clears the buffer.
    ///
    /// With `validate_before_commit` (the default) a failing commit changes
    /// nothing and keeps the buffer. Without it, changes before the failing
    /// one are applied, in-place mutations that were not applied are
    /// restored to their old values, and the buffer is discarded.
    pub fn commit(&mut self) -> Result<CommitOutcome> {
        let pending = mem::take(&mut self.pending);
        let validate = self.config.validates_before_commit();

        let mut plans = Vec::new();
        let mut failure = None;
        for (name, changes) in pending.tables() {
            let mut plan = TablePlan::default();
            let result = self.plan_table(name, changes, &mut plan);
            if result.is_ok() || !validate {
                plans.push((name.to_string(), plan));
            }
            if let Err(err) = result {
                failure = Some(err);
                break;
            }
        }

        let failure = match failure {
            Some(err) if validate => {
                warn!(target: "tabula::store", error = %err, "commit rejected");
                self.pending = pending;
                return Err(err);
            }
            other => other,
        };

        let applied: HashSet<(String, RowId)> = plans
            .iter()
            .flat_map(|(name, plan)| plan.mutations.iter().map(move |(id, _)| (name.clone(), *id)))
            .collect();
        let mut outcome = CommitOutcome::default();
        for (name, plan) in plans {
            self.apply(&name, plan, &mut outcome);
        }

        match failure {
            Some(err) => {
                // Live fields of unapplied mutations never reached the indexes.
                for (name, changes) in pending.tables() {
                    if let Some(data) = self.tables.get_mut(name) {
                        let restored = restore_mutations(data, changes, |row_id| {
                            applied.contains(&(name.to_string(), row_id))
                        });
                        trace!(target: "tabula::store", table = %name, restored, "mutations restored");
                    }
                }
                warn!(target: "tabula::store", error = %err, "commit partially applied");
                Err(err)
            }
            None => Ok(outcome),
        }
    }

    /// Checks the buffered changes of one table and fills `plan` with them in
    /// apply order. On error, `plan` holds the changes before the failing one;
    /// in-place mutations are planned all together or not at all.
    fn plan_table(&self, name: &str, changes: &TableChanges, plan: &mut TablePlan) -> Result<()> {
        let data = self.data_or_err(name)?;
        let schema = data.schema();
        let pk_pos = schema.primary_key_index();
        let mut pks = PkOverlay::new(data.primary_keys());
        let auto = schema.is_auto_increment();
        plan.counter = data.counter();

        // In-place mutations. Old keys are released before new ones are
        // claimed so that records can swap keys.
        let mut mutations = Vec::new();
        let mut rekeys = Vec::new();
        let mut claims = Vec::new();
        for (&row_id, fields) in changes.modifications() {
            if !data.contains(row_id) {
                continue;
            }
            let deltas: Vec<Delta> = fields
                .iter()
                .filter(|(_, (old, new))| old != new)
                .map(|(&pos, (old, new))| (pos, old.clone(), new.clone()))
                .collect();
            for (pos, _, new) in &deltas {
                check_nullable(schema, *pos, new)?;
            }
            if let Some((_, old, new)) = deltas.iter().find(|(pos, _, _)| *pos == pk_pos) {
                pks.remove(old);
                claims.push((row_id, old.clone(), new.clone()));
            }
            if !deltas.is_empty() {
                mutations.push((row_id, deltas));
            }
        }
        let mut counter = plan.counter;
        for (row_id, old, new) in claims {
            if pks.get(&new).is_some() {
                return Err(Error::duplicate_key(name, new));
            }
            if let (true, Value::Integer(key)) = (auto, &new) {
                counter = counter.max(*key);
            }
            pks.insert(new.clone(), row_id);
            rekeys.push((row_id, old, new));
        }
        plan.mutations = mutations;
        plan.rekeys = rekeys;
        plan.counter = counter;

        for pk in changes.deletes() {
            let row_id = pks
                .get(pk)
                .ok_or_else(|| Error::missing_record(name, pk.clone()))?;
            pks.remove(pk);
            plan.deletes.push(row_id);
        }

        for pending in changes.inserts() {
            let mut row = pending.clone();
            for column in schema.columns() {
                let pos = column.index();
                let value = row.get(pos).cloned().unwrap_or(Value::Null);
                row.set(pos, conform(column, value));
            }

            match row.get(pk_pos) {
                Some(Value::Null) if auto => {
                    plan.counter = plan
                        .counter
                        .checked_add(1)
                        .ok_or_else(|| Error::key_exhausted(name))?;
                    row.set(pk_pos, Value::Integer(plan.counter));
                }
                Some(Value::Integer(key)) if auto => plan.counter = plan.counter.max(*key),
                _ => {}
            }

            for column in schema.columns() {
                let pos = column.index();
                if row.get(pos).is_some_and(Value::is_null) {
                    if let Some(value) = column.fill_value() {
                        row.set(pos, conform(column, value));
                    }
                }
                check_nullable(schema, pos, row.get(pos).unwrap_or(&Value::Null))?;
            }

            let pk = row.get(pk_pos).cloned().unwrap_or(Value::Null);
            if pks.get(&pk).is_some() {
                return Err(Error::duplicate_key(name, pk));
            }
            pks.insert(pk, row.id());
            plan.inserts.push(row);
        }

        for (pk, fields) in changes.updates() {
            let row_id = pks
                .get(pk)
                .ok_or_else(|| Error::missing_record(name, pk.clone()))?;
            for (pos, value) in fields {
                check_nullable(schema, *pos, value)?;
            }
            if let Some((_, new)) = fields.iter().rev().find(|(pos, _)| *pos == pk_pos) {
                if new != pk {
                    if pks.get(new).is_some() {
                        return Err(Error::duplicate_key(name, new.clone()));
                    }
                    pks.remove(pk);
                    pks.insert(new.clone(), row_id);
                    if let (true, Value::Integer(key)) = (auto, new) {
                        plan.counter = plan.counter.max(*key);
                    }
                }
            }
            plan.updates.push(PlannedUpdate {
                row_id,
                fields: fields.clone(),
            });
        }

        Ok(())
    }

    /// Applies a checked plan. Never fails.
    fn apply(&mut self, name: &str, plan: TablePlan, outcome: &mut CommitOutcome) {
        let Some(data) = self.tables.get_mut(name) else {
            return;
        };
        let indexes = &mut self.indexes;
        let pk_pos = data.schema().primary_key_index();

        let mutated = plan.mutations.len();
        for (row_id, deltas) in &plan.mutations {
            indexes.on_update(name, *row_id, deltas.iter().map(|(p, o, n)| (*p, o, n)));
        }
        for (row_id, old, new) in plan.rekeys {
            data.rekey(row_id, &old, new);
        }

        let mut deleted = 0;
        for row_id in plan.deletes {
            if let Some(row) = data.remove(row_id) {
                indexes.on_delete(name, &row);
                deleted += 1;
            }
        }

        let mut inserted = Vec::with_capacity(plan.inserts.len());
        for row in plan.inserts {
            let row = data.insert(row);
            indexes.on_insert(name, &row);
            inserted.push(row);
        }
        data.set_counter(plan.counter);

        let updated = plan.updates.len();
        for update in plan.updates {
            let Some(row) = data.row_mut(update.row_id) else {
                continue;
            };
            let mut deltas = Vec::with_capacity(update.fields.len());
            for (pos, value) in update.fields {
                if let Some(old) = row.replace(pos, value.clone()) {
                    deltas.push((pos, old, value));
                }
            }
            indexes.on_update(name, update.row_id, deltas.iter().map(|(p, o, n)| (*p, o, n)));
            if let Some((_, old, new)) = deltas.iter().find(|(p, o, n)| *p == pk_pos && o != n) {
                data.rekey(update.row_id, old, new.clone());
            }
        }

        debug!(
            target: "tabula::store",
            table = %name,
            inserted = inserted.len(),
            deleted,
            updated,
            mutated,
            counter = data.counter(),
            "commit applied"
        );
        outcome.record_inserts(data.schema_rc(), inserted);
        outcome.add_counts(deleted, updated, mutated);
    }

    /// Restores every field written by [`Store::set_field`] in this
    /// transaction and discards the buffer.
    pub fn rollback(&mut self) {
        let pending = mem::take(&mut self.pending);
        for (name, changes) in pending.tables() {
            let Some(data) = self.tables.get_mut(name) else {
                continue;
            };
            let restored = restore_mutations(data, changes, |_| false);
            trace!(target: "tabula::store", table = %name, restored, "mutations restored");
            debug!(
                target: "tabula::store",
                table = %name,
                inserts = changes.inserts().len(),
                deletes = changes.deletes().count(),
                updates = changes.updates().len(),
                "rolled back"
            );
        }
    }
}

/// Writes back the first old value of every in-place mutation of a table,
/// skipping records for which `keep` holds. Returns how many were restored.
fn restore_mutations(
    data: &mut TableData,
    changes: &TableChanges,
    keep: impl Fn(RowId) -> bool,
) -> usize {
    let mut restored = 0;
    for (&row_id, fields) in changes.modifications() {
        if keep(row_id) {
            continue;
        }
        if let Some(row) = data.row_mut(row_id) {
            for (&pos, (old, _)) in fields {
                row.replace(pos, old.clone());
            }
            restored += 1;
        }
    }
    restored
}

fn check_nullable(schema: &Table, pos: usize, value: &Value) -> Result<()> {
    let column = &schema.columns()[pos];
    let accepts_null = column.is_nullable() && pos != schema.primary_key_index();
    if value.is_null() && !accepts_null {
        return Err(Error::null_constraint(schema.name(), column.name()));
    }
    Ok(())
}
