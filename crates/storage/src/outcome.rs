//! Result of a successful commit.

use std::rc::Rc;
use tabula_core::schema::Table;
use tabula_core::{Result, Row, Value};

/// Rows inserted into one table by a commit.
#[derive(Clone, Debug)]
struct Inserted {
    schema: Rc<Table>,
    rows: Vec<Rc<Row>>,
}

/// What a commit applied.
#[derive(Clone, Debug, Default)]
pub struct CommitOutcome {
    inserted: Vec<Inserted>,
    deleted: usize,
    updated: usize,
    mutated: usize,
}

impl CommitOutcome {
    pub(crate) fn record_inserts(&mut self, schema: Rc<Table>, rows: Vec<Rc<Row>>) {
        if !rows.is_empty() {
            self.inserted.push(Inserted { schema, rows });
        }
    }

    pub(crate) fn add_counts(&mut self, deleted: usize, updated: usize, mutated: usize) {
        self.deleted += deleted;
        self.updated += updated;
        self.mutated += mutated;
    }

    /// Snapshots of the rows inserted into `table`, after key assignment and
    /// defaults.
    pub fn inserted(&self, table: &str) -> &[Rc<Row>] {
        self.inserted
            .iter()
            .find(|i| i.schema.name() == table)
            .map_or(&[], |i| i.rows.as_slice())
    }

    /// Total number of inserted rows.
    pub fn inserted_count(&self) -> usize {
        self.inserted.iter().map(|i| i.rows.len()).sum()
    }

    /// Number of deleted rows.
    pub fn deleted_count(&self) -> usize {
        self.deleted
    }

    /// Number of field-level updates applied.
    pub fn updated_count(&self) -> usize {
        self.updated
    }

    /// Number of records whose in-place mutations were folded into indexes.
    pub fn mutated_count(&self) -> usize {
        self.mutated
    }

    /// Projects the inserted rows of `table` onto the named columns, the
    /// values a `RETURNING` clause would report.
    pub fn returning(&self, table: &str, columns: &[&str]) -> Result<Vec<Vec<Value>>> {
        let Some(inserted) = self.inserted.iter().find(|i| i.schema.name() == table) else {
            return Ok(Vec::new());
        };
        let positions = columns
            .iter()
            .map(|c| inserted.schema.require_column(c))
            .collect::<Result<Vec<_>>>()?;

        Ok(inserted
            .rows
            .iter()
            .map(|row| {
                positions
                    .iter()
                    .map(|&p| row.get(p).cloned().unwrap_or(Value::Null))
                    .collect()
            })
            .collect())
    }

    /// Returns true if the commit applied nothing.
    pub fn is_empty(&self) -> bool {
        self.inserted.is_empty() && self.deleted == 0 && self.updated == 0 && self.mutated == 0
    }
}
