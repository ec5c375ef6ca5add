//! Filter executor.
//!
//! Turns a resolved predicate into a lazy stream of record handles. Each
//! condition narrows the stream produced by the one before it. A comparison
//! on an indexed column is answered by the index manager, and its result is
//! used as is only when it is the first condition applied to the whole
//! table. Otherwise it is intersected with, or subtracted from, the stream.

use crate::resolve::{Condition, Resolved};
use hashbrown::HashSet;
use tabula_core::{Error, Result, RowId};
use tabula_index::{IndexLookup, IndexManager};
use tabula_storage::{Store, TableData};
use tracing::{debug, trace};

/// Lazy stream of record handles.
pub type RowStream<'a> = Box<dyn Iterator<Item = RowId> + 'a>;

/// Candidates a condition is applied to.
enum Input<'a> {
    /// Every live record, in live order.
    Table,
    /// The output of the previous condition.
    Rows(RowStream<'a>),
}

/// Filter executor - evaluates predicates against one table.
pub struct FilterExecutor<'a> {
    table: String,
    data: &'a TableData,
    /// None when index selection is disabled.
    indexes: Option<&'a IndexManager>,
}

impl<'a> FilterExecutor<'a> {
    /// Creates a filter executor over the committed data of `table`.
    pub fn new(store: &'a Store, table: &str) -> Result<Self> {
        let data = store.data(table).ok_or_else(|| Error::unknown_table(table))?;
        let indexes = store
            .config()
            .uses_indexes()
            .then(|| store.index_manager());
        Ok(Self {
            table: table.to_string(),
            data,
            indexes,
        })
    }

    /// Returns the handles of the records matching `predicate`.
    pub fn execute(&self, predicate: &Resolved) -> RowStream<'a> {
        self.apply(predicate, Input::Table)
    }

    fn all(&self) -> RowStream<'a> {
        Box::new(self.data.row_ids())
    }

    fn stream(&self, input: Input<'a>) -> RowStream<'a> {
        match input {
            Input::Table => self.all(),
            Input::Rows(rows) => rows,
        }
    }

    fn apply(&self, predicate: &Resolved, input: Input<'a>) -> RowStream<'a> {
        match predicate {
            Resolved::Leaf(condition) => self.apply_condition(condition, input),
            Resolved::And(children) => self.apply_and(children, input),
            Resolved::Or(children) => self.apply_or(children, input),
            Resolved::Not(child) => self.apply_not(child, input),
        }
    }

    fn apply_and(&self, children: &[Resolved], input: Input<'a>) -> RowStream<'a> {
        let mut ordered: Vec<(f64, &Resolved)> =
            children.iter().map(|c| (self.selectivity(c), c)).collect();
        // Stable: equal estimates keep declaration order.
        ordered.sort_by(|a, b| a.0.total_cmp(&b.0));
        debug!(
            target: "tabula::query",
            table = %self.table,
            order = ?ordered.iter().map(|(s, _)| *s).collect::<Vec<_>>(),
            "conjunction order"
        );

        let mut input = input;
        for (_, child) in ordered {
            input = Input::Rows(self.apply(child, input));
        }
        self.stream(input)
    }

    fn apply_or(&self, children: &[Resolved], input: Input<'a>) -> RowStream<'a> {
        let base: Option<Vec<RowId>> = match input {
            Input::Table => None,
            Input::Rows(rows) => Some(rows.collect()),
        };
        let branches: Vec<RowStream<'a>> = children
            .iter()
            .map(|child| {
                let input = match &base {
                    None => Input::Table,
                    Some(rows) => Input::Rows(Box::new(rows.clone().into_iter())),
                };
                self.apply(child, input)
            })
            .collect();

        let mut seen = HashSet::new();
        Box::new(
            branches
                .into_iter()
                .flatten()
                .filter(move |id| seen.insert(*id)),
        )
    }

    fn apply_not(&self, child: &Resolved, input: Input<'a>) -> RowStream<'a> {
        let (base, inner): (Vec<RowId>, Input<'a>) = match input {
            Input::Table => (self.data.row_ids().collect(), Input::Table),
            Input::Rows(rows) => {
                let base: Vec<RowId> = rows.collect();
                let inner = Input::Rows(Box::new(base.clone().into_iter()));
                (base, inner)
            }
        };
        let matched: HashSet<RowId> = self.apply(child, inner).collect();
        Box::new(base.into_iter().filter(move |id| !matched.contains(id)))
    }

    fn apply_condition(&self, condition: &Condition, input: Input<'a>) -> RowStream<'a> {
        let Some(lookup) = self.lookup(condition) else {
            trace!(
                target: "tabula::query",
                table = %self.table,
                column = %condition.accessor().name(),
                op = %condition.op(),
                "scan"
            );
            let data = self.data;
            let condition = condition.clone();
            return Box::new(
                self.stream(input)
                    .filter(move |id| data.get(*id).is_some_and(|row| condition.matches(row))),
            );
        };

        trace!(
            target: "tabula::query",
            table = %self.table,
            column = %condition.accessor().name(),
            op = %condition.op(),
            "index hit"
        );
        match (lookup, input) {
            (IndexLookup::Include(rows), Input::Table) => Box::new(rows.into_iter()),
            (IndexLookup::Include(rows), Input::Rows(stream)) => {
                let keep: HashSet<RowId> = rows.into_iter().collect();
                Box::new(stream.filter(move |id| keep.contains(id)))
            }
            (IndexLookup::Exclude(drop), input) => {
                Box::new(self.stream(input).filter(move |id| !drop.contains(id)))
            }
        }
    }

    fn lookup(&self, condition: &Condition) -> Option<IndexLookup> {
        let indexes = self.indexes?;
        let column = condition.indexed_column()?;
        indexes.query(&self.table, column, condition.op(), condition.operand())
    }

    /// Estimated number of records a condition keeps. Compound conditions,
    /// function targets and unindexed columns count as the whole table.
    fn selectivity(&self, predicate: &Resolved) -> f64 {
        let total = self.data.len();
        let estimate = match (predicate, self.indexes) {
            (Resolved::Leaf(c), Some(indexes)) => match c.indexed_column() {
                Some(column) if c.op().is_index_capable() => {
                    indexes.estimate_selectivity(&self.table, column, c.op(), c.operand(), total)
                }
                _ => total as f64,
            },
            _ => total as f64,
        };
        trace!(target: "tabula::query", table = %self.table, estimate, "selectivity");
        estimate
    }
}
