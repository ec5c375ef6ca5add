//! Query builder and runner.
//!
//! A [`Query`] names one table and carries the predicate, ordering, window,
//! grouping and projection to apply to it. Every name and operand is
//! resolved against the schema before any record is read or any change is
//! buffered, so a query either fails up front or runs to completion.

use crate::ast::{Expr, Predicate, SelectItem, SortOrder, Target};
use crate::executor::{
    AggregateExecutor, FilterExecutor, LimitExecutor, ProjectExecutor, RowStream, SortExecutor,
};
use crate::resolve::{resolve_expr, resolve_predicate, resolve_target, Accessor, Resolved};
use core::iter;
use std::rc::Rc;
use tabula_core::schema::Table;
use tabula_core::{Error, Result, Row, Value};
use tabula_storage::{Store, TableData};
use tracing::debug;

/// A query over a single table.
#[derive(Clone, Debug, PartialEq)]
pub struct Query {
    table: String,
    filters: Vec<Predicate>,
    order_by: Vec<(Target, SortOrder)>,
    limit: Option<usize>,
    offset: usize,
    group_by: Vec<Expr>,
    select: Vec<SelectItem>,
}

/// Resolved filter and ordering.
struct Plan<'a> {
    data: &'a TableData,
    predicate: Option<Resolved>,
    order: Vec<(Accessor, SortOrder)>,
}

/// Resolved output stage.
enum Projection {
    /// One tuple per record.
    Rows(ProjectExecutor),
    /// One tuple per group.
    Groups(AggregateExecutor),
}

impl Query {
    /// Starts a query over `table`.
    pub fn table(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            filters: Vec::new(),
            order_by: Vec::new(),
            limit: None,
            offset: 0,
            group_by: Vec::new(),
            select: Vec::new(),
        }
    }

    /// Adds a filter. Several filters must all hold.
    pub fn filter(mut self, predicate: Predicate) -> Self {
        self.filters.push(predicate);
        self
    }

    /// Adds an ordering key. Earlier keys take precedence.
    pub fn order_by(mut self, target: impl Into<Target>, order: SortOrder) -> Self {
        self.order_by.push((target.into(), order));
        self
    }

    /// Keeps at most `limit` results.
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Skips the first `offset` results.
    pub fn offset(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }

    /// Adds a grouping expression.
    pub fn group_by(mut self, expr: impl Into<Expr>) -> Self {
        self.group_by.push(expr.into());
        self
    }

    /// Adds an output column.
    pub fn select(mut self, item: impl Into<SelectItem>) -> Self {
        self.select.push(item.into());
        self
    }

    /// Returns the queried table name.
    pub fn table_name(&self) -> &str {
        &self.table
    }

    /// Returns true if results are computed per group rather than per record.
    pub fn is_aggregate(&self) -> bool {
        !self.group_by.is_empty() || self.select.iter().any(|s| s.expr.has_aggregate())
    }

    // ---------------------------------------------------------------------
    // Record results
    // ---------------------------------------------------------------------

    /// Returns the matching records after ordering and windowing. Grouping
    /// and projection are ignored.
    pub fn fetch(&self, store: &Store) -> Result<Vec<Rc<Row>>> {
        let plan = self.plan(store)?;
        let rows = self.sorted(store, plan)?;
        Ok(self.window().execute(rows).collect())
    }

    /// Returns the first record [`Query::fetch`] would return.
    pub fn first(&self, store: &Store) -> Result<Option<Rc<Row>>> {
        let plan = self.plan(store)?;
        let rows = self.sorted(store, plan)?;
        Ok(self.window().execute(rows).next())
    }

    /// Returns the number of records [`Query::fetch`] would return.
    pub fn count(&self, store: &Store) -> Result<usize> {
        let plan = self.plan(store)?;
        let rows = self.sorted(store, plan)?;
        Ok(self.window().execute(rows).count())
    }

    // ---------------------------------------------------------------------
    // Tuple results
    // ---------------------------------------------------------------------

    /// Returns the projected tuples. Per-record projection is lazy; grouped
    /// results are computed before the first tuple is returned. Without any
    /// select items every column of the table is returned, or the grouping
    /// keys when the query groups.
    pub fn rows<'a>(&self, store: &'a Store) -> Result<Box<dyn Iterator<Item = Vec<Value>> + 'a>> {
        let plan = self.plan(store)?;
        let (_, projection) = self.projection(plan.data.schema())?;
        self.project(store, plan, projection)
    }

    /// Runs the query and collects the tuples with their column names.
    pub fn execute(&self, store: &Store) -> Result<ResultSet> {
        let plan = self.plan(store)?;
        let (columns, projection) = self.projection(plan.data.schema())?;
        let rows = self.project(store, plan, projection)?.collect();
        Ok(ResultSet { columns, rows })
    }

    // ---------------------------------------------------------------------
    // Statements
    // ---------------------------------------------------------------------

    /// Buffers the deletion of every record [`Query::fetch`] would return.
    /// Returns the number of records affected.
    pub fn delete(&self, store: &mut Store) -> Result<usize> {
        let rows = self.fetch(store)?;
        for row in &rows {
            store.delete(&self.table, row)?;
        }
        debug!(target: "tabula::query", table = %self.table, count = rows.len(), "delete buffered");
        Ok(rows.len())
    }

    /// Buffers an update of every record [`Query::fetch`] would return.
    /// Field names are checked even when nothing matches. Returns the number
    /// of records affected.
    pub fn update(&self, store: &mut Store, fields: &[(&str, Value)]) -> Result<usize> {
        let schema = store
            .table(&self.table)
            .ok_or_else(|| Error::unknown_table(&self.table))?;
        for (name, _) in fields {
            schema.require_column(name)?;
        }
        let pk = schema.primary_key_index();

        let keys: Vec<Value> = self
            .fetch(store)?
            .iter()
            .filter_map(|row| row.get(pk).cloned())
            .collect();
        for key in &keys {
            store.update(&self.table, key.clone(), fields)?;
        }
        debug!(target: "tabula::query", table = %self.table, count = keys.len(), "update buffered");
        Ok(keys.len())
    }

    // ---------------------------------------------------------------------
    // Pipeline
    // ---------------------------------------------------------------------

    fn window(&self) -> LimitExecutor {
        LimitExecutor::new(self.limit, self.offset)
    }

    fn plan<'a>(&self, store: &'a Store) -> Result<Plan<'a>> {
        let data = store
            .data(&self.table)
            .ok_or_else(|| Error::unknown_table(&self.table))?;
        let schema = data.schema();

        let mut resolved = self
            .filters
            .iter()
            .map(|p| resolve_predicate(schema, p))
            .collect::<Result<Vec<_>>>()?;
        let predicate = match resolved.len() {
            0 => None,
            1 => resolved.pop(),
            _ => Some(Resolved::And(resolved)),
        };

        let order = self
            .order_by
            .iter()
            .map(|(target, order)| -> Result<(Accessor, SortOrder)> {
                Ok((resolve_target(schema, target)?, *order))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Plan {
            data,
            predicate,
            order,
        })
    }

    fn projection(&self, schema: &Table) -> Result<(Vec<String>, Projection)> {
        let aggregate = self.is_aggregate();
        let items: Vec<SelectItem> = if !self.select.is_empty() {
            self.select.clone()
        } else if aggregate {
            self.group_by.iter().cloned().map(SelectItem::from).collect()
        } else {
            schema
                .columns()
                .iter()
                .map(|c| SelectItem::from(Expr::column(c.name())))
                .collect()
        };

        let columns = items.iter().map(SelectItem::name).collect();
        let exprs = items
            .iter()
            .map(|item| resolve_expr(schema, &item.expr))
            .collect::<Result<Vec<_>>>()?;
        if !aggregate {
            return Ok((columns, Projection::Rows(ProjectExecutor::new(exprs))));
        }

        let group_by = self
            .group_by
            .iter()
            .map(|expr| {
                if expr.has_aggregate() {
                    return Err(Error::unsupported("aggregate in group by"));
                }
                resolve_expr(schema, expr)
            })
            .collect::<Result<Vec<_>>>()?;
        Ok((
            columns,
            Projection::Groups(AggregateExecutor::new(group_by, exprs)),
        ))
    }

    /// Handles of the matching records, in index or live order.
    fn candidates<'a>(&self, store: &'a Store, plan: &Plan<'a>) -> Result<RowStream<'a>> {
        if plan.data.is_empty() {
            debug!(target: "tabula::query", table = %self.table, "empty table");
            return Ok(Box::new(iter::empty()));
        }
        match &plan.predicate {
            None => Ok(Box::new(plan.data.row_ids())),
            Some(predicate) => Ok(FilterExecutor::new(store, &self.table)?.execute(predicate)),
        }
    }

    /// Matching records in output order, before windowing.
    fn sorted<'a>(
        &self,
        store: &'a Store,
        plan: Plan<'a>,
    ) -> Result<Box<dyn Iterator<Item = Rc<Row>> + 'a>> {
        let data = plan.data;
        let rows = self
            .candidates(store, &plan)?
            .filter_map(move |id| data.get(id).cloned());
        if plan.order.is_empty() {
            return Ok(Box::new(rows));
        }

        let mut rows: Vec<Rc<Row>> = rows.collect();
        SortExecutor::new(plan.order).execute(&mut rows);
        Ok(Box::new(rows.into_iter()))
    }

    fn project<'a>(
        &self,
        store: &'a Store,
        plan: Plan<'a>,
        projection: Projection,
    ) -> Result<Box<dyn Iterator<Item = Vec<Value>> + 'a>> {
        let rows = self.sorted(store, plan)?;
        match projection {
            Projection::Rows(project) => Ok(Box::new(
                self.window()
                    .execute(rows)
                    .map(move |row| project.project(&row)),
            )),
            Projection::Groups(aggregate) => {
                let rows: Vec<Rc<Row>> = rows.collect();
                let groups = aggregate.execute(&rows);
                Ok(self.window().execute(groups.into_iter()))
            }
        }
    }
}

/// Collected query output.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ResultSet {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl ResultSet {
    /// Returns the output column names.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Returns the output tuples.
    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    /// Consumes the result set, returning its tuples.
    pub fn into_rows(self) -> Vec<Vec<Value>> {
        self.rows
    }

    /// Returns the number of tuples.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns true if there are no tuples.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Returns the value of `column` in tuple `row`.
    pub fn get(&self, row: usize, column: &str) -> Option<&Value> {
        let position = self.columns.iter().position(|c| c == column)?;
        self.rows.get(row)?.get(position)
    }

    /// Returns every value of `column`, in tuple order.
    pub fn column(&self, column: &str) -> Option<Vec<Value>> {
        let position = self.columns.iter().position(|c| c == column)?;
        Some(
            self.rows
                .iter()
                .map(|r| r.get(position).cloned().unwrap_or(Value::Null))
                .collect(),
        )
    }
}
