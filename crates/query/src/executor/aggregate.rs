//! Aggregate executor.

use crate::ast::AggregateFunc;
use crate::executor::project::{binary, eval};
use crate::resolve::ResolvedExpr;
use hashbrown::HashMap;
use std::rc::Rc;
use tabula_core::{Row, Value};

/// Aggregate executor - partitions records into groups and computes one
/// output tuple per group.
pub struct AggregateExecutor {
    /// Group key expressions. Empty means one implicit group.
    group_by: Vec<ResolvedExpr>,
    /// Output expressions.
    items: Vec<ResolvedExpr>,
}

impl AggregateExecutor {
    /// Creates a new aggregate executor.
    pub fn new(group_by: Vec<ResolvedExpr>, items: Vec<ResolvedExpr>) -> Self {
        Self { group_by, items }
    }

    /// Creates an aggregate executor with no grouping.
    pub fn no_group(items: Vec<ResolvedExpr>) -> Self {
        Self::new(Vec::new(), items)
    }

    /// Executes the aggregation. Groups come out in the order their first
    /// member was seen. Without grouping there is exactly one output tuple,
    /// even for empty input.
    pub fn execute(&self, rows: &[Rc<Row>]) -> Vec<Vec<Value>> {
        let groups = self.partition(rows);
        groups
            .iter()
            .map(|members| {
                self.items
                    .iter()
                    .map(|item| eval_group(item, members))
                    .collect()
            })
            .collect()
    }

    fn partition<'r>(&self, rows: &'r [Rc<Row>]) -> Vec<Vec<&'r Row>> {
        if self.group_by.is_empty() {
            return vec![rows.iter().map(|r| r.as_ref()).collect()];
        }

        let mut slots: HashMap<Vec<Value>, usize> = HashMap::new();
        let mut groups: Vec<Vec<&Row>> = Vec::new();
        for row in rows {
            let key: Vec<Value> = self.group_by.iter().map(|e| eval(e, row)).collect();
            let slot = *slots.entry(key).or_insert_with(|| {
                groups.push(Vec::new());
                groups.len() - 1
            });
            groups[slot].push(row.as_ref());
        }
        groups
    }
}

/// Evaluates an output expression over the members of one group. Plain
/// column reads see the first member, or `Null` for an empty group.
fn eval_group(expr: &ResolvedExpr, members: &[&Row]) -> Value {
    match expr {
        ResolvedExpr::Aggregate { func, arg } => aggregate(*func, arg.as_deref(), members),
        ResolvedExpr::Literal(v) => v.clone(),
        ResolvedExpr::Read(_) => members.first().map_or(Value::Null, |row| eval(expr, row)),
        ResolvedExpr::Binary { left, op, right } => binary(
            *op,
            &eval_group(left, members),
            &eval_group(right, members),
        ),
        ResolvedExpr::Case { whens, otherwise } => {
            let chosen = members
                .first()
                .and_then(|row| whens.iter().find(|(when, _)| when.matches(row)));
            match chosen {
                Some((_, then)) => eval_group(then, members),
                None => otherwise
                    .as_ref()
                    .map_or(Value::Null, |e| eval_group(e, members)),
            }
        }
    }
}

fn aggregate(func: AggregateFunc, arg: Option<&ResolvedExpr>, members: &[&Row]) -> Value {
    let Some(arg) = arg else {
        // count(*)
        return Value::Integer(members.len() as i64);
    };
    let values = members
        .iter()
        .map(|row| eval(arg, row))
        .filter(|v| !v.is_null());

    match func {
        AggregateFunc::Count => Value::Integer(values.count() as i64),
        AggregateFunc::Sum => sum(values).unwrap_or(Value::Null),
        AggregateFunc::Avg => {
            let numbers: Vec<f64> = values.filter_map(|v| v.as_number()).collect();
            if numbers.is_empty() {
                Value::Null
            } else {
                Value::Float(numbers.iter().sum::<f64>() / numbers.len() as f64)
            }
        }
        AggregateFunc::Min => values.min().unwrap_or(Value::Null),
        AggregateFunc::Max => values.max().unwrap_or(Value::Null),
    }
}

/// Sums the numeric values. Stays integral while every value is an integer
/// and the total fits, otherwise falls back to a float total. `None` when
/// there is nothing to sum.
fn sum(values: impl Iterator<Item = Value>) -> Option<Value> {
    let mut int_total: Option<i64> = Some(0);
    let mut float_total = 0.0f64;
    let mut seen = false;
    for value in values {
        let Some(n) = value.as_number() else {
            continue;
        };
        seen = true;
        float_total += n;
        int_total = match (int_total, value) {
            (Some(acc), Value::Integer(i)) => acc.checked_add(i),
            _ => None,
        };
    }
    seen.then(|| int_total.map_or(Value::Float(float_total), Value::Integer))
}
