//! Name resolution.
//!
//! Binds column names to positions, coerces literals to the column type and
//! checks operand shapes. Every error a query can raise is raised here,
//! before any row is read or any change is buffered.

use crate::ast::{AggregateFunc, BinaryOp, Expr, Operand, Predicate, Target};
use crate::functions::Function;
use std::borrow::Cow;
use tabula_core::pattern_match::like;
use tabula_core::schema::Table;
use tabula_core::{CompareOp, DataType, Error, Result, Row, Value};

static NULL: Value = Value::Null;

/// Reads one (possibly function-wrapped) column of a record.
#[derive(Clone, Debug, PartialEq)]
pub struct Accessor {
    name: String,
    position: usize,
    function: Option<Function>,
}

impl Accessor {
    /// Returns the column name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the column position.
    pub fn position(&self) -> usize {
        self.position
    }

    /// Returns true if the column is read as is.
    pub fn is_plain(&self) -> bool {
        self.function.is_none()
    }

    /// Reads the value from a record.
    pub fn read<'r>(&self, row: &'r Row) -> Cow<'r, Value> {
        let value = row.get(self.position).unwrap_or(&NULL);
        match &self.function {
            None => Cow::Borrowed(value),
            Some(f) => Cow::Owned(f.apply(value)),
        }
    }
}

/// A resolved comparison.
#[derive(Clone, Debug, PartialEq)]
pub struct Condition {
    accessor: Accessor,
    op: CompareOp,
    operand: Vec<Value>,
}

impl Condition {
    /// Returns the column name when the target is a bare column, the only
    /// case an index can answer.
    pub fn indexed_column(&self) -> Option<&str> {
        self.accessor.is_plain().then(|| self.accessor.name())
    }

    pub fn accessor(&self) -> &Accessor {
        &self.accessor
    }

    pub fn op(&self) -> CompareOp {
        self.op
    }

    /// One value for scalar operators, the members or bounds otherwise.
    pub fn operand(&self) -> &[Value] {
        &self.operand
    }

    /// Evaluates the comparison against a record.
    pub fn matches(&self, row: &Row) -> bool {
        compare(self.op, &self.accessor.read(row), &self.operand)
    }
}

/// Evaluates `value op operand`.
pub fn compare(op: CompareOp, value: &Value, operand: &[Value]) -> bool {
    match (op, operand) {
        (CompareOp::Is | CompareOp::Eq, [v]) => value == v,
        (CompareOp::IsNot | CompareOp::Ne, [v]) => value != v,
        (CompareOp::Lt | CompareOp::Le | CompareOp::Gt | CompareOp::Ge, [v]) => {
            if value.is_null() || v.is_null() {
                return false;
            }
            match op {
                CompareOp::Lt => value < v,
                CompareOp::Le => value <= v,
                CompareOp::Gt => value > v,
                _ => value >= v,
            }
        }
        (CompareOp::Like, [pattern]) => like_value(value, pattern),
        (CompareOp::NotLike, [pattern]) => !like_value(value, pattern),
        (CompareOp::In, members) => members.contains(value),
        (CompareOp::NotIn, members) => !members.contains(value),
        (CompareOp::Between, [lo, hi]) => between(value, lo, hi),
        (CompareOp::NotBetween, [lo, hi]) => !between(value, lo, hi),
        _ => false,
    }
}

fn like_value(value: &Value, pattern: &Value) -> bool {
    let Some(pattern) = pattern.as_str() else {
        return false;
    };
    match value {
        Value::Null => like("", pattern),
        Value::String(s) => like(s, pattern),
        _ => false,
    }
}

fn between(value: &Value, lo: &Value, hi: &Value) -> bool {
    !value.is_null() && !lo.is_null() && !hi.is_null() && lo <= value && value <= hi
}

/// A resolved predicate tree.
#[derive(Clone, Debug, PartialEq)]
pub enum Resolved {
    Leaf(Condition),
    And(Vec<Resolved>),
    Or(Vec<Resolved>),
    Not(Box<Resolved>),
}

impl Resolved {
    /// Evaluates the tree against a single record.
    pub fn matches(&self, row: &Row) -> bool {
        match self {
            Resolved::Leaf(c) => c.matches(row),
            Resolved::And(children) => children.iter().all(|c| c.matches(row)),
            Resolved::Or(children) => children.iter().any(|c| c.matches(row)),
            Resolved::Not(child) => !child.matches(row),
        }
    }
}

/// A resolved projection.
#[derive(Clone, Debug, PartialEq)]
pub enum ResolvedExpr {
    Read(Accessor),
    Literal(Value),
    Binary {
        left: Box<ResolvedExpr>,
        op: BinaryOp,
        right: Box<ResolvedExpr>,
    },
    Case {
        whens: Vec<(Resolved, ResolvedExpr)>,
        otherwise: Option<Box<ResolvedExpr>>,
    },
    Aggregate {
        func: AggregateFunc,
        arg: Option<Box<ResolvedExpr>>,
    },
}

impl ResolvedExpr {
    /// Returns true if an aggregate appears anywhere in the expression.
    pub fn has_aggregate(&self) -> bool {
        match self {
            ResolvedExpr::Aggregate { .. } => true,
            ResolvedExpr::Read(_) | ResolvedExpr::Literal(_) => false,
            ResolvedExpr::Binary { left, right, .. } => {
                left.has_aggregate() || right.has_aggregate()
            }
            ResolvedExpr::Case { whens, otherwise } => {
                whens.iter().any(|(_, e)| e.has_aggregate())
                    || otherwise.as_ref().is_some_and(|e| e.has_aggregate())
            }
        }
    }
}

/// Resolves a target against a table schema.
pub fn resolve_target(table: &Table, target: &Target) -> Result<Accessor> {
    let name = target.column_name();
    let position = table.require_column(name)?;
    let function = match target {
        Target::Column(_) => None,
        Target::Date(_) => Some(Function::Date),
        Target::JsonExtract { path, .. } => Some(Function::json_path(path)),
    };
    Ok(Accessor {
        name: name.to_string(),
        position,
        function,
    })
}

/// Resolves a predicate tree against a table schema.
pub fn resolve_predicate(table: &Table, predicate: &Predicate) -> Result<Resolved> {
    let resolved = match predicate {
        Predicate::Compare {
            target,
            op,
            operand,
        } => Resolved::Leaf(resolve_condition(table, target, *op, operand)?),
        Predicate::And(children) => Resolved::And(
            children
                .iter()
                .map(|c| resolve_predicate(table, c))
                .collect::<Result<_>>()?,
        ),
        Predicate::Or(children) => Resolved::Or(
            children
                .iter()
                .map(|c| resolve_predicate(table, c))
                .collect::<Result<_>>()?,
        ),
        Predicate::Not(child) => Resolved::Not(Box::new(resolve_predicate(table, child)?)),
    };
    Ok(resolved)
}

fn resolve_condition(
    table: &Table,
    target: &Target,
    op: CompareOp,
    operand: &Operand,
) -> Result<Condition> {
    let accessor = resolve_target(table, target)?;
    let values = match (op, operand) {
        (CompareOp::Between | CompareOp::NotBetween, Operand::Tuple(bounds)) => {
            if bounds.len() != 2 {
                return Err(Error::unsupported(format!(
                    "{} needs exactly 2 bounds, got {}",
                    op,
                    bounds.len()
                )));
            }
            bounds.clone()
        }
        (CompareOp::In | CompareOp::NotIn, Operand::Tuple(members)) => members.clone(),
        (CompareOp::Like | CompareOp::NotLike, Operand::Scalar(Value::String(p))) => {
            return Ok(Condition {
                accessor,
                op,
                operand: vec![Value::String(p.clone())],
            });
        }
        (CompareOp::Like | CompareOp::NotLike, _) => {
            return Err(Error::unsupported(format!("{} needs a string pattern", op)));
        }
        (_, Operand::Scalar(v)) if !op.takes_tuple() => vec![v.clone()],
        (_, Operand::Scalar(_)) => {
            return Err(Error::unsupported(format!("{} needs a list operand", op)));
        }
        (_, Operand::Tuple(_)) => {
            return Err(Error::unsupported(format!("{} needs a single operand", op)));
        }
    };

    let target_type = match target {
        Target::Column(_) => table.columns().get(accessor.position()).map(|c| c.data_type()),
        Target::Date(_) => Some(DataType::Date),
        Target::JsonExtract { .. } => None,
    };
    let operand = match target_type {
        Some(data_type) => values.into_iter().map(|v| coerce(v, data_type)).collect(),
        None => values,
    };

    Ok(Condition {
        accessor,
        op,
        operand,
    })
}

fn coerce(value: Value, data_type: DataType) -> Value {
    if data_type == DataType::Date {
        if let Value::DateTime(_) = value {
            return value.to_date();
        }
    }
    value.coerce(data_type).unwrap_or(value)
}

/// Resolves a projected expression against a table schema.
pub fn resolve_expr(table: &Table, expr: &Expr) -> Result<ResolvedExpr> {
    resolve_expr_inner(table, expr, false)
}

fn resolve_expr_inner(table: &Table, expr: &Expr, in_aggregate: bool) -> Result<ResolvedExpr> {
    let resolved = match expr {
        Expr::Target(target) => ResolvedExpr::Read(resolve_target(table, target)?),
        Expr::Literal(v) => ResolvedExpr::Literal(v.clone()),
        Expr::Binary { left, op, right } => ResolvedExpr::Binary {
            left: Box::new(resolve_expr_inner(table, left, in_aggregate)?),
            op: *op,
            right: Box::new(resolve_expr_inner(table, right, in_aggregate)?),
        },
        Expr::Case { whens, otherwise } => ResolvedExpr::Case {
            whens: whens
                .iter()
                .map(|(when, then)| -> Result<(Resolved, ResolvedExpr)> {
                    Ok((
                        resolve_predicate(table, when)?,
                        resolve_expr_inner(table, then, in_aggregate)?,
                    ))
                })
                .collect::<Result<_>>()?,
            otherwise: otherwise
                .as_ref()
                .map(|e| resolve_expr_inner(table, e, in_aggregate).map(Box::new))
                .transpose()?,
        },
        Expr::Aggregate { func, arg } => {
            if in_aggregate {
                return Err(Error::unsupported(format!(
                    "nested aggregate {}",
                    func.name()
                )));
            }
            if arg.is_none() && *func != AggregateFunc::Count {
                return Err(Error::unsupported(format!("{} needs an argument", func.name())));
            }
            ResolvedExpr::Aggregate {
                func: *func,
                arg: arg
                    .as_ref()
                    .map(|e| resolve_expr_inner(table, e, true).map(Box::new))
                    .transpose()?,
            }
        }
    };
    Ok(resolved)
}
