//! Project executor.

use crate::ast::BinaryOp;
use crate::resolve::ResolvedExpr;
use core::cmp::Ordering;
use tabula_core::{Row, Value};

/// Project executor - computes one output tuple per record.
pub struct ProjectExecutor {
    exprs: Vec<ResolvedExpr>,
}

impl ProjectExecutor {
    /// Creates a new project executor.
    pub fn new(exprs: Vec<ResolvedExpr>) -> Self {
        Self { exprs }
    }

    /// Projects a record.
    pub fn project(&self, row: &Row) -> Vec<Value> {
        self.exprs.iter().map(|e| eval(e, row)).collect()
    }
}

/// Evaluates an expression against a single record. Aggregates have no
/// meaning per record and evaluate to `Null`.
pub fn eval(expr: &ResolvedExpr, row: &Row) -> Value {
    match expr {
        ResolvedExpr::Read(accessor) => accessor.read(row).into_owned(),
        ResolvedExpr::Literal(v) => v.clone(),
        ResolvedExpr::Binary { left, op, right } => binary(*op, &eval(left, row), &eval(right, row)),
        ResolvedExpr::Case { whens, otherwise } => {
            match whens.iter().find(|(when, _)| when.matches(row)) {
                Some((_, then)) => eval(then, row),
                None => otherwise.as_ref().map_or(Value::Null, |e| eval(e, row)),
            }
        }
        ResolvedExpr::Aggregate { .. } => Value::Null,
    }
}

/// Applies a binary operator.
///
/// Arithmetic on a `Null` or non-numeric operand is `Null`, as is division
/// by zero and integer overflow. `/` always divides as floats. Comparisons
/// yield booleans: numbers compare numerically across integer and float,
/// equality treats `Null` as equal to itself and ordering never holds for
/// `Null`.
pub fn binary(op: BinaryOp, left: &Value, right: &Value) -> Value {
    if op.is_comparison() {
        return Value::Boolean(compare(op, left, right));
    }

    match (left, right) {
        (Value::Integer(a), Value::Integer(b)) => {
            let result = match op {
                BinaryOp::Add => a.checked_add(*b),
                BinaryOp::Sub => a.checked_sub(*b),
                BinaryOp::Mul => a.checked_mul(*b),
                BinaryOp::Mod => a.checked_rem(*b),
                _ => return float_op(op, *a as f64, *b as f64),
            };
            result.map_or(Value::Null, Value::Integer)
        }
        _ => match (left.as_number(), right.as_number()) {
            (Some(a), Some(b)) => float_op(op, a, b),
            _ => Value::Null,
        },
    }
}

fn float_op(op: BinaryOp, a: f64, b: f64) -> Value {
    let result = match op {
        BinaryOp::Add => a + b,
        BinaryOp::Sub => a - b,
        BinaryOp::Mul => a * b,
        BinaryOp::Div | BinaryOp::Mod if b == 0.0 => return Value::Null,
        BinaryOp::Div => a / b,
        BinaryOp::Mod => a % b,
        _ => return Value::Null,
    };
    Value::Float(result)
}

fn compare(op: BinaryOp, left: &Value, right: &Value) -> bool {
    let ordering = match (left.as_number(), right.as_number()) {
        (Some(a), Some(b)) => a.total_cmp(&b),
        _ => left.cmp(right),
    };
    match op {
        BinaryOp::Eq => ordering == Ordering::Equal,
        BinaryOp::Ne => ordering != Ordering::Equal,
        _ if left.is_null() || right.is_null() => false,
        BinaryOp::Lt => ordering == Ordering::Less,
        BinaryOp::Le => ordering != Ordering::Greater,
        BinaryOp::Gt => ordering == Ordering::Greater,
        _ => ordering != Ordering::Less,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integer_arithmetic() {
        let (a, b) = (Value::Integer(7), Value::Integer(2));
        assert_eq!(binary(BinaryOp::Add, &a, &b), Value::Integer(9));
        assert_eq!(binary(BinaryOp::Sub, &b, &a), Value::Integer(-5));
        assert_eq!(binary(BinaryOp::Mul, &a, &b), Value::Integer(14));
        assert_eq!(binary(BinaryOp::Mod, &a, &b), Value::Integer(1));
        assert_eq!(binary(BinaryOp::Div, &a, &b), Value::Float(3.5));
    }

    #[test]
    fn test_null_and_zero() {
        let zero = Value::Integer(0);
        assert_eq!(binary(BinaryOp::Div, &Value::Integer(1), &zero), Value::Null);
        assert_eq!(binary(BinaryOp::Mod, &Value::Integer(1), &zero), Value::Null);
        assert_eq!(binary(BinaryOp::Add, &Value::Null, &zero), Value::Null);
        assert_eq!(binary(BinaryOp::Add, &Value::from("a"), &zero), Value::Null);
        assert_eq!(
            binary(BinaryOp::Add, &Value::Integer(i64::MAX), &Value::Integer(1)),
            Value::Null
        );
    }

    #[test]
    fn test_mixed_numbers() {
        assert_eq!(
            binary(BinaryOp::Mul, &Value::Integer(2), &Value::Float(1.5)),
            Value::Float(3.0)
        );
        assert_eq!(
            binary(BinaryOp::Eq, &Value::Integer(2), &Value::Float(2.0)),
            Value::Boolean(true)
        );
        assert_eq!(
            binary(BinaryOp::Lt, &Value::Float(1.5), &Value::Integer(2)),
            Value::Boolean(true)
        );
    }

    #[test]
    fn test_null_comparisons() {
        assert_eq!(binary(BinaryOp::Eq, &Value::Null, &Value::Null), Value::Boolean(true));
        assert_eq!(binary(BinaryOp::Ge, &Value::Null, &Value::Null), Value::Boolean(false));
        assert_eq!(
            binary(BinaryOp::Ne, &Value::Null, &Value::Integer(1)),
            Value::Boolean(true)
        );
    }
}
