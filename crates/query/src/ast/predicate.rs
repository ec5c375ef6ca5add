//! Predicate definitions for query filtering.

use tabula_core::{CompareOp, Value};

/// Left-hand side of a comparison: a column, possibly wrapped in a function.
#[derive(Clone, Debug, PartialEq)]
pub enum Target {
    /// The column value itself.
    Column(String),
    /// `date(column)`: the calendar date of a date or datetime column.
    Date(String),
    /// `json_extract(column, path)`: a nested value of a structured column,
    /// addressed by a dotted path such as `$.ref.abc`.
    JsonExtract { column: String, path: String },
}

impl Target {
    /// Creates a plain column target.
    pub fn column(name: impl Into<String>) -> Self {
        Target::Column(name.into())
    }

    /// Creates a `date(column)` target.
    pub fn date(name: impl Into<String>) -> Self {
        Target::Date(name.into())
    }

    /// Creates a `json_extract(column, path)` target.
    pub fn json_extract(name: impl Into<String>, path: impl Into<String>) -> Self {
        Target::JsonExtract {
            column: name.into(),
            path: path.into(),
        }
    }

    /// Returns the referenced column name.
    pub fn column_name(&self) -> &str {
        match self {
            Target::Column(c) | Target::Date(c) | Target::JsonExtract { column: c, .. } => c,
        }
    }

    /// Returns true if the target is a bare column.
    pub fn is_column(&self) -> bool {
        matches!(self, Target::Column(_))
    }
}

impl From<&str> for Target {
    fn from(name: &str) -> Self {
        Target::column(name)
    }
}

impl From<String> for Target {
    fn from(name: String) -> Self {
        Target::Column(name)
    }
}

/// Right-hand side of a comparison.
#[derive(Clone, Debug, PartialEq)]
pub enum Operand {
    /// A single literal.
    Scalar(Value),
    /// A literal list: members for `in`, bounds for `between`.
    Tuple(Vec<Value>),
}

impl<T: Into<Value>> From<T> for Operand {
    fn from(value: T) -> Self {
        Operand::Scalar(value.into())
    }
}

/// A filter condition tree.
#[derive(Clone, Debug, PartialEq)]
pub enum Predicate {
    /// `target op operand`.
    Compare {
        target: Target,
        op: CompareOp,
        operand: Operand,
    },
    /// Every child holds.
    And(Vec<Predicate>),
    /// At least one child holds.
    Or(Vec<Predicate>),
    /// The child does not hold.
    Not(Box<Predicate>),
}

impl Predicate {
    /// Creates a comparison.
    pub fn compare(target: impl Into<Target>, op: CompareOp, operand: impl Into<Operand>) -> Self {
        Predicate::Compare {
            target: target.into(),
            op,
            operand: operand.into(),
        }
    }

    pub fn eq(target: impl Into<Target>, value: impl Into<Value>) -> Self {
        Self::compare(target, CompareOp::Eq, Operand::Scalar(value.into()))
    }

    pub fn ne(target: impl Into<Target>, value: impl Into<Value>) -> Self {
        Self::compare(target, CompareOp::Ne, Operand::Scalar(value.into()))
    }

    pub fn lt(target: impl Into<Target>, value: impl Into<Value>) -> Self {
        Self::compare(target, CompareOp::Lt, Operand::Scalar(value.into()))
    }

    pub fn le(target: impl Into<Target>, value: impl Into<Value>) -> Self {
        Self::compare(target, CompareOp::Le, Operand::Scalar(value.into()))
    }

    pub fn gt(target: impl Into<Target>, value: impl Into<Value>) -> Self {
        Self::compare(target, CompareOp::Gt, Operand::Scalar(value.into()))
    }

    pub fn ge(target: impl Into<Target>, value: impl Into<Value>) -> Self {
        Self::compare(target, CompareOp::Ge, Operand::Scalar(value.into()))
    }

    /// `target is null`.
    pub fn is_null(target: impl Into<Target>) -> Self {
        Self::compare(target, CompareOp::Is, Value::Null)
    }

    /// `target is not null`.
    pub fn is_not_null(target: impl Into<Target>) -> Self {
        Self::compare(target, CompareOp::IsNot, Value::Null)
    }

    pub fn like(target: impl Into<Target>, pattern: impl Into<String>) -> Self {
        Self::compare(target, CompareOp::Like, Value::String(pattern.into()))
    }

    pub fn not_like(target: impl Into<Target>, pattern: impl Into<String>) -> Self {
        Self::compare(target, CompareOp::NotLike, Value::String(pattern.into()))
    }

    pub fn in_list(target: impl Into<Target>, values: Vec<Value>) -> Self {
        Self::compare(target, CompareOp::In, Operand::Tuple(values))
    }

    pub fn not_in_list(target: impl Into<Target>, values: Vec<Value>) -> Self {
        Self::compare(target, CompareOp::NotIn, Operand::Tuple(values))
    }

    /// Inclusive range test.
    pub fn between(target: impl Into<Target>, low: impl Into<Value>, high: impl Into<Value>) -> Self {
        Self::compare(
            target,
            CompareOp::Between,
            Operand::Tuple(vec![low.into(), high.into()]),
        )
    }

    pub fn not_between(
        target: impl Into<Target>,
        low: impl Into<Value>,
        high: impl Into<Value>,
    ) -> Self {
        Self::compare(
            target,
            CompareOp::NotBetween,
            Operand::Tuple(vec![low.into(), high.into()]),
        )
    }

    pub fn and(children: Vec<Predicate>) -> Self {
        Predicate::And(children)
    }

    pub fn or(children: Vec<Predicate>) -> Self {
        Predicate::Or(children)
    }

    #[allow(clippy::should_implement_trait)]
    pub fn not(child: Predicate) -> Self {
        Predicate::Not(Box::new(child))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_column_name() {
        assert_eq!(Target::column("a").column_name(), "a");
        assert_eq!(Target::date("created").column_name(), "created");
        assert_eq!(Target::json_extract("doc", "$.a").column_name(), "doc");
        assert!(!Target::date("created").is_column());
    }

    #[test]
    fn test_builders() {
        let p = Predicate::between("id", 2, 4);
        assert_eq!(
            p,
            Predicate::Compare {
                target: Target::column("id"),
                op: CompareOp::Between,
                operand: Operand::Tuple(vec![Value::Integer(2), Value::Integer(4)]),
            }
        );

        let p = Predicate::is_null("name");
        assert!(matches!(
            p,
            Predicate::Compare { op: CompareOp::Is, operand: Operand::Scalar(Value::Null), .. }
        ));
    }
}
