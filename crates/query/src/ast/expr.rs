//! Expression AST definitions.

use crate::ast::predicate::{Predicate, Target};
use tabula_core::Value;

/// Binary operators of projected expressions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BinaryOp {
    // Arithmetic
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    // Comparison
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl BinaryOp {
    /// Returns true for the comparison operators.
    pub fn is_comparison(&self) -> bool {
        !matches!(
            self,
            BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Mod
        )
    }
}

/// Aggregate functions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AggregateFunc {
    Count,
    Sum,
    Avg,
    Min,
    Max,
}

impl AggregateFunc {
    /// Returns the function name.
    pub fn name(&self) -> &'static str {
        match self {
            AggregateFunc::Count => "count",
            AggregateFunc::Sum => "sum",
            AggregateFunc::Avg => "avg",
            AggregateFunc::Min => "min",
            AggregateFunc::Max => "max",
        }
    }
}

/// Sort order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

/// Expression AST node.
#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    /// Column reference, possibly function-wrapped.
    Target(Target),
    /// Literal value.
    Literal(Value),
    /// Binary operation.
    Binary {
        left: Box<Expr>,
        op: BinaryOp,
        right: Box<Expr>,
    },
    /// `case when .. then .. else .. end`: the first matching clause wins.
    Case {
        whens: Vec<(Predicate, Expr)>,
        otherwise: Option<Box<Expr>>,
    },
    /// Aggregate function. `count` without an argument is `count(*)`.
    Aggregate {
        func: AggregateFunc,
        arg: Option<Box<Expr>>,
    },
}

impl Expr {
    /// Creates a column reference expression.
    pub fn column(name: impl Into<String>) -> Self {
        Expr::Target(Target::column(name))
    }

    /// Creates a literal expression.
    pub fn literal(value: impl Into<Value>) -> Self {
        Expr::Literal(value.into())
    }

    /// Creates a `date(column)` expression.
    pub fn date(name: impl Into<String>) -> Self {
        Expr::Target(Target::date(name))
    }

    /// Creates a `json_extract(column, path)` expression.
    pub fn json_extract(name: impl Into<String>, path: impl Into<String>) -> Self {
        Expr::Target(Target::json_extract(name, path))
    }

    /// Creates a binary operation.
    pub fn binary(left: Expr, op: BinaryOp, right: Expr) -> Self {
        Expr::Binary {
            left: Box::new(left),
            op,
            right: Box::new(right),
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn add(left: Expr, right: Expr) -> Self {
        Self::binary(left, BinaryOp::Add, right)
    }

    #[allow(clippy::should_implement_trait)]
    pub fn sub(left: Expr, right: Expr) -> Self {
        Self::binary(left, BinaryOp::Sub, right)
    }

    #[allow(clippy::should_implement_trait)]
    pub fn mul(left: Expr, right: Expr) -> Self {
        Self::binary(left, BinaryOp::Mul, right)
    }

    #[allow(clippy::should_implement_trait)]
    pub fn div(left: Expr, right: Expr) -> Self {
        Self::binary(left, BinaryOp::Div, right)
    }

    pub fn modulo(left: Expr, right: Expr) -> Self {
        Self::binary(left, BinaryOp::Mod, right)
    }

    pub fn eq(left: Expr, right: Expr) -> Self {
        Self::binary(left, BinaryOp::Eq, right)
    }

    pub fn ne(left: Expr, right: Expr) -> Self {
        Self::binary(left, BinaryOp::Ne, right)
    }

    pub fn lt(left: Expr, right: Expr) -> Self {
        Self::binary(left, BinaryOp::Lt, right)
    }

    pub fn le(left: Expr, right: Expr) -> Self {
        Self::binary(left, BinaryOp::Le, right)
    }

    pub fn gt(left: Expr, right: Expr) -> Self {
        Self::binary(left, BinaryOp::Gt, right)
    }

    pub fn ge(left: Expr, right: Expr) -> Self {
        Self::binary(left, BinaryOp::Ge, right)
    }

    /// Creates a case expression.
    pub fn case(whens: Vec<(Predicate, Expr)>, otherwise: Option<Expr>) -> Self {
        Expr::Case {
            whens,
            otherwise: otherwise.map(Box::new),
        }
    }

    fn aggregate(func: AggregateFunc, arg: Expr) -> Self {
        Expr::Aggregate {
            func,
            arg: Some(Box::new(arg)),
        }
    }

    /// `count(*)`.
    pub fn count_all() -> Self {
        Expr::Aggregate {
            func: AggregateFunc::Count,
            arg: None,
        }
    }

    /// `count(expr)`: number of non-null values.
    pub fn count(arg: Expr) -> Self {
        Self::aggregate(AggregateFunc::Count, arg)
    }

    #[allow(clippy::should_implement_trait)]
    pub fn sum(arg: Expr) -> Self {
        Self::aggregate(AggregateFunc::Sum, arg)
    }

    pub fn avg(arg: Expr) -> Self {
        Self::aggregate(AggregateFunc::Avg, arg)
    }

    pub fn min(arg: Expr) -> Self {
        Self::aggregate(AggregateFunc::Min, arg)
    }

    pub fn max(arg: Expr) -> Self {
        Self::aggregate(AggregateFunc::Max, arg)
    }

    /// Returns true if an aggregate appears anywhere in the expression.
    pub fn has_aggregate(&self) -> bool {
        match self {
            Expr::Aggregate { .. } => true,
            Expr::Target(_) | Expr::Literal(_) => false,
            Expr::Binary { left, right, .. } => left.has_aggregate() || right.has_aggregate(),
            Expr::Case { whens, otherwise } => {
                whens.iter().any(|(_, e)| e.has_aggregate())
                    || otherwise.as_ref().is_some_and(|e| e.has_aggregate())
            }
        }
    }

    /// Attaches an output label.
    pub fn label(self, label: impl Into<String>) -> SelectItem {
        SelectItem {
            expr: self,
            label: Some(label.into()),
        }
    }

    /// Name used for an unlabeled output column.
    pub fn default_label(&self) -> String {
        match self {
            Expr::Target(Target::Column(c)) => c.clone(),
            Expr::Target(Target::Date(_)) => "date".into(),
            Expr::Target(Target::JsonExtract { .. }) => "json_extract".into(),
            Expr::Literal(_) => "literal".into(),
            Expr::Binary { .. } => "expr".into(),
            Expr::Case { .. } => "case".into(),
            Expr::Aggregate { func, .. } => func.name().into(),
        }
    }
}

impl From<&str> for Expr {
    fn from(name: &str) -> Self {
        Expr::column(name)
    }
}

impl From<Target> for Expr {
    fn from(target: Target) -> Self {
        Expr::Target(target)
    }
}

/// A projected output column.
#[derive(Clone, Debug, PartialEq)]
pub struct SelectItem {
    pub expr: Expr,
    pub label: Option<String>,
}

impl SelectItem {
    /// Returns the output column name.
    pub fn name(&self) -> String {
        self.label
            .clone()
            .unwrap_or_else(|| self.expr.default_label())
    }
}

impl From<Expr> for SelectItem {
    fn from(expr: Expr) -> Self {
        SelectItem { expr, label: None }
    }
}

impl From<&str> for SelectItem {
    fn from(name: &str) -> Self {
        Expr::column(name).into()
    }
}
