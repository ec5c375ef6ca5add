//! AST module for query expressions and predicates.

mod expr;
mod predicate;

pub use expr::{AggregateFunc, BinaryOp, Expr, SelectItem, SortOrder};
pub use predicate::{Operand, Predicate, Target};
