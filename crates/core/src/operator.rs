//! Comparison operators shared by indexes and predicates.

use crate::error::Error;
use core::fmt;
use core::str::FromStr;

/// Operator of a comparison between a column and a literal operand.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    /// Null-identity test (`IS`).
    Is,
    /// Negated null-identity test (`IS NOT`).
    IsNot,
    Like,
    NotLike,
    In,
    NotIn,
    /// Inclusive on both bounds.
    Between,
    NotBetween,
}

impl CompareOp {
    /// Operators answered by a hash index bucket lookup.
    pub fn uses_hash_index(&self) -> bool {
        matches!(
            self,
            CompareOp::Eq | CompareOp::Ne | CompareOp::In | CompareOp::NotIn
        )
    }

    /// Operators answered by a range index bound scan.
    pub fn uses_range_index(&self) -> bool {
        matches!(
            self,
            CompareOp::Lt
                | CompareOp::Le
                | CompareOp::Gt
                | CompareOp::Ge
                | CompareOp::Between
                | CompareOp::NotBetween
        )
    }

    /// Returns true if an index can answer this operator.
    pub fn is_index_capable(&self) -> bool {
        self.uses_hash_index() || self.uses_range_index()
    }

    /// Returns true if the operand must be a tuple of values.
    pub fn takes_tuple(&self) -> bool {
        matches!(
            self,
            CompareOp::In | CompareOp::NotIn | CompareOp::Between | CompareOp::NotBetween
        )
    }

    /// Returns the operator's textual form.
    pub fn as_str(&self) -> &'static str {
        match self {
            CompareOp::Eq => "=",
            CompareOp::Ne => "!=",
            CompareOp::Lt => "<",
            CompareOp::Le => "<=",
            CompareOp::Gt => ">",
            CompareOp::Ge => ">=",
            CompareOp::Is => "is",
            CompareOp::IsNot => "is not",
            CompareOp::Like => "like",
            CompareOp::NotLike => "not like",
            CompareOp::In => "in",
            CompareOp::NotIn => "not in",
            CompareOp::Between => "between",
            CompareOp::NotBetween => "not between",
        }
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CompareOp {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let op = match s.trim().to_ascii_lowercase().as_str() {
            "=" | "==" | "eq" => CompareOp::Eq,
            "!=" | "<>" | "ne" => CompareOp::Ne,
            "<" | "lt" => CompareOp::Lt,
            "<=" | "le" => CompareOp::Le,
            ">" | "gt" => CompareOp::Gt,
            ">=" | "ge" => CompareOp::Ge,
            "is" => CompareOp::Is,
            "is not" | "isnot" => CompareOp::IsNot,
            "like" => CompareOp::Like,
            "not like" => CompareOp::NotLike,
            "in" => CompareOp::In,
            "not in" | "notin" => CompareOp::NotIn,
            "between" => CompareOp::Between,
            "not between" => CompareOp::NotBetween,
            other => return Err(Error::unsupported(format!("operator {}", other))),
        };
        Ok(op)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_routing() {
        assert!(CompareOp::Eq.uses_hash_index());
        assert!(CompareOp::NotIn.uses_hash_index());
        assert!(CompareOp::Between.uses_range_index());
        assert!(!CompareOp::Like.is_index_capable());
        assert!(!CompareOp::Is.is_index_capable());
    }

    #[test]
    fn test_parse() {
        assert_eq!("<>".parse::<CompareOp>().unwrap(), CompareOp::Ne);
        assert_eq!("NOT BETWEEN".parse::<CompareOp>().unwrap(), CompareOp::NotBetween);
        assert!(matches!(
            "regexp".parse::<CompareOp>(),
            Err(Error::UnsupportedPredicate { .. })
        ));
    }
}
