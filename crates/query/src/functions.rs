//! Functions that wrap a column in a comparison or projection.

use tabula_core::Value;

/// A resolved column function.
#[derive(Clone, Debug, PartialEq)]
pub enum Function {
    /// Calendar date of a date or datetime value.
    Date,
    /// Nested member of a structured value, one key per segment.
    JsonExtract(Vec<String>),
}

impl Function {
    /// Parses a `json_extract` path. A leading `$.` or `$` is optional;
    /// the rest is split on dots.
    pub fn json_path(path: &str) -> Self {
        let raw = path
            .strip_prefix("$.")
            .or_else(|| path.strip_prefix('$'))
            .unwrap_or(path);
        let segments = if raw.is_empty() {
            Vec::new()
        } else {
            raw.split('.').map(str::to_string).collect()
        };
        Function::JsonExtract(segments)
    }

    /// Applies the function. Values it cannot apply to yield `Null`.
    pub fn apply(&self, value: &Value) -> Value {
        match self {
            Function::Date => value.to_date(),
            Function::JsonExtract(segments) => {
                let mut current = value;
                for key in segments {
                    match current.as_object().and_then(|o| o.get(key)) {
                        Some(next) => current = next,
                        None => return Value::Null,
                    }
                }
                current.clone()
            }
        }
    }
}
