//! Tabula Core - Core types and schema definitions for the Tabula store.
//!
//! This crate provides the foundational types shared by every other layer:
//!
//! - `DataType`: Supported column types
//! - `Value`: Runtime values stored in record fields
//! - `Row`: A record with a process-unique handle
//! - `CompareOp`: Comparison operators understood by indexes and predicates
//! - `schema`: Table and column definitions
//! - `Error`: Error kinds surfaced to the integration layer
//!
//! # Example
//!
//! ```rust
//! use tabula_core::{DataType, Value};
//! use tabula_core::schema::TableBuilder;
//!
//! let table = TableBuilder::new("items")
//!     .unwrap()
//!     .add_column("id", DataType::Integer)
//!     .unwrap()
//!     .add_column("name", DataType::String)
//!     .unwrap()
//!     .primary_key("id")
//!     .unwrap()
//!     .build()
//!     .unwrap();
//!
//! let row = table.record(&[("name", Value::from("foo"))]).unwrap();
//! assert_eq!(row.get(0), Some(&Value::Null));
//! assert_eq!(row.get(1), Some(&Value::from("foo")));
//! ```

mod error;
mod operator;
pub mod pattern_match;
mod row;
pub mod schema;
mod types;
mod value;

pub use error::{Error, Result};
pub use operator::CompareOp;
pub use row::{next_row_id, Row, RowId};
pub use types::DataType;
pub use value::Value;
