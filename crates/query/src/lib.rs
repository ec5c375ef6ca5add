//! Tabula Query - Predicate and aggregate query engine for the Tabula engine.
//!
//! This crate provides the query layer including:
//!
//! - `ast`: Predicate and expression trees built by callers
//! - `resolve`: Binding of names to column positions and literal coercion
//! - `functions`: `date` and `json_extract` column functions
//! - `executor`: Filter, sort, limit, project and aggregate executors
//! - `query`: The `Query` builder tying them together
//!
//! # Example
//!
//! ```rust
//! use tabula_core::schema::TableBuilder;
//! use tabula_core::{DataType, Value};
//! use tabula_query::{Predicate, Query};
//! use tabula_storage::Store;
//!
//! let mut store = Store::new();
//! let schema = TableBuilder::new("items")
//!     .unwrap()
//!     .add_column("id", DataType::Integer)
//!     .unwrap()
//!     .add_column("name", DataType::String)
//!     .unwrap()
//!     .primary_key("id")
//!     .unwrap()
//!     .build()
//!     .unwrap();
//! store.create_table(schema).unwrap();
//!
//! for name in ["foo", "bar"] {
//!     let row = store.table("items").unwrap().record(&[("name", name.into())]).unwrap();
//!     store.add("items", row).unwrap();
//! }
//! store.commit().unwrap();
//!
//! let found = Query::table("items")
//!     .filter(Predicate::like("name", "fo%"))
//!     .fetch(&store)
//!     .unwrap();
//! assert_eq!(found.len(), 1);
//! assert_eq!(found[0].get(0), Some(&Value::Integer(1)));
//! ```

pub mod ast;
pub mod executor;
pub mod functions;
pub mod query;
pub mod resolve;

pub use ast::{AggregateFunc, BinaryOp, Expr, Operand, Predicate, SelectItem, SortOrder, Target};
pub use query::{Query, ResultSet};
