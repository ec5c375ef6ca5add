//! Tabula Storage - Transactional store for the Tabula engine.
//!
//! This crate provides the storage layer including:
//!
//! - `Store`: Committed tables, their indexes and the writer buffer
//! - `PendingChanges`: Buffered inserts, deletes, updates and mutations
//! - `TableData`: Live records, primary-key map and auto-increment counter
//! - `CommitOutcome`: Counts and inserted snapshots of a commit
//! - `StoreConfig`: Commit and query behaviour switches
//!
//! # Example
//!
//! ```rust
//! use tabula_storage::Store;
//! use tabula_core::schema::TableBuilder;
//! use tabula_core::{DataType, Value};
//!
//! // Create a store and table
//! let mut store = Store::new();
//! let schema = TableBuilder::new("users")
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
//! // Buffer an insert and commit it
//! let row = store.table("users").unwrap().record(&[("name", "Alice".into())]).unwrap();
//! store.add("users", row).unwrap();
//! let outcome = store.commit().unwrap();
//!
//! assert_eq!(outcome.returning("users", &["id"]).unwrap(), vec![vec![Value::Integer(1)]]);
//! assert_eq!(store.len("users"), 1);
//! ```

pub mod config;
pub mod outcome;
pub mod pending;
pub mod store;
pub mod table_data;

pub use config::StoreConfig;
pub use outcome::CommitOutcome;
pub use pending::{FieldChange, FieldUpdates, PendingChanges, TableChanges};
pub use store::Store;
pub use table_data::TableData;
