//! Schema module for Tabula.
//!
//! Column and table definitions handed to the store when a table is
//! registered.

mod column;
mod table;

pub use column::{Column, ColumnDefault};
pub use table::{Table, TableBuilder};
