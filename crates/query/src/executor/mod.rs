//! Query executor module.

mod aggregate;
mod filter;
mod limit;
mod project;
mod sort;

pub use aggregate::AggregateExecutor;
pub use filter::{FilterExecutor, RowStream};
pub use limit::LimitExecutor;
pub use project::{binary, eval, ProjectExecutor};
pub use sort::SortExecutor;
