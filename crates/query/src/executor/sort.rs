//! Sort executor.

use crate::ast::SortOrder;
use crate::resolve::Accessor;
use core::cmp::Ordering;
use std::rc::Rc;
use tabula_core::Row;

/// Sort executor - sorts records by one or more keys.
pub struct SortExecutor {
    keys: Vec<(Accessor, SortOrder)>,
}

impl SortExecutor {
    /// Creates a new sort executor. The first key is the most significant.
    pub fn new(keys: Vec<(Accessor, SortOrder)>) -> Self {
        Self { keys }
    }

    /// Sorts records in place. The sort is stable, so records equal on every
    /// key keep their input order.
    pub fn execute(&self, rows: &mut [Rc<Row>]) {
        if self.keys.is_empty() {
            return;
        }
        rows.sort_by(|a, b| self.compare(a, b));
    }

    fn compare(&self, a: &Row, b: &Row) -> Ordering {
        for (accessor, order) in &self.keys {
            let cmp = accessor.read(a).cmp(&accessor.read(b));
            if cmp != Ordering::Equal {
                return match order {
                    SortOrder::Asc => cmp,
                    SortOrder::Desc => cmp.reverse(),
                };
            }
        }
        Ordering::Equal
    }
}
