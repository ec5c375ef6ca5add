//! Limit executor.

/// Limit executor - applies OFFSET then LIMIT to a sequence.
#[derive(Clone, Copy, Debug, Default)]
pub struct LimitExecutor {
    limit: Option<usize>,
    offset: usize,
}

impl LimitExecutor {
    /// Creates a new limit executor. A `None` limit keeps everything after
    /// the offset.
    pub fn new(limit: Option<usize>, offset: usize) -> Self {
        Self { limit, offset }
    }

    /// Applies the window lazily.
    pub fn execute<'a, I>(&self, input: I) -> Box<dyn Iterator<Item = I::Item> + 'a>
    where
        I: Iterator + 'a,
    {
        let skipped = input.skip(self.offset);
        match self.limit {
            Some(limit) => Box::new(skipped.take(limit)),
            None => Box::new(skipped),
        }
    }
}
