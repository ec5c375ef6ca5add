//! Store configuration.

/// Behaviour switches of a [`Store`](crate::Store).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoreConfig {
    validate_before_commit: bool,
    index_selection: bool,
}

impl StoreConfig {
    /// Creates the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// When true (the default), a commit checks every buffered change before
    /// applying any of them, so a failing commit leaves the store untouched
    /// and the buffer intact. When false, changes are applied in order and a
    /// failure leaves everything before it applied and discards the rest of
    /// the buffer.
    pub fn validate_before_commit(mut self, enabled: bool) -> Self {
        self.validate_before_commit = enabled;
        self
    }

    /// When false, queries never consult indexes and always scan.
    pub fn index_selection(mut self, enabled: bool) -> Self {
        self.index_selection = enabled;
        self
    }

    /// Returns whether commits validate before applying.
    #[inline]
    pub fn validates_before_commit(&self) -> bool {
        self.validate_before_commit
    }

    /// Returns whether queries may use indexes.
    #[inline]
    pub fn uses_indexes(&self) -> bool {
        self.index_selection
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            validate_before_commit: true,
            index_selection: true,
        }
    }
}
