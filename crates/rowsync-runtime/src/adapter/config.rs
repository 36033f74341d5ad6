#![forbid(unsafe_code)]

//! Adapter configuration.

use rowsync_core::DiffConfig;

/// Configuration for [`LifecycleListAdapter`](super::LifecycleListAdapter).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdapterConfig {
    /// Settings for the diff run on every submission.
    pub diff: DiffConfig,
    /// Reject submitted sequences longer than this.
    pub max_rows: Option<usize>,
    /// Reject submitted sequences containing a row whose identity check is
    /// not reflexive.
    pub check_reflexive_identity: bool,
}

impl Default for AdapterConfig {
    fn default() -> Self {
        Self {
            diff: DiffConfig::default(),
            max_rows: None,
            check_reflexive_identity: true,
        }
    }
}

impl AdapterConfig {
    #[must_use]
    pub fn with_diff(mut self, diff: DiffConfig) -> Self {
        self.diff = diff;
        self
    }

    #[must_use]
    pub fn with_max_rows(mut self, max_rows: usize) -> Self {
        self.max_rows = Some(max_rows);
        self
    }

    #[must_use]
    pub fn with_check_reflexive_identity(mut self, enabled: bool) -> Self {
        self.check_reflexive_identity = enabled;
        self
    }
}
