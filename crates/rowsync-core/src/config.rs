#![forbid(unsafe_code)]

//! Diff engine configuration.

/// Configuration for [`ListDiffEngine`](crate::ListDiffEngine).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiffConfig {
    /// Report reordered rows as `Move`. When off, a reordered row becomes a
    /// `Remove` followed by an `Insert`.
    pub detect_moves: bool,
    /// Catch panics raised by item predicates and record them as
    /// comparison faults. When off, a panicking predicate unwinds through
    /// the diff.
    ///
    /// Catching needs the `panic = "unwind"` strategy; under
    /// `panic = "abort"` a predicate panic still aborts the process.
    pub catch_predicate_panics: bool,
}

impl Default for DiffConfig {
    fn default() -> Self {
        Self {
            detect_moves: true,
            catch_predicate_panics: true,
        }
    }
}

impl DiffConfig {
    /// Toggle move detection.
    #[must_use]
    pub fn with_detect_moves(mut self, enabled: bool) -> Self {
        self.detect_moves = enabled;
        self
    }

    /// Toggle fail-soft handling of panicking predicates.
    #[must_use]
    pub fn with_catch_predicate_panics(mut self, enabled: bool) -> Self {
        self.catch_predicate_panics = enabled;
        self
    }
}
