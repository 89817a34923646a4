//! Configuration for scenario runs.

use serde::{Deserialize, Serialize};

/// Controls how the engine evaluates positions.
///
/// Only affects performance: results are identical whether positions are
/// evaluated sequentially or in parallel.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EngineConfig {
    /// Enable parallel evaluation (requires the `parallel` feature).
    pub parallel: bool,

    /// Minimum position count before evaluating in parallel.
    /// Below this, thread overhead outweighs the work.
    pub parallel_threshold: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            parallel: true,
            parallel_threshold: 256,
        }
    }
}

impl EngineConfig {
    /// Creates a new config with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a config that always evaluates sequentially.
    #[must_use]
    pub fn sequential() -> Self {
        Self {
            parallel: false,
            ..Self::default()
        }
    }

    /// Sets whether to evaluate in parallel.
    #[must_use]
    pub fn with_parallel(mut self, enabled: bool) -> Self {
        self.parallel = enabled;
        self
    }

    /// Sets the position count threshold for parallel evaluation.
    #[must_use]
    pub fn with_threshold(mut self, threshold: usize) -> Self {
        self.parallel_threshold = threshold;
        self
    }

    /// Returns true if parallel evaluation should be used for the given count.
    #[must_use]
    pub fn should_parallelize(&self, count: usize) -> bool {
        cfg!(feature = "parallel") && self.parallel && count >= self.parallel_threshold
    }
}
