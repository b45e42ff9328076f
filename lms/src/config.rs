//! Runtime settings for key generation, loading and chain signing.

use crate::constants::{DEFAULT_KEY_RESERVE_COUNT, STORED_TOP_LEVEL_NODES, THREAD_COUNT};
use crate::error::{Error, Result};

/// Tunables passed explicitly to every operation that needs them.
///
/// ```
/// use lms_hss::Settings;
///
/// let settings = Settings::default().with_threads(4).with_reserve_count(100);
/// assert_eq!(settings.threads, 4);
/// assert_eq!(settings.stored_top_level_nodes, 65_535);
/// ```
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Settings {
    /// Keys reserved at once on the terminal level of a chain.
    pub reserve_count: u32,
    /// Maximum internal node hashes cached per tree.
    pub stored_top_level_nodes: usize,
    /// Size of the leaf generation worker pool.
    pub threads: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            reserve_count: DEFAULT_KEY_RESERVE_COUNT,
            stored_top_level_nodes: STORED_TOP_LEVEL_NODES,
            threads: THREAD_COUNT,
        }
    }
}

impl Settings {
    /// Sets the terminal-level reservation size.
    pub fn with_reserve_count(mut self, reserve_count: u32) -> Self {
        self.reserve_count = reserve_count;
        self
    }

    /// Sets the internal node cache limit.
    pub fn with_stored_top_level_nodes(mut self, limit: usize) -> Self {
        self.stored_top_level_nodes = limit;
        self
    }

    /// Sets the worker pool size.
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.threads == 0 {
            return Err(Error::invalid("thread count must be at least 1"));
        }
        if self.reserve_count == 0 {
            return Err(Error::invalid("reserve count must be at least 1"));
        }
        Ok(())
    }
}
