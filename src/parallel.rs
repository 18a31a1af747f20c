//! Rayon thread pool configuration
//!
//! Per-grid-point work (axis means, t-tests) runs on rayon's global pool;
//! this module sizes it once at startup.

use crate::errors::{ClimVisError, Result};
use rayon::ThreadPoolBuilder;

/// Configuration for parallel processing
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParallelConfig {
    pub num_threads: Option<usize>,
}

impl ParallelConfig {
    #[must_use]
    pub fn new(num_threads: Option<usize>) -> Self {
        Self { num_threads }
    }

    /// Use every available CPU core
    #[must_use]
    pub fn all_cores() -> Self {
        Self::new(Some(num_cpus::get()))
    }

    /// Set up the global Rayon thread pool.
    ///
    /// # Errors
    ///
    /// Returns `ThreadPoolError` for a zero thread count or when the global
    /// pool was already initialised.
    pub fn setup_global_pool(&self) -> Result<()> {
        match self.num_threads {
            Some(0) => Err(ClimVisError::ThreadPoolError(
                "thread count must be at least 1".to_string(),
            )),
            Some(num_threads) => {
                ThreadPoolBuilder::new()
                    .num_threads(num_threads)
                    .build_global()
                    .map_err(|e| {
                        ClimVisError::ThreadPoolError(format!(
                            "Failed to initialize thread pool with {num_threads} threads: {e}"
                        ))
                    })?;
                tracing::info!(threads = num_threads, "configured thread pool");
                Ok(())
            }
            None => {
                tracing::debug!(threads = rayon::current_num_threads(), "using default thread pool");
                Ok(())
            }
        }
    }
}

/// Snapshot of the parallel processing environment
#[derive(Debug, Clone)]
pub struct ParallelInfo {
    pub current_threads: usize,
    pub available_cores: usize,
}

impl ParallelInfo {
    #[must_use]
    pub fn current() -> Self {
        Self {
            current_threads: rayon::current_num_threads(),
            available_cores: num_cpus::get(),
        }
    }

    pub fn log(&self) {
        tracing::debug!(
            current_threads = self.current_threads,
            available_cores = self.available_cores,
            "parallel environment"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_threads_rejected() {
        let err = ParallelConfig::new(Some(0)).setup_global_pool().unwrap_err();
        assert!(matches!(err, ClimVisError::ThreadPoolError(_)));
    }

    #[test]
    fn all_cores_matches_cpu_count() {
        assert_eq!(ParallelConfig::all_cores().num_threads, Some(num_cpus::get()));
        assert!(ParallelInfo::current().available_cores >= 1);
    }
}
