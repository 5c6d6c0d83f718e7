//! Coordinator-wide run statistics.
//!
//! `PipelineStats` summarizes every run a coordinator has finished and
//! `StatsManager` applies thread-safe updates from the worker threads.

use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Cumulative statistics for the runs of one coordinator.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineStats {
    /// The total number of finished runs.
    pub total_runs: usize,
    /// The number of runs that reached `Completed`.
    pub completed_runs: usize,
    /// The number of runs that reached `Failed` (cancellations included).
    pub failed_runs: usize,
    /// The average wall-clock run time in milliseconds.
    pub average_run_time_ms: f64,
}

impl PipelineStats {
    /// Creates a new PipelineStats instance with default values.
    pub fn new() -> Self {
        Self {
            total_runs: 0,
            completed_runs: 0,
            failed_runs: 0,
            average_run_time_ms: 0.0,
        }
    }

    /// Returns the success rate as a percentage (0.0 to 100.0).
    pub fn success_rate(&self) -> f64 {
        if self.total_runs == 0 {
            0.0
        } else {
            (self.completed_runs as f64 / self.total_runs as f64) * 100.0
        }
    }
}

impl Default for PipelineStats {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for PipelineStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Pipeline Statistics:")?;
        writeln!(f, "  Total runs: {}", self.total_runs)?;
        writeln!(
            f,
            "  Completed: {} ({:.1}%)",
            self.completed_runs,
            self.success_rate()
        )?;
        writeln!(f, "  Failed: {}", self.failed_runs)?;
        writeln!(f, "  Average run time: {:.2} ms", self.average_run_time_ms)?;
        Ok(())
    }
}

/// Thread-safe manager for updating run statistics.
#[derive(Debug, Default)]
pub struct StatsManager {
    /// Shared statistics state guarded by a mutex.
    stats: Mutex<PipelineStats>,
}

impl StatsManager {
    /// Creates a new `StatsManager` instance with zeroed metrics.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, PipelineStats> {
        self.stats.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns a copy of the current statistics snapshot.
    pub fn get_stats(&self) -> PipelineStats {
        self.lock().clone()
    }

    /// Records one finished run.
    pub fn record_run(&self, completed: bool, run_time_ms: f64) {
        let mut stats = self.lock();

        let previous_total = stats.total_runs;
        let accumulated_time = stats.average_run_time_ms * previous_total as f64;

        stats.total_runs = previous_total + 1;
        if completed {
            stats.completed_runs += 1;
        } else {
            stats.failed_runs += 1;
        }
        stats.average_run_time_ms = (accumulated_time + run_time_ms) / stats.total_runs as f64;
    }
}
