//! Execution counters and a resumable wall-clock timer.

use serde::Serialize;
use std::time::{Duration, Instant};

/// Performance counters for one loaded program.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PerformanceMetrics {
    /// Completed instructions.
    pub instruction_count: u64,
    /// Completed cycles. One per instruction.
    pub cycles: u64,
    /// Branches actually taken.
    pub branch_count: u64,
    /// Computed on every [`stop_timer`](Self::stop_timer).
    pub instructions_per_second: f64,
    #[serde(skip)]
    started_at: Option<Instant>,
    #[serde(rename = "accumulated_seconds", serialize_with = "serialize_secs")]
    accumulated: Duration,
}

fn serialize_secs<S: serde::Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_f64(d.as_secs_f64())
}

impl PerformanceMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start (or continue) timing. Does nothing if already running.
    pub fn resume_timer(&mut self) {
        if self.started_at.is_none() {
            self.started_at = Some(Instant::now());
        }
    }

    /// Stop timing and update `instructions_per_second`.
    ///
    /// Returns `false` without touching anything if the timer was not running.
    pub fn stop_timer(&mut self) -> bool {
        let Some(started) = self.started_at.take() else {
            return false;
        };
        self.accumulated += started.elapsed();
        self.instructions_per_second = Self::rate(self.instruction_count, self.accumulated);
        true
    }

    pub fn is_running(&self) -> bool {
        self.started_at.is_some()
    }

    /// Total timed wall-clock seconds, excluding a currently running interval.
    pub fn accumulated_seconds(&self) -> f64 {
        self.accumulated.as_secs_f64()
    }

    fn rate(count: u64, elapsed: Duration) -> f64 {
        let secs = elapsed.as_secs_f64();
        if secs == 0.0 {
            0.0
        } else {
            count as f64 / secs
        }
    }
}
