//! Per-operation progress tracking
//!
//! The cloud CLI offers no structured progress stream, so descriptors are
//! advanced by timer ticks against an expected duration. `completed`
//! approaches but never reaches `total` until the terminal message lands;
//! the ETA is a hint, not ground truth.

use std::time::{Duration, Instant};

/// Coarse stage of a long-running operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Starting,
    Running,
    Finishing,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Starting => "starting",
            Self::Running => "running",
            Self::Finishing => "finishing",
        }
    }
}

/// Simulated progress for one dispatched operation
#[derive(Debug, Clone)]
pub struct ProgressDescriptor {
    /// What is being done, e.g. "start webapp-prod-01"
    pub operation: String,
    pub stage: Stage,
    pub completed: u64,
    pub total: u64,
    pub started: Instant,
    /// Status-bar label for the currently running step
    pub current_operation: String,
    pub estimated_remaining: Option<Duration>,
    /// Per-item failures accumulated along the way
    pub errors: Vec<(String, String)>,
    expected: Duration,
}

impl ProgressDescriptor {
    pub fn new(operation: impl Into<String>, total: u64, expected: Duration) -> Self {
        let operation = operation.into();
        Self {
            current_operation: operation.clone(),
            operation,
            stage: Stage::Starting,
            completed: 0,
            total,
            started: Instant::now(),
            estimated_remaining: Some(expected),
            errors: Vec::new(),
            expected,
        }
    }

    /// Advance the time-based estimate. Holds the invariant
    /// `0 <= completed <= total` and stays strictly below `total`.
    pub fn tick(&mut self) {
        let elapsed = self.started.elapsed();
        let fraction = if self.expected.is_zero() {
            1.0
        } else {
            (elapsed.as_secs_f64() / self.expected.as_secs_f64()).min(1.0)
        };

        let ceiling = self.total.saturating_sub(1);
        self.completed = ((fraction * self.total as f64) as u64).min(ceiling);

        self.stage = if fraction < 0.2 {
            Stage::Starting
        } else if fraction < 0.9 {
            Stage::Running
        } else {
            Stage::Finishing
        };

        self.estimated_remaining = self.expected.checked_sub(elapsed);
    }

    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.completed as f64 / self.total as f64
    }

    pub fn record_error(&mut self, item: impl Into<String>, message: impl Into<String>) {
        self.errors.push((item.into(), message.into()));
    }
}
