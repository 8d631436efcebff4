//! Training metrics, stability tracking and progress observers

use std::fmt;

/// Snapshot handed to observers at each checkpoint
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CheckpointStats {
    pub iteration: usize,
    pub max_iterations: usize,
    /// Mean squared error at this iteration
    pub error: f64,
    /// Previous checkpoint error minus this one (positive = improving)
    pub delta: Option<f64>,
    pub learning_rate: f64,
}

impl CheckpointStats {
    pub fn progress(&self) -> f64 {
        if self.max_iterations == 0 {
            1.0
        } else {
            self.iteration as f64 / self.max_iterations as f64
        }
    }
}

impl fmt::Display for CheckpointStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Iteration: {}/{} ({:.0}%) - Error: {:.8}",
            self.iteration,
            self.max_iterations,
            self.progress() * 100.0,
            self.error
        )?;
        if let Some(delta) = self.delta {
            write!(f, " - Delta: {:.8}", delta)?;
        }
        Ok(())
    }
}

/// Receives progress at checkpoint boundaries
pub trait TrainingObserver {
    fn on_checkpoint(&mut self, stats: &CheckpointStats);
}

impl<F: FnMut(&CheckpointStats)> TrainingObserver for F {
    fn on_checkpoint(&mut self, stats: &CheckpointStats) {
        self(stats)
    }
}

/// Logs each checkpoint at info level
#[derive(Debug, Clone, Copy, Default)]
pub struct LogObserver;

impl TrainingObserver for LogObserver {
    fn on_checkpoint(&mut self, stats: &CheckpointStats) {
        log::info!("{}", stats);
    }
}

/// Counts consecutive checkpoints whose error rose
#[derive(Debug, Clone)]
pub struct StabilityGuard {
    tolerance: usize,
    last_error: f64,
    increases: usize,
}

impl StabilityGuard {
    pub fn new(tolerance: usize) -> Self {
        StabilityGuard {
            tolerance,
            last_error: f64::INFINITY,
            increases: 0,
        }
    }

    /// Record a checkpoint error; true once rises exceed the tolerance
    pub fn observe(&mut self, error: f64) -> bool {
        if error > self.last_error {
            self.increases += 1;
        } else {
            self.increases = 0;
        }
        self.last_error = error;
        self.increases > self.tolerance
    }

    pub fn increases(&self) -> usize {
        self.increases
    }
}

/// Per-iteration error curve
#[derive(Debug, Clone, Default)]
pub struct TrainingHistory {
    pub errors: Vec<f64>,
    pub checkpoints: Vec<CheckpointStats>,
    pub best_error: f64,
    pub best_iteration: usize,
}

impl TrainingHistory {
    pub fn new() -> Self {
        Self {
            best_error: f64::INFINITY,
            ..Default::default()
        }
    }

    /// Record the error of a (1-based) iteration
    pub fn record_iteration(&mut self, iteration: usize, error: f64) {
        self.errors.push(error);
        if error < self.best_error {
            self.best_error = error;
            self.best_iteration = iteration;
        }
    }

    pub fn record_checkpoint(&mut self, stats: CheckpointStats) {
        self.checkpoints.push(stats);
    }

    /// Get improvement from last iteration
    pub fn last_improvement(&self) -> Option<f64> {
        if self.errors.len() < 2 {
            return None;
        }
        let n = self.errors.len();
        Some(self.errors[n - 2] - self.errors[n - 1])
    }

    pub fn final_error(&self) -> Option<f64> {
        self.errors.last().copied()
    }
}
