//! Model training
//!
//! Full-batch training loop, stability checks and progress reporting.

pub mod metrics;
pub mod trainer;

pub use metrics::{CheckpointStats, LogObserver, StabilityGuard, TrainingHistory, TrainingObserver};
pub use trainer::{TrainedModel, Trainer};
