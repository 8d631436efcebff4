//! Prediction and inference
//!
//! Load trained models, decode their output into lineups and compare the
//! result against history.

pub mod accuracy;
pub mod inference;
pub mod report;

pub use accuracy::{analyze_accuracy, AccuracyReport};
pub use inference::{Decoder, Predictor};
pub use report::PredictionReport;
