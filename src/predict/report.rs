//! Saved prediction reports and console formatting

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::predict::AccuracyReport;
use crate::{PredictionResult, Result};

/// Everything written out after a prediction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionReport {
    pub prediction: PredictionResult,
    pub as_numbers: String,
    pub generated_at: DateTime<Utc>,
    pub method: String,
    pub training_error: f64,
    pub confidence: f32,
    pub accuracy: AccuracyReport,
}

impl PredictionReport {
    pub fn new(prediction: PredictionResult, training_error: f64, accuracy: AccuracyReport) -> Self {
        PredictionReport {
            as_numbers: prediction.as_numbers(),
            confidence: prediction.confidence,
            generated_at: Utc::now(),
            method: "neural_network".to_string(),
            training_error,
            accuracy,
            prediction,
        }
    }

    /// Write as pretty JSON, creating parent directories
    pub fn save(&self, path: &str) -> Result<()> {
        if let Some(parent) = Path::new(path).parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}

/// Format a prediction for console display
pub fn format_prediction(pred: &PredictionResult) -> String {
    let mut rows = String::new();
    for pick in &pred.players {
        let marker = if pick.boosted { " *" } else { "" };
        rows.push_str(&format!(
            "│  Position {}:  {:<24} {:>5.1}%{}\n",
            pick.position + 1,
            pick.player.name,
            pick.probability * 100.0,
            marker
        ));
    }

    format!(
        r#"
┌─────────────────────────────────────────────────┐
│  Predicted lineup {}
├─────────────────────────────────────────────────┤
{}│  Goalie:      {:<24} {:>5.1}%
├─────────────────────────────────────────────────┤
│  Confidence:  {:.1}%
└─────────────────────────────────────────────────┘
"#,
        pred.as_numbers(),
        rows,
        pred.goalie.goalie.name,
        pred.goalie.probability * 100.0,
        pred.confidence * 100.0
    )
}
