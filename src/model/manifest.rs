//! Metadata saved next to the model weights

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::RegressorConfig;
use crate::Result;

/// Describes a trained model so it can be rebuilt before loading weights
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelManifest {
    pub regressor: RegressorConfig,
    pub final_error: f64,
    pub iterations: usize,
    pub examples: usize,
    pub trained_at: DateTime<Utc>,
}

impl ModelManifest {
    /// Manifest path for a model path (`model/x` → `model/x.json`)
    pub fn path_for(model_path: &str) -> String {
        format!("{}.json", model_path)
    }

    /// True when both the manifest and the weights exist
    pub fn exists(model_path: &str) -> bool {
        Path::new(&Self::path_for(model_path)).exists()
            && Path::new(&format!("{}.mpk", model_path)).exists()
    }

    pub fn save(&self, model_path: &str) -> Result<()> {
        let path = Self::path_for(model_path);
        if let Some(parent) = Path::new(&path).parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn load(model_path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(Self::path_for(model_path))?;
        Ok(serde_json::from_str(&content)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manifest_roundtrip_on_disk() {
        let dir = std::env::temp_dir().join(format!("lineup-manifest-{}", std::process::id()));
        let model_path = dir.join("model").to_string_lossy().to_string();

        let manifest = ModelManifest {
            regressor: RegressorConfig::default(),
            final_error: 0.0125,
            iterations: 340,
            examples: 12,
            trained_at: Utc::now(),
        };
        manifest.save(&model_path).unwrap();

        let loaded = ModelManifest::load(&model_path).unwrap();
        assert_eq!(loaded.regressor, manifest.regressor);
        assert_eq!(loaded.iterations, 340);
        // Weights were never written
        assert!(!ModelManifest::exists(&model_path));

        std::fs::remove_dir_all(dir).ok();
    }
}
