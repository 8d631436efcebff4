//! Neural network architecture
//!
//! Feed-forward regressor mapping an encoded history block to an encoded
//! lineup block, plus the manifest persisted beside its weights.

pub mod manifest;
pub mod regressor;

pub use manifest::ModelManifest;
pub use regressor::{Activation, RegressorConfig, TeamRegressor};
