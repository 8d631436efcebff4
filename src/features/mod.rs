//! Feature extraction and encoding
//!
//! Statistical weights over selection history and the fixed-width encodings
//! consumed by the regressor.

pub mod encoding;
pub mod patterns;
pub mod weights;

pub use encoding::FeatureEncoder;
pub use patterns::PatternSummary;
pub use weights::{PairKey, WeightCounts, WeightTable};
