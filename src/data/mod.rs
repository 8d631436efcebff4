//! Data ingestion
//!
//! Reference tables, selection history loading and the burn training dataset.

pub mod dataset;
pub mod history;
pub mod roster;

pub use dataset::SelectionDataset;
pub use history::load_history;
pub use roster::{PlayerRef, Roster};
