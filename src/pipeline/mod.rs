//! Pipeline entry point for a full harvest run.
//!
//! - `run_harvest`: plan, crawl, enrich, and export in sequence

pub mod harvest;

pub use harvest::{run_harvest, HarvestStats};
