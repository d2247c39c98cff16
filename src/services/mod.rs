//! Service layer for the harvester application.
//!
//! This module contains the engine components:
//! - Rate-limited fetching (`Fetcher`)
//! - Pagination planning (`Planner`)
//! - The batched crawl sweep (`CrawlOrchestrator`)
//! - Post-crawl enrichment (`EnrichmentPipeline`)

mod crawler;
mod enrich;
mod fetcher;
mod planner;

pub use crawler::CrawlOrchestrator;
pub use enrich::EnrichmentPipeline;
pub use fetcher::Fetcher;
pub use planner::{PageRequest, Plan, Planner};
