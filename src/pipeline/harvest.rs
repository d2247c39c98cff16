// src/pipeline/harvest.rs

//! Full harvest pipeline.
//!
//! Phases run strictly in sequence: plan, crawl sweep, enrichment,
//! export. Only planning failure ends a run early; everything else is
//! diagnosed and skipped.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::error::{AppError, Result};
use crate::export::Sink;
use crate::extract::Extractor;
use crate::models::Config;
use crate::services::{CrawlOrchestrator, EnrichmentPipeline, Fetcher, Planner};
use crate::store::ResultStore;
use crate::utils::http;

/// Counters for a completed harvest run.
#[derive(Debug, Clone)]
pub struct HarvestStats {
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub expected_total: usize,
    pub page_count: usize,
    pub accepted: usize,
    pub duplicates: usize,
    pub network_errors: usize,
    pub parse_failures: usize,
    pub enriched: usize,
}

/// Run the full pipeline and export the results through the sink.
pub async fn run_harvest(config: Arc<Config>, sink: &dyn Sink) -> Result<HarvestStats> {
    let start_time = Utc::now();

    let client = http::create_client(&config.crawler)?;
    let store = Arc::new(ResultStore::new());
    let fetcher = Arc::new(Fetcher::new(
        client,
        config.crawler.max_concurrent,
        config.crawler.retry_attempts,
        Arc::clone(&store),
    ));
    let extractor = Arc::new(Extractor::new()?);

    // Phase 1: plan
    log::info!("[1/3] Probing total result count...");
    let planner = Planner::new(Arc::clone(&config), Arc::clone(&fetcher));
    let plan = planner.plan().await;
    if plan.is_empty() {
        return Err(AppError::planning(
            "total result count unavailable; nothing to crawl",
        ));
    }
    store.set_expected_total(plan.total);
    log::info!(
        "      {} results across {} pages",
        plan.total,
        plan.pages.len()
    );

    // Phase 2: crawl sweep
    log::info!("[2/3] Crawling search pages...");
    let orchestrator = CrawlOrchestrator::new(
        Arc::clone(&config),
        Arc::clone(&fetcher),
        Arc::clone(&extractor),
        Arc::clone(&store),
    )?;
    orchestrator.run(&plan.pages).await;

    {
        let snapshot = store.snapshot();
        log::info!(
            "      crawl done: {} accepted, {} duplicates, {} network errors, {} parse failures",
            snapshot.records.len(),
            snapshot.duplicates.len(),
            snapshot.network_errors.len(),
            snapshot.parse_failures.len(),
        );
    }

    // Phase 3: enrichment (strictly after the whole sweep)
    log::info!("[3/3] Enriching records with unresolved places...");
    let enrichment = EnrichmentPipeline::new(
        Arc::clone(&config),
        Arc::clone(&fetcher),
        Arc::clone(&extractor),
        Arc::clone(&store),
    )?;
    let enriched = enrichment.enrich().await;
    log::info!("      {} records enriched", enriched);

    // Export
    let snapshot = store.snapshot();
    let summary = sink.export(&snapshot)?;
    log::info!(
        "Exported {} records to {}",
        summary.record_count,
        summary.records_path.display()
    );
    log::info!(
        "Exported {} diagnostics to {}",
        summary.diagnostic_count,
        summary.diagnostics_path.display()
    );

    Ok(HarvestStats {
        start_time,
        end_time: Utc::now(),
        expected_total: plan.total,
        page_count: plan.pages.len(),
        accepted: snapshot.records.len(),
        duplicates: snapshot.duplicates.len(),
        network_errors: snapshot.network_errors.len(),
        parse_failures: snapshot.parse_failures.len(),
        enriched,
    })
}
