// src/services/enrich.rs

//! Post-crawl enrichment of records with an unresolved place.
//!
//! Runs strictly after the crawl sweep. Each incomplete record walks
//! an ordered list of fallback stages, cheapest first, stopping at the
//! first stage that resolves a place. Records both stages fail on keep
//! the unspecified marker permanently.

use std::sync::Arc;

use async_trait::async_trait;
use futures::future::join_all;
use scraper::{ElementRef, Html, Selector};

use crate::error::{AppError, Result};
use crate::extract::Extractor;
use crate::models::{Config, UNSPECIFIED};
use crate::services::Fetcher;
use crate::store::ResultStore;
use crate::utils::extract_item_id;

/// One fallback strategy for resolving a record's place.
#[async_trait]
trait PlaceResolver: Send + Sync {
    /// Stage label for debug logging.
    fn name(&self) -> &'static str;

    /// Try to resolve a place from the record's detail-page URL.
    async fn resolve(&self, record_url: &str) -> Option<String>;
}

/// Stage 1: organization links on the record's own detail page.
struct DetailPageStage {
    fetcher: Arc<Fetcher>,
    extractor: Arc<Extractor>,
    org_link: Selector,
}

#[async_trait]
impl PlaceResolver for DetailPageStage {
    fn name(&self) -> &'static str {
        "detail-page"
    }

    async fn resolve(&self, record_url: &str) -> Option<String> {
        if record_url.is_empty() {
            return None;
        }
        let html = self.fetcher.fetch(record_url).await?;
        self.scan_organization_links(&html)
    }
}

impl DetailPageStage {
    fn scan_organization_links(&self, html: &str) -> Option<String> {
        let document = Html::parse_document(html);

        for link in document.select(&self.org_link) {
            let text = element_text(link);
            let place = self.extractor.infer_place("", &text);
            if place != UNSPECIFIED {
                return Some(place);
            }
        }
        None
    }
}

/// Stage 2: provider names from the secondary metadata endpoint.
struct MetadataStage {
    config: Arc<Config>,
    fetcher: Arc<Fetcher>,
    extractor: Arc<Extractor>,
}

#[async_trait]
impl PlaceResolver for MetadataStage {
    fn name(&self) -> &'static str {
        "metadata"
    }

    async fn resolve(&self, record_url: &str) -> Option<String> {
        let item_id = extract_item_id(record_url)?;
        let url = self.config.search.metadata_url(&item_id).ok()?;
        let body = self.fetcher.fetch(&url).await?;
        self.scan_provider_names(&body)
    }
}

impl MetadataStage {
    /// Scan provider-name elements in the metadata document.
    ///
    /// The document is XML-shaped; the lenient HTML parser handles it,
    /// and a structurally malformed response simply yields no
    /// provider elements (a miss, not an error).
    fn scan_provider_names(&self, body: &str) -> Option<String> {
        let document = Html::parse_document(body);

        for node in document.root_element().descendants() {
            let Some(element) = ElementRef::wrap(node) else {
                continue;
            };
            if !element.value().name().to_lowercase().contains("provider") {
                continue;
            }

            let text = element_text(element);
            let place = self.extractor.infer_place("", &text);
            if place != UNSPECIFIED {
                return Some(place);
            }
        }
        None
    }
}

/// Walks incomplete records through the fallback stages in batches.
pub struct EnrichmentPipeline {
    config: Arc<Config>,
    store: Arc<ResultStore>,
    stages: Vec<Box<dyn PlaceResolver>>,
}

impl EnrichmentPipeline {
    pub fn new(
        config: Arc<Config>,
        fetcher: Arc<Fetcher>,
        extractor: Arc<Extractor>,
        store: Arc<ResultStore>,
    ) -> Result<Self> {
        let org_link = Selector::parse("a[href*='/organization/']")
            .map_err(|e| AppError::selector("a[href*='/organization/']", format!("{e:?}")))?;

        let stages: Vec<Box<dyn PlaceResolver>> = vec![
            Box::new(DetailPageStage {
                fetcher: Arc::clone(&fetcher),
                extractor: Arc::clone(&extractor),
                org_link,
            }),
            Box::new(MetadataStage {
                config: Arc::clone(&config),
                fetcher,
                extractor,
            }),
        ];

        Ok(Self {
            config,
            store,
            stages,
        })
    }

    /// Enrich every record whose place is still unspecified.
    ///
    /// Returns the number of records newly completed. Uses the same
    /// batched-concurrency style as the crawl sweep.
    pub async fn enrich(&self) -> usize {
        let targets = self.store.records_needing_place();
        if targets.is_empty() {
            return 0;
        }

        log::info!("  {} records with unresolved place", targets.len());

        let batch_size = self.config.crawler.batch_size.max(1);
        let mut resolved = 0;

        for batch in targets.chunks(batch_size) {
            let outcomes = join_all(
                batch
                    .iter()
                    .map(|(index, url)| self.enrich_one(*index, url)),
            )
            .await;
            resolved += outcomes.into_iter().filter(|done| *done).count();
        }

        resolved
    }

    /// Try each stage in order, stopping at the first success.
    async fn enrich_one(&self, index: usize, url: &str) -> bool {
        for stage in &self.stages {
            if let Some(place) = stage.resolve(url).await {
                log::debug!("place resolved via {} stage: {}", stage.name(), place);
                return self.store.resolve_place(index, place);
            }
        }
        false
    }
}

/// Whitespace-normalized text content of an element.
fn element_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .collect::<Vec<_>>()
        .join(" ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
