// src/services/planner.rs

//! Pagination planning for the search sweep.
//!
//! One cheap probe (a single-row query) discovers the total result
//! count from the page's rendered summary text; the plan is then one
//! page descriptor per `rows_per_page` slice of that total.

use std::sync::Arc;

use regex::Regex;
use scraper::Html;

use crate::models::Config;
use crate::services::Fetcher;

/// One planned search page fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub url: String,
    pub offset: usize,
    pub rows: usize,
}

/// The full crawl plan.
#[derive(Debug, Clone, Default)]
pub struct Plan {
    /// Total result count reported by the portal
    pub total: usize,
    /// Ordered page descriptors covering the total
    pub pages: Vec<PageRequest>,
}

impl Plan {
    /// An empty plan means "nothing to crawl" (planning failed or the
    /// query has no results).
    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }
}

/// Derives the ordered list of page fetches needed to cover the query.
pub struct Planner {
    config: Arc<Config>,
    fetcher: Arc<Fetcher>,
}

impl Planner {
    pub fn new(config: Arc<Config>, fetcher: Arc<Fetcher>) -> Self {
        Self { config, fetcher }
    }

    /// Probe the total result count and derive the page descriptors.
    ///
    /// Any failure along the way (probe fetch, summary text without a
    /// count) yields an empty plan, never an error.
    pub async fn plan(&self) -> Plan {
        let Some(total) = self.total_results().await else {
            return Plan::default();
        };
        Plan {
            total,
            pages: self.page_requests(total),
        }
    }

    /// Fetch a single-row probe page and parse the total count.
    async fn total_results(&self) -> Option<usize> {
        let probe_url = self.config.search.search_url(0, 1).ok()?;
        let html = self.fetcher.fetch(&probe_url).await?;
        parse_total(&html)
    }

    /// Build one descriptor per page of the total.
    fn page_requests(&self, total: usize) -> Vec<PageRequest> {
        let rows = self.config.search.rows_per_page;
        let page_count = total.div_ceil(rows);

        (0..page_count)
            .filter_map(|page| {
                let offset = page * rows;
                let url = self.config.search.search_url(offset, rows).ok()?;
                Some(PageRequest { url, offset, rows })
            })
            .collect()
    }
}

/// Pull the total result count out of the rendered summary text
/// ("1 - 1 of 3,047"), stripping grouping separators.
fn parse_total(html: &str) -> Option<usize> {
    let document = Html::parse_document(html);
    let text = document
        .root_element()
        .text()
        .collect::<Vec<_>>()
        .join(" ");

    let pattern = Regex::new(r"of\s+([\d,]+)").ok()?;
    let caps = pattern.captures(&text)?;
    caps[1].replace(',', "").parse().ok()
}
