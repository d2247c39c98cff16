// src/services/crawler.rs

//! Batched concurrent crawl over the planned search pages.
//!
//! Pages are processed in fixed-size batches: every page in a batch is
//! fetched and parsed concurrently, and the next batch starts only
//! after the whole batch has finished. This caps bursts of list-page
//! requests on top of the fetcher's global permit pool.

use std::sync::Arc;

use futures::future::join_all;
use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::error::Result;
use crate::extract::Extractor;
use crate::models::Config;
use crate::services::{Fetcher, PageRequest};
use crate::store::ResultStore;
use crate::utils::resolve_url;

/// Elements that may wrap one list item.
const FRAGMENT_CONTAINERS: [&str; 4] = ["li", "div", "article", "tr"];

/// Drives the crawl sweep and feeds candidates into the store.
pub struct CrawlOrchestrator {
    config: Arc<Config>,
    fetcher: Arc<Fetcher>,
    extractor: Arc<Extractor>,
    store: Arc<ResultStore>,
    base_url: Url,
    item_link: Selector,
}

impl CrawlOrchestrator {
    pub fn new(
        config: Arc<Config>,
        fetcher: Arc<Fetcher>,
        extractor: Arc<Extractor>,
        store: Arc<ResultStore>,
    ) -> Result<Self> {
        let base_url = Url::parse(&config.search.base_url)?;
        let item_link = Selector::parse("a[href*='/item/']")
            .map_err(|e| crate::error::AppError::selector("a[href*='/item/']", format!("{e:?}")))?;

        Ok(Self {
            config,
            fetcher,
            extractor,
            store,
            base_url,
            item_link,
        })
    }

    /// Process all planned pages in batches.
    ///
    /// Failures stay page-local: a page that cannot be fetched
    /// contributes nothing beyond the fetcher's diagnostic, and the
    /// sweep continues with the remaining pages.
    pub async fn run(&self, pages: &[PageRequest]) {
        let batch_size = self.config.crawler.batch_size.max(1);

        for batch in pages.chunks(batch_size) {
            join_all(batch.iter().map(|page| self.process_page(page))).await;

            log::info!(
                "  progress: {}/{} records accepted",
                self.store.accepted_count(),
                self.store.expected_total()
            );
        }
    }

    async fn process_page(&self, page: &PageRequest) {
        let Some(html) = self.fetcher.fetch(&page.url).await else {
            return;
        };
        self.ingest_page(&html, &page.url);
    }

    /// Extract every item fragment on a fetched list page.
    fn ingest_page(&self, html: &str, page_url: &str) {
        let document = Html::parse_document(html);

        for link in document.select(&self.item_link) {
            let fragment = item_fragment(link);

            match self.extractor.extract_fragment(&fragment, &self.base_url) {
                Some(record) => {
                    // Admission, dedup, and the duplicate diagnostic
                    // are one serialized step inside the store
                    self.store.admit(record, &fragment);
                }
                None => {
                    let href = link.value().attr("href").unwrap_or_default();
                    let item_url = resolve_url(&self.base_url, href);
                    self.store.record_parse_failure(&item_url, page_url);
                }
            }
        }
    }
}

/// The smallest container element wrapping a list item link, falling
/// back to the link's parent element.
fn item_fragment(link: ElementRef<'_>) -> String {
    for ancestor in link.ancestors().filter_map(ElementRef::wrap) {
        if FRAGMENT_CONTAINERS.contains(&ancestor.value().name()) {
            return ancestor.html();
        }
    }

    link.ancestors()
        .filter_map(ElementRef::wrap)
        .next()
        .map(|parent| parent.html())
        .unwrap_or_else(|| link.html())
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::services::Planner;
    use crate::utils::http::create_client;

    struct Harness {
        orchestrator: CrawlOrchestrator,
        store: Arc<ResultStore>,
        config: Arc<Config>,
        fetcher: Arc<Fetcher>,
    }

    fn harness(base_url: &str) -> Harness {
        let mut config = Config::default();
        config.search.base_url = base_url.to_string();
        let config = Arc::new(config);

        let store = Arc::new(ResultStore::new());
        let client = create_client(&config.crawler).unwrap();
        let fetcher = Arc::new(Fetcher::new(client, 4, 1, Arc::clone(&store)));
        let extractor = Arc::new(Extractor::new().unwrap());

        let orchestrator = CrawlOrchestrator::new(
            Arc::clone(&config),
            Arc::clone(&fetcher),
            extractor,
            Arc::clone(&store),
        )
        .unwrap();

        Harness {
            orchestrator,
            store,
            config,
            fetcher,
        }
    }

    #[tokio::test]
    async fn single_page_single_record_scenario() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/objekte"))
            .and(query_param("rows", "1"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("<html><body>1 - 1 of 1</body></html>"),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/objekte"))
            .and(query_param("rows", "100"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"<html><body><ul>
                    <li>
                        <a href="/item/SCENARIO1">Bürgerinitiative Rheinufer</a>
                        <span>1974-1979, Stadtarchiv Köln</span>
                    </li>
                </ul></body></html>"#,
            ))
            .expect(1)
            .mount(&server)
            .await;

        let h = harness(&server.uri());
        let planner = Planner::new(Arc::clone(&h.config), Arc::clone(&h.fetcher));
        let plan = planner.plan().await;
        assert_eq!(plan.pages.len(), 1);
        assert_eq!(plan.pages[0].offset, 0);
        assert_eq!(plan.pages[0].rows, 100);

        h.orchestrator.run(&plan.pages).await;

        let snapshot = h.store.snapshot();
        assert_eq!(snapshot.records.len(), 1);
        assert_eq!(snapshot.records[0].title, "Bürgerinitiative Rheinufer");
        assert_eq!(snapshot.records[0].period, "1974-1979");
        assert_eq!(snapshot.diagnostic_count(), 0);
    }

    #[tokio::test]
    async fn duplicate_items_are_diverted() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"<html><body>
                    <li><a href="/item/SAME01">Initiative A</a> <span>1980</span></li>
                    <li><a href="/item/SAME01">Initiative A</a> <span>1980</span></li>
                    <li><a href="/item/OTHER2">Initiative B</a> <span>1981</span></li>
                </body></html>"#,
            ))
            .mount(&server)
            .await;

        let h = harness(&server.uri());
        let page = PageRequest {
            url: format!("{}/objekte?offset=0&rows=100", server.uri()),
            offset: 0,
            rows: 100,
        };
        h.orchestrator.run(&[page]).await;

        let snapshot = h.store.snapshot();
        assert_eq!(snapshot.records.len(), 2);
        assert_eq!(snapshot.duplicates.len(), 1);
        assert_eq!(snapshot.duplicates[0].title(), "Initiative A");
    }

    #[tokio::test]
    async fn link_without_text_is_a_parse_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"<html><body>
                    <li><a href="/item/NOTEXT1"><img src="thumb.jpg"></a></li>
                </body></html>"#,
            ))
            .mount(&server)
            .await;

        let h = harness(&server.uri());
        let page = PageRequest {
            url: format!("{}/objekte", server.uri()),
            offset: 0,
            rows: 100,
        };
        h.orchestrator.run(&[page]).await;

        let snapshot = h.store.snapshot();
        assert!(snapshot.records.is_empty());
        assert_eq!(snapshot.parse_failures.len(), 1);
        assert!(snapshot.parse_failures[0].url().contains("/item/NOTEXT1"));
    }

    #[tokio::test]
    async fn failed_page_does_not_stop_the_sweep() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(query_param("offset", "0"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(query_param("offset", "100"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"<html><body>
                    <li><a href="/item/OKPAGE1">Initiative C</a> <span>1985</span></li>
                </body></html>"#,
            ))
            .mount(&server)
            .await;

        let h = harness(&server.uri());
        let pages = vec![
            PageRequest {
                url: format!("{}/objekte?offset=0&rows=100", server.uri()),
                offset: 0,
                rows: 100,
            },
            PageRequest {
                url: format!("{}/objekte?offset=100&rows=100", server.uri()),
                offset: 100,
                rows: 100,
            },
        ];
        h.orchestrator.run(&pages).await;

        let snapshot = h.store.snapshot();
        assert_eq!(snapshot.records.len(), 1);
        assert_eq!(snapshot.network_errors.len(), 1);
    }
}
