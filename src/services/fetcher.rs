// src/services/fetcher.rs

//! Rate-limited HTTP fetching with retry and backoff.
//!
//! All network access goes through [`Fetcher::fetch`]. A global
//! counting semaphore caps simultaneously in-flight requests; the
//! permit is the sole admission-control mechanism and is held across
//! retries of the same URL.

use std::sync::Arc;
use std::time::Duration;

use reqwest::{Client, StatusCode};
use tokio::sync::Semaphore;

use crate::store::ResultStore;

/// Fixed delay before retrying a timed-out request.
const TIMEOUT_RETRY_DELAY: Duration = Duration::from_secs(1);

/// Classification of a single request attempt.
enum AttemptOutcome {
    /// HTTP 200 with a readable body
    Success(String),
    /// HTTP 429; retry after exponential backoff
    RateLimited,
    /// Any other status; permanent, no retry
    HardFailure(String),
    /// Transport timeout; retry after a fixed short delay
    Timeout,
    /// Other transport failure; silent retry until the last attempt
    Transport(String),
}

/// Per-request retry state.
enum RetryState {
    Attempting(u32),
    Backoff { next: u32, delay: Duration },
    Succeeded(String),
    Failed,
}

/// HTTP fetcher with a global concurrency cap and bounded retries.
pub struct Fetcher {
    client: Client,
    permits: Arc<Semaphore>,
    attempts: u32,
    store: Arc<ResultStore>,
}

impl Fetcher {
    pub fn new(
        client: Client,
        max_concurrent: usize,
        attempts: u32,
        store: Arc<ResultStore>,
    ) -> Self {
        Self {
            client,
            permits: Arc::new(Semaphore::new(max_concurrent.max(1))),
            attempts: attempts.max(1),
            store,
        }
    }

    /// Fetch a URL, returning the body on success.
    ///
    /// A URL that ultimately fails records exactly one network
    /// diagnostic (never one per retry attempt) and returns `None`.
    pub async fn fetch(&self, url: &str) -> Option<String> {
        // The semaphore is never closed, so acquire cannot fail
        let _permit = self.permits.acquire().await.ok()?;

        let mut state = RetryState::Attempting(0);
        loop {
            state = match state {
                RetryState::Attempting(attempt) => {
                    let last = attempt + 1 >= self.attempts;
                    match self.attempt(url).await {
                        AttemptOutcome::Success(body) => RetryState::Succeeded(body),
                        AttemptOutcome::HardFailure(detail) => {
                            self.store.record_network_error(url, &detail);
                            RetryState::Failed
                        }
                        AttemptOutcome::RateLimited => {
                            if last {
                                self.store.record_network_error(
                                    url,
                                    &format!("rate limited after {} attempts", self.attempts),
                                );
                                RetryState::Failed
                            } else {
                                RetryState::Backoff {
                                    next: attempt + 1,
                                    delay: Duration::from_secs(1u64 << attempt),
                                }
                            }
                        }
                        AttemptOutcome::Timeout => {
                            if last {
                                self.store.record_network_error(
                                    url,
                                    &format!("timeout after {} attempts", self.attempts),
                                );
                                RetryState::Failed
                            } else {
                                RetryState::Backoff {
                                    next: attempt + 1,
                                    delay: TIMEOUT_RETRY_DELAY,
                                }
                            }
                        }
                        AttemptOutcome::Transport(detail) => {
                            if last {
                                self.store.record_network_error(url, &detail);
                                RetryState::Failed
                            } else {
                                RetryState::Attempting(attempt + 1)
                            }
                        }
                    }
                }
                RetryState::Backoff { next, delay } => {
                    tokio::time::sleep(delay).await;
                    RetryState::Attempting(next)
                }
                RetryState::Succeeded(body) => return Some(body),
                RetryState::Failed => return None,
            };
        }
    }

    /// Issue one GET and classify the outcome.
    async fn attempt(&self, url: &str) -> AttemptOutcome {
        match self.client.get(url).send().await {
            Ok(response) => {
                let status = response.status();
                if status == StatusCode::TOO_MANY_REQUESTS {
                    return AttemptOutcome::RateLimited;
                }
                if status != StatusCode::OK {
                    return AttemptOutcome::HardFailure(format!("HTTP {status}"));
                }
                match response.text().await {
                    Ok(body) => AttemptOutcome::Success(body),
                    Err(e) if e.is_timeout() => AttemptOutcome::Timeout,
                    Err(e) => AttemptOutcome::Transport(e.to_string()),
                }
            }
            Err(e) if e.is_timeout() => AttemptOutcome::Timeout,
            Err(e) => AttemptOutcome::Transport(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn fetcher(store: Arc<ResultStore>, attempts: u32) -> Fetcher {
        let client = Client::builder()
            .timeout(Duration::from_secs(5))
            .build()
            .unwrap();
        Fetcher::new(client, 4, attempts, store)
    }

    #[tokio::test]
    async fn success_returns_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/page"))
            .respond_with(ResponseTemplate::new(200).set_body_string("hello"))
            .expect(1)
            .mount(&server)
            .await;

        let store = Arc::new(ResultStore::new());
        let body = fetcher(Arc::clone(&store), 3)
            .fetch(&format!("{}/page", server.uri()))
            .await;

        assert_eq!(body.as_deref(), Some("hello"));
        assert_eq!(store.snapshot().network_errors.len(), 0);
    }

    #[tokio::test]
    async fn non_200_fails_immediately_with_one_diagnostic() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/missing"))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&server)
            .await;

        let store = Arc::new(ResultStore::new());
        let body = fetcher(Arc::clone(&store), 3)
            .fetch(&format!("{}/missing", server.uri()))
            .await;

        assert!(body.is_none());
        let snapshot = store.snapshot();
        assert_eq!(snapshot.network_errors.len(), 1);
        assert!(snapshot.network_errors[0].detail().contains("404"));
    }

    #[tokio::test]
    async fn rate_limit_exhausts_retry_budget() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/limited"))
            .respond_with(ResponseTemplate::new(429))
            .expect(3)
            .mount(&server)
            .await;

        let store = Arc::new(ResultStore::new());
        let body = fetcher(Arc::clone(&store), 3)
            .fetch(&format!("{}/limited", server.uri()))
            .await;

        assert!(body.is_none());
        let snapshot = store.snapshot();
        assert_eq!(snapshot.network_errors.len(), 1);
        assert!(snapshot.network_errors[0].detail().contains("rate limited"));
    }

    #[tokio::test]
    async fn connection_failure_records_one_diagnostic() {
        // Nothing listens on this port; every attempt is a transport
        // error, recorded only once
        let store = Arc::new(ResultStore::new());
        let body = fetcher(Arc::clone(&store), 2)
            .fetch("http://127.0.0.1:1/unreachable")
            .await;

        assert!(body.is_none());
        assert_eq!(store.snapshot().network_errors.len(), 1);
    }
}
