//! Application configuration structures.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{AppError, Result};

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Search endpoint and query settings
    #[serde(default)]
    pub search: SearchConfig,

    /// HTTP and crawling behavior settings
    #[serde(default)]
    pub crawler: CrawlerConfig,

    /// Export settings
    #[serde(default)]
    pub output: OutputConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if Url::parse(&self.search.base_url).is_err() {
            return Err(AppError::validation("search.base_url is not a valid URL"));
        }
        if self.search.query.trim().is_empty() {
            return Err(AppError::validation("search.query is empty"));
        }
        if self.search.rows_per_page == 0 {
            return Err(AppError::validation("search.rows_per_page must be > 0"));
        }
        if self.crawler.user_agent.trim().is_empty() {
            return Err(AppError::validation("crawler.user_agent is empty"));
        }
        if self.crawler.timeout_secs == 0 {
            return Err(AppError::validation("crawler.timeout_secs must be > 0"));
        }
        if self.crawler.max_concurrent == 0 {
            return Err(AppError::validation("crawler.max_concurrent must be > 0"));
        }
        if self.crawler.retry_attempts == 0 {
            return Err(AppError::validation("crawler.retry_attempts must be > 0"));
        }
        if self.crawler.batch_size == 0 {
            return Err(AppError::validation("crawler.batch_size must be > 0"));
        }
        Ok(())
    }
}

/// Search endpoint, query, and pagination settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Portal base URL
    #[serde(default = "defaults::base_url")]
    pub base_url: String,

    /// Search endpoint path
    #[serde(default = "defaults::search_path")]
    pub search_path: String,

    /// Secondary metadata endpoint path (item id is appended)
    #[serde(default = "defaults::metadata_path")]
    pub metadata_path: String,

    /// Interface language parameter for the search endpoint
    #[serde(default = "defaults::lang")]
    pub lang: String,

    /// Search query
    #[serde(default = "defaults::query")]
    pub query: String,

    /// Results per page (the site's pagination contract)
    #[serde(default = "defaults::rows_per_page")]
    pub rows_per_page: usize,
}

impl SearchConfig {
    /// Build a search page URL for the given offset and row count.
    pub fn search_url(&self, offset: usize, rows: usize) -> Result<String> {
        let mut url = Url::parse(&self.base_url)?;
        url.set_path(&self.search_path);
        url.query_pairs_mut()
            .append_pair("lang", &self.lang)
            .append_pair("query", &self.query)
            .append_pair("offset", &offset.to_string())
            .append_pair("rows", &rows.to_string());
        Ok(url.to_string())
    }

    /// Build the secondary metadata URL for an item identifier.
    pub fn metadata_url(&self, item_id: &str) -> Result<String> {
        let url = Url::parse(&self.base_url)?;
        let path = format!(
            "{}/{}",
            self.metadata_path.trim_end_matches('/'),
            item_id
        );
        Ok(url.join(&path)?.to_string())
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            base_url: defaults::base_url(),
            search_path: defaults::search_path(),
            metadata_path: defaults::metadata_path(),
            lang: defaults::lang(),
            query: defaults::query(),
            rows_per_page: defaults::rows_per_page(),
        }
    }
}

/// HTTP client and crawling behavior settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlerConfig {
    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// Maximum simultaneously in-flight requests (global permit pool)
    #[serde(default = "defaults::max_concurrent")]
    pub max_concurrent: usize,

    /// Retry budget per request
    #[serde(default = "defaults::retry_attempts")]
    pub retry_attempts: u32,

    /// Number of page fetches launched and awaited together
    #[serde(default = "defaults::batch_size")]
    pub batch_size: usize,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
            max_concurrent: defaults::max_concurrent(),
            retry_attempts: defaults::retry_attempts(),
            batch_size: defaults::batch_size(),
        }
    }
}

/// Export settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Directory the export files are written to
    #[serde(default = "defaults::output_dir")]
    pub dir: String,

    /// Export file stem (without extension)
    #[serde(default = "defaults::file_stem")]
    pub file_stem: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: defaults::output_dir(),
            file_stem: defaults::file_stem(),
        }
    }
}

mod defaults {
    // Search defaults match the portal's pagination contract
    pub fn base_url() -> String {
        "https://www.archivportal-d.de".into()
    }
    pub fn search_path() -> String {
        "/objekte".into()
    }
    pub fn metadata_path() -> String {
        "/item/xml".into()
    }
    pub fn lang() -> String {
        "en".into()
    }
    pub fn query() -> String {
        "Bürgerinitiativen".into()
    }
    pub fn rows_per_page() -> usize {
        100
    }

    // Crawler defaults
    pub fn user_agent() -> String {
        "Mozilla/5.0 (compatible; ArchivHarvest/1.0; educational research)".into()
    }
    pub fn timeout() -> u64 {
        30
    }
    pub fn max_concurrent() -> usize {
        30
    }
    pub fn retry_attempts() -> u32 {
        3
    }
    pub fn batch_size() -> usize {
        10
    }

    // Output defaults
    pub fn output_dir() -> String {
        "output".into()
    }
    pub fn file_stem() -> String {
        "buergerinitiativen".into()
    }
}
