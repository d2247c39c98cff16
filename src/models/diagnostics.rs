//! Diagnostic entries recorded during a harvest run.
//!
//! Diagnostics are append-only and purely informational: they feed the
//! post-run report and the diagnostics export, never retry logic.

/// A recorded, non-fatal anomaly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// A fetch that permanently failed (non-200 status, exhausted
    /// retries, transport error)
    Network { url: String, detail: String },

    /// A candidate record rejected because its canonical key was
    /// already seen
    Duplicate {
        key: String,
        title: String,
        url: String,
    },

    /// A fragment with a qualifying link that yielded no record
    ParseFailure { url: String, page_url: String },
}

impl Diagnostic {
    /// Short kind tag for the diagnostics export.
    pub fn kind(&self) -> &'static str {
        match self {
            Diagnostic::Network { .. } => "network",
            Diagnostic::Duplicate { .. } => "duplicate",
            Diagnostic::ParseFailure { .. } => "parse_failure",
        }
    }

    /// The URL the diagnostic is about.
    pub fn url(&self) -> &str {
        match self {
            Diagnostic::Network { url, .. } => url,
            Diagnostic::Duplicate { url, .. } => url,
            Diagnostic::ParseFailure { url, .. } => url,
        }
    }

    /// Record title, where one exists.
    pub fn title(&self) -> &str {
        match self {
            Diagnostic::Duplicate { title, .. } => title,
            _ => "",
        }
    }

    /// Free-form detail for the diagnostics export.
    pub fn detail(&self) -> String {
        match self {
            Diagnostic::Network { detail, .. } => detail.clone(),
            Diagnostic::Duplicate { key, .. } => format!("key: {key}"),
            Diagnostic::ParseFailure { page_url, .. } => format!("page: {page_url}"),
        }
    }
}
