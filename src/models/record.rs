//! Harvested record and its canonical deduplication key.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::utils::extract_item_id;

/// Marker for a field whose value could not be determined.
pub const UNSPECIFIED: &str = "unspecified";

/// Marker for a period the source explicitly labels as undated.
pub const UNDATED: &str = "undated";

/// A record harvested from the archive portal.
///
/// Field order matters: it is the column order of the CSV export.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Record {
    /// Record title, taken from the item link text (never empty)
    pub title: String,

    /// Date-shape category ("1971-1980", "01.02.1975", "1968"),
    /// or the undated/unspecified marker
    pub period: String,

    /// Place name, or the unspecified marker
    pub place: String,

    /// Holding institution (may be empty)
    pub institution: String,

    /// Full URL to the item detail page (may be empty)
    pub url: String,
}

impl Record {
    /// Derive the canonical key used for duplicate detection.
    ///
    /// An item identifier parsed from the URL wins over the content
    /// fingerprint, so two records pointing at the same item are
    /// duplicates even when their extracted fields drift.
    pub fn canonical_key(&self) -> CanonicalKey {
        if let Some(id) = extract_item_id(&self.url) {
            return CanonicalKey::ItemId(id);
        }

        let normalized = format!(
            "{}|{}|{}",
            self.title.to_lowercase().trim(),
            self.period,
            self.place.to_lowercase().trim()
        );
        let digest = Sha256::digest(normalized.as_bytes());
        CanonicalKey::Fingerprint(hex::encode(digest))
    }

    /// Whether the place field still carries the unspecified marker.
    pub fn needs_place(&self) -> bool {
        self.place == UNSPECIFIED
    }
}

/// Canonical identifier for duplicate detection.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CanonicalKey {
    /// Item identifier parsed from the record URL (preferred form)
    ItemId(String),

    /// SHA-256 fingerprint over normalized (title, period, place)
    Fingerprint(String),
}

impl std::fmt::Display for CanonicalKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CanonicalKey::ItemId(id) => write!(f, "{id}"),
            CanonicalKey::Fingerprint(hash) => write!(f, "{hash}"),
        }
    }
}
