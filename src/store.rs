// src/store.rs

//! Shared accumulation of accepted records and diagnostics.
//!
//! The store is the single point of serialized access for everything
//! concurrent fetch/parse tasks mutate: the seen-key set, the accepted
//! record list, and the diagnostic collections. All mutation goes
//! through one mutex; no lock is ever held across an await point.

use std::collections::HashMap;
use std::sync::Mutex;

use crate::models::{CanonicalKey, Diagnostic, Record, UNSPECIFIED};

/// Seen canonical keys, mapped to the raw fragment that first produced
/// them (kept for duplicate diagnostics).
#[derive(Debug, Default)]
struct SeenSet {
    keys: HashMap<CanonicalKey, String>,
}

impl SeenSet {
    /// Admit a key: true if first occurrence, false if already seen.
    fn admit(&mut self, key: CanonicalKey, fragment: &str) -> bool {
        match self.keys.entry(key) {
            std::collections::hash_map::Entry::Occupied(_) => false,
            std::collections::hash_map::Entry::Vacant(entry) => {
                entry.insert(fragment.to_string());
                true
            }
        }
    }
}

#[derive(Debug, Default)]
struct StoreInner {
    seen: SeenSet,
    records: Vec<Record>,
    network_errors: Vec<Diagnostic>,
    duplicates: Vec<Diagnostic>,
    parse_failures: Vec<Diagnostic>,
    expected_total: usize,
}

/// Thread-safe accumulator shared by the fetcher, the orchestrator,
/// and the enrichment pipeline.
#[derive(Debug, Default)]
pub struct ResultStore {
    inner: Mutex<StoreInner>,
}

impl ResultStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the expected total obtained from planning (advisory,
    /// used for progress reporting only).
    pub fn set_expected_total(&self, total: usize) {
        self.lock().expected_total = total;
    }

    pub fn expected_total(&self) -> usize {
        self.lock().expected_total
    }

    /// Admit a candidate record.
    ///
    /// Key derivation, the seen-set check, acceptance, and the
    /// duplicate diagnostic happen under one lock, so concurrent
    /// admissions racing on the same key yield exactly one acceptance.
    pub fn admit(&self, record: Record, fragment: &str) -> bool {
        let key = record.canonical_key();
        let mut inner = self.lock();
        if inner.seen.admit(key.clone(), fragment) {
            inner.records.push(record);
            true
        } else {
            inner.duplicates.push(Diagnostic::Duplicate {
                key: key.to_string(),
                title: record.title,
                url: record.url,
            });
            false
        }
    }

    /// Record a permanently failed fetch.
    pub fn record_network_error(&self, url: &str, detail: &str) {
        self.lock().network_errors.push(Diagnostic::Network {
            url: url.to_string(),
            detail: detail.to_string(),
        });
    }

    /// Record a fragment that yielded no extractable record.
    pub fn record_parse_failure(&self, url: &str, page_url: &str) {
        self.lock().parse_failures.push(Diagnostic::ParseFailure {
            url: url.to_string(),
            page_url: page_url.to_string(),
        });
    }

    /// Number of accepted (non-duplicate) records so far.
    pub fn accepted_count(&self) -> usize {
        self.lock().records.len()
    }

    /// Indices and URLs of accepted records whose place is still the
    /// unspecified marker.
    pub fn records_needing_place(&self) -> Vec<(usize, String)> {
        self.lock()
            .records
            .iter()
            .enumerate()
            .filter(|(_, record)| record.needs_place())
            .map(|(index, record)| (index, record.url.clone()))
            .collect()
    }

    /// Set a record's place if it is still unspecified.
    ///
    /// Returns true when the field was actually updated, so each
    /// record's place is mutated at most once.
    pub fn resolve_place(&self, index: usize, place: String) -> bool {
        let mut inner = self.lock();
        match inner.records.get_mut(index) {
            Some(record) if record.place == UNSPECIFIED => {
                record.place = place;
                true
            }
            _ => false,
        }
    }

    /// Clone out the accepted records (insertion order) and the
    /// diagnostics by kind.
    pub fn snapshot(&self) -> Snapshot {
        let inner = self.lock();
        Snapshot {
            records: inner.records.clone(),
            network_errors: inner.network_errors.clone(),
            duplicates: inner.duplicates.clone(),
            parse_failures: inner.parse_failures.clone(),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, StoreInner> {
        // A poisoned lock means a panic mid-mutation; propagating the
        // panic is the only sound option.
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => panic!("result store lock poisoned: {poisoned}"),
        }
    }
}

/// Point-in-time copy of the store contents.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub records: Vec<Record>,
    pub network_errors: Vec<Diagnostic>,
    pub duplicates: Vec<Diagnostic>,
    pub parse_failures: Vec<Diagnostic>,
}

impl Snapshot {
    /// Total number of diagnostics across all kinds.
    pub fn diagnostic_count(&self) -> usize {
        self.network_errors.len() + self.duplicates.len() + self.parse_failures.len()
    }

    /// All diagnostics in export order (network, duplicates, parse).
    pub fn diagnostics(&self) -> impl Iterator<Item = &Diagnostic> {
        self.network_errors
            .iter()
            .chain(self.duplicates.iter())
            .chain(self.parse_failures.iter())
    }
}
