// src/export/mod.rs

//! Export sinks for harvested records and diagnostics.

mod csv_sink;

use std::path::PathBuf;

use crate::error::Result;
use crate::store::Snapshot;

pub use csv_sink::CsvSink;

/// Where the export files landed.
#[derive(Debug, Clone)]
pub struct ExportSummary {
    pub records_path: PathBuf,
    pub diagnostics_path: PathBuf,
    pub record_count: usize,
    pub diagnostic_count: usize,
}

/// A destination for the final snapshot.
///
/// Implementations must preserve the snapshot's record order.
pub trait Sink {
    fn export(&self, snapshot: &Snapshot) -> Result<ExportSummary>;
}
