// src/export/csv_sink.rs

//! CSV export of records and diagnostics.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::export::{ExportSummary, Sink};
use crate::store::Snapshot;

/// Writes `<stem>.csv` (records) and `<stem>_diagnostics.csv` into an
/// output directory, creating it if needed.
pub struct CsvSink {
    dir: PathBuf,
    stem: String,
}

impl CsvSink {
    pub fn new(dir: impl AsRef<Path>, stem: impl Into<String>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
            stem: stem.into(),
        }
    }

    fn write_records(&self, snapshot: &Snapshot, path: &Path) -> Result<()> {
        // Header written explicitly so an empty run still exports a
        // well-formed file
        let mut writer = csv::WriterBuilder::new().has_headers(false).from_path(path)?;
        writer.write_record(["title", "period", "place", "institution", "url"])?;
        for record in &snapshot.records {
            writer.serialize(record)?;
        }
        writer.flush()?;
        Ok(())
    }

    fn write_diagnostics(&self, snapshot: &Snapshot, path: &Path) -> Result<()> {
        let mut writer = csv::Writer::from_path(path)?;
        writer.write_record(["kind", "url", "title", "detail"])?;
        for diagnostic in snapshot.diagnostics() {
            writer.write_record([
                diagnostic.kind(),
                diagnostic.url(),
                diagnostic.title(),
                &diagnostic.detail(),
            ])?;
        }
        writer.flush()?;
        Ok(())
    }
}

impl Sink for CsvSink {
    fn export(&self, snapshot: &Snapshot) -> Result<ExportSummary> {
        fs::create_dir_all(&self.dir)?;

        let records_path = self.dir.join(format!("{}.csv", self.stem));
        let diagnostics_path = self.dir.join(format!("{}_diagnostics.csv", self.stem));

        self.write_records(snapshot, &records_path)?;
        self.write_diagnostics(snapshot, &diagnostics_path)?;

        Ok(ExportSummary {
            records_path,
            diagnostics_path,
            record_count: snapshot.records.len(),
            diagnostic_count: snapshot.diagnostic_count(),
        })
    }
}
