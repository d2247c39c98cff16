//! Archivportal harvester CLI
//!
//! Runs the full pipeline (plan, crawl, enrich) and writes the record
//! and diagnostic CSV exports.

use std::path::PathBuf;
use std::sync::Arc;

use archiv_harvest::{
    error::Result,
    export::CsvSink,
    models::Config,
    pipeline::run_harvest,
};
use clap::Parser;

/// archiv-harvest - Archivportal-D record harvester
#[derive(Parser, Debug)]
#[command(
    name = "archiv-harvest",
    version,
    about = "Harvests Bürgerinitiativen records from Archivportal-D"
)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "data/config.toml")]
    config: PathBuf,

    /// Output file stem (without extension)
    #[arg(short, long)]
    output: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    log::info!("archiv-harvest starting...");

    let mut config = Config::load_or_default(&cli.config);
    if let Some(stem) = cli.output {
        config.output.file_stem = stem;
    }
    config.validate()?;

    let sink = CsvSink::new(&config.output.dir, &config.output.file_stem);
    let config = Arc::new(config);

    let stats = run_harvest(Arc::clone(&config), &sink).await?;

    log::info!(
        "Done! {} records in {}s ({} expected, {} enriched, {} diagnostics)",
        stats.accepted,
        (stats.end_time - stats.start_time).num_seconds(),
        stats.expected_total,
        stats.enriched,
        stats.duplicates + stats.network_errors + stats.parse_failures,
    );

    Ok(())
}
