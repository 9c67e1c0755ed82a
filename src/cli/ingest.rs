use tracing::{info, warn};

use crate::cli::commands::IngestArgs;
use crate::config::load_config;
use crate::errors::ForecastError;
use crate::sources::{build_fetchers, run_ingestion, IngestionOutcome, QueryWindow};

pub async fn handle_ingest(args: IngestArgs) -> Result<(), ForecastError> {
    let config = load_config(args.config.as_deref()).await?;
    let window = QueryWindow::from_bounds(args.since, args.until)?;
    let fetchers = build_fetchers(&config)?;
    info!(sources = fetchers.len(), ?window, "Starting ingestion");

    let IngestionOutcome { dataset, sources } = run_ingestion(fetchers, window, &config.fetch).await;

    let mut first_failure = None;
    for source in sources {
        println!(
            "  {:<5} pages={:<4} raw={:<7} kept={:<7} dropped={:<5} {}",
            source.source.as_str(),
            source.pages,
            source.raw_records,
            source.normalize.emitted,
            source.normalize.dropped,
            source.error.as_ref().map(|e| format!("FAILED: {}", e)).unwrap_or_else(|| "ok".into()),
        );
        if let Some(err) = source.error {
            first_failure.get_or_insert(err);
        }
    }

    if let Some(err) = first_failure {
        if !args.allow_partial {
            warn!("A source failed; dataset not written (use --allow-partial to keep it)");
            return Err(err);
        }
        warn!(error = %err, "Writing a partial dataset; labels may be incomplete");
    }

    let output = args.output.unwrap_or_else(|| config.paths.dataset_path());
    dataset.save(&output).await?;

    let report = &dataset.report;
    println!(
        "Dataset written: {} ({} records, {} exploited, {} orphaned evidence ids, {} duplicates)",
        output.display(),
        dataset.len(),
        report.positives,
        report.orphaned_evidence_ids,
        report.duplicate_registry_records
    );
    Ok(())
}
