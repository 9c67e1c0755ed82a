use std::path::Path;

use tracing::info;

use crate::cli::commands::TrainArgs;
use crate::config::load_config;
use crate::errors::ForecastError;
use crate::model::Trainer;
use crate::models::ReconciledDataset;

pub async fn handle_train(args: TrainArgs) -> Result<(), ForecastError> {
    let config = load_config(args.config.as_deref()).await?;
    let dataset_path = args.dataset.unwrap_or_else(|| config.paths.dataset_path());
    let artifact_dir = args.artifact_dir.unwrap_or_else(|| config.paths.artifact_dir.clone());
    let seed = args.seed.unwrap_or(config.training.seed);

    let dataset = load_dataset(&dataset_path).await?;
    info!(path = %dataset_path.display(), records = dataset.len(), "Loaded dataset");

    let trainer = Trainer::new(config.training.clone(), config.features);
    let (artifact, metrics) = trainer.fit_and_train(&dataset, seed)?;
    let model_path = artifact.save(&artifact_dir).await?;

    println!("Model written: {}", model_path.display());
    println!("  run id:     {}", artifact.provenance.run_id);
    println!("  columns:    {}", artifact.transform.width());
    println!(
        "  evaluation: n={} accuracy={:.3} precision={:.3} recall={:.3} f1={:.3} roc_auc={}",
        metrics.samples,
        metrics.accuracy,
        metrics.precision,
        metrics.recall,
        metrics.f1,
        metrics.roc_auc.map(|v| format!("{:.3}", v)).unwrap_or_else(|| "n/a".into()),
    );
    Ok(())
}

async fn load_dataset(path: &Path) -> Result<ReconciledDataset, ForecastError> {
    if !path.exists() {
        return Err(ForecastError::Configuration(format!(
            "dataset not found: {} (run `vulnforecast ingest` first)",
            path.display()
        )));
    }
    ReconciledDataset::load(path).await
}
