use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "vulnforecast", version, about = "Forecast which vulnerabilities will be exploited")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase log verbosity (repeat for more)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Fetch every enabled source and write a reconciled dataset
    Ingest(IngestArgs),
    /// Fit the transform and model on a reconciled dataset
    Train(TrainArgs),
    /// Start the HTTP prediction server
    Serve(ServeArgs),
    /// Score records from a JSON file with a saved model
    Predict(PredictArgs),
    /// Validate a configuration file
    Validate(ValidateArgs),
}

#[derive(Args, Clone)]
pub struct IngestArgs {
    /// YAML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// First publication date to ingest (YYYY-MM-DD)
    #[arg(long)]
    pub since: Option<NaiveDate>,

    /// Last publication date to ingest (YYYY-MM-DD, default today)
    #[arg(long)]
    pub until: Option<NaiveDate>,

    /// Where to write the dataset (default: <data_dir>/dataset.json)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Write the dataset even if a source failed
    #[arg(long)]
    pub allow_partial: bool,
}

#[derive(Args, Clone)]
pub struct TrainArgs {
    /// YAML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Reconciled dataset (default: <data_dir>/dataset.json)
    #[arg(short, long)]
    pub dataset: Option<PathBuf>,

    /// Output directory for the model (default: <artifact_dir>)
    #[arg(long)]
    pub artifact_dir: Option<PathBuf>,

    /// Seed for the train/eval split (default: training.seed)
    #[arg(long)]
    pub seed: Option<u64>,
}

#[derive(Args, Clone)]
pub struct ServeArgs {
    /// Directory holding model.json
    #[arg(long, default_value = "./models")]
    pub artifact_dir: PathBuf,

    /// Listen address
    #[arg(long, default_value = "0.0.0.0")]
    pub host: String,

    /// Listen port
    #[arg(long, default_value = "8080")]
    pub port: u16,
}

#[derive(Args, Clone)]
pub struct PredictArgs {
    /// Directory holding model.json
    #[arg(long, default_value = "./models")]
    pub artifact_dir: PathBuf,

    /// JSON file with one input object or an array of them
    #[arg(short, long)]
    pub input: PathBuf,
}

#[derive(Args, Clone)]
pub struct ValidateArgs {
    /// Path to YAML config file
    pub config: PathBuf,
}
