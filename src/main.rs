use clap::Parser;
use tracing_subscriber::EnvFilter;

use vulnforecast::cli::{self, Commands};

#[tokio::main]
async fn main() {
    let cli = cli::Cli::parse();

    // Initialize logging
    let log_level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);
    if cli.log_json {
        subscriber.json().init();
    } else {
        subscriber.with_ansi(!cli.no_color).init();
    }

    let result = match cli.command {
        Commands::Ingest(args) => cli::ingest::handle_ingest(args).await,
        Commands::Train(args) => cli::train::handle_train(args).await,
        Commands::Serve(args) => cli::serve::handle_serve(args).await,
        Commands::Predict(args) => cli::predict::handle_predict(args).await,
        Commands::Validate(args) => cli::validate::handle_validate(args).await,
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(e.exit_code());
    }
}
