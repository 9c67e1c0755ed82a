use crate::cli::commands::ValidateArgs;
use crate::config::parse_config;
use crate::errors::ForecastError;

pub async fn handle_validate(args: ValidateArgs) -> Result<(), ForecastError> {
    let config = parse_config(&args.config).await?;
    let sources = &config.sources;
    let enabled: Vec<&str> = [
        ("nvd", sources.nvd.enabled),
        ("kev", sources.kev.enabled),
        ("epss", sources.epss.enabled),
    ]
    .into_iter()
    .filter_map(|(name, on)| on.then_some(name))
    .collect();

    println!("Configuration is valid: {}", args.config.display());
    println!("  sources: {}", enabled.join(", "));
    Ok(())
}
