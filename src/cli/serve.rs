use tracing::info;

use crate::api;
use crate::cli::commands::ServeArgs;
use crate::errors::ForecastError;

pub async fn handle_serve(args: ServeArgs) -> Result<(), ForecastError> {
    info!(host = %args.host, port = args.port, artifact_dir = %args.artifact_dir.display(), "Starting API server");

    let state = api::create_app_state(&args.artifact_dir).await?;
    let app = api::build_router(state);

    let addr = format!("{}:{}", args.host, args.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Listening on {}", addr);

    axum::serve(listener, app)
        .await
        .map_err(|e| ForecastError::Internal(format!("Server error: {}", e)))?;

    Ok(())
}
