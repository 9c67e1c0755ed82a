pub mod errors;
pub mod models;
pub mod routes;

use std::path::Path;
use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::errors::ForecastError;
use crate::model::Predictor;

/// Shared by every handler. The predictor is read-only, so no lock is needed.
#[derive(Clone, Default)]
pub struct AppState {
    pub predictor: Option<Arc<Predictor>>,
}

impl AppState {
    pub fn ready(predictor: Predictor) -> Self {
        Self { predictor: Some(Arc::new(predictor)) }
    }

    pub(crate) fn predictor(&self) -> Result<&Predictor, ForecastError> {
        self.predictor
            .as_deref()
            .ok_or_else(|| ForecastError::NotReady("no model is loaded".into()))
    }
}

/// Load the model once at startup. A broken artifact stops the server here.
pub async fn create_app_state(artifact_dir: &Path) -> Result<AppState, ForecastError> {
    let predictor = Predictor::load(artifact_dir).await?;
    Ok(AppState::ready(predictor))
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(routes::health::health_check))
        .route("/api/predict", post(routes::predict::predict))
        .route("/api/predict/batch", post(routes::predict::predict_batch))
        .route("/api/features", get(routes::features::get_features))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
