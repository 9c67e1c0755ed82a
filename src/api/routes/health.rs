use axum::{extract::State, http::StatusCode, Json};

use crate::api::models::{HealthResponse, ModelSummary};
use crate::api::AppState;
use crate::model::{health, Health};

pub async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let status = health(&state.predictor);
    let model = state.predictor.as_deref().map(|p| {
        let artifact = p.artifact();
        ModelSummary {
            run_id: artifact.provenance.run_id.to_string(),
            transform_version: artifact.transform.version().to_string(),
            layout_hash: format!("{:08x}", artifact.transform.layout_hash()),
            columns: artifact.transform.width(),
            estimator: artifact.estimator.name(),
            trained_at: artifact.provenance.trained_at.to_rfc3339(),
        }
    });
    let code = match status {
        Health::Ready => StatusCode::OK,
        Health::NotReady => StatusCode::SERVICE_UNAVAILABLE,
    };

    (
        code,
        Json(HealthResponse {
            status,
            service: env!("CARGO_PKG_NAME"),
            version: env!("CARGO_PKG_VERSION"),
            model,
        }),
    )
}
