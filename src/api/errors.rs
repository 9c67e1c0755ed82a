use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::json;

use crate::errors::ForecastError;

impl IntoResponse for ForecastError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self {
            ForecastError::SchemaMismatch { field, detail } => {
                let body = json!({"error": "schema_mismatch", "field": field, "detail": detail});
                return (StatusCode::UNPROCESSABLE_ENTITY, Json(body)).into_response();
            }
            ForecastError::Configuration(_) => StatusCode::BAD_REQUEST,
            ForecastError::NotReady(_) => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        }

        (status, Json(json!({"error": self.to_string()}))).into_response()
    }
}
