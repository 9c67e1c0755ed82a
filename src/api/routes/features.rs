use axum::{extract::State, Json};

use crate::api::AppState;
use crate::errors::ForecastError;
use crate::features::FeatureMetadata;

/// Column layout of the loaded model, for clients that send encoded vectors.
pub async fn get_features(State(state): State<AppState>) -> Result<Json<FeatureMetadata>, ForecastError> {
    Ok(Json(state.predictor()?.metadata()))
}
