use axum::extract::rejection::JsonRejection;
use axum::{extract::State, Json};
use chrono::Utc;
use serde_json::Value;

use crate::api::models::{BatchPredictRequest, BatchPredictResponse};
use crate::api::AppState;
use crate::errors::ForecastError;
use crate::features::PredictInput;
use crate::model::Prediction;

fn body(payload: Result<Json<Value>, JsonRejection>) -> Result<Value, ForecastError> {
    payload
        .map(|Json(v)| v)
        .map_err(|e| ForecastError::schema_mismatch("body", e.body_text()))
}

pub async fn predict(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Prediction>, ForecastError> {
    let predictor = state.predictor()?;
    let input = PredictInput::from_json(body(payload)?)?;
    Ok(Json(predictor.predict(&input)?))
}

pub async fn predict_batch(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<BatchPredictResponse>, ForecastError> {
    let predictor = state.predictor()?;
    let request: BatchPredictRequest = serde_json::from_value(body(payload)?)
        .map_err(|e| ForecastError::schema_mismatch("inputs", e.to_string()))?;

    let reference = Utc::now();
    let predictions = request
        .inputs
        .into_iter()
        .enumerate()
        .map(|(i, raw)| {
            PredictInput::from_json(raw)
                .and_then(|input| predictor.predict_at(&input, reference))
                .map_err(|e| match e {
                    ForecastError::SchemaMismatch { field, detail } => {
                        ForecastError::schema_mismatch(format!("inputs[{}].{}", i, field), detail)
                    }
                    other => other,
                })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Json(BatchPredictResponse { predictions }))
}
