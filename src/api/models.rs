use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::model::Prediction;

#[derive(Deserialize)]
pub struct BatchPredictRequest {
    pub inputs: Vec<Value>,
}

#[derive(Serialize)]
pub struct BatchPredictResponse {
    pub predictions: Vec<Prediction>,
}

#[derive(Serialize)]
pub struct ModelSummary {
    pub run_id: String,
    pub transform_version: String,
    pub layout_hash: String,
    pub columns: usize,
    pub estimator: &'static str,
    pub trained_at: String,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: crate::model::Health,
    pub service: &'static str,
    pub version: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<ModelSummary>,
}
