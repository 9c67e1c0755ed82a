use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use ndarray::ArrayView1;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::errors::ForecastError;
use crate::features::{FeatureMetadata, FeatureVector, PredictInput};
use crate::transform;
use super::artifact::ModelArtifact;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub predicted_class: u8,
    /// Probability of `predicted_class`.
    pub probability: f64,
    /// Probability of the exploited class.
    pub exploit_probability: f64,
}

/// Read-only scorer over one loaded artifact. Shared behind an `Arc`.
#[derive(Debug)]
pub struct Predictor {
    artifact: Arc<ModelArtifact>,
}

impl Predictor {
    /// Load from an artifact directory, failing on a missing, corrupt or
    /// incompatible model.
    pub async fn load(dir: &Path) -> Result<Self, ForecastError> {
        let artifact = ModelArtifact::load(dir).await?;
        info!(
            dir = %dir.display(),
            run_id = %artifact.provenance.run_id,
            version = artifact.transform.version(),
            columns = artifact.transform.width(),
            "Loaded model"
        );
        Ok(Self { artifact: Arc::new(artifact) })
    }

    pub fn from_artifact(artifact: ModelArtifact) -> Result<Self, ForecastError> {
        artifact.validate()?;
        Ok(Self { artifact: Arc::new(artifact) })
    }

    pub fn artifact(&self) -> &ModelArtifact {
        &self.artifact
    }

    pub fn metadata(&self) -> FeatureMetadata {
        self.artifact.transform.metadata()
    }

    /// Encode (unless pre-encoded) and score. Ages are taken relative to now.
    pub fn predict(&self, input: &PredictInput) -> Result<Prediction, ForecastError> {
        self.predict_at(input, Utc::now())
    }

    pub fn predict_at(&self, input: &PredictInput, reference: DateTime<Utc>) -> Result<Prediction, ForecastError> {
        let vector = self.encode(input, reference)?;
        let p = self.artifact.estimator.predict_proba(ArrayView1::from(vector.values.as_slice()));
        let exploited = p >= self.artifact.decision_threshold;
        Ok(Prediction {
            predicted_class: u8::from(exploited),
            probability: if exploited { p } else { 1.0 - p },
            exploit_probability: p,
        })
    }

    pub fn predict_batch(&self, inputs: &[PredictInput]) -> Result<Vec<Prediction>, ForecastError> {
        let reference = Utc::now();
        inputs.iter().map(|input| self.predict_at(input, reference)).collect()
    }

    pub fn encode(&self, input: &PredictInput, reference: DateTime<Utc>) -> Result<FeatureVector, ForecastError> {
        let t = &self.artifact.transform;
        match input {
            PredictInput::Record(record) => {
                record.check_ranges()?;
                transform::apply(t, record, reference)
            }
            PredictInput::Encoded(values) => transform::encoded(t, values.clone()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Health {
    Ready,
    NotReady,
}

pub fn health(predictor: &Option<Arc<Predictor>>) -> Health {
    match predictor {
        Some(_) => Health::Ready,
        None => Health::NotReady,
    }
}
