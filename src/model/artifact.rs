use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;
use uuid::Uuid;

use crate::errors::ForecastError;
use crate::features::TRANSFORM_VERSION;
use crate::transform::{self, FittedTransform};
use super::estimator::TrainedEstimator;
use super::metrics::EvaluationMetrics;

pub const MODEL_FILE: &str = "model.json";
pub const METADATA_FILE: &str = "feature_metadata.json";

/// Where a model came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Provenance {
    pub run_id: Uuid,
    pub trained_at: DateTime<Utc>,
    pub dataset_snapshot_at: DateTime<Utc>,
    pub seed: u64,
    pub train_size: usize,
    pub eval_size: usize,
    pub git_hash: Option<String>,
    pub build_timestamp: Option<String>,
}

impl Provenance {
    pub fn new(seed: u64, dataset_snapshot_at: DateTime<Utc>, train_size: usize, eval_size: usize) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            trained_at: Utc::now(),
            dataset_snapshot_at,
            seed,
            train_size,
            eval_size,
            git_hash: option_env!("GIT_HASH").map(str::to_string),
            build_timestamp: option_env!("BUILD_TIMESTAMP").map(str::to_string),
        }
    }
}

/// Transform and estimator persisted as one document, so neither can be
/// replaced without the other.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub transform: FittedTransform,
    pub estimator: TrainedEstimator,
    pub decision_threshold: f64,
    pub metrics: EvaluationMetrics,
    pub provenance: Provenance,
}

impl ModelArtifact {
    /// Internal consistency: transform layout intact and estimator width matching.
    pub fn validate(&self) -> Result<(), ForecastError> {
        transform::verify(&self.transform)?;
        if self.estimator.n_features() != self.transform.width() {
            return Err(ForecastError::Artifact(format!(
                "estimator expects {} features but the transform produces {}",
                self.estimator.n_features(),
                self.transform.width()
            )));
        }
        if !(0.0..=1.0).contains(&self.decision_threshold) {
            return Err(ForecastError::Artifact(format!(
                "decision threshold {} outside [0, 1]",
                self.decision_threshold
            )));
        }
        Ok(())
    }

    /// Write `model.json` and `feature_metadata.json` into `dir`.
    ///
    /// Each file is written to a temporary sibling and renamed into place, so
    /// a reader never sees a partial document.
    pub async fn save(&self, dir: &Path) -> Result<PathBuf, ForecastError> {
        self.validate()?;
        tokio::fs::create_dir_all(dir).await?;

        let model_path = dir.join(MODEL_FILE);
        write_atomic(&model_path, &serde_json::to_vec_pretty(self)?).await?;
        write_atomic(
            &dir.join(METADATA_FILE),
            &serde_json::to_vec_pretty(&self.transform.metadata())?,
        )
        .await?;

        info!(
            path = %model_path.display(),
            run_id = %self.provenance.run_id,
            layout_hash = %format!("{:08x}", self.transform.layout_hash()),
            "Saved model artifact"
        );
        Ok(model_path)
    }

    /// Load and validate `dir/model.json`. Fails on anything unusable.
    pub async fn load(dir: &Path) -> Result<Self, ForecastError> {
        let path = dir.join(MODEL_FILE);
        let bytes = match tokio::fs::read(&path).await {
            Ok(b) => b,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ForecastError::Artifact(format!("no model at {}", path.display())));
            }
            Err(e) => return Err(e.into()),
        };
        Self::from_slice(&bytes)
    }

    /// Parse and validate a serialized artifact.
    ///
    /// The version tag is checked before anything else so that an artifact
    /// from another layout reports a version conflict, not a parse error.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, ForecastError> {
        let doc: Value = serde_json::from_slice(bytes)
            .map_err(|e| ForecastError::Artifact(format!("model document is not valid JSON: {}", e)))?;

        let found = doc
            .pointer("/transform/version")
            .and_then(Value::as_str)
            .ok_or_else(|| ForecastError::Artifact("model document has no transform version".into()))?;
        if found != TRANSFORM_VERSION {
            return Err(ForecastError::IncompatibleTransformVersion {
                found: found.to_string(),
                expected: TRANSFORM_VERSION.to_string(),
            });
        }

        let artifact: Self = serde_json::from_value(doc)
            .map_err(|e| ForecastError::Artifact(format!("model document is corrupt: {}", e)))?;
        artifact.validate()?;
        Ok(artifact)
    }
}

async fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), ForecastError> {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    tokio::fs::write(&tmp, bytes).await?;
    tokio::fs::rename(&tmp, path).await?;
    Ok(())
}
