use ndarray::{Array1, Array2};
use tracing::{info, warn};

use crate::config::{FeatureConfig, TrainingConfig};
use crate::errors::ForecastError;
use crate::features::{FeatureInput, FeatureVector};
use crate::models::{Label, ReconciledDataset};
use crate::transform;
use super::artifact::{ModelArtifact, Provenance};
use super::estimator::{Estimator, LogisticRegression, TrainedEstimator};
use super::metrics::EvaluationMetrics;
use super::split::stratified_split;

pub struct Trainer {
    training: TrainingConfig,
    features: FeatureConfig,
}

impl Trainer {
    pub fn new(training: TrainingConfig, features: FeatureConfig) -> Self {
        Self { training, features }
    }

    /// Split, fit the transform on the training partition, fit the estimator
    /// and evaluate on the held-out partition. Writes nothing.
    pub fn fit_and_train(
        &self,
        dataset: &ReconciledDataset,
        seed: u64,
    ) -> Result<(ModelArtifact, EvaluationMetrics), ForecastError> {
        let split = stratified_split(&dataset.records, self.training.test_ratio, seed);

        let train_positives = split
            .train
            .iter()
            .filter(|&&i| dataset.records[i].label == Label::Exploited)
            .count();
        if split.train.is_empty() {
            return Err(ForecastError::InsufficientTrainingData("the training partition is empty".into()));
        }
        if train_positives == 0 || train_positives == split.train.len() {
            return Err(ForecastError::InsufficientTrainingData(format!(
                "the training partition has a single class ({} records, {} exploited)",
                split.train.len(),
                train_positives
            )));
        }
        info!(
            train = split.train.len(),
            eval = split.eval.len(),
            train_positives,
            seed,
            "Split dataset"
        );

        let snapshot_at = dataset.snapshot_at;
        let inputs = |idx: &[usize]| -> Vec<FeatureInput> {
            idx.iter().map(|&i| FeatureInput::from(&dataset.records[i])).collect()
        };
        let labels = |idx: &[usize]| -> Array1<f64> {
            idx.iter().map(|&i| dataset.records[i].label.as_f64()).collect()
        };

        let train_inputs = inputs(&split.train);
        let fitted = transform::fit(&train_inputs, snapshot_at, &self.features);
        let x_train = to_matrix(&transform::apply_batch(&fitted, &train_inputs, snapshot_at)?, fitted.width())?;

        let mut estimator = LogisticRegression::new(
            self.training.learning_rate,
            self.training.max_iter,
            self.training.l2,
        );
        estimator.fit(&x_train, &labels(&split.train))?;

        let eval_inputs = inputs(&split.eval);
        let x_eval = to_matrix(&transform::apply_batch(&fitted, &eval_inputs, snapshot_at)?, fitted.width())?;
        let y_eval = labels(&split.eval);
        let proba: Vec<f64> = x_eval.rows().into_iter().map(|row| estimator.predict_proba(row)).collect();
        let metrics = EvaluationMetrics::evaluate(
            y_eval.as_slice().unwrap_or(&[]),
            &proba,
            self.training.decision_threshold,
        );

        if split.eval.is_empty() {
            warn!("Evaluation partition is empty; metrics are not meaningful");
        }
        info!(
            accuracy = metrics.accuracy,
            precision = metrics.precision,
            recall = metrics.recall,
            f1 = metrics.f1,
            roc_auc = ?metrics.roc_auc,
            columns = fitted.width(),
            "Trained model"
        );

        let artifact = ModelArtifact {
            transform: fitted,
            estimator: TrainedEstimator::LogisticRegression(estimator),
            decision_threshold: self.training.decision_threshold,
            metrics: metrics.clone(),
            provenance: Provenance::new(seed, snapshot_at, split.train.len(), split.eval.len()),
        };
        Ok((artifact, metrics))
    }
}

fn to_matrix(rows: &[FeatureVector], width: usize) -> Result<Array2<f64>, ForecastError> {
    let flat: Vec<f64> = rows.iter().flat_map(|r| r.values.iter().copied()).collect();
    Array2::from_shape_vec((rows.len(), width), flat)
        .map_err(|e| ForecastError::Internal(format!("feature matrix shape: {}", e)))
}
