pub mod artifact;
pub mod estimator;
pub mod metrics;
pub mod predictor;
pub mod split;
pub mod trainer;

pub use artifact::{ModelArtifact, Provenance, METADATA_FILE, MODEL_FILE};
pub use estimator::{Estimator, LogisticRegression, TrainedEstimator};
pub use metrics::{ConfusionMatrix, EvaluationMetrics};
pub use predictor::{health, Health, Prediction, Predictor};
pub use split::{stratified_split, Split};
pub use trainer::Trainer;
