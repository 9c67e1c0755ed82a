use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ForecastError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Source '{source_name}' unavailable after {attempts} attempt(s): {reason}")]
    SourceUnavailable {
        source_name: String,
        attempts: u32,
        reason: String,
    },

    #[error("Malformed record: {0}")]
    MalformedRecord(String),

    #[error("Schema mismatch on '{field}': {detail}")]
    SchemaMismatch { field: String, detail: String },

    #[error("Incompatible transform version: artifact has '{found}', this build expects '{expected}'")]
    IncompatibleTransformVersion { found: String, expected: String },

    #[error("Insufficient training data: {0}")]
    InsufficientTrainingData(String),

    #[error("Model artifact error: {0}")]
    Artifact(String),

    #[error("Authentication error: {0}")]
    Authentication(String),

    #[error("Rate limited: {message}")]
    RateLimit {
        message: String,
        retry_after: Option<Duration>,
    },

    #[error("Upstream returned HTTP {status}: {message}")]
    UpstreamStatus { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Service not ready: {0}")]
    NotReady(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ForecastError {
    pub fn schema_mismatch(field: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::SchemaMismatch {
            field: field.into(),
            detail: detail.into(),
        }
    }

    /// Map a reqwest transport failure onto the retry taxonomy.
    pub fn from_transport(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout(err.to_string())
        } else if err.is_decode() {
            Self::MalformedRecord(format!("undecodable response body: {}", err))
        } else if let Some(status) = err.status() {
            Self::UpstreamStatus {
                status: status.as_u16(),
                message: err.to_string(),
            }
        } else {
            Self::Network(err.to_string())
        }
    }

    /// Process exit code used by the CLI.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Configuration(_) => 2,
            Self::SourceUnavailable { .. } => 3,
            Self::InsufficientTrainingData(_) => 4,
            Self::IncompatibleTransformVersion { .. } | Self::Artifact(_) => 5,
            _ => 1,
        }
    }
}
