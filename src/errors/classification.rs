use super::types::ForecastError;

#[derive(Debug, Clone)]
pub struct ErrorClassification {
    pub error_type: &'static str,
    pub retryable: bool,
}

impl ForecastError {
    /// Classify this error to determine its type and whether a fetch may be retried.
    pub fn classify(&self) -> ErrorClassification {
        match self {
            // Transient transport failures
            ForecastError::RateLimit { .. } => ErrorClassification {
                error_type: "RateLimitError",
                retryable: true,
            },
            ForecastError::Network(_) => ErrorClassification {
                error_type: "NetworkError",
                retryable: true,
            },
            ForecastError::Timeout(_) => ErrorClassification {
                error_type: "TimeoutError",
                retryable: true,
            },
            ForecastError::UpstreamStatus { status, .. } => ErrorClassification {
                error_type: "UpstreamStatusError",
                retryable: *status >= 500,
            },

            // Fail fast
            ForecastError::Authentication(_) => ErrorClassification {
                error_type: "AuthenticationError",
                retryable: false,
            },
            ForecastError::Configuration(_) => ErrorClassification {
                error_type: "ConfigurationError",
                retryable: false,
            },
            ForecastError::SourceUnavailable { .. } => ErrorClassification {
                error_type: "SourceUnavailable",
                retryable: false,
            },
            ForecastError::MalformedRecord(_) => ErrorClassification {
                error_type: "MalformedRecord",
                retryable: false,
            },
            ForecastError::SchemaMismatch { .. } => ErrorClassification {
                error_type: "SchemaMismatch",
                retryable: false,
            },
            ForecastError::IncompatibleTransformVersion { .. } => ErrorClassification {
                error_type: "IncompatibleTransformVersion",
                retryable: false,
            },
            ForecastError::InsufficientTrainingData(_) => ErrorClassification {
                error_type: "InsufficientTrainingData",
                retryable: false,
            },
            ForecastError::Artifact(_) => ErrorClassification {
                error_type: "ArtifactError",
                retryable: false,
            },
            ForecastError::NotReady(_) => ErrorClassification {
                error_type: "NotReady",
                retryable: false,
            },
            // A response body that fails to parse will not parse on retry either
            ForecastError::Json(_) => ErrorClassification {
                error_type: "JsonError",
                retryable: false,
            },
            ForecastError::Yaml(_) => ErrorClassification {
                error_type: "YamlError",
                retryable: false,
            },
            ForecastError::Io(_) => ErrorClassification {
                error_type: "IoError",
                retryable: true,
            },
            ForecastError::Internal(_) => ErrorClassification {
                error_type: "InternalError",
                retryable: false,
            },
        }
    }
}
