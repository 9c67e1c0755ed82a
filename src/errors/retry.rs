use std::future::Future;
use std::time::Duration;

use super::classification::ErrorClassification;
use super::types::ForecastError;
use tracing::warn;

/// Retry configuration for source fetches.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
        }
    }
}

impl RetryConfig {
    /// No waiting between attempts. Used by tests and dry runs.
    pub fn immediate(max_retries: u32) -> Self {
        Self {
            max_retries,
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_retries + 1
    }
}

impl ErrorClassification {
    /// Delay before the next attempt (0-indexed).
    ///
    /// Exponential backoff `base * 2^attempt` plus up to one `base` of jitter,
    /// capped at `max_delay`. A rate-limit response never waits less than the
    /// server's `Retry-After`.
    pub fn retry_delay(&self, attempt: u32, config: &RetryConfig, retry_after: Option<Duration>) -> Duration {
        let base = config.base_delay.as_secs_f64();
        let exp = base * 2.0_f64.powi(attempt.min(16) as i32);
        let jitter = base * rand::random::<f64>();
        let capped = (exp + jitter).min(config.max_delay.as_secs_f64());
        let delay = Duration::from_secs_f64(capped.max(0.0));

        match (self.error_type, retry_after) {
            ("RateLimitError", Some(server_hint)) => delay.max(server_hint),
            _ => delay,
        }
    }
}

/// Execute an async operation with retry logic.
///
/// Retries only if the error is classified as retryable and `max_retries`
/// has not been exhausted. The last error is returned unchanged.
pub async fn with_retry<F, Fut, T>(
    operation_name: &str,
    config: &RetryConfig,
    mut factory: F,
) -> Result<T, ForecastError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ForecastError>>,
{
    let max_attempts = config.max_attempts();
    let mut attempt = 0;

    loop {
        let err = match factory().await {
            Ok(result) => return Ok(result),
            Err(e) => e,
        };

        let classification = err.classify();
        if !classification.retryable {
            warn!(
                operation = operation_name,
                error_type = classification.error_type,
                "Non-retryable error, failing immediately"
            );
            return Err(err);
        }
        if attempt + 1 >= max_attempts {
            warn!(
                operation = operation_name,
                attempt = attempt + 1,
                max = max_attempts,
                "Max retries exhausted"
            );
            return Err(err);
        }

        let retry_after = match &err {
            ForecastError::RateLimit { retry_after, .. } => *retry_after,
            _ => None,
        };
        let delay = classification.retry_delay(attempt, config, retry_after);
        warn!(
            operation = operation_name,
            attempt = attempt + 1,
            max = max_attempts,
            error_type = classification.error_type,
            delay_ms = delay.as_millis() as u64,
            error = %err,
            "Retrying after error"
        );

        tokio::time::sleep(delay).await;
        attempt += 1;
    }
}
