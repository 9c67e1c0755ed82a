use std::time::Duration;

use reqwest::{Client, RequestBuilder, StatusCode};
use serde_json::Value;

use crate::errors::ForecastError;

/// Shared HTTP client. The per-request timeout is independent of retry/backoff.
pub fn build_client(request_timeout: Duration) -> Result<Client, ForecastError> {
    Client::builder()
        .timeout(request_timeout)
        .user_agent(concat!("vulnforecast/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| ForecastError::Configuration(format!("Failed to build HTTP client: {}", e)))
}

/// Send a request and decode a JSON body, mapping HTTP failures onto the retry taxonomy.
pub async fn get_json(request: RequestBuilder, source: &str) -> Result<Value, ForecastError> {
    let resp = request.send().await.map_err(ForecastError::from_transport)?;

    let status = resp.status();
    if status == StatusCode::TOO_MANY_REQUESTS {
        let retry_after = resp
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(parse_retry_after);
        return Err(ForecastError::RateLimit {
            message: format!("{} rate limit", source),
            retry_after,
        });
    }
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return Err(ForecastError::Authentication(format!("{} returned HTTP {}", source, status.as_u16())));
    }
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(ForecastError::UpstreamStatus {
            status: status.as_u16(),
            message: truncate(&body, 200),
        });
    }

    resp.json::<Value>().await.map_err(ForecastError::from_transport)
}

/// `Retry-After` in delta-seconds form. HTTP-date form is ignored.
fn parse_retry_after(value: &str) -> Option<Duration> {
    value.trim().parse::<u64>().ok().map(Duration::from_secs)
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        let cut: String = text.chars().take(max).collect();
        format!("{}…", cut)
    }
}
