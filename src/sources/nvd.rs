use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde_json::Value;

use crate::config::credentials::require_credential;
use crate::config::NvdSourceConfig;
use crate::errors::ForecastError;
use super::fetcher::{Cursor, Page, QueryWindow, SourceFetcher, SourceKind};
use super::http::get_json;

/// NVD rejects publication ranges longer than this.
pub const MAX_RANGE_DAYS: i64 = 120;

const NVD_DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3f";

pub struct NvdFetcher {
    client: Client,
    base_url: String,
    api_key: String,
    results_per_page: u32,
}

impl NvdFetcher {
    /// Resolves the API key up front: a missing key fails here, before any request.
    pub fn from_config(config: &NvdSourceConfig, client: Client) -> Result<Self, ForecastError> {
        let api_key = require_credential("nvd", config.api_key.as_deref())?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
            results_per_page: config.results_per_page,
        })
    }
}

#[async_trait]
impl SourceFetcher for NvdFetcher {
    fn kind(&self) -> SourceKind {
        SourceKind::Nvd
    }

    async fn fetch_page(&self, window: &QueryWindow, cursor: Cursor) -> Result<Page, ForecastError> {
        let segments = window.segments(MAX_RANGE_DAYS);
        let Some(segment) = segments.get(cursor.segment) else {
            return Ok(Page::default());
        };

        let mut query: Vec<(&str, String)> = vec![
            ("startIndex", cursor.offset.to_string()),
            ("resultsPerPage", self.results_per_page.to_string()),
        ];
        if let Some((from, to)) = segment {
            query.push(("pubStartDate", format_nvd_date(from)));
            query.push(("pubEndDate", format_nvd_date(to)));
        }

        let request = self
            .client
            .get(&self.base_url)
            .header("apiKey", &self.api_key)
            .query(&query);
        let body = get_json(request, "nvd").await?;

        parse_page(&body, cursor, segments.len())
    }
}

fn format_nvd_date(ts: &DateTime<Utc>) -> String {
    ts.format(NVD_DATE_FORMAT).to_string()
}

/// Extract records and the continuation cursor from one NVD response.
fn parse_page(body: &Value, cursor: Cursor, segment_count: usize) -> Result<Page, ForecastError> {
    let records = body
        .get("vulnerabilities")
        .and_then(Value::as_array)
        .ok_or_else(|| ForecastError::MalformedRecord("NVD response has no 'vulnerabilities' array".into()))?
        .clone();
    let total = body.get("totalResults").and_then(Value::as_u64).unwrap_or(0);
    let start = body.get("startIndex").and_then(Value::as_u64).unwrap_or(cursor.offset);

    let consumed = start + records.len() as u64;
    let next = if !records.is_empty() && consumed < total {
        Some(Cursor { segment: cursor.segment, offset: consumed })
    } else if cursor.segment + 1 < segment_count {
        Some(Cursor { segment: cursor.segment + 1, offset: 0 })
    } else {
        None
    };

    Ok(Page { records, next })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_page_continues_within_segment() {
        let body = json!({
            "resultsPerPage": 2,
            "startIndex": 0,
            "totalResults": 5,
            "vulnerabilities": [{"cve": {"id": "CVE-2024-0001"}}, {"cve": {"id": "CVE-2024-0002"}}]
        });
        let page = parse_page(&body, Cursor::default(), 1).unwrap();
        assert_eq!(page.records.len(), 2);
        assert_eq!(page.next, Some(Cursor { segment: 0, offset: 2 }));
    }

    #[test]
    fn test_parse_page_moves_to_next_segment() {
        let body = json!({"startIndex": 4, "totalResults": 5, "vulnerabilities": [{"cve": {}}]});
        let page = parse_page(&body, Cursor { segment: 0, offset: 4 }, 3).unwrap();
        assert_eq!(page.next, Some(Cursor { segment: 1, offset: 0 }));
    }

    #[test]
    fn test_parse_page_ends_on_last_segment() {
        let body = json!({"startIndex": 0, "totalResults": 0, "vulnerabilities": []});
        let page = parse_page(&body, Cursor::default(), 1).unwrap();
        assert!(page.records.is_empty());
        assert_eq!(page.next, None);
    }

    #[test]
    fn test_parse_page_rejects_wrong_shape() {
        let body = json!({"message": "error"});
        assert!(matches!(
            parse_page(&body, Cursor::default(), 1),
            Err(ForecastError::MalformedRecord(_))
        ));
    }

    #[test]
    fn test_missing_key_fails_before_requests() {
        let config = NvdSourceConfig { api_key: None, ..Default::default() };
        let client = Client::new();
        assert!(matches!(
            NvdFetcher::from_config(&config, client),
            Err(ForecastError::Configuration(_))
        ));
    }

    #[test]
    fn test_nvd_date_format() {
        let ts = chrono::NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
            .and_utc();
        assert_eq!(format_nvd_date(&ts), "2024-03-01T00:00:00.000");
    }
}
