use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;

use crate::config::EpssSourceConfig;
use crate::errors::ForecastError;
use super::fetcher::{Cursor, Page, QueryWindow, SourceFetcher, SourceKind};
use super::http::get_json;

/// Exploit-likelihood score feed, paged by offset.
pub struct EpssFetcher {
    client: Client,
    base_url: String,
    page_size: u32,
}

impl EpssFetcher {
    pub fn from_config(config: &EpssSourceConfig, client: Client) -> Self {
        Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            page_size: config.page_size.max(1),
        }
    }
}

#[async_trait]
impl SourceFetcher for EpssFetcher {
    fn kind(&self) -> SourceKind {
        SourceKind::Epss
    }

    // Scores are a daily snapshot over all identifiers; the window does not apply.
    async fn fetch_page(&self, _window: &QueryWindow, cursor: Cursor) -> Result<Page, ForecastError> {
        let request = self.client.get(&self.base_url).query(&[
            ("offset", cursor.offset.to_string()),
            ("limit", self.page_size.to_string()),
        ]);
        let body = get_json(request, "epss").await?;
        parse_page(&body, cursor)
    }
}

fn parse_page(body: &Value, cursor: Cursor) -> Result<Page, ForecastError> {
    let records = body
        .get("data")
        .and_then(Value::as_array)
        .ok_or_else(|| ForecastError::MalformedRecord("EPSS response has no 'data' array".into()))?
        .clone();
    let total = body.get("total").and_then(Value::as_u64).unwrap_or(0);
    let offset = body.get("offset").and_then(Value::as_u64).unwrap_or(cursor.offset);

    let consumed = offset + records.len() as u64;
    let next = (!records.is_empty() && consumed < total).then_some(Cursor {
        segment: cursor.segment,
        offset: consumed,
    });
    Ok(Page { records, next })
}
