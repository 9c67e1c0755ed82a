use std::path::PathBuf;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;

use crate::config::KevSourceConfig;
use crate::errors::ForecastError;
use super::fetcher::{Cursor, Page, QueryWindow, SourceFetcher, SourceKind};
use super::http::get_json;

enum KevLocation {
    Url(String),
    File(PathBuf),
}

/// Exploited-vulnerability catalog: a single bulk document, remote or manually supplied.
pub struct KevFetcher {
    client: Client,
    location: KevLocation,
}

impl KevFetcher {
    pub fn from_config(config: &KevSourceConfig, client: Client) -> Result<Self, ForecastError> {
        let location = match &config.path {
            Some(path) => {
                if !path.exists() {
                    return Err(ForecastError::Configuration(format!(
                        "KEV catalog file not found: {}",
                        path.display()
                    )));
                }
                KevLocation::File(path.clone())
            }
            None if config.url.trim().is_empty() => {
                return Err(ForecastError::Configuration("sources.kev needs a url or a path".into()));
            }
            None => KevLocation::Url(config.url.clone()),
        };
        Ok(Self { client, location })
    }
}

#[async_trait]
impl SourceFetcher for KevFetcher {
    fn kind(&self) -> SourceKind {
        SourceKind::Kev
    }

    // The catalog is a snapshot, so the publication window does not apply.
    async fn fetch_page(&self, _window: &QueryWindow, _cursor: Cursor) -> Result<Page, ForecastError> {
        let body: Value = match &self.location {
            KevLocation::Url(url) => get_json(self.client.get(url), "kev").await?,
            KevLocation::File(path) => {
                let bytes = tokio::fs::read(path).await?;
                serde_json::from_slice(&bytes)?
            }
        };
        parse_catalog(&body)
    }
}

fn parse_catalog(body: &Value) -> Result<Page, ForecastError> {
    let records = body
        .get("vulnerabilities")
        .and_then(Value::as_array)
        .ok_or_else(|| ForecastError::MalformedRecord("KEV catalog has no 'vulnerabilities' array".into()))?
        .clone();
    Ok(Page { records, next: None })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;

    #[tokio::test]
    async fn test_reads_manually_supplied_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        let doc = json!({
            "catalogVersion": "2024.01.01",
            "vulnerabilities": [
                {"cveID": "CVE-2021-44228", "dateAdded": "2021-12-10"},
                {"cveID": "CVE-2023-4966", "dateAdded": "2023-10-18"}
            ]
        });
        file.write_all(doc.to_string().as_bytes()).unwrap();

        let config = KevSourceConfig {
            path: Some(file.path().to_path_buf()),
            ..Default::default()
        };
        let fetcher = KevFetcher::from_config(&config, Client::new()).unwrap();
        let page = fetcher.fetch_page(&QueryWindow::All, Cursor::default()).await.unwrap();
        assert_eq!(page.records.len(), 2);
        assert!(page.next.is_none());
    }

    #[test]
    fn test_missing_file_is_configuration_error() {
        let config = KevSourceConfig {
            path: Some(PathBuf::from("/nonexistent/kev.json")),
            ..Default::default()
        };
        assert!(matches!(
            KevFetcher::from_config(&config, Client::new()),
            Err(ForecastError::Configuration(_))
        ));
    }

    #[test]
    fn test_wrong_shape_is_malformed() {
        assert!(parse_catalog(&json!({"data": []})).is_err());
    }
}
