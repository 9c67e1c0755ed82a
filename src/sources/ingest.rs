use std::sync::Arc;

use chrono::Utc;
use futures::future::join_all;
use futures::StreamExt;
use tracing::{error, info, warn};

use crate::config::{FetchConfig, ForecastConfig};
use crate::errors::{ForecastError, RetryConfig};
use crate::models::{NormalizedRecord, ReconciledDataset};
use crate::normalize::{normalize, NormalizeReport};
use crate::reconcile::Reconciler;
use super::epss::EpssFetcher;
use super::fetcher::{fetch_pages, QueryWindow, SourceFetcher, SourceKind};
use super::http::build_client;
use super::kev::KevFetcher;
use super::nvd::NvdFetcher;
use super::pacing::RequestPacer;

/// What happened to one source during an ingestion run.
#[derive(Debug)]
pub struct SourceOutcome {
    pub source: SourceKind,
    pub pages: usize,
    pub raw_records: usize,
    pub normalize: NormalizeReport,
    /// Set when the source aborted. Its partial records were discarded.
    pub error: Option<ForecastError>,
}

impl SourceOutcome {
    fn new(source: SourceKind) -> Self {
        Self {
            source,
            pages: 0,
            raw_records: 0,
            normalize: NormalizeReport::default(),
            error: None,
        }
    }

    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

#[derive(Debug)]
pub struct IngestionOutcome {
    pub dataset: ReconciledDataset,
    pub sources: Vec<SourceOutcome>,
}

impl IngestionOutcome {
    pub fn failed_sources(&self) -> impl Iterator<Item = &SourceOutcome> {
        self.sources.iter().filter(|s| !s.succeeded())
    }
}

/// Construct a fetcher for every enabled source.
///
/// Credentials and local paths are checked here, so a bad configuration fails
/// before the first request goes out.
pub fn build_fetchers(config: &ForecastConfig) -> Result<Vec<Arc<dyn SourceFetcher>>, ForecastError> {
    let client = build_client(config.fetch.request_timeout())?;
    let sources = &config.sources;
    let mut fetchers: Vec<Arc<dyn SourceFetcher>> = Vec::new();

    if sources.nvd.enabled {
        fetchers.push(Arc::new(NvdFetcher::from_config(&sources.nvd, client.clone())?));
    }
    if sources.kev.enabled {
        fetchers.push(Arc::new(KevFetcher::from_config(&sources.kev, client.clone())?));
    }
    if sources.epss.enabled {
        fetchers.push(Arc::new(EpssFetcher::from_config(&sources.epss, client)));
    }

    if fetchers.is_empty() {
        return Err(ForecastError::Configuration("no source is enabled".into()));
    }
    Ok(fetchers)
}

/// Fetch every source concurrently, one task each, then reconcile.
///
/// A source that fails is reported in its outcome and contributes nothing;
/// the other sources still complete.
pub async fn run_ingestion(
    fetchers: Vec<Arc<dyn SourceFetcher>>,
    window: QueryWindow,
    fetch: &FetchConfig,
) -> IngestionOutcome {
    let retry = fetch.retry();
    let interval = fetch.request_interval();

    let (kinds, handles): (Vec<SourceKind>, Vec<_>) = fetchers
        .into_iter()
        .map(|fetcher| {
            let kind = fetcher.kind();
            let retry = retry.clone();
            let handle = tokio::spawn(async move {
                ingest_source(fetcher, window, retry, RequestPacer::new(interval)).await
            });
            (kind, handle)
        })
        .unzip();

    let mut records = Vec::new();
    let mut sources = Vec::with_capacity(kinds.len());
    for (kind, joined) in kinds.into_iter().zip(join_all(handles).await) {
        match joined {
            Ok((outcome, source_records)) => {
                records.extend(source_records);
                sources.push(outcome);
            }
            Err(e) => {
                error!(source = %kind, error = %e, "Source task panicked");
                let mut outcome = SourceOutcome::new(kind);
                outcome.error = Some(ForecastError::Internal(format!("source task failed: {}", e)));
                sources.push(outcome);
            }
        }
    }

    let dataset = Reconciler::reconcile(records, Utc::now());
    IngestionOutcome { dataset, sources }
}

async fn ingest_source(
    fetcher: Arc<dyn SourceFetcher>,
    window: QueryWindow,
    retry: RetryConfig,
    pacer: RequestPacer,
) -> (SourceOutcome, Vec<NormalizedRecord>) {
    let kind = fetcher.kind();
    let mut outcome = SourceOutcome::new(kind);
    let mut records = Vec::new();

    {
        let mut pages = fetch_pages(fetcher.as_ref(), &window, &retry, &pacer);
        while let Some(page) = pages.next().await {
            match page {
                Ok(page) => {
                    outcome.pages += 1;
                    outcome.raw_records += page.records.len();
                    for raw in &page.records {
                        records.extend(outcome.normalize.observe(kind.as_str(), normalize(kind, raw)));
                    }
                }
                Err(e) => {
                    warn!(source = %kind, error = %e, "Source aborted, discarding its partial records");
                    outcome.error = Some(e);
                    records.clear();
                    break;
                }
            }
        }
    }

    outcome.normalize.log_summary(kind.as_str());
    info!(
        source = %kind,
        pages = outcome.pages,
        raw = outcome.raw_records,
        kept = records.len(),
        ok = outcome.succeeded(),
        "Source ingestion finished"
    );
    (outcome, records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Label;
    use crate::sources::fetcher::testing::{page, ScriptedFetcher};
    use crate::sources::fetcher::Cursor;
    use serde_json::json;

    fn fast_fetch() -> FetchConfig {
        FetchConfig {
            rate_limit_per_minute: 60_000,
            max_retries: 2,
            backoff_base_ms: 0,
            backoff_max_ms: 0,
            ..Default::default()
        }
    }

    fn nvd_item(id: &str) -> serde_json::Value {
        json!({"cve": {"id": id, "metrics": {}}})
    }

    #[tokio::test]
    async fn test_failing_source_does_not_block_the_others() {
        let nvd = Arc::new(ScriptedFetcher::new(
            SourceKind::Nvd,
            vec![page(vec![nvd_item("CVE-2024-0001"), nvd_item("CVE-2024-0002")], None)],
        ));
        let kev = Arc::new(ScriptedFetcher::always_failing(SourceKind::Kev));
        let fetchers: Vec<Arc<dyn SourceFetcher>> = vec![nvd.clone(), kev.clone()];

        let outcome = run_ingestion(fetchers, QueryWindow::All, &fast_fetch()).await;

        assert_eq!(outcome.dataset.len(), 2);
        assert!(outcome.dataset.records.iter().all(|r| r.label == Label::NotObserved));

        let kev_outcome = outcome.sources.iter().find(|s| s.source == SourceKind::Kev).unwrap();
        assert!(matches!(
            kev_outcome.error,
            Some(ForecastError::SourceUnavailable { attempts: 3, .. })
        ));
        assert_eq!(kev.calls(), 3);
        assert_eq!(outcome.failed_sources().count(), 1);
    }

    #[tokio::test]
    async fn test_partial_records_of_failed_source_are_discarded() {
        let nvd = Arc::new(ScriptedFetcher::new(
            SourceKind::Nvd,
            vec![page(vec![nvd_item("CVE-2024-0001")], Some(Cursor { segment: 0, offset: 1 }))],
        ));
        let fetchers: Vec<Arc<dyn SourceFetcher>> = vec![nvd];

        let outcome = run_ingestion(fetchers, QueryWindow::All, &fast_fetch()).await;
        assert!(outcome.dataset.is_empty());
        assert_eq!(outcome.sources[0].pages, 1);
        assert!(!outcome.sources[0].succeeded());
    }

    #[tokio::test]
    async fn test_catalog_labels_registry_records() {
        let nvd = Arc::new(ScriptedFetcher::new(
            SourceKind::Nvd,
            vec![page(vec![nvd_item("CVE-2024-0001"), nvd_item("CVE-2024-0002"), json!("junk")], None)],
        ));
        let kev = Arc::new(ScriptedFetcher::new(
            SourceKind::Kev,
            vec![page(vec![json!({"cveID": "CVE-2024-0001", "dateAdded": "2024-02-01"})], None)],
        ));
        let fetchers: Vec<Arc<dyn SourceFetcher>> = vec![nvd, kev];

        let outcome = run_ingestion(fetchers, QueryWindow::All, &fast_fetch()).await;
        let id = crate::models::VulnId::new("CVE-2024-0001").unwrap();
        assert_eq!(outcome.dataset.label_of(&id), Some(Label::Exploited));
        assert_eq!(outcome.dataset.report.positives, 1);

        let nvd_outcome = outcome.sources.iter().find(|s| s.source == SourceKind::Nvd).unwrap();
        assert_eq!(nvd_outcome.normalize.dropped, 1);
        assert_eq!(nvd_outcome.raw_records, 3);
    }

    #[test]
    fn test_missing_nvd_key_fails_at_construction() {
        let mut config = ForecastConfig::default();
        config.sources.nvd.api_key = Some("$VULNFORECAST_TEST_UNSET_KEY".into());
        assert!(matches!(build_fetchers(&config), Err(ForecastError::Configuration(_))));
    }

    #[test]
    fn test_only_enabled_sources_are_built() {
        let mut config = ForecastConfig::default();
        config.sources.nvd.enabled = false;
        let fetchers = build_fetchers(&config).unwrap();
        let kinds: Vec<SourceKind> = fetchers.iter().map(|f| f.kind()).collect();
        assert_eq!(kinds, vec![SourceKind::Kev, SourceKind::Epss]);
    }
}
