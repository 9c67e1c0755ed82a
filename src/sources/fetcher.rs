use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, NaiveDate, Utc};
use futures::stream::{self, BoxStream, StreamExt, TryStreamExt};
use serde_json::Value;
use tracing::debug;

use crate::errors::{with_retry, ForecastError, RetryConfig};
use super::pacing::RequestPacer;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SourceKind {
    /// Primary vulnerability registry (NVD).
    Nvd,
    /// Exploited-in-the-wild catalog (CISA KEV).
    Kev,
    /// Exploit-likelihood score feed (EPSS).
    Epss,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Nvd => "nvd",
            Self::Kev => "kev",
            Self::Epss => "epss",
        }
    }
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Publication window to ingest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryWindow {
    All,
    Range { start: NaiveDate, end: NaiveDate },
}

impl QueryWindow {
    pub fn from_bounds(since: Option<NaiveDate>, until: Option<NaiveDate>) -> Result<Self, ForecastError> {
        match (since, until) {
            (None, None) => Ok(Self::All),
            (Some(start), until) => {
                let end = until.unwrap_or_else(|| Utc::now().date_naive());
                if end < start {
                    return Err(ForecastError::Configuration(format!(
                        "window end {} is before start {}",
                        end, start
                    )));
                }
                Ok(Self::Range { start, end })
            }
            (None, Some(_)) => Err(ForecastError::Configuration(
                "a window end requires a window start".into(),
            )),
        }
    }

    /// Split the window into consecutive segments of at most `max_days` days.
    /// `All` is a single unbounded segment.
    pub fn segments(&self, max_days: i64) -> Vec<Option<(DateTime<Utc>, DateTime<Utc>)>> {
        match *self {
            Self::All => vec![None],
            Self::Range { start, end } => {
                let mut out = Vec::new();
                let mut seg_start = start;
                while seg_start <= end {
                    let seg_end = (seg_start + ChronoDuration::days(max_days - 1)).min(end);
                    let from = seg_start.and_hms_opt(0, 0, 0).map(|t| t.and_utc());
                    let to = seg_end.and_hms_milli_opt(23, 59, 59, 999).map(|t| t.and_utc());
                    if let (Some(from), Some(to)) = (from, to) {
                        out.push(Some((from, to)));
                    }
                    seg_start = seg_end + ChronoDuration::days(1);
                }
                out
            }
        }
    }
}

/// Position within a paginated source: which window segment, and the offset in it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Cursor {
    pub segment: usize,
    pub offset: u64,
}

#[derive(Debug, Clone, Default)]
pub struct Page {
    pub records: Vec<Value>,
    pub next: Option<Cursor>,
}

#[async_trait]
pub trait SourceFetcher: Send + Sync {
    fn kind(&self) -> SourceKind;

    /// Fetch one page. Must be repeatable for the same cursor.
    async fn fetch_page(&self, window: &QueryWindow, cursor: Cursor) -> Result<Page, ForecastError>;
}

/// Lazily page through a source, sequentially, honoring pacing and retry.
///
/// The stream is finite and ends at the first page with no continuation.
/// A page that fails after retries ends the stream with `SourceUnavailable`.
pub fn fetch_pages<'a>(
    fetcher: &'a dyn SourceFetcher,
    window: &'a QueryWindow,
    retry: &'a RetryConfig,
    pacer: &'a RequestPacer,
) -> BoxStream<'a, Result<Page, ForecastError>> {
    stream::try_unfold(Some(Cursor::default()), move |state| async move {
        let Some(cursor) = state else {
            return Ok(None);
        };

        let operation = format!("{}:segment{}@{}", fetcher.kind(), cursor.segment, cursor.offset);
        let page = with_retry(&operation, retry, || async move {
            pacer.wait().await;
            fetcher.fetch_page(window, cursor).await
        })
        .await
        .map_err(|e| surface_page_error(fetcher.kind(), retry, e))?;

        debug!(
            source = %fetcher.kind(),
            segment = cursor.segment,
            offset = cursor.offset,
            records = page.records.len(),
            "Fetched page"
        );
        let next = page.next;
        Ok(Some((page, next)))
    })
    .boxed()
}

/// Flatten `fetch_pages` into a lazy sequence of raw records.
pub fn fetch_records<'a>(
    fetcher: &'a dyn SourceFetcher,
    window: &'a QueryWindow,
    retry: &'a RetryConfig,
    pacer: &'a RequestPacer,
) -> BoxStream<'a, Result<Value, ForecastError>> {
    fetch_pages(fetcher, window, retry, pacer)
        .map_ok(|page| stream::iter(page.records.into_iter().map(Ok)))
        .try_flatten()
        .boxed()
}

/// Turn the last error of a failed page into the error surfaced for the source.
fn surface_page_error(kind: SourceKind, retry: &RetryConfig, err: ForecastError) -> ForecastError {
    let class = err.classify();
    match err {
        ForecastError::Configuration(_) => err,
        ForecastError::Authentication(reason) => ForecastError::Configuration(format!(
            "source '{}' rejected the configured credentials: {}",
            kind, reason
        )),
        other => ForecastError::SourceUnavailable {
            source_name: kind.as_str().to_string(),
            attempts: if class.retryable { retry.max_attempts() } else { 1 },
            reason: other.to_string(),
        },
    }
}
