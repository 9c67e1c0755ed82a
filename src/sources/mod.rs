pub mod epss;
pub mod fetcher;
pub mod http;
pub mod ingest;
pub mod kev;
pub mod nvd;
pub mod pacing;

pub use fetcher::{fetch_pages, fetch_records, Cursor, Page, QueryWindow, SourceFetcher, SourceKind};
pub use ingest::{build_fetchers, run_ingestion, IngestionOutcome, SourceOutcome};
pub use pacing::RequestPacer;
