use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::errors::ForecastError;
use crate::models::NormalizedRecord;

/// Why one raw record could not be normalized. Counted, never fatal.
#[derive(Debug, Clone, PartialEq)]
pub struct Malformed {
    pub reason: &'static str,
    pub detail: String,
}

impl Malformed {
    pub fn new(reason: &'static str, detail: impl Into<String>) -> Self {
        Self { reason, detail: detail.into() }
    }
}

impl From<Malformed> for ForecastError {
    fn from(m: Malformed) -> Self {
        ForecastError::MalformedRecord(format!("{}: {}", m.reason, m.detail))
    }
}

/// Partial-success accounting for one source's batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizeReport {
    pub seen: usize,
    pub accepted: usize,
    pub emitted: usize,
    pub dropped: usize,
    pub drop_reasons: BTreeMap<String, usize>,
}

impl NormalizeReport {
    /// Record one normalization outcome and pass through what it produced.
    pub fn observe(
        &mut self,
        source: &str,
        outcome: Result<Vec<NormalizedRecord>, Malformed>,
    ) -> Vec<NormalizedRecord> {
        self.seen += 1;
        match outcome {
            Ok(records) => {
                self.accepted += 1;
                self.emitted += records.len();
                records
            }
            Err(m) => {
                self.dropped += 1;
                *self.drop_reasons.entry(m.reason.to_string()).or_default() += 1;
                debug!(source, reason = m.reason, detail = %m.detail, "Dropped malformed record");
                Vec::new()
            }
        }
    }

    pub fn log_summary(&self, source: &str) {
        if self.dropped > 0 {
            warn!(
                source,
                seen = self.seen,
                dropped = self.dropped,
                reasons = ?self.drop_reasons,
                "Dropped malformed records"
            );
        }
    }
}
