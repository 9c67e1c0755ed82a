use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::evidence::{ExploitationEvidence, Likelihood};
use super::identifier::VulnId;
use super::vulnerability::VulnerabilityRecord;

/// Output of a source normalizer: either a base record or a piece of evidence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NormalizedRecord {
    Vulnerability(VulnerabilityRecord),
    Evidence(ExploitationEvidence),
}

impl NormalizedRecord {
    pub fn id(&self) -> &VulnId {
        match self {
            Self::Vulnerability(v) => &v.id,
            Self::Evidence(e) => &e.id,
        }
    }
}

/// Ground-truth exploitation label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Label {
    /// Listed in the exploited catalog.
    Exploited,
    /// No catalog entry. Absence of evidence, not evidence of absence.
    NotObserved,
}

impl Label {
    pub fn as_u8(&self) -> u8 {
        match self {
            Self::Exploited => 1,
            Self::NotObserved => 0,
        }
    }

    pub fn as_f64(&self) -> f64 {
        self.as_u8() as f64
    }
}

/// Evidence for one identifier after precedence has been applied.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EvidenceSummary {
    pub confirmed_exploited: bool,
    pub evidence_count: Option<u32>,
    pub likelihood: Option<Likelihood>,
    pub catalog_date_added: Option<NaiveDate>,
    pub known_ransomware_use: Option<bool>,
    /// Origins that contributed, in precedence order.
    pub origins: Vec<String>,
}

impl EvidenceSummary {
    pub fn has_evidence(&self) -> bool {
        !self.origins.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconciledRecord {
    pub vulnerability: VulnerabilityRecord,
    pub evidence: EvidenceSummary,
    pub label: Label,
}

impl ReconciledRecord {
    pub fn id(&self) -> &VulnId {
        &self.vulnerability.id
    }
}

/// Counts kept by the reconciler so nothing is dropped silently.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconcileReport {
    pub registry_records: usize,
    pub evidence_records: usize,
    pub duplicate_registry_records: usize,
    pub orphaned_evidence_ids: usize,
    pub positives: usize,
    pub negatives: usize,
}

/// One reconciled record per identifier, ordered by identifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconciledDataset {
    pub snapshot_at: DateTime<Utc>,
    pub records: Vec<ReconciledRecord>,
    pub report: ReconcileReport,
}

impl ReconciledDataset {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn label_of(&self, id: &VulnId) -> Option<Label> {
        self.records
            .binary_search_by(|r| r.id().cmp(id))
            .ok()
            .map(|i| self.records[i].label)
    }

    pub async fn save(&self, path: &std::path::Path) -> Result<(), crate::errors::ForecastError> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let json = serde_json::to_vec(self)?;
        tokio::fs::write(path, json).await?;
        Ok(())
    }

    pub async fn load(path: &std::path::Path) -> Result<Self, crate::errors::ForecastError> {
        let bytes = tokio::fs::read(path).await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}
