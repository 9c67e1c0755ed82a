use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::identifier::VulnId;

/// Where a piece of exploitation evidence came from, in precedence order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvidenceOrigin {
    /// Ground-truth exploited catalog. Always wins.
    Catalog,
    /// Exploit-tagged references in the primary registry.
    Registry,
    /// Probabilistic exploit-likelihood feed.
    Score,
}

impl EvidenceOrigin {
    /// Lower rank wins.
    pub fn rank(&self) -> u8 {
        match self {
            Self::Catalog => 0,
            Self::Registry => 1,
            Self::Score => 2,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Catalog => "catalog",
            Self::Registry => "registry",
            Self::Score => "score",
        }
    }
}

/// A probabilistic exploitation score with the date it was computed for.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Likelihood {
    pub score: f64,
    pub percentile: Option<f64>,
    pub as_of: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExploitationEvidence {
    pub id: VulnId,
    pub origin: EvidenceOrigin,
    pub confirmed_exploited: bool,
    /// Known public exploit artifacts.
    pub evidence_count: Option<u32>,
    pub likelihood: Option<Likelihood>,
    pub date_added: Option<NaiveDate>,
    pub known_ransomware_use: Option<bool>,
}

impl ExploitationEvidence {
    pub fn catalog(id: VulnId, date_added: Option<NaiveDate>) -> Self {
        Self {
            id,
            origin: EvidenceOrigin::Catalog,
            confirmed_exploited: true,
            evidence_count: None,
            likelihood: None,
            date_added,
            known_ransomware_use: None,
        }
    }

    pub fn exploit_references(id: VulnId, count: u32) -> Self {
        Self {
            id,
            origin: EvidenceOrigin::Registry,
            confirmed_exploited: false,
            evidence_count: Some(count),
            likelihood: None,
            date_added: None,
            known_ransomware_use: None,
        }
    }

    pub fn score(id: VulnId, likelihood: Likelihood) -> Self {
        Self {
            id,
            origin: EvidenceOrigin::Score,
            confirmed_exploited: false,
            evidence_count: None,
            likelihood: Some(likelihood),
            date_added: None,
            known_ransomware_use: None,
        }
    }
}
