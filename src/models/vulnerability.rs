use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::identifier::VulnId;

/// CVSS scoring version the sub-scores were taken from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CvssVersion {
    #[serde(rename = "2.0")]
    V2,
    #[serde(rename = "3.0")]
    V30,
    #[serde(rename = "3.1")]
    V31,
}

impl CvssVersion {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "2.0" | "2" => Some(Self::V2),
            "3.0" => Some(Self::V30),
            "3.1" => Some(Self::V31),
            _ => None,
        }
    }

    /// Inclusive upper bound of the exploitability sub-score.
    pub fn max_exploitability(&self) -> f64 {
        match self {
            Self::V2 => 10.0,
            Self::V30 | Self::V31 => 3.9,
        }
    }

    /// Inclusive upper bound of the impact sub-score.
    pub fn max_impact(&self) -> f64 {
        match self {
            Self::V2 => 10.0,
            Self::V30 | Self::V31 => 6.1,
        }
    }
}

/// One vulnerability as described by the primary registry.
///
/// `None` means the registry did not say. It is never read as zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VulnerabilityRecord {
    pub id: VulnId,
    pub cvss_version: Option<CvssVersion>,
    pub base_score: Option<f64>,
    pub exploitability_score: Option<f64>,
    pub impact_score: Option<f64>,
    pub vector_string: Option<String>,
    pub base_severity: Option<String>,
    pub attack_vector: Option<String>,
    pub attack_complexity: Option<String>,
    pub weakness: Option<String>,
    pub published: Option<DateTime<Utc>>,
    pub last_modified: Option<DateTime<Utc>>,
    pub description: Option<String>,
    pub reference_count: Option<u32>,
}

impl VulnerabilityRecord {
    /// A record with nothing known beyond its identifier.
    pub fn bare(id: VulnId) -> Self {
        Self {
            id,
            cvss_version: None,
            base_score: None,
            exploitability_score: None,
            impact_score: None,
            vector_string: None,
            base_severity: None,
            attack_vector: None,
            attack_complexity: None,
            weakness: None,
            published: None,
            last_modified: None,
            description: None,
            reference_count: None,
        }
    }

    /// Fill every field that is unknown here from `other`. Known fields are kept.
    pub fn fill_gaps_from(&mut self, other: &VulnerabilityRecord) {
        fn fill<T: Clone>(slot: &mut Option<T>, from: &Option<T>) {
            if slot.is_none() {
                slot.clone_from(from);
            }
        }
        fill(&mut self.cvss_version, &other.cvss_version);
        fill(&mut self.base_score, &other.base_score);
        fill(&mut self.exploitability_score, &other.exploitability_score);
        fill(&mut self.impact_score, &other.impact_score);
        fill(&mut self.vector_string, &other.vector_string);
        fill(&mut self.base_severity, &other.base_severity);
        fill(&mut self.attack_vector, &other.attack_vector);
        fill(&mut self.attack_complexity, &other.attack_complexity);
        fill(&mut self.weakness, &other.weakness);
        fill(&mut self.published, &other.published);
        fill(&mut self.last_modified, &other.last_modified);
        fill(&mut self.description, &other.description);
        fill(&mut self.reference_count, &other.reference_count);
    }
}
