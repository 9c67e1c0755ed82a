use chrono::{DateTime, Utc};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::errors::ForecastError;
use crate::models::{CvssVersion, ReconciledRecord};
use crate::normalize::{check_range, parse_timestamp};
use super::cvss::vector_version;

/// Raw, pre-encoding description of one vulnerability.
///
/// Training derives it from a reconciled record and serving parses it from a
/// request, so both paths go through the same encoder.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FeatureInput {
    pub vector_string: Option<String>,
    pub base_score: Option<f64>,
    pub exploitability_score: Option<f64>,
    pub impact_score: Option<f64>,
    pub base_severity: Option<String>,
    pub attack_vector: Option<String>,
    pub attack_complexity: Option<String>,
    pub weakness: Option<String>,
    #[serde(deserialize_with = "registry_timestamp")]
    pub published: Option<DateTime<Utc>>,
    #[serde(deserialize_with = "registry_timestamp")]
    pub last_modified: Option<DateTime<Utc>>,
    pub exploit_evidence_count: Option<u32>,
    pub likelihood_score: Option<f64>,
}

impl FeatureInput {
    pub const FIELDS: &'static [&'static str] = &[
        "vector_string",
        "base_score",
        "exploitability_score",
        "impact_score",
        "base_severity",
        "attack_vector",
        "attack_complexity",
        "weakness",
        "published",
        "last_modified",
        "exploit_evidence_count",
        "likelihood_score",
    ];

    /// Parse a request body, naming the offending field on failure.
    pub fn from_json(value: Value) -> Result<Self, ForecastError> {
        let Value::Object(map) = value else {
            return Err(ForecastError::schema_mismatch("input", "expected a JSON object"));
        };

        if let Some(unknown) = map.keys().find(|k| !Self::FIELDS.contains(&k.as_str())) {
            return Err(ForecastError::schema_mismatch(
                unknown.as_str(),
                format!("unknown field; expected one of: {}", Self::FIELDS.join(", ")),
            ));
        }

        let input: Self = serde_json::from_value(Value::Object(map.clone())).map_err(|e| {
            let field = map
                .iter()
                .find(|(k, v)| {
                    let single = Map::from_iter([((*k).clone(), (*v).clone())]);
                    serde_json::from_value::<Self>(Value::Object(single)).is_err()
                })
                .map(|(k, _)| k.clone())
                .unwrap_or_else(|| "input".to_string());
            ForecastError::schema_mismatch(field, e.to_string())
        })?;
        input.check_ranges()?;
        Ok(input)
    }

    /// Apply the score bounds ingestion enforces, so a value the training data
    /// could never contain is refused instead of extrapolated.
    ///
    /// Sub-score bounds follow the vector's CVSS version; without a vector the
    /// widest (v2) bounds apply.
    pub fn check_ranges(&self) -> Result<(), ForecastError> {
        let version = self
            .vector_string
            .as_deref()
            .and_then(vector_version)
            .unwrap_or(CvssVersion::V2);
        let checks = [
            ("base_score", self.base_score, 10.0),
            ("exploitability_score", self.exploitability_score, version.max_exploitability()),
            ("impact_score", self.impact_score, version.max_impact()),
            ("likelihood_score", self.likelihood_score, 1.0),
        ];
        for (field, value, max) in checks {
            check_range(field, value, max).map_err(|m| ForecastError::schema_mismatch(field, m.detail))?;
        }
        Ok(())
    }
}

/// Timestamps as the registry writes them (zone-less UTC) or RFC 3339.
fn registry_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer)?
        .map(|raw| {
            parse_timestamp(&raw).map_err(|m| D::Error::custom(format!("unrecognized timestamp '{}'", m.detail)))
        })
        .transpose()
}

impl From<&ReconciledRecord> for FeatureInput {
    fn from(record: &ReconciledRecord) -> Self {
        let v = &record.vulnerability;
        Self {
            vector_string: v.vector_string.clone(),
            base_score: v.base_score,
            exploitability_score: v.exploitability_score,
            impact_score: v.impact_score,
            base_severity: v.base_severity.clone(),
            attack_vector: v.attack_vector.clone(),
            attack_complexity: v.attack_complexity.clone(),
            weakness: v.weakness.clone(),
            published: v.published,
            last_modified: v.last_modified,
            exploit_evidence_count: record.evidence.evidence_count,
            likelihood_score: record.evidence.likelihood.map(|l| l.score),
        }
    }
}

/// What a caller may submit for prediction.
#[derive(Debug, Clone, PartialEq)]
pub enum PredictInput {
    /// Raw fields, encoded with the stored transform.
    Record(FeatureInput),
    /// An already-encoded vector in the stored column order.
    Encoded(Vec<f64>),
}

impl PredictInput {
    /// `{"features": [..]}` is a pre-encoded vector; any other object is a record.
    pub fn from_json(value: Value) -> Result<Self, ForecastError> {
        match value {
            Value::Object(mut map) if map.contains_key("features") => {
                if map.len() > 1 {
                    let extra = map.keys().find(|k| *k != "features").cloned().unwrap_or_default();
                    return Err(ForecastError::schema_mismatch(
                        extra,
                        "an encoded request carries only 'features'",
                    ));
                }
                let features = map.remove("features").unwrap_or(Value::Null);
                let values: Vec<f64> = serde_json::from_value(features)
                    .map_err(|e| ForecastError::schema_mismatch("features", e.to_string()))?;
                Ok(Self::Encoded(values))
            }
            other => FeatureInput::from_json(other).map(Self::Record),
        }
    }
}
