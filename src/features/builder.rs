use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::ForecastError;
use super::cvss::{attack_complexity_abbrev, attack_vector_abbrev, decompose};
use super::input::FeatureInput;
use super::layout::{CATEGORICAL_FEATURES, NUMERIC_COLUMNS};

const SECONDS_PER_DAY: i64 = 86_400;

/// Values extracted from one input before fill, scaling and one-hot encoding.
///
/// Aligned with [`NUMERIC_COLUMNS`] and [`CATEGORICAL_FEATURES`]. `None` is unknown.
#[derive(Debug, Clone, PartialEq)]
pub struct RawFeatures {
    pub numeric: Vec<Option<f64>>,
    pub categorical: Vec<Option<String>>,
}

/// Whole days from `ts` to `reference`, floored. Negative when `ts` is later.
pub fn age_days(reference: DateTime<Utc>, ts: DateTime<Utc>) -> f64 {
    (reference - ts).num_seconds().div_euclid(SECONDS_PER_DAY) as f64
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value.map(str::trim).filter(|v| !v.is_empty()).map(str::to_string)
}

/// Pull every raw feature out of `input`. `reference` anchors the age columns.
pub fn extract(input: &FeatureInput, reference: DateTime<Utc>) -> RawFeatures {
    let numeric = vec![
        input.base_score,
        input.exploitability_score,
        input.impact_score,
        input.likelihood_score,
        input.published.map(|ts| age_days(reference, ts)),
        input.last_modified.map(|ts| age_days(reference, ts)),
        Some(input.exploit_evidence_count.unwrap_or(0) as f64),
    ];
    debug_assert_eq!(numeric.len(), NUMERIC_COLUMNS.len());

    let metrics = input.vector_string.as_deref().map(decompose).unwrap_or_default();
    let metric = |name: &str| metrics.get(name).cloned();

    let categorical = vec![
        metric("AV").or_else(|| {
            input.attack_vector.as_deref().and_then(attack_vector_abbrev).map(str::to_string)
        }),
        metric("AC").or_else(|| {
            input.attack_complexity.as_deref().and_then(attack_complexity_abbrev).map(str::to_string)
        }),
        metric("PR"),
        metric("UI"),
        metric("S"),
        metric("C"),
        metric("I"),
        metric("A"),
        metric("Au"),
        non_empty(input.base_severity.as_deref()).map(|s| s.to_ascii_uppercase()),
        non_empty(input.weakness.as_deref())
            .map(|s| s.to_ascii_uppercase())
            .filter(|s| s.starts_with("CWE-")),
    ];
    debug_assert_eq!(categorical.len(), CATEGORICAL_FEATURES.len());

    RawFeatures { numeric, categorical }
}

/// One encoded row, tagged with the layout it was encoded against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    pub version: String,
    pub layout_hash: u32,
    pub values: Vec<f64>,
}

impl FeatureVector {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Reject a vector whose length does not match the layout.
pub fn check_width(field: &str, expected: usize, actual: usize) -> Result<(), ForecastError> {
    if expected != actual {
        return Err(ForecastError::schema_mismatch(
            field,
            format!("expected {} values, got {}", expected, actual),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn reference() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_age_days_floors() {
        let r = reference();
        assert_eq!(age_days(r, Utc.with_ymd_and_hms(2024, 5, 31, 12, 0, 0).unwrap()), 1.0);
        assert_eq!(age_days(r, Utc.with_ymd_and_hms(2024, 5, 31, 13, 0, 0).unwrap()), 0.0);
        assert_eq!(age_days(r, Utc.with_ymd_and_hms(2024, 6, 1, 13, 0, 0).unwrap()), -1.0);
    }

    #[test]
    fn test_extract_prefers_vector_over_long_names() {
        let input = FeatureInput {
            vector_string: Some("CVSS:3.1/AV:L/AC:H/PR:N/UI:N/S:U/C:H/I:H/A:H".into()),
            attack_vector: Some("NETWORK".into()),
            ..Default::default()
        };
        let raw = extract(&input, reference());
        assert_eq!(raw.categorical[0].as_deref(), Some("L"));
        assert_eq!(raw.categorical[1].as_deref(), Some("H"));
        assert_eq!(raw.categorical[8], None);
    }

    #[test]
    fn test_extract_falls_back_to_long_names() {
        let input = FeatureInput {
            attack_vector: Some("NETWORK".into()),
            attack_complexity: Some("LOW".into()),
            weakness: Some(" cwe-79 ".into()),
            ..Default::default()
        };
        let raw = extract(&input, reference());
        assert_eq!(raw.categorical[0].as_deref(), Some("N"));
        assert_eq!(raw.categorical[1].as_deref(), Some("L"));
        assert_eq!(raw.categorical[10].as_deref(), Some("CWE-79"));
    }

    #[test]
    fn test_registry_placeholder_weakness_is_unknown() {
        for placeholder in ["NVD-CWE-Other", "NVD-CWE-noinfo", "  "] {
            let input = FeatureInput {
                weakness: Some(placeholder.into()),
                ..Default::default()
            };
            assert_eq!(extract(&input, reference()).categorical[10], None, "{placeholder}");
        }
    }

    #[test]
    fn test_missing_numerics_stay_unknown_except_evidence_count() {
        let raw = extract(&FeatureInput::default(), reference());
        assert!(raw.numeric[..6].iter().all(Option::is_none));
        assert_eq!(raw.numeric[6], Some(0.0));
        assert!(raw.categorical.iter().all(Option::is_none));
    }

    #[test]
    fn test_check_width() {
        assert!(check_width("features", 3, 3).is_ok());
        match check_width("features", 3, 2) {
            Err(ForecastError::SchemaMismatch { field, detail }) => {
                assert_eq!(field, "features");
                assert!(detail.contains("expected 3"));
            }
            other => panic!("unexpected: {other:?}"),
        }
    }
}
