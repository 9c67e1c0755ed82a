//! Feature layout: the fixed column order and its versioned hash.
//!
//! Adding, removing or reordering a column changes the layout and requires a
//! new [`TRANSFORM_VERSION`].

use std::collections::BTreeMap;

use crc32fast::Hasher;
use serde::{Deserialize, Serialize};

/// Version of the transform this build produces and accepts.
pub const TRANSFORM_VERSION: &str = "v1";

/// Numeric columns, in vector order.
pub const NUMERIC_COLUMNS: &[&str] = &[
    "base_score",
    "exploitability_score",
    "impact_score",
    "likelihood_score",
    "published_age_days",
    "modified_age_days",
    "exploit_evidence_count",
];

/// Categorical features, in vector order. Each expands into one-hot columns.
pub const CATEGORICAL_FEATURES: &[&str] = &[
    "cvss_AV",
    "cvss_AC",
    "cvss_PR",
    "cvss_UI",
    "cvss_S",
    "cvss_C",
    "cvss_I",
    "cvss_A",
    "cvss_Au",
    "base_severity",
    "weakness",
];

/// Trailing bucket for unseen and pruned levels.
pub const OTHER_LEVEL: &str = "__other__";

pub fn one_hot_column(feature: &str, level: &str) -> String {
    format!("{}={}", feature, level)
}

/// Ordered column names for the given per-feature vocabularies.
///
/// `vocabularies` must be aligned with [`CATEGORICAL_FEATURES`] and each sorted.
pub fn column_names(vocabularies: &[Vec<String>]) -> Vec<String> {
    let mut columns: Vec<String> = NUMERIC_COLUMNS.iter().map(|c| c.to_string()).collect();
    for (feature, vocabulary) in CATEGORICAL_FEATURES.iter().zip(vocabularies) {
        columns.extend(vocabulary.iter().map(|level| one_hot_column(feature, level)));
        columns.push(one_hot_column(feature, OTHER_LEVEL));
    }
    columns
}

/// CRC32 over the version tag and the ordered column names.
pub fn layout_hash(version: &str, columns: &[String]) -> u32 {
    let mut hasher = Hasher::new();
    hasher.update(version.as_bytes());
    hasher.update(&[0]);
    for name in columns {
        hasher.update(name.as_bytes());
        hasher.update(&[0]);
    }
    hasher.finalize()
}

/// Column semantics for consumers outside the process.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureMetadata {
    pub version: String,
    pub layout_hash: u32,
    pub width: usize,
    pub columns: Vec<String>,
    pub positions: BTreeMap<String, usize>,
    pub vocabularies: BTreeMap<String, Vec<String>>,
    pub numeric_fills: BTreeMap<String, f64>,
    pub categorical_fills: BTreeMap<String, String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty_vocabularies() -> Vec<Vec<String>> {
        vec![Vec::new(); CATEGORICAL_FEATURES.len()]
    }

    #[test]
    fn test_minimal_layout_has_other_bucket_per_feature() {
        let columns = column_names(&empty_vocabularies());
        assert_eq!(columns.len(), NUMERIC_COLUMNS.len() + CATEGORICAL_FEATURES.len());
        assert_eq!(columns[0], "base_score");
        assert_eq!(columns[NUMERIC_COLUMNS.len()], "cvss_AV=__other__");
    }

    #[test]
    fn test_other_follows_vocabulary() {
        let mut vocabularies = empty_vocabularies();
        vocabularies[0] = vec!["L".into(), "N".into()];
        let columns = column_names(&vocabularies);
        let start = NUMERIC_COLUMNS.len();
        assert_eq!(&columns[start..start + 3], &["cvss_AV=L", "cvss_AV=N", "cvss_AV=__other__"]);
    }

    #[test]
    fn test_hash_depends_on_order_and_version() {
        let a = vec!["x".to_string(), "y".to_string()];
        let b = vec!["y".to_string(), "x".to_string()];
        assert_eq!(layout_hash("v1", &a), layout_hash("v1", &a));
        assert_ne!(layout_hash("v1", &a), layout_hash("v1", &b));
        assert_ne!(layout_hash("v1", &a), layout_hash("v2", &a));
    }
}
