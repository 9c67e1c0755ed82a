use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::config::FeatureConfig;
use crate::features::{extract, FeatureInput, CATEGORICAL_FEATURES, NUMERIC_COLUMNS, OTHER_LEVEL, TRANSFORM_VERSION};
use super::fitted::{CategoricalColumn, FittedTransform, NumericColumn};

/// Learn fills, scaling and vocabularies from training inputs only.
///
/// Age columns are computed against `snapshot_at`.
pub fn fit(inputs: &[FeatureInput], snapshot_at: DateTime<Utc>, config: &FeatureConfig) -> FittedTransform {
    let raws: Vec<_> = inputs.iter().map(|input| extract(input, snapshot_at)).collect();

    let numeric = NUMERIC_COLUMNS
        .iter()
        .enumerate()
        .map(|(i, name)| {
            let observed: Vec<f64> = raws.iter().filter_map(|r| r.numeric[i]).filter(|v| v.is_finite()).collect();
            let fill = median(&observed).unwrap_or(0.0);
            let filled: Vec<f64> = raws.iter().map(|r| r.numeric[i].filter(|v| v.is_finite()).unwrap_or(fill)).collect();
            let (mean, std) = mean_std(&filled);
            NumericColumn { name: name.to_string(), fill, mean, std }
        })
        .collect();

    let categorical = CATEGORICAL_FEATURES
        .iter()
        .enumerate()
        .map(|(i, name)| {
            let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
            for level in raws.iter().filter_map(|r| r.categorical[i].as_deref()) {
                *counts.entry(level).or_default() += 1;
            }
            let column = CategoricalColumn {
                name: name.to_string(),
                fill: mode(&counts).unwrap_or(OTHER_LEVEL).to_string(),
                vocabulary: vocabulary(&counts, config),
            };
            debug!(feature = name, levels = counts.len(), kept = column.vocabulary.len(), "Fitted vocabulary");
            column
        })
        .collect();

    FittedTransform::from_parts(TRANSFORM_VERSION, *config, snapshot_at, numeric, categorical)
}

pub(crate) fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    Some(if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    })
}

/// Population mean and standard deviation. A degenerate spread becomes 1.
pub(crate) fn mean_std(values: &[f64]) -> (f64, f64) {
    if values.is_empty() {
        return (0.0, 1.0);
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    let std = var.sqrt();
    (mean, if std > 0.0 && std.is_finite() { std } else { 1.0 })
}

/// Most frequent level; ties go to the lexicographically smallest.
fn mode<'a>(counts: &BTreeMap<&'a str, usize>) -> Option<&'a str> {
    // BTreeMap iterates in key order, so the first max wins ties.
    let mut best: Option<(&'a str, usize)> = None;
    for (&level, &count) in counts {
        if best.map_or(true, |(_, c)| count > c) {
            best = Some((level, count));
        }
    }
    best.map(|(level, _)| level)
}

/// Levels seen at least `other_threshold` times, at most `vocabulary_cap` of
/// them by frequency, returned sorted.
fn vocabulary(counts: &BTreeMap<&str, usize>, config: &FeatureConfig) -> Vec<String> {
    let mut frequent: Vec<(&str, usize)> = counts
        .iter()
        .filter(|(level, count)| **count >= config.other_threshold && **level != OTHER_LEVEL)
        .map(|(&level, &count)| (level, count))
        .collect();
    frequent.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    frequent.truncate(config.vocabulary_cap);

    let mut kept: Vec<String> = frequent.into_iter().map(|(level, _)| level.to_string()).collect();
    kept.sort();
    kept
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(cap: usize, threshold: usize) -> FeatureConfig {
        FeatureConfig { vocabulary_cap: cap, other_threshold: threshold }
    }

    #[test]
    fn test_median() {
        assert_eq!(median(&[]), None);
        assert_eq!(median(&[3.0, 1.0, 2.0]), Some(2.0));
        assert_eq!(median(&[4.0, 1.0, 2.0, 3.0]), Some(2.5));
    }

    #[test]
    fn test_mean_std_degenerate() {
        assert_eq!(mean_std(&[5.0, 5.0]), (5.0, 1.0));
        let (mean, std) = mean_std(&[1.0, 3.0]);
        assert_eq!(mean, 2.0);
        assert_eq!(std, 1.0);
    }

    #[test]
    fn test_mode_ties_are_lexicographic() {
        let counts = BTreeMap::from([("N", 2), ("L", 2), ("A", 1)]);
        assert_eq!(mode(&counts), Some("L"));
        assert_eq!(mode(&BTreeMap::new()), None);
    }

    #[test]
    fn test_vocabulary_threshold_and_cap() {
        let counts = BTreeMap::from([("a", 5), ("b", 9), ("c", 5), ("d", 1)]);
        assert_eq!(vocabulary(&counts, &config(50, 2)), vec!["a", "b", "c"]);
        assert_eq!(vocabulary(&counts, &config(2, 2)), vec!["a", "b"]);
        assert_eq!(vocabulary(&counts, &config(50, 6)), vec!["b"]);
    }

    #[test]
    fn test_fit_learns_fill_from_observed_values_only() {
        let inputs = vec![
            FeatureInput { base_score: Some(2.0), weakness: Some("CWE-79".into()), ..Default::default() },
            FeatureInput { base_score: Some(4.0), weakness: Some("CWE-79".into()), ..Default::default() },
            FeatureInput { base_score: Some(9.0), weakness: Some("CWE-89".into()), ..Default::default() },
            FeatureInput::default(),
        ];
        let t = fit(&inputs, Utc::now(), &config(50, 1));

        assert_eq!(t.numeric()[0].fill, 4.0);
        // likelihood never observed
        assert_eq!(t.numeric()[3].fill, 0.0);
        let weakness = t.categorical().last().unwrap();
        assert_eq!(weakness.fill, "CWE-79");
        assert_eq!(weakness.vocabulary, vec!["CWE-79", "CWE-89"]);
        assert_eq!(t.categorical()[0].fill, OTHER_LEVEL);
        assert_eq!(t.layout_hash(), t.recomputed_hash());
        assert_eq!(t.width(), t.columns().len());
    }
}
