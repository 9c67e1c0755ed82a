use chrono::{DateTime, Utc};

use crate::errors::ForecastError;
use crate::features::builder::check_width;
use crate::features::{extract, FeatureInput, FeatureVector, CATEGORICAL_FEATURES, NUMERIC_COLUMNS, TRANSFORM_VERSION};
use super::fitted::FittedTransform;

/// Encode one input with a fitted transform. Pure: no state is read or written
/// beyond `transform`.
pub fn apply(
    transform: &FittedTransform,
    input: &FeatureInput,
    reference: DateTime<Utc>,
) -> Result<FeatureVector, ForecastError> {
    let raw = extract(input, reference);
    let mut values = Vec::with_capacity(transform.width());

    for (column, value) in transform.numeric().iter().zip(raw.numeric) {
        let x = value.filter(|v| v.is_finite()).unwrap_or(column.fill);
        values.push((x - column.mean) / column.std);
    }

    for (column, level) in transform.categorical().iter().zip(raw.categorical) {
        let level = level.unwrap_or_else(|| column.fill.clone());
        // Unseen and pruned levels land on the trailing `__other__` slot.
        let hot = column
            .vocabulary
            .binary_search(&level)
            .unwrap_or(column.vocabulary.len());
        values.extend((0..=column.vocabulary.len()).map(|i| if i == hot { 1.0 } else { 0.0 }));
    }

    check_width("features", transform.width(), values.len())?;
    Ok(FeatureVector {
        version: transform.version().to_string(),
        layout_hash: transform.layout_hash(),
        values,
    })
}

/// `apply` over a batch. Each record is encoded independently.
pub fn apply_batch(
    transform: &FittedTransform,
    inputs: &[FeatureInput],
    reference: DateTime<Utc>,
) -> Result<Vec<FeatureVector>, ForecastError> {
    inputs.iter().map(|input| apply(transform, input, reference)).collect()
}

/// Accept a caller-encoded vector after checking it against the layout.
pub fn encoded(transform: &FittedTransform, values: Vec<f64>) -> Result<FeatureVector, ForecastError> {
    check_width("features", transform.width(), values.len())?;
    if let Some(pos) = values.iter().position(|v| !v.is_finite()) {
        return Err(ForecastError::schema_mismatch(
            "features",
            format!("value at position {} ({}) is not finite", pos, transform.columns()[pos]),
        ));
    }
    Ok(FeatureVector {
        version: transform.version().to_string(),
        layout_hash: transform.layout_hash(),
        values,
    })
}

/// Check a loaded transform against the version this build expects.
pub fn ensure_version(transform: &FittedTransform, expected: &str) -> Result<(), ForecastError> {
    if transform.version() != expected {
        return Err(ForecastError::IncompatibleTransformVersion {
            found: transform.version().to_string(),
            expected: expected.to_string(),
        });
    }
    Ok(())
}

/// Full load-time validation: version first, then layout integrity.
pub fn verify(transform: &FittedTransform) -> Result<(), ForecastError> {
    ensure_version(transform, TRANSFORM_VERSION)?;

    let numeric_ok = transform.numeric().len() == NUMERIC_COLUMNS.len()
        && transform.numeric().iter().zip(NUMERIC_COLUMNS).all(|(c, n)| c.name == *n && c.std > 0.0);
    let categorical_ok = transform.categorical().len() == CATEGORICAL_FEATURES.len()
        && transform
            .categorical()
            .iter()
            .zip(CATEGORICAL_FEATURES)
            .all(|(c, n)| c.name == *n && c.vocabulary.windows(2).all(|w| w[0] < w[1]));
    if !numeric_ok || !categorical_ok {
        return Err(ForecastError::Artifact("transform columns do not match this build's layout".into()));
    }

    let recomputed = transform.recomputed_hash();
    if recomputed != transform.layout_hash() || transform.columns().len() != transform.width() {
        return Err(ForecastError::Artifact(format!(
            "layout hash mismatch (stored {:08x}, recomputed {:08x}); artifact is corrupt",
            transform.layout_hash(),
            recomputed
        )));
    }
    Ok(())
}
