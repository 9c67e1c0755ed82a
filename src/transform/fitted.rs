use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::FeatureConfig;
use crate::features::layout::{column_names, layout_hash};
use crate::features::FeatureMetadata;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumericColumn {
    pub name: String,
    /// Training median, used when the value is unknown.
    pub fill: f64,
    pub mean: f64,
    /// Never zero.
    pub std: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoricalColumn {
    pub name: String,
    /// Training mode, used when the level is unknown.
    pub fill: String,
    /// Sorted. Levels outside it encode as `__other__`.
    pub vocabulary: Vec<String>,
}

/// Everything learned from the training partition. Immutable once fitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FittedTransform {
    version: String,
    config: FeatureConfig,
    fitted_at: DateTime<Utc>,
    numeric: Vec<NumericColumn>,
    categorical: Vec<CategoricalColumn>,
    columns: Vec<String>,
    layout_hash: u32,
}

impl FittedTransform {
    pub(crate) fn from_parts(
        version: &str,
        config: FeatureConfig,
        fitted_at: DateTime<Utc>,
        numeric: Vec<NumericColumn>,
        categorical: Vec<CategoricalColumn>,
    ) -> Self {
        let columns = Self::layout_columns(&categorical);
        let layout_hash = layout_hash(version, &columns);
        Self {
            version: version.to_string(),
            config,
            fitted_at,
            numeric,
            categorical,
            columns,
            layout_hash,
        }
    }

    fn layout_columns(categorical: &[CategoricalColumn]) -> Vec<String> {
        let vocabularies: Vec<Vec<String>> = categorical.iter().map(|c| c.vocabulary.clone()).collect();
        column_names(&vocabularies)
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn config(&self) -> FeatureConfig {
        self.config
    }

    /// Reference time the age columns were computed against during fitting.
    pub fn fitted_at(&self) -> DateTime<Utc> {
        self.fitted_at
    }

    pub fn numeric(&self) -> &[NumericColumn] {
        &self.numeric
    }

    pub fn categorical(&self) -> &[CategoricalColumn] {
        &self.categorical
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn layout_hash(&self) -> u32 {
        self.layout_hash
    }

    /// Hash recomputed from the stored vocabularies, ignoring the stored hash.
    pub fn recomputed_hash(&self) -> u32 {
        layout_hash(&self.version, &Self::layout_columns(&self.categorical))
    }

    pub fn metadata(&self) -> FeatureMetadata {
        FeatureMetadata {
            version: self.version.clone(),
            layout_hash: self.layout_hash,
            width: self.width(),
            columns: self.columns.clone(),
            positions: self.columns.iter().enumerate().map(|(i, c)| (c.clone(), i)).collect(),
            vocabularies: self
                .categorical
                .iter()
                .map(|c| (c.name.clone(), c.vocabulary.clone()))
                .collect(),
            numeric_fills: self.numeric.iter().map(|c| (c.name.clone(), c.fill)).collect::<BTreeMap<_, _>>(),
            categorical_fills: self.categorical.iter().map(|c| (c.name.clone(), c.fill.clone())).collect(),
        }
    }
}
