pub mod builder;
pub mod cvss;
pub mod input;
pub mod layout;

pub use builder::{extract, FeatureVector, RawFeatures};
pub use input::{FeatureInput, PredictInput};
pub use layout::{FeatureMetadata, CATEGORICAL_FEATURES, NUMERIC_COLUMNS, OTHER_LEVEL, TRANSFORM_VERSION};
