//! Fitting and applying the feature transform.
//!
//! The transform is learned once from the training partition and then only
//! read: serving never recomputes a statistic.

pub mod fit;
pub mod fitted;
pub mod store;

pub use fit::fit;
pub use fitted::{CategoricalColumn, FittedTransform, NumericColumn};
pub use store::{apply, apply_batch, encoded, ensure_version, verify};
