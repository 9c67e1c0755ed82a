//! Vulnerability exploitation forecasting.
//!
//! Ingests a vulnerability registry, an exploited-vulnerability catalog and an
//! exploit-likelihood feed, reconciles them into one labeled record per
//! identifier, and trains a classifier whose feature transform is shared
//! verbatim between training and serving.

pub mod api;
pub mod cli;
pub mod config;
pub mod errors;
pub mod features;
pub mod model;
pub mod models;
pub mod normalize;
pub mod reconcile;
pub mod sources;
pub mod transform;
