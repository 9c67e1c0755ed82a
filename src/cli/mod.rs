pub mod commands;
pub mod ingest;
pub mod predict;
pub mod serve;
pub mod train;
pub mod validate;

pub use commands::{Cli, Commands};
