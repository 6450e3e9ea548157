//! Run configuration.

pub mod loader;

pub use loader::{load_config, RunConfig};
