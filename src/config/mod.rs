//! Configuration module for Infra Snitch
//!
//! CLI arguments and the validated run configuration derived from them.

mod settings;

pub use settings::*;
