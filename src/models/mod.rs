//! Data models and structures for the ping probe

pub mod config;
pub mod metrics;

// Re-export main model types
pub use config::{Config, RunConfig};
pub use metrics::{Probe, Observation, RunReport};
