//! Environment configuration and the concrete SEMS HTTP client.

pub mod config;
pub mod sems;

pub use config::SemsConfig;
