//! Configuration: defaults plus environment overrides.

pub mod app_config;

pub use app_config::{AppConfig, ConfigError, DEFAULT_ORIGIN};
