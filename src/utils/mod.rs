//! Utility modules for configuration and logging

pub mod config;
pub mod logger;

pub use config::{builtin_anchors, ConfigError, ConfigurationManager, SystemConfig, ValidationResult};
