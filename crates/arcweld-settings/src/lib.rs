//! Arcweld Settings Crate
//!
//! Handles welder configuration: defaults, validation and persistence.

pub mod config;
pub mod error;

pub use config::{default_config_path, WelderConfig};
pub use error::{ConfigError, SettingsError, SettingsResult};
