//! Errors raised while loading, validating and saving welder settings

use thiserror::Error;

/// Failure of a settings operation
#[derive(Error, Debug)]
pub enum SettingsError {
    /// Reading the file failed
    #[error("Failed to load settings: {0}")]
    LoadError(String),

    /// Writing the file failed
    #[error("Failed to save settings: {0}")]
    SaveError(String),

    /// A value failed validation
    #[error("Invalid setting '{key}': {reason}")]
    InvalidSetting { key: String, reason: String },

    /// The config directory is missing and could not be created
    #[error("Config directory error: {0}")]
    ConfigDirectory(String),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("TOML error: {0}")]
    TomlSerError(#[from] toml::ser::Error),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

/// Problems with where or how the settings file is stored
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Only `.toml` and `.json` files are understood
    #[error("Unsupported config format: {0}")]
    UnsupportedFormat(String),

    /// No per-user config directory on this platform
    #[error("Unsupported platform: {0}")]
    UnsupportedPlatform(String),
}

pub type SettingsResult<T> = Result<T, SettingsError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_setting_display() {
        let err = SettingsError::InvalidSetting {
            key: "buffer_size".to_string(),
            reason: "must be at least 1".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Invalid setting 'buffer_size': must be at least 1"
        );
    }

    #[test]
    fn test_config_error_wraps() {
        let err: SettingsError = ConfigError::UnsupportedFormat("yaml".to_string()).into();
        assert!(matches!(err, SettingsError::Config(_)));
        assert_eq!(err.to_string(), "Config error: Unsupported config format: yaml");
    }

    #[test]
    fn test_parse_error_converts() {
        let parse = toml::from_str::<toml::Value>("resolution_mm = ").unwrap_err();
        let err: SettingsError = parse.into();
        assert!(err.to_string().starts_with("TOML error: "));
    }
}
