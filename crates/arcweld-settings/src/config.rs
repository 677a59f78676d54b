//! Welder configuration
//!
//! Provides configuration file handling and validation for a welding run.
//! Supports JSON and TOML file formats; the default location is
//! `<config dir>/arcweld/config.toml`.
//!
//! Settings cover:
//! - Fitting tolerances (resolution and radius bounds in mm, arc length
//!   tolerance as a fraction where 0.05 means 5%)
//! - Firmware behaviour (whether G90/G91 also switch the extruder mode)
//! - Memory bound on the unwritten-command buffer
//! - Progress notification cadence

use crate::error::{ConfigError, SettingsError, SettingsResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application directory name under the platform config dir
const APP_DIR: &str = "arcweld";

/// Default config file name
const CONFIG_FILE: &str = "config.toml";

/// Settings for one welding run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WelderConfig {
    /// Maximum deviation between the original path and the fitted arc, in mm
    pub resolution_mm: f64,
    /// Arcs with a smaller radius are rejected, in mm
    pub min_radius_mm: f64,
    /// Arcs with a larger radius are rejected, in mm
    pub max_radius_mm: f64,
    /// Whether G90/G91 also switch the extruder between absolute and relative
    pub g90_g91_influences_extruder: bool,
    /// Maximum number of buffered commands before a forced flush
    pub buffer_size: usize,
    /// Seconds between progress notifications; 0 notifies after every command
    pub notification_period_seconds: f64,
    /// Allowed relative mismatch between arc length and path length
    ///
    /// A fraction, not a percentage: 0.05 accepts a 5% difference. Files
    /// written with the older `arc_length_tolerance_percent` key still load.
    #[serde(alias = "arc_length_tolerance_percent")]
    pub arc_length_tolerance: f64,
}

impl Default for WelderConfig {
    fn default() -> Self {
        Self {
            resolution_mm: 0.05,
            min_radius_mm: 0.05,
            max_radius_mm: 9999.0,
            g90_g91_influences_extruder: false,
            buffer_size: 1000,
            notification_period_seconds: 1.0,
            arc_length_tolerance: 0.05,
        }
    }
}

enum ConfigFormat {
    Json,
    Toml,
}

impl ConfigFormat {
    fn from_path(path: &Path) -> SettingsResult<Self> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Ok(Self::Json),
            Some("toml") => Ok(Self::Toml),
            other => Err(ConfigError::UnsupportedFormat(
                other.unwrap_or("<none>").to_string(),
            )
            .into()),
        }
    }
}

impl WelderConfig {
    /// Create new config with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Load config from file (JSON or TOML)
    pub fn load_from_file(path: &Path) -> SettingsResult<Self> {
        let format = ConfigFormat::from_path(path)?;
        let content = std::fs::read_to_string(path).map_err(|e| {
            SettingsError::LoadError(format!("{}: {}", path.display(), e))
        })?;

        let config: Self = match format {
            ConfigFormat::Json => serde_json::from_str(&content)?,
            ConfigFormat::Toml => toml::from_str(&content)?,
        };

        config.validate()?;
        tracing::debug!("Loaded welder config from {}", path.display());
        Ok(config)
    }

    /// Load config from `path` when it exists, defaults otherwise
    pub fn load_or_default(path: &Path) -> SettingsResult<Self> {
        if path.exists() {
            Self::load_from_file(path)
        } else {
            tracing::debug!(
                "No config at {}, using defaults",
                path.display()
            );
            Ok(Self::default())
        }
    }

    /// Save config to file (JSON or TOML)
    pub fn save_to_file(&self, path: &Path) -> SettingsResult<()> {
        self.validate()?;

        let content = match ConfigFormat::from_path(path)? {
            ConfigFormat::Json => serde_json::to_string_pretty(self)?,
            ConfigFormat::Toml => toml::to_string_pretty(self)?,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .map_err(|e| SettingsError::ConfigDirectory(format!("{}: {}", parent.display(), e)))?;
        }

        std::fs::write(path, content)
            .map_err(|e| SettingsError::SaveError(format!("{}: {}", path.display(), e)))?;

        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> SettingsResult<()> {
        fn invalid(key: &str, reason: &str) -> SettingsError {
            SettingsError::InvalidSetting {
                key: key.to_string(),
                reason: reason.to_string(),
            }
        }

        if !(self.resolution_mm.is_finite() && self.resolution_mm > 0.0) {
            return Err(invalid("resolution_mm", "must be greater than 0"));
        }

        if self.max_radius_mm.is_nan() || self.max_radius_mm <= 0.0 {
            return Err(invalid("max_radius_mm", "must be greater than 0"));
        }

        if !(self.min_radius_mm.is_finite()
            && self.min_radius_mm >= 0.0
            && self.min_radius_mm < self.max_radius_mm)
        {
            return Err(invalid(
                "min_radius_mm",
                "must be 0 or greater and below max_radius_mm",
            ));
        }

        // An arc needs at least two buffered commands after the anchor
        if self.buffer_size < 2 {
            return Err(invalid("buffer_size", "must be at least 2"));
        }

        if !(self.notification_period_seconds.is_finite()
            && self.notification_period_seconds >= 0.0)
        {
            return Err(invalid(
                "notification_period_seconds",
                "must be 0 or greater",
            ));
        }

        if !(self.arc_length_tolerance.is_finite() && self.arc_length_tolerance > 0.0) {
            return Err(invalid(
                "arc_length_tolerance",
                "must be greater than 0",
            ));
        }

        Ok(())
    }
}

/// Platform default config file location
pub fn default_config_path() -> SettingsResult<PathBuf> {
    let dir = dirs::config_dir().ok_or_else(|| {
        ConfigError::UnsupportedPlatform(std::env::consts::OS.to_string())
    })?;
    Ok(dir.join(APP_DIR).join(CONFIG_FILE))
}
