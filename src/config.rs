// SPDX-License-Identifier: GPL-3.0-only

use crate::constants::defaults;
use crate::errors::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

/// Pipeline tuning options
///
/// Missing fields in a config file fall back to their defaults, so a file only
/// needs to list what it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Run recognition on every Nth tick
    pub sample_interval: u32,
    /// Shrink frames by this factor before recognition
    pub resize_divisor: u32,
    /// Annotated frames to buffer before playback starts
    pub fill_threshold: usize,
    /// Approximate pixel width of one label character
    pub label_plate_char_width_px: f32,
    /// Ticks without a new source frame before warning (0 disables)
    pub stale_frame_ticks: u32,
    /// Pause between acquisition iterations (0 yields instead)
    pub worker_idle_ms: u64,
    /// Pop and display cadence once playback has started
    pub display_tick_ms: u64,
    /// Minimum driver tick period (0 runs ticks back to back)
    pub driver_tick_ms: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            sample_interval: defaults::SAMPLE_INTERVAL,
            resize_divisor: defaults::RESIZE_DIVISOR,
            fill_threshold: defaults::FILL_THRESHOLD,
            label_plate_char_width_px: defaults::LABEL_PLATE_CHAR_WIDTH_PX,
            stale_frame_ticks: defaults::STALE_FRAME_TICKS,
            worker_idle_ms: defaults::WORKER_IDLE_MS,
            display_tick_ms: defaults::DISPLAY_TICK_MS,
            driver_tick_ms: defaults::DRIVER_TICK_MS,
        }
    }
}

impl PipelineConfig {
    /// Check option ranges
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sample_interval == 0 {
            return Err(ConfigError::InvalidValue {
                option: "sample_interval",
                reason: "must be at least 1".to_string(),
            });
        }
        if !(1..=defaults::MAX_RESIZE_DIVISOR).contains(&self.resize_divisor) {
            return Err(ConfigError::InvalidValue {
                option: "resize_divisor",
                reason: format!("must be between 1 and {}", defaults::MAX_RESIZE_DIVISOR),
            });
        }
        if self.label_plate_char_width_px.is_nan() || self.label_plate_char_width_px <= 0.0 {
            return Err(ConfigError::InvalidValue {
                option: "label_plate_char_width_px",
                reason: "must be a positive number".to_string(),
            });
        }
        Ok(())
    }

    /// Parse and validate a JSON config file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Parse(format!("{}: {}", path.display(), e)))?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        info!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    /// Load `explicit` if given, else the default location if a file exists
    /// there, else defaults
    pub fn load_or_default(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        match default_config_path() {
            Some(path) if path.is_file() => Self::load(&path),
            _ => {
                debug!("No config file, using defaults");
                Ok(Self::default())
            }
        }
    }

    pub fn worker_idle(&self) -> Duration {
        Duration::from_millis(self.worker_idle_ms)
    }

    pub fn display_tick(&self) -> Duration {
        Duration::from_millis(self.display_tick_ms)
    }
}

/// `<config dir>/rollcall/config.json`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("rollcall").join("config.json"))
}

/// Directory for log files when the terminal is in use
pub fn log_directory() -> PathBuf {
    dirs::state_dir()
        .or_else(dirs::cache_dir)
        .unwrap_or_else(std::env::temp_dir)
        .join("rollcall")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(PipelineConfig::default().validate().is_ok());
    }

    #[test]
    fn test_rejects_zero_interval() {
        let config = PipelineConfig {
            sample_interval: 0,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue {
                option: "sample_interval",
                ..
            })
        ));
    }

    #[test]
    fn test_resize_divisor_bounds() {
        let at_limit = PipelineConfig {
            resize_divisor: defaults::MAX_RESIZE_DIVISOR,
            ..Default::default()
        };
        assert!(at_limit.validate().is_ok());

        for divisor in [defaults::MAX_RESIZE_DIVISOR + 1, u32::MAX] {
            let config = PipelineConfig {
                resize_divisor: divisor,
                ..Default::default()
            };
            assert!(matches!(
                config.validate(),
                Err(ConfigError::InvalidValue {
                    option: "resize_divisor",
                    ..
                })
            ));
        }
    }

    #[test]
    fn test_rejects_nan_char_width() {
        let config = PipelineConfig {
            label_plate_char_width_px: f32::NAN,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{ "fill_threshold": 5 }"#).unwrap();

        let config = PipelineConfig::load(&path).unwrap();
        assert_eq!(config.fill_threshold, 5);
        assert_eq!(config.sample_interval, defaults::SAMPLE_INTERVAL);
    }

    #[test]
    fn test_invalid_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{ "resize_divisor": 0 }"#).unwrap();
        assert!(PipelineConfig::load(&path).is_err());
    }
}
