//! Application configuration.
//!
//! The configuration is loaded from a JSON file at
//! `$XDG_CONFIG_HOME/snapgrd/config.json`.  The top-level schema uses named
//! sections so the file can be extended later without breaking backward
//! compatibility.
//!
//! # Example
//!
//! ```json
//! {
//!   "snap_groups": {
//!     "divider_thickness": 8,
//!     "snap_to_replace_threshold": 0.07,
//!     "automatically_lock_group": true,
//!     "default_ratio": 0.5
//!   },
//!   "headless": {
//!     "displays": [{ "x": 0, "y": 0, "width": 1920, "height": 1032 }]
//!   }
//! }
//! ```

use crate::geometry::Rect;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Top-level configuration.
///
/// Every field is optional: a minimal `{}` file is valid and all sections
/// fall back to their compiled-in defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Snap-group behaviour.
    #[serde(default)]
    pub snap_groups: SnapGroupConfig,

    /// Displays simulated by the headless window system.
    #[serde(default)]
    pub headless: HeadlessConfig,
}

/// Snap-group tuning knobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SnapGroupConfig {
    /// Short-side length of the divider in pixels.  Default: `8`.
    pub divider_thickness: i32,
    /// Largest difference between the ratio of a newly snapped window and
    /// the ratio of the group member it would replace for snap-to-replace to
    /// apply.  Default: `0.07`.
    pub snap_to_replace_threshold: f64,
    /// Group two windows as soon as they are snapped to opposite sides.
    /// Default: `true`.
    pub automatically_lock_group: bool,
    /// Primary ratio used when a window has no snap ratio of its own.
    /// Default: `0.5`.
    pub default_ratio: f64,
}

impl Default for SnapGroupConfig {
    fn default() -> Self {
        Self {
            divider_thickness: 8,
            snap_to_replace_threshold: 0.07,
            automatically_lock_group: true,
            default_ratio: 0.5,
        }
    }
}

/// Headless window system settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HeadlessConfig {
    /// Work area of each simulated display.  Each display starts with one
    /// desk.
    pub displays: Vec<Rect>,
}

impl Default for HeadlessConfig {
    fn default() -> Self {
        Self {
            displays: vec![Rect::new(0, 0, 1920, 1032)],
        }
    }
}

impl Config {
    /// Load configuration from a JSON file at `path`.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError(format!("failed to read {}: {}", path.display(), e)))?;
        let config: Self = serde_json::from_str(&contents)
            .map_err(|e| ConfigError(format!("failed to parse {}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the snap-group algorithms cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let sg = &self.snap_groups;
        if sg.divider_thickness < 0 {
            return Err(ConfigError(format!(
                "divider_thickness must not be negative (got {})",
                sg.divider_thickness
            )));
        }
        if !(sg.default_ratio > 0.0 && sg.default_ratio < 1.0) {
            return Err(ConfigError(format!(
                "default_ratio must be in (0, 1) (got {})",
                sg.default_ratio
            )));
        }
        if !(0.0..1.0).contains(&sg.snap_to_replace_threshold) {
            return Err(ConfigError(format!(
                "snap_to_replace_threshold must be in [0, 1) (got {})",
                sg.snap_to_replace_threshold
            )));
        }
        Ok(())
    }
}

/// Error from loading or parsing a configuration file.
#[derive(Debug, thiserror::Error)]
#[error("config error: {0}")]
pub struct ConfigError(String);
