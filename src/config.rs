//! Viewer configuration.
//!
//! Every tunable constant of the engine lives in [`ViewerConfig`]. It can be
//! stored as YAML; missing fields take their defaults.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::data::channels::GroupRule;
use crate::data::hotkeys::Hotkeys;
use crate::error::ConfigError;

/// Amplitude auto-scale parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutoScaleConfig {
    /// Percentile of absolute amplitude, in percent.
    pub percentile: f64,
    /// Fraction of the row spacing the percentile should fill.
    pub target_fill: f64,
}

impl Default for AutoScaleConfig {
    fn default() -> Self {
        Self {
            percentile: 95.0,
            target_fill: 0.8,
        }
    }
}

/// Palette as `[r, g, b]` triples.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaletteConfig {
    pub selected: [u8; 3],
    pub bad: [u8; 3],
    pub eeg: [u8; 3],
    pub meg_mag: [u8; 3],
    pub meg_grad: [u8; 3],
    pub eog: [u8; 3],
    pub ecg: [u8; 3],
    pub emg: [u8; 3],
    pub stim: [u8; 3],
    pub misc: [u8; 3],
}

impl Default for PaletteConfig {
    fn default() -> Self {
        Self {
            selected: [0x4e, 0xcd, 0xc4],
            bad: [0xff, 0x6b, 0x6b],
            eeg: [0x1f, 0x77, 0xb4],
            meg_mag: [0xff, 0x7f, 0x0e],
            meg_grad: [0x2c, 0xa0, 0x2c],
            eog: [0xd6, 0x27, 0x28],
            ecg: [0x94, 0x67, 0xbd],
            emg: [0x8c, 0x56, 0x4b],
            stim: [0xe3, 0x77, 0xc2],
            misc: [0x7f, 0x7f, 0x7f],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub default_window_s: f64,
    pub min_window_s: f64,
    /// Longest window an overview time selection may produce.
    pub max_selection_window_s: f64,
    pub default_channel_count: usize,
    pub overview_channels: usize,
    /// Overview amplitude relative to the detail scale.
    pub overview_amplitude_ratio: f64,
    /// Min/max bins per overview channel.
    pub overview_max_points: usize,
    pub row_spacing: f64,
    pub zoom_step_factor: f64,
    pub filter_transition_hz: f64,
    pub auto_scale: AutoScaleConfig,
    pub channel_groups: Vec<GroupRule>,
    pub palette: PaletteConfig,
    pub hotkeys: Hotkeys,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            default_window_s: 10.0,
            min_window_s: 1.0,
            max_selection_window_s: 60.0,
            default_channel_count: 20,
            overview_channels: 10,
            overview_amplitude_ratio: 0.5,
            overview_max_points: 2000,
            row_spacing: 1.0,
            zoom_step_factor: 1.1,
            filter_transition_hz: 1.0,
            auto_scale: AutoScaleConfig::default(),
            channel_groups: GroupRule::default_table(),
            palette: PaletteConfig::default(),
            hotkeys: Hotkeys::default(),
        }
    }
}

impl ViewerConfig {
    /// Load and validate a YAML config.
    pub fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let cfg: ViewerConfig = serde_yaml::from_str(&text)?;
        cfg.validate()?;
        info!(path = %path.display(), "loaded viewer config");
        Ok(cfg)
    }

    pub fn save_to_path(&self, path: &Path) -> Result<(), ConfigError> {
        let text = serde_yaml::to_string(self)?;
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir).map_err(|source| ConfigError::Io {
                path: dir.to_path_buf(),
                source,
            })?;
        }
        fs::write(path, text).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("default_window_s", self.default_window_s),
            ("min_window_s", self.min_window_s),
            ("max_selection_window_s", self.max_selection_window_s),
            ("overview_amplitude_ratio", self.overview_amplitude_ratio),
            ("row_spacing", self.row_spacing),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::Invalid(format!("{name} must be > 0, got {value}")));
            }
        }
        if self.min_window_s > self.default_window_s {
            return Err(ConfigError::Invalid(format!(
                "min_window_s {} exceeds default_window_s {}",
                self.min_window_s, self.default_window_s
            )));
        }
        if self.min_window_s > self.max_selection_window_s {
            return Err(ConfigError::Invalid(format!(
                "min_window_s {} exceeds max_selection_window_s {}",
                self.min_window_s, self.max_selection_window_s
            )));
        }
        if !(self.zoom_step_factor.is_finite() && self.zoom_step_factor > 1.0) {
            return Err(ConfigError::Invalid(format!(
                "zoom_step_factor must be > 1, got {}",
                self.zoom_step_factor
            )));
        }
        let p = self.auto_scale.percentile;
        if !(p > 0.0 && p <= 100.0) {
            return Err(ConfigError::Invalid(format!(
                "auto_scale.percentile must be in (0, 100], got {p}"
            )));
        }
        let fill = self.auto_scale.target_fill;
        if !(fill > 0.0 && fill <= 1.0) {
            return Err(ConfigError::Invalid(format!(
                "auto_scale.target_fill must be in (0, 1], got {fill}"
            )));
        }
        if self.default_channel_count == 0 {
            return Err(ConfigError::Invalid(
                "default_channel_count must be at least 1".to_string(),
            ));
        }
        if self.filter_transition_hz < 0.0 || !self.filter_transition_hz.is_finite() {
            return Err(ConfigError::Invalid(format!(
                "filter_transition_hz must be >= 0, got {}",
                self.filter_transition_hz
            )));
        }
        if self.channel_groups.iter().any(|r| r.prefix.is_empty()) {
            return Err(ConfigError::Invalid(
                "channel group prefixes must not be empty".to_string(),
            ));
        }
        if let Some((a, b)) = self.hotkeys.find_conflict() {
            return Err(ConfigError::Invalid(format!(
                "hotkeys {a:?} and {b:?} share a binding"
            )));
        }
        Ok(())
    }
}
