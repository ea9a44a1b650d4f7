//! Stage configuration
//!
//! Settings for the frame driver, loaded from `rune.toml` with environment
//! variable overrides. Every section is optional; missing keys fall back to
//! the defaults below.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Top-level configuration consumed by `Stage::with_config`.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct StageConfig {
    /// Surface size and global playback knobs
    pub stage: StageSection,
    /// Frame clock tuning
    pub timing: TimingConfig,
    /// Logging toggles
    pub diagnostics: DiagnosticsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StageSection {
    /// Logical width in CSS-like pixels
    pub width: u32,
    /// Logical height in CSS-like pixels
    pub height: u32,
    /// Clear the surface before every render
    pub auto_clear: bool,
    /// Multiplier applied to every frame snippet
    pub time_scale: f64,
    /// Device pixel ratio; the backing store is `width * pixel_ratio` wide
    pub pixel_ratio: f64,
    /// Route pointer input through the interaction manager
    pub interactive: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TimingConfig {
    /// Gaps longer than this reset the clock instead of producing one huge snippet
    pub max_frame_gap_ms: f64,
    /// Floor used for FPS bookkeeping
    pub min_frame_ms: f64,
    /// Sprite clip interval when a clip declares `fps = 0`
    pub default_clip_interval_ms: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct DiagnosticsConfig {
    /// Emit a debug line with fps once per second of stage time
    pub log_fps: bool,
}

impl Default for StageSection {
    fn default() -> Self {
        Self {
            width: 800,
            height: 600,
            auto_clear: true,
            time_scale: 1.0,
            pixel_ratio: 1.0,
            interactive: false,
        }
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            max_frame_gap_ms: 200.0,
            min_frame_ms: 15.0,
            default_clip_interval_ms: 16.0,
        }
    }
}

impl StageConfig {
    /// Load configuration from a TOML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Load `rune.toml` from the current directory, or defaults if it is
    /// missing or malformed
    pub fn load_or_default() -> Self {
        Self::load_from_file("rune.toml").unwrap_or_default()
    }

    /// Environment variables take precedence over file values
    pub fn merge_with_env(&mut self) {
        if let Some(w) = env_parse::<u32>("RUNE_STAGE_WIDTH") {
            self.stage.width = w;
        }
        if let Some(h) = env_parse::<u32>("RUNE_STAGE_HEIGHT") {
            self.stage.height = h;
        }
        if let Some(scale) = env_parse::<f64>("RUNE_TIME_SCALE") {
            self.stage.time_scale = scale;
        }
        if let Some(ratio) = env_parse::<f64>("RUNE_PIXEL_RATIO") {
            self.stage.pixel_ratio = ratio;
        }
        if let Ok(val) = std::env::var("RUNE_LOG_FPS") {
            self.diagnostics.log_fps = val == "1" || val.eq_ignore_ascii_case("true");
        }
    }

    /// File (or defaults) then environment overrides
    pub fn load() -> Self {
        let mut config = Self::load_or_default();
        config.merge_with_env();
        config
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}
