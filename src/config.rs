use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::audio::analysis::{FRAME_LENGTH, HOP_LENGTH};
use crate::audio::spectrum::{max_bins, DEFAULT_AMPLIFICATION};
use crate::visualization::circular::CIRCLE_BINS;
use crate::visualization::VisualizationKind;

#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub capture: CaptureConfig,
    #[serde(default)]
    pub render: RenderConfig,
    #[serde(default)]
    pub analysis: AnalysisConfig,
}

#[derive(Debug, Deserialize)]
pub struct CaptureConfig {
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    /// Input device name; the host default when unset
    #[serde(default)]
    pub device: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RenderConfig {
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
    /// Selected at startup; `"none"` leaves every view off until one is chosen
    #[serde(default = "default_visualization")]
    pub visualization: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AnalysisConfig {
    #[serde(default = "default_frame_length")]
    pub frame_length: usize,
    #[serde(default = "default_hop_length")]
    pub hop_length: usize,
    #[serde(default = "default_amplification")]
    pub amplification: f32,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            sample_rate: default_sample_rate(),
            chunk_size: default_chunk_size(),
            device: None,
        }
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_interval_ms(),
            visualization: default_visualization(),
        }
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            frame_length: default_frame_length(),
            hop_length: default_hop_length(),
            amplification: default_amplification(),
        }
    }
}

pub fn default_sample_rate() -> u32 { 44100 }
pub fn default_chunk_size() -> usize { 1024 }
pub fn default_interval_ms() -> u64 { 20 }
fn default_visualization() -> Option<String> { Some(VisualizationKind::FrequencyBars.name().into()) }
fn default_frame_length() -> usize { FRAME_LENGTH }
fn default_hop_length() -> usize { HOP_LENGTH }
fn default_amplification() -> f32 { DEFAULT_AMPLIFICATION }

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config {}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// `./pulsescope.toml`, then the per-user config locations.
pub fn discover_config() -> Option<PathBuf> {
    let local = PathBuf::from("pulsescope.toml");
    if local.exists() {
        return Some(local);
    }
    if let Some(home) = dirs::home_dir() {
        let xdg = home.join(".config").join("pulsescope").join("config.toml");
        if xdg.exists() {
            return Some(xdg);
        }
    }
    if let Some(config_dir) = dirs::config_dir() {
        let platform = config_dir.join("pulsescope").join("config.toml");
        if platform.exists() {
            return Some(platform);
        }
    }
    None
}

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let chunk = self.capture.chunk_size;
        if self.capture.sample_rate == 0 {
            return Err(ConfigError::Invalid("sample_rate must be greater than 0".into()));
        }
        if chunk == 0 || chunk % 2 != 0 {
            return Err(ConfigError::Invalid(format!(
                "chunk_size must be a positive even number (got {})",
                chunk
            )));
        }
        if max_bins(chunk) < CIRCLE_BINS {
            return Err(ConfigError::Invalid(format!(
                "chunk_size {} is too small for the {}-bin circular spectrum",
                chunk, CIRCLE_BINS
            )));
        }
        if self.analysis.frame_length == 0 || self.analysis.hop_length == 0 {
            return Err(ConfigError::Invalid(
                "frame_length and hop_length must be greater than 0".into(),
            ));
        }
        if !(self.analysis.amplification.is_finite() && self.analysis.amplification > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "amplification must be a positive number (got {})",
                self.analysis.amplification
            )));
        }
        if self.render.interval_ms == 0 {
            return Err(ConfigError::Invalid("interval_ms must be greater than 0".into()));
        }
        if let Some(name) = self.startup_name() {
            name.parse::<VisualizationKind>()
                .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        }
        Ok(())
    }

    /// Startup view, if one is configured.
    pub fn initial_visualization(&self) -> Option<VisualizationKind> {
        self.startup_name().and_then(|name| name.parse().ok())
    }

    fn startup_name(&self) -> Option<&str> {
        self.render
            .visualization
            .as_deref()
            .filter(|name| !name.trim().eq_ignore_ascii_case("none"))
    }
}
