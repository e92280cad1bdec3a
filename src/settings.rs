use crate::config::VisualizerConfig;
use crate::error::ConfigError;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Optional overrides read from `~/.config/specterm/config.toml`
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    #[serde(default)]
    pub visualizer: VisualizerSettings,
    #[serde(default)]
    pub audio: AudioSettings,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VisualizerSettings {
    pub bars: Option<usize>,
    pub growth: Option<f64>,
    pub bar_width: Option<usize>,
    pub bar_spacing: Option<usize>,
    pub bar_padding: Option<usize>,
    pub frame_delay_ms: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AudioSettings {
    pub sample_rate: Option<u32>,
    pub fft_size: Option<usize>,
    pub playback: Option<bool>,
    pub ffmpeg: Option<String>,
}

impl Settings {
    /// Load the user settings file; a missing file yields the defaults
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::config_path())
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .map_err(|e| ConfigError::Settings(format!("{}: {}", path.display(), e)))?;
        Self::parse(&content).map_err(|e| match e {
            ConfigError::Settings(msg) => ConfigError::Settings(format!("{}: {}", path.display(), msg)),
            other => other,
        })
    }

    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Settings(e.to_string()))
    }

    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("specterm")
            .join("config.toml")
    }

    /// Layer these settings over the built-in defaults in `config`
    pub fn apply(&self, config: &mut VisualizerConfig) {
        let v = &self.visualizer;
        if let Some(bars) = v.bars {
            config.bar_count = bars;
        }
        if let Some(growth) = v.growth {
            config.growth = growth;
        }
        if v.bar_width.is_some() {
            config.bar_width = v.bar_width;
        }
        if let Some(spacing) = v.bar_spacing {
            config.bar_spacing = spacing;
        }
        if let Some(padding) = v.bar_padding {
            config.bar_padding = padding;
        }
        if let Some(ms) = v.frame_delay_ms {
            config.frame_delay = Some(Duration::from_millis(ms));
        }

        let a = &self.audio;
        if let Some(rate) = a.sample_rate {
            config.sample_rate = rate;
        }
        if let Some(size) = a.fft_size {
            config.window_size = size;
        }
        if let Some(playback) = a.playback {
            config.playback = playback;
        }
        if let Some(ref ffmpeg) = a.ffmpeg {
            config.ffmpeg = ffmpeg.clone();
        }
    }
}
