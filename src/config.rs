use crate::error::ConfigError;
use std::path::PathBuf;
use std::time::Duration;

/// Built-in defaults, overridden by the settings file and then the CLI.
pub mod constants {
    /// Sample rate requested from the decoder (Hz)
    pub const SAMPLE_RATE: u32 = 44100;
    /// FFT window size - must be a power of two
    pub const WINDOW_SIZE: usize = 2048;
    /// Number of frequency bars to display
    pub const BAR_COUNT: usize = 60;
    /// Multiplicative step between bucket boundaries
    pub const GROWTH_FACTOR: f64 = 1.08;

    /// Columns between the frame border and the first bar
    pub const BAR_PADDING: usize = 3;
    /// Columns between adjacent bars
    pub const BAR_SPACING: usize = 1;

    /// Rows kept free below the canvas so the prompt line never scrolls it
    pub const RESERVED_ROWS: usize = 1;
    /// Smallest frame that still has room for a border and one bar row
    pub const MIN_ROWS: usize = 3;
    pub const MIN_COLS: usize = 3;

    /// Decoder executable looked up on PATH
    pub const FFMPEG: &str = "ffmpeg";

    /// Debug log file path (in /tmp for easy access)
    pub const DEBUG_LOG_PATH: &str = "/tmp/specterm.log";
    /// Debug log file permissions (owner read/write only - 0o600)
    pub const DEBUG_LOG_MODE: u32 = 0o600;
}

use constants::*;

/// Fully merged runtime configuration for one visualizer run
#[derive(Clone, Debug)]
pub struct VisualizerConfig {
    pub input: PathBuf,
    pub sample_rate: u32,
    pub window_size: usize,
    pub bar_count: usize,
    pub growth: f64,
    pub bar_padding: usize,
    pub bar_spacing: usize,
    /// Fixed bar width; `None` fits the bars to the terminal width
    pub bar_width: Option<usize>,
    /// Minimum time between two rendered frames; `None` paces frames to the
    /// audio duration of one window
    pub frame_delay: Option<Duration>,
    pub playback: bool,
    pub ffmpeg: String,
}

impl VisualizerConfig {
    pub fn new(input: PathBuf) -> Self {
        Self {
            input,
            sample_rate: SAMPLE_RATE,
            window_size: WINDOW_SIZE,
            bar_count: BAR_COUNT,
            growth: GROWTH_FACTOR,
            bar_padding: BAR_PADDING,
            bar_spacing: BAR_SPACING,
            bar_width: None,
            frame_delay: None,
            playback: true,
            ffmpeg: FFMPEG.to_string(),
        }
    }

    /// Check everything that can be checked before touching the terminal
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.input.as_os_str().is_empty() {
            return Err(ConfigError::MissingInput);
        }
        if !self.input.exists() {
            return Err(ConfigError::InputNotFound(self.input.clone()));
        }
        if !self.window_size.is_power_of_two() || self.window_size < 4 {
            return Err(ConfigError::WindowNotPowerOfTwo(self.window_size));
        }
        if self.sample_rate == 0 {
            return Err(ConfigError::InvalidSampleRate(self.sample_rate));
        }
        if !self.growth.is_finite() || self.growth <= 1.0 {
            return Err(ConfigError::InvalidGrowth(self.growth));
        }
        if self.bar_count == 0 {
            return Err(ConfigError::NoBars);
        }
        Ok(())
    }

    /// Interval between frames, defaulting to the audio length of one window
    pub fn frame_interval(&self) -> Duration {
        self.frame_delay.unwrap_or_else(|| {
            Duration::from_secs_f64(self.window_size as f64 / self.sample_rate.max(1) as f64)
        })
    }

    /// Canvas size for a terminal of the given size, one row reserved
    pub fn canvas_size(&self, term_cols: u16, term_rows: u16) -> Result<(usize, usize), ConfigError> {
        let rows = (term_rows as usize).saturating_sub(RESERVED_ROWS);
        let cols = term_cols as usize;
        if rows < MIN_ROWS || cols < MIN_COLS {
            return Err(ConfigError::TerminalTooSmall { rows, cols });
        }
        Ok((rows, cols))
    }
}
