//! Error types for every stage of the visualizer.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Problems detected before the first frame is drawn.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing argument: input file name")]
    MissingInput,

    #[error("Input file not found: {}", .0.display())]
    InputNotFound(PathBuf),

    #[error("FFT window size must be a power of two (>= 4), got {0}")]
    WindowNotPowerOfTwo(usize),

    #[error("Sample rate must be greater than zero, got {0}")]
    InvalidSampleRate(u32),

    #[error("Bucket growth factor must be finite and greater than 1.0, got {0}")]
    InvalidGrowth(f64),

    #[error("At least one display bar is required")]
    NoBars,

    #[error("Terminal too small: {rows} rows x {cols} cols")]
    TerminalTooSmall { rows: usize, cols: usize },

    #[error("Invalid settings file: {0}")]
    Settings(String),
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum CanvasError {
    #[error("Canvas dimensions must be at least 1x1, got {rows}x{cols}")]
    InvalidDimension { rows: usize, cols: usize },

    #[error("Cell ({row}, {col}) is outside the {rows}x{cols} canvas")]
    OutOfBounds {
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
    },
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum TransformError {
    #[error("Transform length must be a power of two, got {0}")]
    InvalidLength(usize),
}

/// Failures at the audio boundary (decoder pipe and playback device).
#[derive(Error, Debug)]
pub enum AudioError {
    #[error("Failed to start decoder: {0}")]
    Spawn(#[source] io::Error),

    #[error("Failed to read PCM stream: {0}")]
    Read(#[source] io::Error),

    #[error("Decoder failed: {0}")]
    Decoder(String),

    #[error("Audio playback unavailable: {0}")]
    Playback(String),
}

/// Top-level error returned by the render loop.
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Canvas(#[from] CanvasError),

    #[error(transparent)]
    Transform(#[from] TransformError),

    #[error(transparent)]
    Audio(#[from] AudioError),

    #[error("Terminal I/O error: {0}")]
    Io(#[from] io::Error),
}

impl Error {
    /// Process exit code for this error (2 for configuration, 1 otherwise).
    pub fn exit_code(&self) -> u8 {
        match self {
            Error::Config(_) => 2,
            _ => 1,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
