//! Signal-to-bars analysis
//!
//! One sample window goes in, one fresh set of bar heights comes out; nothing
//! is carried over between frames.

pub mod buckets;
pub mod fft;

use crate::error::TransformError;

use buckets::{bar_heights, bucketize};
use fft::{log_magnitudes, real_to_complex, transform};

/// Per-frame analysis settings
#[derive(Clone, Copy, Debug)]
pub struct AnalysisParams {
    pub growth: f64,
    pub bar_count: usize,
}

/// Result of analysing one window
#[derive(Debug)]
pub struct FrameSpectrum {
    /// Peak log-magnitude per bucket
    pub buckets: Vec<f64>,
    /// Normalized heights, one per display bar
    pub bars: Vec<f64>,
}

/// Window -> FFT -> log magnitudes -> buckets -> bar heights
pub fn analyze(window: &[f64], params: AnalysisParams) -> Result<FrameSpectrum, TransformError> {
    let spectrum = transform(&real_to_complex(window))?;
    let logs = log_magnitudes(&spectrum);
    let buckets = bucketize(&logs, params.growth);
    log::trace!("{} bins -> {} buckets", logs.len(), buckets.len());
    if buckets.len() < params.bar_count {
        log::debug!(
            "only {} buckets for {} bars, padding with zeros",
            buckets.len(),
            params.bar_count
        );
    }
    let bars = bar_heights(&buckets, params.bar_count);
    Ok(FrameSpectrum { buckets, bars })
}
