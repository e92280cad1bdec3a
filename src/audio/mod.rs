//! Audio boundary: decoding input to PCM windows and optional monitoring playback.

pub mod decode;
pub mod playback;

pub use decode::{Decoder, PcmReader};
pub use playback::Monitor;
