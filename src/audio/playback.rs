//! Monitoring playback on the default output device.
//!
//! The render loop pushes every decoded window into a shared queue; cpal's
//! callback drains it. Nothing here is allowed to stop the visualization:
//! setup failures come back as [`AudioError::Playback`] for the caller to log,
//! and stream errors at runtime are only logged.

use crate::error::AudioError;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use dasp_sample::Sample;
use std::collections::VecDeque;
use std::fs::File;
use std::os::unix::io::AsRawFd;
use std::sync::{Arc, Mutex};

/// Seconds of audio the queue may hold before the oldest samples are dropped
const QUEUE_SECONDS: usize = 2;

/// RAII guard to suppress stderr during ALSA device enumeration
/// Restores stderr when dropped
struct StderrSuppressor {
    saved_fd: i32,
    dev_null: File,
}

impl StderrSuppressor {
    fn new() -> Option<Self> {
        let dev_null = File::open("/dev/null").ok()?;

        let saved_fd = unsafe { libc::dup(2) };
        if saved_fd < 0 {
            return None;
        }

        let dup2_result = unsafe { libc::dup2(dev_null.as_raw_fd(), 2) };
        if dup2_result < 0 {
            unsafe {
                libc::close(saved_fd);
            }
            return None;
        }

        Some(Self { saved_fd, dev_null })
    }
}

impl Drop for StderrSuppressor {
    fn drop(&mut self) {
        unsafe {
            libc::dup2(self.saved_fd, 2);
            libc::close(self.saved_fd);
        }
        let _ = &self.dev_null; // Keep dev_null alive until here
    }
}

/// Bounded mono sample queue shared with the audio callback
#[derive(Clone)]
pub struct SampleQueue {
    inner: Arc<Mutex<VecDeque<f32>>>,
    capacity: usize,
}

impl SampleQueue {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Arc::new(Mutex::new(VecDeque::with_capacity(capacity))),
            capacity,
        }
    }

    /// Append samples, discarding the oldest ones past capacity
    pub fn push(&self, samples: &[f64]) {
        if let Ok(mut queue) = self.inner.lock() {
            queue.extend(samples.iter().map(|s| s.to_sample::<f32>()));
            let excess = queue.len().saturating_sub(self.capacity);
            if excess > 0 {
                queue.drain(..excess);
            }
        }
    }

    /// Fill interleaved `data` with queued samples copied to every channel; silence on underrun
    pub fn fill_frames(&self, data: &mut [f32], channels: usize) {
        let channels = channels.max(1);
        match self.inner.lock() {
            Ok(mut queue) => {
                for frame in data.chunks_mut(channels) {
                    let sample = queue.pop_front().unwrap_or(f32::EQUILIBRIUM);
                    frame.fill(sample);
                }
            }
            Err(_) => data.fill(f32::EQUILIBRIUM),
        }
    }

    pub fn len(&self) -> usize {
        self.inner.lock().map(|q| q.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Running output stream; dropping it releases the device
pub struct Monitor {
    queue: SampleQueue,
    _stream: cpal::Stream,
}

impl Monitor {
    pub fn open(sample_rate: u32) -> Result<Self, AudioError> {
        let stderr_guard = StderrSuppressor::new();

        let host = cpal::default_host();
        log::debug!("audio host: {:?}", host.id());
        let device = host
            .default_output_device()
            .ok_or_else(|| AudioError::Playback("no output device found".to_string()))?;
        let name = device.name().unwrap_or_else(|_| "Unknown".to_string());

        let supported = device
            .default_output_config()
            .map_err(|e| AudioError::Playback(format!("no supported config: {}", e)))?;
        let channels = supported.channels();
        if channels == 0 {
            return Err(AudioError::Playback("device reported 0 channels".to_string()));
        }

        let stream_config = cpal::StreamConfig {
            channels,
            sample_rate: cpal::SampleRate(sample_rate),
            buffer_size: cpal::BufferSize::Default,
        };

        let queue = SampleQueue::new(sample_rate as usize * QUEUE_SECONDS);
        let callback_queue = queue.clone();
        let stream = device
            .build_output_stream(
                &stream_config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    callback_queue.fill_frames(data, channels as usize);
                },
                |err| log::warn!("audio stream error: {}", err),
                None,
            )
            .map_err(|e| AudioError::Playback(format!("failed to build stream: {}", e)))?;
        stream
            .play()
            .map_err(|e| AudioError::Playback(format!("failed to start stream: {}", e)))?;

        drop(stderr_guard);
        log::info!("playback on {} ({} Hz, {} channels)", name, sample_rate, channels);

        Ok(Self {
            queue,
            _stream: stream,
        })
    }

    pub fn push(&self, window: &[f64]) {
        self.queue.push(window);
    }

    /// Samples waiting to be played
    pub fn queued(&self) -> usize {
        self.queue.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn queue_drops_oldest_past_capacity() {
        let queue = SampleQueue::new(4);
        queue.push(&[0.1, 0.2, 0.3]);
        queue.push(&[0.4, 0.5, 0.6]);
        assert_eq!(queue.len(), 4);

        let mut out = [0.0f32; 4];
        queue.fill_frames(&mut out, 1);
        assert_eq!(out, [0.3, 0.4, 0.5, 0.6]);
    }

    #[test]
    fn frames_duplicate_mono_and_pad_with_silence() {
        let queue = SampleQueue::new(16);
        queue.push(&[0.5, -0.5]);
        let mut out = [1.0f32; 6];
        queue.fill_frames(&mut out, 2);
        assert_eq!(out, [0.5, 0.5, -0.5, -0.5, 0.0, 0.0]);
        assert!(queue.is_empty());
    }
}
