//! PCM input: an ffmpeg child process decoding the media file to raw s32le.

use crate::error::AudioError;
use dasp_sample::Sample;
use std::collections::VecDeque;
use std::io::{self, BufRead, BufReader, Read};
use std::path::Path;
use std::process::{Child, ChildStdout, Command, Stdio};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

/// Bytes per decoded sample (signed 32-bit little endian)
pub const SAMPLE_BYTES: usize = 4;

/// Reads fixed-size windows of mono s32le samples from any byte stream
pub struct PcmReader<R> {
    inner: R,
    bytes: Vec<u8>,
}

impl<R: Read> PcmReader<R> {
    pub fn new(inner: R) -> Self {
        Self { inner, bytes: Vec::new() }
    }

    /// Next `len` samples scaled to [-1, 1), or `None` once the stream ends.
    ///
    /// A short final read also counts as the end; its partial window is dropped.
    pub fn read_window(&mut self, len: usize) -> Result<Option<Vec<f64>>, AudioError> {
        self.bytes.resize(len * SAMPLE_BYTES, 0);
        let filled = fill(&mut self.inner, &mut self.bytes).map_err(AudioError::Read)?;
        if filled < self.bytes.len() {
            log::debug!("end of PCM stream ({} trailing bytes dropped)", filled);
            return Ok(None);
        }

        let window = self
            .bytes
            .chunks_exact(SAMPLE_BYTES)
            .map(|b| i32::from_le_bytes([b[0], b[1], b[2], b[3]]).to_sample::<f64>())
            .collect();
        Ok(Some(window))
    }
}

/// Read until `buf` is full or the stream reports EOF; returns bytes read
fn fill<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

/// Lines of decoder stderr kept for the failure message
const STDERR_TAIL_LINES: usize = 8;
/// Longest stderr line read at once, in bytes; longer lines are split
const STDERR_LINE_MAX: usize = 512;

/// Drains a child's stderr on its own thread so the child never blocks on a
/// full pipe; the last few lines are kept for error reporting.
struct StderrTail {
    lines: Arc<Mutex<VecDeque<String>>>,
    handle: Option<JoinHandle<()>>,
}

impl StderrTail {
    fn start<R: Read + Send + 'static>(pipe: R) -> Self {
        let lines = Arc::new(Mutex::new(VecDeque::with_capacity(STDERR_TAIL_LINES)));
        let shared = Arc::clone(&lines);
        let handle = thread::spawn(move || {
            let mut reader = BufReader::new(pipe);
            let mut raw = Vec::new();
            loop {
                raw.clear();
                match reader.by_ref().take(STDERR_LINE_MAX as u64).read_until(b'\n', &mut raw) {
                    Ok(0) | Err(_) => break,
                    Ok(_) => {}
                }
                let line = String::from_utf8_lossy(&raw).trim().to_string();
                if line.is_empty() {
                    continue;
                }
                log::warn!("decoder: {}", line);
                if let Ok(mut tail) = shared.lock() {
                    if tail.len() == STDERR_TAIL_LINES {
                        tail.pop_front();
                    }
                    tail.push_back(line);
                }
            }
        });
        Self {
            lines,
            handle: Some(handle),
        }
    }

    /// Wait for the pipe to close, then return the last non-empty line
    fn finish(&mut self) -> String {
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
        self.lines
            .lock()
            .ok()
            .and_then(|tail| tail.back().cloned())
            .unwrap_or_default()
    }
}

/// ffmpeg child decoding one file; killed and reaped on drop
pub struct Decoder {
    child: Child,
    reader: PcmReader<ChildStdout>,
    stderr: StderrTail,
}

impl Decoder {
    /// Start `ffmpeg` downmixing `input` to mono s32le at `sample_rate`
    pub fn spawn(ffmpeg: &str, input: &Path, sample_rate: u32) -> Result<Self, AudioError> {
        log::info!("decoding {} with {} at {} Hz", input.display(), ffmpeg, sample_rate);
        let mut command = Command::new(ffmpeg);
        command
            .args(["-nostdin", "-loglevel", "error", "-i"])
            .arg(input)
            .args(["-f", "s32le", "-acodec", "pcm_s32le", "-ac", "1", "-ar"])
            .arg(sample_rate.to_string())
            .arg("-");
        Self::from_command(command)
    }

    /// Run any command that writes s32le PCM to stdout
    pub fn from_command(mut command: Command) -> Result<Self, AudioError> {
        let mut child = command
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(AudioError::Spawn)?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| AudioError::Decoder("decoder stdout not captured".to_string()))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| AudioError::Decoder("decoder stderr not captured".to_string()))?;

        Ok(Self {
            child,
            reader: PcmReader::new(stdout),
            stderr: StderrTail::start(stderr),
        })
    }

    pub fn read_window(&mut self, len: usize) -> Result<Option<Vec<f64>>, AudioError> {
        self.reader.read_window(len)
    }

    /// Wait for the decoder after end of stream and surface a failed exit
    pub fn finish(&mut self) -> Result<(), AudioError> {
        let status = self.child.wait().map_err(AudioError::Read)?;
        let detail = self.stderr.finish();
        if status.success() {
            log::info!("decoder finished");
            return Ok(());
        }
        Err(AudioError::Decoder(format!("{} {}", status, detail).trim().to_string()))
    }
}

impl Drop for Decoder {
    fn drop(&mut self) {
        if let Ok(None) = self.child.try_wait() {
            let _ = self.child.kill();
            let _ = self.child.wait();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn pcm(samples: &[i32]) -> Vec<u8> {
        samples.iter().flat_map(|s| s.to_le_bytes()).collect()
    }

    #[test]
    fn reads_full_windows_then_ends() {
        let bytes = pcm(&[0, i32::MAX, i32::MIN, 1 << 30, 0, 0, 7]);
        let mut reader = PcmReader::new(Cursor::new(bytes));

        let first = reader.read_window(3).unwrap().unwrap();
        assert_eq!(first[0], 0.0);
        assert!((first[1] - 1.0).abs() < 1e-6);
        assert_eq!(first[2], -1.0);

        let second = reader.read_window(3).unwrap().unwrap();
        assert_eq!(second[0], 0.5);

        // one sample left: short read is end of stream
        assert!(reader.read_window(3).unwrap().is_none());
    }

    #[test]
    fn empty_stream_ends_immediately() {
        let mut reader = PcmReader::new(Cursor::new(Vec::new()));
        assert!(reader.read_window(2048).unwrap().is_none());
    }

    #[test]
    fn partial_sample_bytes_end_the_stream() {
        let mut bytes = pcm(&[5, 6]);
        bytes.pop();
        let mut reader = PcmReader::new(Cursor::new(bytes));
        assert!(reader.read_window(2).unwrap().is_none());
    }

    /// Hands out one byte per read call, like a slow pipe
    struct Trickle(Cursor<Vec<u8>>);

    impl Read for Trickle {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            let end = buf.len().min(1);
            self.0.read(&mut buf[..end])
        }
    }

    #[test]
    fn fragmented_reads_are_reassembled() {
        let mut reader = PcmReader::new(Trickle(Cursor::new(pcm(&[1 << 30, -(1 << 30)]))));
        assert_eq!(reader.read_window(2).unwrap().unwrap(), vec![0.5, -0.5]);
    }

    struct Broken;

    impl Read for Broken {
        fn read(&mut self, _: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "gone"))
        }
    }

    #[test]
    fn io_errors_are_fatal() {
        let mut reader = PcmReader::new(Broken);
        assert!(matches!(reader.read_window(4), Err(AudioError::Read(_))));
    }

    #[test]
    fn missing_decoder_fails_to_spawn() {
        let result = Decoder::spawn("/nonexistent/ffmpeg-binary", Path::new("in.mp3"), 44100);
        assert!(matches!(result, Err(AudioError::Spawn(_))));
    }

    fn shell(script: &str) -> Decoder {
        let mut command = Command::new("sh");
        command.args(["-c", script]);
        Decoder::from_command(command).unwrap()
    }

    #[test]
    fn noisy_stderr_does_not_stall_the_stream() {
        // far more stderr than a pipe buffer holds, written before any PCM
        let (tx, rx) = std::sync::mpsc::channel();
        thread::spawn(move || {
            let mut decoder = shell("head -c 200000 /dev/zero | tr '\\0' e >&2; head -c 16384 /dev/zero");
            let mut windows = 0;
            while let Ok(Some(_)) = decoder.read_window(2048) {
                windows += 1;
            }
            let _ = tx.send((windows, decoder.finish().is_ok()));
        });
        let (windows, finished) = rx
            .recv_timeout(std::time::Duration::from_secs(10))
            .expect("decoder stalled on a full stderr pipe");
        assert_eq!(windows, 2);
        assert!(finished);
    }

    #[test]
    fn failed_decoder_reports_its_last_stderr_line() {
        let mut decoder = shell("echo 'first complaint' >&2; echo 'Invalid data found when processing input' >&2; exit 1");
        assert!(decoder.read_window(2048).unwrap().is_none());
        match decoder.finish() {
            Err(AudioError::Decoder(msg)) => {
                assert!(msg.contains("Invalid data found"), "{}", msg);
                assert!(!msg.contains("first complaint"), "{}", msg);
            }
            other => panic!("expected decoder failure, got {:?}", other),
        }
    }

    #[test]
    fn clean_exit_finishes_ok() {
        let mut decoder = shell("head -c 8 /dev/zero");
        assert_eq!(decoder.read_window(2).unwrap().unwrap(), vec![0.0, 0.0]);
        assert!(decoder.read_window(2).unwrap().is_none());
        assert!(decoder.finish().is_ok());
    }
}
