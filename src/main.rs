mod app;
mod audio;
mod canvas;
mod config;
mod error;
mod settings;
mod spectrum;
mod terminal;
mod visualizer;

use clap::Parser;
use config::constants::{DEBUG_LOG_MODE, DEBUG_LOG_PATH};
use config::VisualizerConfig;
use error::Error;
use settings::Settings;
use std::fs::{File, OpenOptions};
use std::os::unix::fs::OpenOptionsExt;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "specterm")]
#[command(author = "Terminal Art Generator")]
#[command(version = "0.1.0")]
#[command(about = "Terminal audio spectrum visualizer: FFT bars drawn in place", long_about = None)]
struct Cli {
    /// Media file to analyze (anything ffmpeg can decode)
    file: PathBuf,

    /// Number of frequency bars
    #[arg(short, long)]
    bars: Option<usize>,

    /// FFT window size in samples (power of two)
    #[arg(short = 'n', long)]
    fft_size: Option<usize>,

    /// Growth factor between bucket boundaries (> 1.0)
    #[arg(short, long)]
    growth: Option<f64>,

    /// Fixed bar width in columns (default: fit to terminal)
    #[arg(short = 'w', long)]
    bar_width: Option<usize>,

    /// Minimum delay between frames in milliseconds (default: one window of audio)
    #[arg(short, long)]
    delay_ms: Option<u64>,

    /// Do not play the audio while visualizing
    #[arg(long)]
    no_playback: bool,

    /// Decoder executable
    #[arg(long)]
    ffmpeg: Option<String>,

    /// Write a debug log (see --log-file)
    #[arg(long)]
    debug: bool,

    /// Debug log destination
    #[arg(long, default_value = DEBUG_LOG_PATH)]
    log_file: PathBuf,
}

impl Cli {
    fn apply(&self, config: &mut VisualizerConfig) {
        if let Some(bars) = self.bars {
            config.bar_count = bars;
        }
        if let Some(size) = self.fft_size {
            config.window_size = size;
        }
        if let Some(growth) = self.growth {
            config.growth = growth;
        }
        if self.bar_width.is_some() {
            config.bar_width = self.bar_width;
        }
        if let Some(ms) = self.delay_ms {
            config.frame_delay = Some(Duration::from_millis(ms));
        }
        if self.no_playback {
            config.playback = false;
        }
        if let Some(ref ffmpeg) = self.ffmpeg {
            config.ffmpeg = ffmpeg.clone();
        }
    }
}

/// Open the debug log, preferring an exclusive create and falling back to truncating
fn open_log_file(path: &Path) -> std::io::Result<File> {
    OpenOptions::new()
        .write(true)
        .create_new(true)
        .mode(DEBUG_LOG_MODE)
        .open(path)
        .or_else(|_| OpenOptions::new().write(true).truncate(true).open(path))
}

/// stdout and stderr belong to the animation, so logs only go to a file
/// (`--debug`) or, when RUST_LOG is set explicitly, to stderr
fn init_logging(cli: &Cli) {
    let mut builder = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("off"));
    if cli.debug {
        builder.filter_level(log::LevelFilter::Debug);
        builder.parse_default_env();
        match open_log_file(&cli.log_file) {
            Ok(file) => {
                builder.target(env_logger::Target::Pipe(Box::new(file)));
            }
            Err(e) => eprintln!("Cannot open log file {}: {}", cli.log_file.display(), e),
        }
    }
    let _ = builder.try_init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(&cli);

    let settings = match Settings::load() {
        Ok(s) => s,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::from(2);
        }
    };

    let mut config = VisualizerConfig::new(cli.file.clone());
    settings.apply(&mut config);
    cli.apply(&mut config);
    log::debug!("config: {:?}", config);

    match app::run(&config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            eprintln!("{}", e);
            ExitCode::from(Error::exit_code(&e))
        }
    }
}
