//! Frame loop: capture -> transform -> bucketize -> layout -> render.
//!
//! One window of samples is read per frame and turned into fresh bar heights;
//! the canvas is reused and cleared before every redraw. Quit requests are
//! honoured between stages, never in the middle of one.

use crate::audio::{Decoder, Monitor, PcmReader};
use crate::canvas::{Canvas, Point};
use crate::config::VisualizerConfig;
use crate::error::{AudioError, Result};
use crate::spectrum::{analyze, AnalysisParams};
use crate::terminal::Terminal;
use crate::visualizer::{BarStyle, Visualizer};
use crossterm::cursor::{MoveDown, MoveToColumn};
use crossterm::queue;
use std::io::{self, stdout, Read, Write};

/// Anything that hands out sample windows until the stream ends
pub trait WindowSource {
    fn next_window(&mut self, len: usize) -> std::result::Result<Option<Vec<f64>>, AudioError>;
}

impl WindowSource for Decoder {
    fn next_window(&mut self, len: usize) -> std::result::Result<Option<Vec<f64>>, AudioError> {
        self.read_window(len)
    }
}

impl<R: Read> WindowSource for PcmReader<R> {
    fn next_window(&mut self, len: usize) -> std::result::Result<Option<Vec<f64>>, AudioError> {
        self.read_window(len)
    }
}

/// Why the loop stopped
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stop {
    EndOfStream,
    Cancelled,
}

/// Everything one frame needs, owned by the loop
pub struct FrameLoop<'a> {
    pub canvas: Canvas,
    pub visualizer: Visualizer,
    pub params: AnalysisParams,
    pub window_size: usize,
    pub monitor: Option<&'a Monitor>,
}

impl FrameLoop<'_> {
    /// Run frames until the source ends or `quit` says so; returns frames drawn.
    ///
    /// Whenever a frame was drawn the cursor is moved below it before
    /// returning, errors included.
    pub fn run<S, W, Q>(&mut self, source: &mut S, out: &mut W, quit: Q) -> Result<(u64, Stop)>
    where
        S: WindowSource,
        W: Write,
        Q: FnMut() -> io::Result<bool>,
    {
        let mut frames = 0u64;
        let result = self.frames(source, out, quit, &mut frames);

        if frames > 0 {
            // leave the cursor below the last frame
            queue!(out, MoveDown(self.canvas.rows() as u16), MoveToColumn(0))?;
        }
        out.flush()?;

        let stop = result?;
        log::info!("stopped after {} frames: {:?}", frames, stop);
        Ok((frames, stop))
    }

    fn frames<S, W, Q>(&mut self, source: &mut S, out: &mut W, mut quit: Q, frames: &mut u64) -> Result<Stop>
    where
        S: WindowSource,
        W: Write,
        Q: FnMut() -> io::Result<bool>,
    {
        loop {
            if quit()? {
                return Ok(Stop::Cancelled);
            }

            let window = match source.next_window(self.window_size)? {
                Some(w) => w,
                None => return Ok(Stop::EndOfStream),
            };
            if let Some(monitor) = self.monitor {
                monitor.push(&window);
                log::trace!("playback queue: {} samples", monitor.queued());
            }
            if quit()? {
                return Ok(Stop::Cancelled);
            }

            let spectrum = analyze(&window, self.params)?;
            if quit()? {
                return Ok(Stop::Cancelled);
            }

            self.canvas.clear();
            self.visualizer.draw(&mut self.canvas, &spectrum.bars)?;
            self.canvas.render(out)?;
            *frames += 1;
        }
    }
}

fn bar_style(config: &VisualizerConfig, cols: usize) -> BarStyle {
    match config.bar_width {
        Some(width) => BarStyle {
            width: width.max(1),
            spacing: config.bar_spacing,
            padding: config.bar_padding,
        },
        None => BarStyle::fit(cols, config.bar_count, config.bar_spacing, config.bar_padding),
    }
}

/// Visualize `config.input` until it ends or the user quits
pub fn run(config: &VisualizerConfig) -> Result<()> {
    config.validate()?;

    let (term_cols, term_rows) = Terminal::size()?;
    let (rows, cols) = config.canvas_size(term_cols, term_rows)?;
    let style = bar_style(config, cols);
    log::info!(
        "canvas {}x{}, {} bars of width {}, window {} @ {} Hz",
        rows,
        cols,
        config.bar_count,
        style.width,
        config.window_size,
        config.sample_rate
    );

    let mut decoder = Decoder::spawn(&config.ffmpeg, &config.input, config.sample_rate)?;

    let monitor = if config.playback {
        match Monitor::open(config.sample_rate) {
            Ok(m) => Some(m),
            Err(e) => {
                log::warn!("{}; continuing without playback", e);
                None
            }
        }
    } else {
        None
    };

    let mut frame_loop = FrameLoop {
        canvas: Canvas::new(rows, cols)?.with_frame_interval(config.frame_interval()),
        visualizer: Visualizer::new(Point::new(0, 0), rows, cols, style),
        params: AnalysisParams {
            growth: config.growth,
            bar_count: config.bar_count,
        },
        window_size: config.window_size,
        monitor: monitor.as_ref(),
    };

    let term = Terminal::new()?;
    let mut out = stdout().lock();
    let (_, stop) = frame_loop.run(&mut decoder, &mut out, || term.quit_requested())?;
    drop(term);

    match stop {
        Stop::EndOfStream => decoder.finish()?,
        Stop::Cancelled => log::info!("cancelled by user"),
    }
    Ok(())
}
