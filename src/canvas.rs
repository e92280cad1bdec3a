//! Character-grid canvas with rectangle primitives and in-place redraw.
//!
//! The grid is addressed as `(row, col)` from the top-left corner. Drawing
//! never touches the terminal; only [`Canvas::render`] writes, and it leaves
//! the cursor back at the top-left of the block so the next frame
//! overwrites this one instead of scrolling.

use crate::error::CanvasError;
use crossterm::cursor::{MoveToColumn, MoveUp};
use crossterm::queue;
use std::io::{self, Write};
use std::time::{Duration, Instant};

pub const BLANK: char = ' ';
pub const FILLED: char = '█';

/// Box-drawing glyphs used by [`Canvas::draw_bordered_rect`]
pub mod glyphs {
    pub const TOP_LEFT: char = '┌';
    pub const TOP_RIGHT: char = '┐';
    pub const BOTTOM_LEFT: char = '└';
    pub const BOTTOM_RIGHT: char = '┘';
    pub const HORIZONTAL: char = '─';
    pub const VERTICAL: char = '│';
}

/// A cell position on the canvas
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Point {
    pub row: usize,
    pub col: usize,
}

impl Point {
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}

pub struct Canvas {
    rows: usize,
    cols: usize,
    grid: Vec<Vec<char>>,
    frame_interval: Duration,
    last_render: Option<Instant>,
}

impl Canvas {
    /// Allocate a blank `rows` x `cols` grid
    pub fn new(rows: usize, cols: usize) -> Result<Self, CanvasError> {
        if rows == 0 || cols == 0 {
            return Err(CanvasError::InvalidDimension { rows, cols });
        }
        Ok(Self {
            rows,
            cols,
            grid: vec![vec![BLANK; cols]; rows],
            frame_interval: Duration::ZERO,
            last_render: None,
        })
    }

    /// Minimum time between two consecutive [`render`](Self::render) calls
    pub fn with_frame_interval(mut self, interval: Duration) -> Self {
        self.frame_interval = interval;
        self
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn cell(&self, row: usize, col: usize) -> Option<char> {
        self.grid.get(row).and_then(|r| r.get(col)).copied()
    }

    /// Reset every cell to blank
    pub fn clear(&mut self) {
        for row in &mut self.grid {
            row.fill(BLANK);
        }
    }

    fn check(&self, row: usize, col: usize) -> Result<(), CanvasError> {
        if row >= self.rows || col >= self.cols {
            return Err(CanvasError::OutOfBounds {
                row,
                col,
                rows: self.rows,
                cols: self.cols,
            });
        }
        Ok(())
    }

    pub fn draw_cell(&mut self, row: usize, col: usize, ch: char) -> Result<(), CanvasError> {
        self.check(row, col)?;
        self.grid[row][col] = ch;
        Ok(())
    }

    pub fn draw_point(&mut self, point: Point, ch: char) -> Result<(), CanvasError> {
        self.draw_cell(point.row, point.col, ch)
    }

    /// Fill the inclusive rectangle with solid blocks.
    ///
    /// An inverted rectangle is empty and draws nothing. Bounds are checked
    /// up front so a failing call leaves the grid untouched.
    pub fn draw_filled_rect(&mut self, top_left: Point, bottom_right: Point) -> Result<(), CanvasError> {
        if top_left.row > bottom_right.row || top_left.col > bottom_right.col {
            return Ok(());
        }
        self.check(bottom_right.row, bottom_right.col)?;

        for row in &mut self.grid[top_left.row..=bottom_right.row] {
            row[top_left.col..=bottom_right.col].fill(FILLED);
        }
        Ok(())
    }

    /// Draw a one-cell border around the inclusive rectangle, interior untouched.
    ///
    /// With a width or height below 3 there is no room for edges along that
    /// axis and only the corners are drawn.
    pub fn draw_bordered_rect(&mut self, top_left: Point, bottom_right: Point) -> Result<(), CanvasError> {
        if top_left.row > bottom_right.row || top_left.col > bottom_right.col {
            return Ok(());
        }
        self.check(bottom_right.row, bottom_right.col)?;

        let (top, left) = (top_left.row, top_left.col);
        let (bottom, right) = (bottom_right.row, bottom_right.col);

        for row in top + 1..bottom {
            self.grid[row][left] = glyphs::VERTICAL;
            self.grid[row][right] = glyphs::VERTICAL;
        }
        for col in left + 1..right {
            self.grid[top][col] = glyphs::HORIZONTAL;
            self.grid[bottom][col] = glyphs::HORIZONTAL;
        }

        self.grid[top][left] = glyphs::TOP_LEFT;
        self.grid[top][right] = glyphs::TOP_RIGHT;
        self.grid[bottom][left] = glyphs::BOTTOM_LEFT;
        self.grid[bottom][right] = glyphs::BOTTOM_RIGHT;
        Ok(())
    }

    /// Rows joined by newlines, without any control sequences
    pub fn to_text(&self) -> String {
        self.grid
            .iter()
            .map(|row| row.iter().collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Write the grid to `out` and move the cursor back to the block's top-left.
    ///
    /// Rows end in `\r\n` so the output is laid out the same in raw and cooked
    /// terminal modes. Blocks until at least the frame interval has passed
    /// since the previous render.
    pub fn render<W: Write>(&mut self, out: &mut W) -> io::Result<()> {
        for row in &self.grid {
            let line: String = row.iter().collect();
            out.write_all(line.as_bytes())?;
            out.write_all(b"\r\n")?;
        }
        queue!(out, MoveUp(self.rows as u16), MoveToColumn(0))?;
        out.flush()?;

        if let Some(last) = self.last_render {
            let elapsed = last.elapsed();
            if elapsed < self.frame_interval {
                std::thread::sleep(self.frame_interval - elapsed);
            }
        }
        self.last_render = Some(Instant::now());
        Ok(())
    }
}
