//! Bar layout inside a bordered frame.
//!
//! Geometry is computed directly from the bar index and height; the frame's
//! bottom border row is the baseline every bar grows up from.

use crate::canvas::{Canvas, Point};
use crate::error::CanvasError;

/// Horizontal bar metrics, in columns
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BarStyle {
    pub width: usize,
    pub spacing: usize,
    pub padding: usize,
}

impl BarStyle {
    /// Widest bars that still fit `bars` bars inside a frame `cols` wide
    pub fn fit(cols: usize, bars: usize, spacing: usize, padding: usize) -> Self {
        let inner = cols.saturating_sub(2 * padding.max(1) + 1);
        let gaps = bars.saturating_sub(1) * spacing;
        let width = (inner.saturating_sub(gaps) / bars.max(1)).max(1);
        Self { width, spacing, padding }
    }
}

/// Inclusive rectangle
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rect {
    pub top_left: Point,
    pub bottom_right: Point,
}

/// One bar's placement for the current frame
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BarRect {
    /// Column span and vertical extent; `top_left.row > bottom_right.row` when empty
    pub rect: Rect,
    /// Number of filled rows
    pub fill_rows: usize,
}

#[derive(Debug)]
pub struct Layout {
    pub frame: Rect,
    pub bars: Vec<BarRect>,
}

pub struct Visualizer {
    top_left: Point,
    rows: usize,
    cols: usize,
    style: BarStyle,
}

impl Visualizer {
    pub fn new(top_left: Point, rows: usize, cols: usize, style: BarStyle) -> Self {
        Self { top_left, rows, cols, style }
    }

    /// Bottom border row; bars rest directly on top of it
    pub fn frame_bottom(&self) -> usize {
        self.top_left.row + self.rows.saturating_sub(1)
    }

    /// Interior height (frame minus top and bottom border)
    pub fn usable_rows(&self) -> usize {
        self.rows.saturating_sub(2)
    }

    fn frame(&self) -> Rect {
        Rect {
            top_left: self.top_left,
            bottom_right: Point::new(
                self.frame_bottom(),
                self.top_left.col + self.cols.saturating_sub(1),
            ),
        }
    }

    /// Bar rectangles for `heights` (each clamped to [0, 1]).
    ///
    /// Bars that would run into the right border are left out.
    pub fn layout(&self, heights: &[f64]) -> Layout {
        let frame = self.frame();
        let right_limit = frame.bottom_right.col;
        let bottom = self.frame_bottom();
        let usable = self.usable_rows();
        let BarStyle { width, spacing, padding } = self.style;
        // padding is measured from the frame edge, so 0 would sit on the border
        let padding = padding.max(1);

        let mut bars = Vec::with_capacity(heights.len());
        for (i, &height) in heights.iter().enumerate() {
            let left = self.top_left.col + padding + i * (width + spacing);
            let right = left + width.max(1) - 1;
            if right >= right_limit {
                break;
            }

            let h = if height.is_finite() { height.clamp(0.0, 1.0) } else { 0.0 };
            let fill_rows = ((usable as f64 * h).ceil() as usize).min(usable);
            let top = bottom - fill_rows;
            bars.push(BarRect {
                rect: Rect {
                    top_left: Point::new(top, left),
                    bottom_right: Point::new(bottom.saturating_sub(1), right),
                },
                fill_rows,
            });
        }

        Layout { frame, bars }
    }

    /// Border once, then one filled rectangle per bar
    pub fn draw(&self, canvas: &mut Canvas, heights: &[f64]) -> Result<(), CanvasError> {
        let layout = self.layout(heights);
        canvas.draw_bordered_rect(layout.frame.top_left, layout.frame.bottom_right)?;
        for bar in &layout.bars {
            if bar.fill_rows > 0 {
                canvas.draw_filled_rect(bar.rect.top_left, bar.rect.bottom_right)?;
            }
        }
        Ok(())
    }
}
