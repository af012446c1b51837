#![forbid(unsafe_code)]

//! Plasma field generator (cell-space).
//!
//! Three periodic oscillators are summed per cell. Their phases depend on
//! the cell position and on simulated time only, so moiré-like interference
//! emerges without any per-cell state: every frame is a fresh evaluation.

use crate::frame::FrameBuffer;
use crate::palette::Palette;

// ---------------------------------------------------------------------------
// Wave Functions
// ---------------------------------------------------------------------------

/// Spatial frequency of oscillator A.
pub const K1: f64 = 10.0;
/// Spatial frequency of oscillator B.
pub const K1B: f64 = 10.0;
/// Time divisor of oscillator B's x rotation.
pub const K2: f64 = 2.0;
/// Time divisor of oscillator B's y rotation.
pub const K3: f64 = 3.0;
/// Time divisor of oscillator C's horizontal drift.
pub const K4: f64 = 5.0;
/// Time divisor of oscillator C's vertical drift.
pub const K5: f64 = 3.0;

/// Horizontal wave travelling with time.
#[inline]
pub fn oscillator_a(x: f64, t: f64) -> f64 {
    (x * K1 + t).sin()
}

/// Wave whose direction rotates slowly with time.
#[inline]
pub fn oscillator_b(x: f64, y: f64, t: f64) -> f64 {
    (K1B * (x * (t / K2).sin() + y * (t / K3).cos()) + t).sin()
}

/// Circular ripple around a wandering center.
#[inline]
pub fn oscillator_c(x: f64, y: f64, t: f64) -> f64 {
    let cx = x + 0.5 * (t / K4).sin();
    let cy = y + 0.5 * (t / K5).cos();
    ((100.0 * (cx * cx + cy * cy) + 1.0).sqrt() + t).sin()
}

/// Raw field value at field coordinates `(x, y)` and simulated time `t`.
///
/// Returns the sum of the three oscillators, in `[-3, 3]`.
///
/// # Determinism
///
/// Given identical inputs, this function always returns the same output.
#[inline]
pub fn evaluate(x: f64, y: f64, t: f64) -> f64 {
    oscillator_a(x, t) + oscillator_b(x, y, t) + oscillator_c(x, y, t)
}

/// Map a raw field value from `[-3, 3]` to `[0, 1]`.
#[inline]
pub fn normalize(value: f64) -> f64 {
    (value + 3.0) / 6.0
}

// ---------------------------------------------------------------------------
// Geometry
// ---------------------------------------------------------------------------

/// Default side length of the square LED grid.
pub const DEFAULT_GRID_SIZE: u16 = 10;
/// Default extent of the field window sampled by the grid.
pub const DEFAULT_FIELD_SIZE: f64 = 0.25;

/// Placement of the LED grid inside the field.
///
/// The grid samples a `field_size × field_size` window centered on the
/// origin. Column 0 is the left edge (`x = -field_size/2`), row 0 the top
/// edge (`y = +field_size/2`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldGeometry {
    pub width: u16,
    pub height: u16,
    pub field_size: f64,
}

impl FieldGeometry {
    #[must_use]
    pub const fn new(width: u16, height: u16, field_size: f64) -> Self {
        Self {
            width,
            height,
            field_size,
        }
    }

    /// Number of cells.
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.width as usize * self.height as usize
    }

    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Field coordinates of cell `(col, row)`.
    #[must_use]
    pub fn position(&self, col: u16, row: u16) -> (f64, f64) {
        let half = self.field_size / 2.0;
        let x = -half + f64::from(col) * step(self.field_size, self.width);
        let y = half - f64::from(row) * step(self.field_size, self.height);
        (x, y)
    }

    /// Normalized field value of cell `(col, row)` at time `t`.
    #[inline]
    #[must_use]
    pub fn sample(&self, col: u16, row: u16, t: f64) -> f64 {
        let (x, y) = self.position(col, row);
        normalize(evaluate(x, y, t))
    }
}

impl Default for FieldGeometry {
    fn default() -> Self {
        Self::new(DEFAULT_GRID_SIZE, DEFAULT_GRID_SIZE, DEFAULT_FIELD_SIZE)
    }
}

#[inline]
fn step(field_size: f64, cells: u16) -> f64 {
    if cells > 1 {
        field_size / f64::from(cells - 1)
    } else {
        0.0
    }
}

/// Evaluate the whole grid at time `t` into `out`, resizing it if needed.
pub fn render_into(geometry: &FieldGeometry, palette: &Palette, t: f64, out: &mut FrameBuffer) {
    out.resize(geometry.width, geometry.height);
    for row in 0..geometry.height {
        for col in 0..geometry.width {
            let color = palette.color_at(geometry.sample(col, row, t));
            out.set(col, row, color);
        }
    }
}

/// Evaluate the whole grid at time `t`.
#[must_use]
pub fn render_frame(geometry: &FieldGeometry, palette: &Palette, t: f64) -> FrameBuffer {
    let mut frame = FrameBuffer::new(geometry.width, geometry.height);
    render_into(geometry, palette, t, &mut frame);
    frame
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
