#![forbid(unsafe_code)]

//! Per-tick color buffers and the LED chain byte layout.

use crate::color::Rgb;

/// The colors selected for every grid cell in one tick, row-major.
///
/// Recomputed from scratch every tick; it owns no device resources.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FrameBuffer {
    width: u16,
    height: u16,
    cells: Vec<Rgb>,
}

impl FrameBuffer {
    /// Create a black frame.
    #[must_use]
    pub fn new(width: u16, height: u16) -> Self {
        Self {
            width,
            height,
            cells: vec![Rgb::BLACK; width as usize * height as usize],
        }
    }

    /// Resize in place. Contents are unspecified afterwards.
    pub fn resize(&mut self, width: u16, height: u16) {
        self.width = width;
        self.height = height;
        self.cells
            .resize(width as usize * height as usize, Rgb::BLACK);
    }

    #[inline]
    #[must_use]
    pub const fn width(&self) -> u16 {
        self.width
    }

    #[inline]
    #[must_use]
    pub const fn height(&self) -> u16 {
        self.height
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    #[inline]
    fn index(&self, col: u16, row: u16) -> Option<usize> {
        (col < self.width && row < self.height)
            .then(|| row as usize * self.width as usize + col as usize)
    }

    #[inline]
    #[must_use]
    pub fn get(&self, col: u16, row: u16) -> Option<Rgb> {
        self.index(col, row).map(|i| self.cells[i])
    }

    /// Set a cell. Out-of-bounds writes are ignored.
    #[inline]
    pub fn set(&mut self, col: u16, row: u16, color: Rgb) {
        if let Some(i) = self.index(col, row) {
            self.cells[i] = color;
        }
    }

    pub fn fill(&mut self, color: Rgb) {
        self.cells.fill(color);
    }

    #[inline]
    #[must_use]
    pub fn as_slice(&self) -> &[Rgb] {
        &self.cells
    }

    /// Iterate `(col, row, color)` in row-major order.
    pub fn iter_cells(&self) -> impl Iterator<Item = (u16, u16, Rgb)> + '_ {
        let width = self.width.max(1);
        self.cells.iter().enumerate().map(move |(i, c)| {
            let col = (i % width as usize) as u16;
            let row = (i / width as usize) as u16;
            (col, row, *c)
        })
    }
}

/// Byte layout of a physical LED chain.
///
/// The chain snakes through the grid: LED 0 is the top-left cell, even rows
/// run left to right and odd rows run right to left. Each LED takes three
/// bytes, red first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LedStrip {
    width: u16,
    height: u16,
}

impl LedStrip {
    #[must_use]
    pub const fn new(width: u16, height: u16) -> Self {
        Self { width, height }
    }

    /// Length of one encoded frame in bytes.
    #[inline]
    #[must_use]
    pub const fn byte_len(&self) -> usize {
        3 * self.width as usize * self.height as usize
    }

    /// Byte offset of cell `(col, row)` in an encoded frame.
    #[inline]
    #[must_use]
    pub fn offset(&self, col: u16, row: u16) -> usize {
        let w = self.width as usize;
        let (col, row) = (col as usize, row as usize);
        let idx = if row % 2 == 0 {
            row * w + col
        } else {
            row * w + (w - col - 1)
        };
        3 * idx
    }

    /// Encode `frame` into `out`, passing every color through `correct`.
    ///
    /// `out` is cleared and resized to [`Self::byte_len`]. Cells outside the
    /// strip are skipped.
    pub fn encode_into<F>(&self, frame: &FrameBuffer, out: &mut Vec<u8>, mut correct: F)
    where
        F: FnMut(Rgb) -> Rgb,
    {
        out.clear();
        out.resize(self.byte_len(), 0);
        for (col, row, color) in frame.iter_cells() {
            if col >= self.width || row >= self.height {
                continue;
            }
            let off = self.offset(col, row);
            out[off..off + 3].copy_from_slice(&correct(color).channels());
        }
    }
}
