#![forbid(unsafe_code)]

//! Status screen shown above the terminal preview.

use std::fmt::Write as _;
use std::io::{self, Stdout, Write};

use crossterm::cursor::MoveTo;
use crossterm::queue;
use crossterm::style::{Print, ResetColor};
use crossterm::terminal::{Clear, ClearType};
use plasma_core::PaletteSet;
use plasma_runtime::{Status, StatusObserver};

use crate::keys::BINDINGS;

/// Anchor colors printed per status row.
pub const ANCHORS_PER_ROW: usize = 6;

/// Rows besides the anchor rows: gamma, palette, legend, and two blank
/// rows above the grid.
const FIXED_ROWS: usize = 5;

/// Column where the grid starts.
pub const GRID_COLUMN: u16 = 2;

/// Terminal rows reserved for the status block; the grid starts below.
///
/// Sized for the palette with the most anchors so no palette's block runs
/// into the grid.
#[must_use]
pub fn status_rows(palettes: &PaletteSet) -> u16 {
    let anchor_rows = palettes
        .iter()
        .map(|p| p.anchors().len().div_ceil(ANCHORS_PER_ROW))
        .max()
        .unwrap_or(0)
        .max(1);
    u16::try_from(FIXED_ROWS + anchor_rows).unwrap_or(u16::MAX)
}

/// The status block as plain text lines.
#[must_use]
pub fn status_lines(status: &Status<'_>) -> Vec<String> {
    let params = status.params;
    let mut lines = vec![
        format!(
            "gamma {:.1}   time step {:.2}",
            params.gamma, params.time_step
        ),
        format!(
            "palette {}/{}  {}",
            params.palette_index + 1,
            status.palette_count,
            status.palette.name()
        ),
    ];
    for chunk in status.palette.anchors().chunks(ANCHORS_PER_ROW) {
        let mut row = String::from(" ");
        for color in chunk {
            let _ = write!(row, " {color}");
        }
        lines.push(row);
    }
    lines.push(legend());
    lines
}

fn legend() -> String {
    let key = |i: usize| BINDINGS[i].0;
    format!(
        "{}/{} gamma -/+   {}/{} speed -/+   {}/{} palette -/+   {} quit",
        key(0),
        key(1),
        key(2),
        key(3),
        key(4),
        key(5),
        key(6)
    )
}

/// Draws [`status_lines`] in the top `rows` rows of the screen.
///
/// Every reserved row is rewritten, so a shorter block clears what a longer
/// one left behind. The whole block is written with one `write_all` so it
/// cannot interleave with a frame drawn by the animation thread on the same
/// terminal.
#[derive(Debug)]
pub struct StatusScreen<W: Write = Stdout> {
    out: W,
    rows: u16,
    scratch: Vec<u8>,
}

impl StatusScreen {
    #[must_use]
    pub fn stdout(rows: u16) -> Self {
        Self::new(io::stdout(), rows)
    }
}

impl<W: Write> StatusScreen<W> {
    pub fn new(out: W, rows: u16) -> Self {
        Self {
            out,
            rows,
            scratch: Vec::new(),
        }
    }

    pub fn get_ref(&self) -> &W {
        &self.out
    }

    pub fn draw(&mut self, status: &Status<'_>) -> io::Result<()> {
        self.scratch.clear();
        let buf = &mut self.scratch;
        let mut lines = status_lines(status).into_iter();
        for row in 0..self.rows {
            queue!(buf, MoveTo(0, row), ResetColor, Clear(ClearType::CurrentLine))?;
            if let Some(line) = lines.next() {
                queue!(buf, Print(line))?;
            }
        }
        self.out.write_all(&self.scratch)?;
        self.out.flush()
    }
}

impl<W: Write> StatusObserver for StatusScreen<W> {
    fn status(&mut self, status: &Status<'_>) -> io::Result<()> {
        self.draw(status)
    }
}
