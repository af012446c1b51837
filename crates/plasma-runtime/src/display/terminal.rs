#![forbid(unsafe_code)]

use std::io::{self, Stdout, Write};

use crossterm::cursor::MoveTo;
use crossterm::queue;
use crossterm::style::{Color, Print, ResetColor, SetBackgroundColor};
use crossterm::terminal::{BeginSynchronizedUpdate, EndSynchronizedUpdate};
use plasma_core::{FrameBuffer, Rgb};

use super::{Display, DisplayError, GammaTable, check_bounds};

/// Terminal columns per LED; two spaces make a roughly square cell.
const CELL_COLUMNS: u16 = 2;

/// True-color preview of the LED grid.
///
/// Each LED is drawn as a two-column block with a 24-bit background color.
/// A frame is queued into a scratch buffer and written with a single
/// `write_all`, wrapped in a synchronized update, so other writers to the
/// same terminal can only land between frames.
#[derive(Debug)]
pub struct TerminalDisplay<W: Write + Send = Stdout> {
    out: W,
    origin: (u16, u16),
    staged: FrameBuffer,
    gamma: GammaTable,
    scratch: Vec<u8>,
    released: bool,
}

impl TerminalDisplay {
    /// Draw on stdout with the grid's top-left corner at `origin`.
    #[must_use]
    pub fn stdout(width: u16, height: u16, gamma: f64, origin: (u16, u16)) -> Self {
        Self::with_writer(io::stdout(), width, height, gamma, origin)
    }
}

impl<W: Write + Send> TerminalDisplay<W> {
    pub fn with_writer(out: W, width: u16, height: u16, gamma: f64, origin: (u16, u16)) -> Self {
        Self {
            out,
            origin,
            staged: FrameBuffer::new(width, height),
            gamma: GammaTable::new(gamma),
            scratch: Vec::new(),
            released: false,
        }
    }

    /// Terminal rows and columns covered by the grid, as `(columns, rows)`.
    #[must_use]
    pub const fn extent(&self) -> (u16, u16) {
        (
            self.staged.width().saturating_mul(CELL_COLUMNS),
            self.staged.height(),
        )
    }

    pub fn get_ref(&self) -> &W {
        &self.out
    }

    fn ensure_live(&self) -> Result<(), DisplayError> {
        if self.released {
            Err(DisplayError::Released)
        } else {
            Ok(())
        }
    }

    fn paint(&mut self) -> io::Result<()> {
        self.scratch.clear();
        let buf = &mut self.scratch;
        queue!(buf, BeginSynchronizedUpdate)?;
        for row in 0..self.staged.height() {
            let y = self.origin.1.saturating_add(row);
            queue!(buf, MoveTo(self.origin.0, y))?;
            for col in 0..self.staged.width() {
                let c = self
                    .gamma
                    .correct(self.staged.get(col, row).unwrap_or_default());
                queue!(
                    buf,
                    SetBackgroundColor(Color::Rgb {
                        r: c.r,
                        g: c.g,
                        b: c.b
                    }),
                    Print("  ")
                )?;
            }
        }
        queue!(buf, ResetColor, EndSynchronizedUpdate)?;
        self.out.write_all(&self.scratch)?;
        self.out.flush()
    }
}

impl<W: Write + Send> Display for TerminalDisplay<W> {
    fn name(&self) -> &'static str {
        "terminal"
    }

    fn size(&self) -> (u16, u16) {
        (self.staged.width(), self.staged.height())
    }

    fn set_cell(&mut self, x: u16, y: u16, color: Rgb) -> Result<(), DisplayError> {
        self.ensure_live()?;
        check_bounds(x, y, self.staged.width(), self.staged.height())?;
        self.staged.set(x, y, color);
        Ok(())
    }

    fn show(&mut self) -> Result<(), DisplayError> {
        self.ensure_live()?;
        self.paint()?;
        Ok(())
    }

    fn set_gamma(&mut self, gamma: f64) -> Result<(), DisplayError> {
        self.ensure_live()?;
        self.gamma = GammaTable::new(gamma);
        Ok(())
    }

    fn all_off(&mut self) -> Result<(), DisplayError> {
        self.ensure_live()?;
        self.staged.fill(Rgb::BLACK);
        self.paint()?;
        Ok(())
    }

    fn release(&mut self) -> Result<(), DisplayError> {
        if self.released {
            return Ok(());
        }
        self.released = true;
        queue!(self.out, ResetColor)?;
        self.out.flush()?;
        Ok(())
    }
}
