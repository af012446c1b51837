#![forbid(unsafe_code)]

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use plasma_core::{FrameBuffer, LedStrip, Rgb};
use tracing::debug;

use super::{Display, DisplayError, GammaTable, check_bounds};

/// Records frames as raw LED-chain bytes.
///
/// Every published frame is gamma-corrected and appended in serpentine
/// [`LedStrip`] order, three bytes per LED. The resulting file can be
/// streamed to a real grid controller frame by frame.
#[derive(Debug)]
pub struct FileDisplay<W: Write + Send = BufWriter<File>> {
    out: W,
    strip: LedStrip,
    staged: FrameBuffer,
    gamma: GammaTable,
    scratch: Vec<u8>,
    frames: u64,
    released: bool,
}

impl FileDisplay {
    /// Create (or truncate) the recording at `path`.
    pub fn create(
        path: impl AsRef<Path>,
        width: u16,
        height: u16,
        gamma: f64,
    ) -> Result<Self, DisplayError> {
        let file = File::create(path.as_ref())?;
        debug!(path = %path.as_ref().display(), "frame recording opened");
        Ok(Self::with_writer(BufWriter::new(file), width, height, gamma))
    }
}

impl<W: Write + Send> FileDisplay<W> {
    pub fn with_writer(out: W, width: u16, height: u16, gamma: f64) -> Self {
        let strip = LedStrip::new(width, height);
        Self {
            out,
            strip,
            staged: FrameBuffer::new(width, height),
            gamma: GammaTable::new(gamma),
            scratch: Vec::with_capacity(strip.byte_len()),
            frames: 0,
            released: false,
        }
    }

    /// Frames written so far, including the blank frame from `all_off`.
    #[must_use]
    pub const fn frames(&self) -> u64 {
        self.frames
    }

    /// Consume the display and return the writer.
    pub fn into_inner(self) -> W {
        self.out
    }

    fn ensure_live(&self) -> Result<(), DisplayError> {
        if self.released {
            Err(DisplayError::Released)
        } else {
            Ok(())
        }
    }

    fn write_staged(&mut self) -> Result<(), DisplayError> {
        let gamma = &self.gamma;
        self.strip
            .encode_into(&self.staged, &mut self.scratch, |c| gamma.correct(c));
        self.out.write_all(&self.scratch)?;
        self.frames += 1;
        Ok(())
    }
}

impl<W: Write + Send> Display for FileDisplay<W> {
    fn name(&self) -> &'static str {
        "file"
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
        self.write_staged()
    }

    fn set_gamma(&mut self, gamma: f64) -> Result<(), DisplayError> {
        self.ensure_live()?;
        self.gamma = GammaTable::new(gamma);
        Ok(())
    }

    fn all_off(&mut self) -> Result<(), DisplayError> {
        self.ensure_live()?;
        self.staged.fill(Rgb::BLACK);
        self.write_staged()
    }

    fn release(&mut self) -> Result<(), DisplayError> {
        if self.released {
            return Ok(());
        }
        self.released = true;
        self.out.flush()?;
        debug!(frames = self.frames, "frame recording closed");
        Ok(())
    }
}
