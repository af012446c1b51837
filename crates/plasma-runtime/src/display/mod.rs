#![forbid(unsafe_code)]

//! Display collaborators.
//!
//! The animation core only talks to the [`Display`] trait. Constructing a
//! backend plays the role of device initialization; after that the core
//! writes cells, publishes frames, forwards gamma changes, and finally
//! blanks and releases the device.
//!
//! # Backends
//!
//! - [`TerminalDisplay`]: true-color preview drawn with crossterm.
//! - [`FileDisplay`]: raw LED-chain frames appended to a file.
//! - [`NullDisplay`]: accepts everything, counts frames.
//! - `RecordingDisplay`: records every call. Built for tests and with the
//!   `test-helpers` feature.
//!
//! Backends that emulate a device apply gamma themselves through a
//! [`GammaTable`]; the core never corrects colors.

mod file;
mod gamma;
mod null;
#[cfg(any(test, feature = "test-helpers"))]
mod recording;
mod terminal;

use std::io;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use plasma_core::{FrameBuffer, Rgb};

pub use file::FileDisplay;
pub use gamma::GammaTable;
pub use null::NullDisplay;
#[cfg(any(test, feature = "test-helpers"))]
pub use recording::{DisplayCall, RecordingDisplay, RecordingLog};
pub use terminal::TerminalDisplay;

/// Failure reported by a display backend. Fatal for the animation.
#[derive(Debug, thiserror::Error)]
pub enum DisplayError {
    #[error("display I/O failed: {0}")]
    Io(#[from] io::Error),
    #[error("display has already been released")]
    Released,
    #[error("cell ({x}, {y}) is outside the {width}x{height} display")]
    OutOfBounds {
        x: u16,
        y: u16,
        width: u16,
        height: u16,
    },
}

/// A color-addressable grid device.
pub trait Display: Send {
    /// Short backend name for logs.
    fn name(&self) -> &'static str;

    /// Grid size as `(width, height)`.
    fn size(&self) -> (u16, u16);

    /// Stage a color for cell `(x, y)`. Nothing is visible until
    /// [`Display::show`].
    fn set_cell(&mut self, x: u16, y: u16, color: Rgb) -> Result<(), DisplayError>;

    /// Publish the staged frame.
    fn show(&mut self) -> Result<(), DisplayError>;

    /// Change the device's brightness-correction exponent.
    fn set_gamma(&mut self, gamma: f64) -> Result<(), DisplayError>;

    /// Turn every cell off.
    fn all_off(&mut self) -> Result<(), DisplayError>;

    /// Release the device. Later writes fail with [`DisplayError::Released`].
    fn release(&mut self) -> Result<(), DisplayError>;
}

/// A display shared between the animation thread, the control loop, and
/// the shutdown path.
pub type SharedDisplay = Arc<Mutex<dyn Display>>;

/// Wrap a backend for sharing.
pub fn shared<D: Display + 'static>(display: D) -> SharedDisplay {
    Arc::new(Mutex::new(display))
}

/// Lock a shared display, recovering from a poisoned lock.
pub fn lock(display: &SharedDisplay) -> MutexGuard<'_, dyn Display + 'static> {
    display.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Write a complete frame and publish it.
///
/// Callers hold the display lock for the whole call, so no other writer can
/// interleave with a half-written frame.
pub fn present(display: &mut dyn Display, frame: &FrameBuffer) -> Result<(), DisplayError> {
    for (x, y, color) in frame.iter_cells() {
        display.set_cell(x, y, color)?;
    }
    display.show()
}

#[inline]
pub(crate) fn check_bounds(x: u16, y: u16, width: u16, height: u16) -> Result<(), DisplayError> {
    if x < width && y < height {
        Ok(())
    } else {
        Err(DisplayError::OutOfBounds {
            x,
            y,
            width,
            height,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn present_writes_every_cell_then_shows() {
        let rec = RecordingDisplay::new(2, 2);
        let log = rec.log();
        let display = shared(rec);
        let mut frame = FrameBuffer::new(2, 2);
        frame.set(1, 1, Rgb::WHITE);
        present(&mut *lock(&display), &frame).expect("present");

        let calls = log.calls();
        assert_eq!(calls.len(), 5);
        assert!(calls[..4].iter().all(|c| matches!(c, DisplayCall::SetCell { .. })));
        assert_eq!(calls[4], DisplayCall::Show);
        assert_eq!(log.last_frame(), Some(frame));
    }

    #[test]
    fn bounds_check_reports_geometry() {
        let err = check_bounds(5, 0, 4, 4).unwrap_err();
        assert_eq!(err.to_string(), "cell (5, 0) is outside the 4x4 display");
        assert!(check_bounds(3, 3, 4, 4).is_ok());
    }
}
