#![forbid(unsafe_code)]

use plasma_core::Rgb;

use super::{Display, DisplayError, check_bounds};

/// A display that drops every frame. Useful for headless runs and
/// benchmarking the field evaluation.
#[derive(Debug, Clone, Default)]
pub struct NullDisplay {
    width: u16,
    height: u16,
    gamma: f64,
    frames: u64,
    released: bool,
}

impl NullDisplay {
    #[must_use]
    pub fn new(width: u16, height: u16, gamma: f64) -> Self {
        Self {
            width,
            height,
            gamma,
            frames: 0,
            released: false,
        }
    }

    /// Frames published so far.
    #[must_use]
    pub const fn frames(&self) -> u64 {
        self.frames
    }

    #[must_use]
    pub const fn gamma(&self) -> f64 {
        self.gamma
    }

    fn ensure_live(&self) -> Result<(), DisplayError> {
        if self.released {
            Err(DisplayError::Released)
        } else {
            Ok(())
        }
    }
}

impl Display for NullDisplay {
    fn name(&self) -> &'static str {
        "null"
    }

    fn size(&self) -> (u16, u16) {
        (self.width, self.height)
    }

    fn set_cell(&mut self, x: u16, y: u16, _color: Rgb) -> Result<(), DisplayError> {
        self.ensure_live()?;
        check_bounds(x, y, self.width, self.height)
    }

    fn show(&mut self) -> Result<(), DisplayError> {
        self.ensure_live()?;
        self.frames += 1;
        Ok(())
    }

    fn set_gamma(&mut self, gamma: f64) -> Result<(), DisplayError> {
        self.ensure_live()?;
        self.gamma = gamma;
        Ok(())
    }

    fn all_off(&mut self) -> Result<(), DisplayError> {
        self.ensure_live()
    }

    fn release(&mut self) -> Result<(), DisplayError> {
        self.released = true;
        Ok(())
    }
}
