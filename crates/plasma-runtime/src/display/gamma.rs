#![forbid(unsafe_code)]

use plasma_core::Rgb;

/// Per-channel brightness correction, as an LED controller applies it.
///
/// Entry `i` is `255 * (i / 255)^gamma`, rounded. LEDs respond roughly
/// linearly to PWM duty while the eye does not; a gamma above 1 darkens the
/// low end so gradients look even.
#[derive(Debug, Clone, PartialEq)]
pub struct GammaTable {
    gamma: f64,
    table: [u8; 256],
}

impl GammaTable {
    #[must_use]
    pub fn new(gamma: f64) -> Self {
        let mut table = [0u8; 256];
        for (i, slot) in table.iter_mut().enumerate() {
            let v = 255.0 * (i as f64 / 255.0).powf(gamma);
            *slot = v.round().clamp(0.0, 255.0) as u8;
        }
        Self { gamma, table }
    }

    #[inline]
    #[must_use]
    pub const fn gamma(&self) -> f64 {
        self.gamma
    }

    #[inline]
    #[must_use]
    pub fn channel(&self, value: u8) -> u8 {
        self.table[value as usize]
    }

    #[inline]
    #[must_use]
    pub fn correct(&self, color: Rgb) -> Rgb {
        Rgb::new(
            self.channel(color.r),
            self.channel(color.g),
            self.channel(color.b),
        )
    }
}

impl Default for GammaTable {
    fn default() -> Self {
        Self::new(1.0)
    }
}
