#![forbid(unsafe_code)]

//! 24-bit RGB color.

use std::fmt;

/// Largest value a packed 24-bit color can hold.
pub const MAX_PACKED: u32 = 0x00ff_ffff;

/// A 24-bit RGB color with 8 bits per channel.
///
/// Packs to `0xRRGGBB`. Unlike a terminal cell color there is no alpha:
/// an LED is either driven or dark.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    /// All channels off.
    pub const BLACK: Self = Self::new(0, 0, 0);
    /// All channels at full intensity.
    pub const WHITE: Self = Self::new(0xff, 0xff, 0xff);

    #[inline]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Unpack from `0xRRGGBB`. Bits above 24 are ignored.
    #[inline]
    pub const fn from_packed(value: u32) -> Self {
        Self {
            r: ((value >> 16) & 0xff) as u8,
            g: ((value >> 8) & 0xff) as u8,
            b: (value & 0xff) as u8,
        }
    }

    /// Unpack from `0xRRGGBB`, rejecting values wider than 24 bits.
    #[inline]
    pub const fn try_from_packed(value: u32) -> Option<Self> {
        if value > MAX_PACKED {
            None
        } else {
            Some(Self::from_packed(value))
        }
    }

    #[inline]
    pub const fn packed(self) -> u32 {
        ((self.r as u32) << 16) | ((self.g as u32) << 8) | self.b as u32
    }

    /// Sum of the three channels; a cheap brightness measure for ordering.
    #[inline]
    pub const fn brightness(self) -> u16 {
        self.r as u16 + self.g as u16 + self.b as u16
    }

    #[inline]
    pub const fn channels(self) -> [u8; 3] {
        [self.r, self.g, self.b]
    }
}

impl From<u32> for Rgb {
    fn from(value: u32) -> Self {
        Self::from_packed(value)
    }
}

impl From<Rgb> for u32 {
    fn from(value: Rgb) -> Self {
        value.packed()
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:06x}", self.packed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn packs_channels_in_rgb_order() {
        let c = Rgb::new(0x12, 0x34, 0x56);
        assert_eq!(c.packed(), 0x123456);
        assert_eq!(Rgb::from_packed(0x123456), c);
    }

    #[test]
    fn try_from_packed_rejects_wide_values() {
        assert_eq!(Rgb::try_from_packed(0xffffff), Some(Rgb::WHITE));
        assert_eq!(Rgb::try_from_packed(0x1000000), None);
    }

    #[test]
    fn display_is_six_hex_digits() {
        assert_eq!(Rgb::new(0, 0x80, 0x0a).to_string(), "0x00800a");
    }
}
