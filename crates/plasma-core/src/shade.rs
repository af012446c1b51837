#![forbid(unsafe_code)]

//! Shade tables: dense RGB gradients expanded from anchor colors.
//!
//! A palette names a handful of anchor colors. Looking those up directly
//! gives hard color bands, so each consecutive anchor pair is expanded into
//! [`RESOLUTION`] linearly interpolated shades. The field generator's
//! continuous output then indexes the table with [`ShadeTable::map`].
//!
//! # Layout
//!
//! For anchors `a0 .. a(n-1)` the table holds `RESOLUTION * (n - 1)`
//! entries; segment `i` occupies `i*RESOLUTION .. (i+1)*RESOLUTION` and runs
//! from `a(i)` towards (but excluding) `a(i+1)`. A cyclic table adds one
//! more segment from `a(n-1)` back to `a0`.

use crate::color::Rgb;

/// Interpolated shades per anchor segment.
pub const RESOLUTION: usize = 256;

/// Dense per-segment interpolation of a palette's anchors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShadeTable {
    entries: Vec<Rgb>,
    cyclic: bool,
}

impl ShadeTable {
    /// Build the table for `anchors`.
    ///
    /// With `cyclic` set the gradient closes on itself: an extra segment
    /// leads from the last anchor back to the first. Fewer than two anchors
    /// produce an empty table; [`crate::Palette`] never allows that.
    #[must_use]
    pub fn build(anchors: &[Rgb], cyclic: bool) -> Self {
        let segments = segment_count(anchors.len(), cyclic);
        let mut entries = Vec::with_capacity(segments * RESOLUTION);
        for i in 0..segments {
            let from = anchors[i];
            let to = anchors[(i + 1) % anchors.len()];
            for j in 0..RESOLUTION {
                let t = j as f64 / RESOLUTION as f64;
                entries.push(Rgb::new(
                    lerp_channel(from.r, to.r, t),
                    lerp_channel(from.g, to.g, t),
                    lerp_channel(from.b, to.b, t),
                ));
            }
        }
        Self { entries, cyclic }
    }

    /// Map a normalized field value to a shade.
    ///
    /// Values outside `[0, 1]` clamp to the nearest end of the table, so a
    /// field sum that overshoots by a rounding error still lands on the
    /// first or last shade. `NaN` maps to the first shade.
    #[inline]
    #[must_use]
    pub fn map(&self, value: f64) -> Rgb {
        let len = self.entries.len();
        if len == 0 {
            return Rgb::BLACK;
        }
        let v = if value.is_nan() {
            0.0
        } else {
            value.clamp(0.0, 1.0)
        };
        let idx = ((v * len as f64) as usize).min(len - 1);
        self.entries[idx]
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[inline]
    #[must_use]
    pub const fn is_cyclic(&self) -> bool {
        self.cyclic
    }

    #[inline]
    #[must_use]
    pub fn get(&self, index: usize) -> Option<Rgb> {
        self.entries.get(index).copied()
    }

    #[inline]
    #[must_use]
    pub fn as_slice(&self) -> &[Rgb] {
        &self.entries
    }
}

#[inline]
const fn segment_count(anchors: usize, cyclic: bool) -> usize {
    if anchors < 2 {
        0
    } else if cyclic {
        anchors
    } else {
        anchors - 1
    }
}

/// `a + t*(b - a)`, truncated toward zero.
#[inline]
fn lerp_channel(a: u8, b: u8, t: f64) -> u8 {
    let a = f64::from(a);
    let b = f64::from(b);
    (a + t * (b - a)) as u8
}
