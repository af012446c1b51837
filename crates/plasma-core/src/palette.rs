#![forbid(unsafe_code)]

//! Palette store: named anchor-color lists parsed from a text source.
//!
//! # Source format
//!
//! ```text
//! Sunset = 0x492d61, 0x048091, 0x61c155,
//!          0xf2d43f, 0xd1026c,
//! Mono   = 0x000000, 0xffffff,
//! ```
//!
//! A record is a name terminated by `=`, followed by `0x`-prefixed hex
//! colors separated by commas. Whitespace (including newlines) is free
//! between tokens and the trailing comma is optional. Lines starting with
//! `#` between records are comments. Once the remaining text holds no `=`
//! the source is exhausted; leftover text after the last record is ignored.
//!
//! Palettes keep their definition order: operators step through them by
//! index, not by name.

use std::fs;
use std::path::Path;

use tracing::debug;

use crate::color::{MAX_PACKED, Rgb};
use crate::error::PaletteError;
use crate::shade::ShadeTable;

/// A named gradient path with its expanded shade table.
///
/// The shade table is built once at construction and the anchors are never
/// mutated afterwards, so the two cannot drift apart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
    name: String,
    anchors: Vec<Rgb>,
    shades: ShadeTable,
}

impl Palette {
    /// Create a palette, rejecting anchor lists shorter than two colors.
    pub fn new(
        name: impl Into<String>,
        anchors: Vec<Rgb>,
        cyclic: bool,
    ) -> Result<Self, PaletteError> {
        let name = name.into();
        if anchors.len() < 2 {
            return Err(PaletteError::MalformedPalette {
                name,
                anchors: anchors.len(),
            });
        }
        let shades = ShadeTable::build(&anchors, cyclic);
        Ok(Self {
            name,
            anchors,
            shades,
        })
    }

    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    #[must_use]
    pub fn anchors(&self) -> &[Rgb] {
        &self.anchors
    }

    #[inline]
    #[must_use]
    pub fn shades(&self) -> &ShadeTable {
        &self.shades
    }

    /// Color for a normalized field value. See [`ShadeTable::map`].
    #[inline]
    #[must_use]
    pub fn color_at(&self, value: f64) -> Rgb {
        self.shades.map(value)
    }
}

/// The palettes of one source, in definition order. Never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaletteSet {
    palettes: Vec<Palette>,
}

impl PaletteSet {
    /// Parse a palette source. `cyclic` closes every gradient back onto its
    /// first anchor.
    pub fn parse(source: &str, cyclic: bool) -> Result<Self, PaletteError> {
        let mut palettes: Vec<Palette> = Vec::new();
        let mut scanner = Scanner::new(source);

        while let Some(name) = scanner.record_name() {
            let anchors = scanner.anchors(&name)?;
            if palettes.iter().any(|p| p.name == name) {
                return Err(PaletteError::DuplicatePaletteName { name });
            }
            let palette = Palette::new(name, anchors, cyclic)?;
            debug!(
                name = palette.name(),
                anchors = palette.anchors().len(),
                shades = palette.shades().len(),
                "palette parsed"
            );
            palettes.push(palette);
        }

        if palettes.is_empty() {
            return Err(PaletteError::EmptySource);
        }
        Ok(Self { palettes })
    }

    /// Read and parse a palette file.
    pub fn from_path(path: impl AsRef<Path>, cyclic: bool) -> Result<Self, PaletteError> {
        let path = path.as_ref();
        let source = fs::read_to_string(path).map_err(|source| PaletteError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&source, cyclic)
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.palettes.len()
    }

    /// Always false for a successfully parsed set.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.palettes.is_empty()
    }

    #[inline]
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Palette> {
        self.palettes.get(index)
    }

    /// Index of the palette called `name`.
    #[must_use]
    pub fn find(&self, name: &str) -> Option<usize> {
        self.palettes.iter().position(|p| p.name == name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.palettes.iter().map(Palette::name)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Palette> {
        self.palettes.iter()
    }
}

impl<'a> IntoIterator for &'a PaletteSet {
    type Item = &'a Palette;
    type IntoIter = std::slice::Iter<'a, Palette>;

    fn into_iter(self) -> Self::IntoIter {
        self.palettes.iter()
    }
}

/// Parse `source` into open (non-cyclic) palettes.
pub fn load(source: &str) -> Result<PaletteSet, PaletteError> {
    PaletteSet::parse(source, false)
}

// ---------------------------------------------------------------------------
// Scanner
// ---------------------------------------------------------------------------

struct Scanner<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Scanner<'a> {
    const fn new(src: &'a str) -> Self {
        Self { src, pos: 0 }
    }

    #[inline]
    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn skip_whitespace(&mut self) {
        let rest = self.rest();
        self.pos += rest.len() - rest.trim_start().len();
    }

    fn skip_comments(&mut self) {
        loop {
            self.skip_whitespace();
            if !self.rest().starts_with('#') {
                return;
            }
            match self.rest().find('\n') {
                Some(nl) => self.pos += nl + 1,
                None => self.pos = self.src.len(),
            }
        }
    }

    /// Next record name, or `None` when only trailing text remains.
    fn record_name(&mut self) -> Option<String> {
        self.skip_comments();
        let rest = self.rest();
        let eq = rest.find('=')?;
        let name = rest[..eq].trim();
        if name.is_empty() {
            return None;
        }
        self.pos += eq + 1;
        Some(name.to_string())
    }

    /// Anchor list following a record name. Stops at the first token that
    /// is not a `0x` color.
    fn anchors(&mut self, name: &str) -> Result<Vec<Rgb>, PaletteError> {
        let mut anchors = Vec::new();
        loop {
            self.skip_whitespace();
            let rest = self.rest();
            let Some(digits_start) = rest
                .strip_prefix("0x")
                .or_else(|| rest.strip_prefix("0X"))
            else {
                break;
            };
            let digits_len = digits_start
                .find(|c: char| !c.is_ascii_hexdigit())
                .unwrap_or(digits_start.len());
            if digits_len == 0 {
                break;
            }
            let digits = &digits_start[..digits_len];
            let token_len = 2 + digits_len;
            let color = u32::from_str_radix(digits, 16)
                .ok()
                .filter(|v| *v <= MAX_PACKED)
                .map(Rgb::from_packed)
                .ok_or_else(|| PaletteError::InvalidColor {
                    name: name.to_string(),
                    token: rest[..token_len].to_string(),
                })?;
            anchors.push(color);
            self.pos += token_len;

            self.skip_whitespace();
            if self.rest().starts_with(',') {
                self.pos += 1;
            }
        }
        Ok(anchors)
    }
}
