#![forbid(unsafe_code)]

//! Palette loading errors.
//!
//! Every variant is fatal: the animator cannot start without at least one
//! valid palette.

use std::io;
use std::path::PathBuf;

/// Failure while loading a palette source.
#[derive(Debug, thiserror::Error)]
pub enum PaletteError {
    /// The palette file could not be read.
    #[error("couldn't read palette file '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// A record defines fewer than two anchor colors.
    #[error("palette '{name}' has {anchors} anchor color(s); at least 2 are required")]
    MalformedPalette { name: String, anchors: usize },
    /// An anchor is not a valid 24-bit color.
    #[error("palette '{name}': '{token}' is not a 24-bit color")]
    InvalidColor { name: String, token: String },
    /// The source yielded no palettes at all.
    #[error("palette source contains no palettes")]
    EmptySource,
    /// Two records share a name.
    #[error("palette '{name}' is defined more than once")]
    DuplicatePaletteName { name: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_palette() {
        let err = PaletteError::MalformedPalette {
            name: "Fire".into(),
            anchors: 1,
        };
        assert_eq!(
            err.to_string(),
            "palette 'Fire' has 1 anchor color(s); at least 2 are required"
        );

        let err = PaletteError::InvalidColor {
            name: "Fire".into(),
            token: "0x1000000".into(),
        };
        assert!(err.to_string().contains("0x1000000"));
    }
}
