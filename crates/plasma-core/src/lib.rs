#![forbid(unsafe_code)]

//! Core: palettes, shade tables, and the plasma field.
//!
//! # Role in the workspace
//! `plasma-core` holds everything that is pure computation. It parses
//! palette sources, expands anchor colors into dense shade tables, and
//! evaluates the multi-oscillator field that drives the plasma. Nothing in
//! this crate touches threads, terminals, or devices.
//!
//! # Primary responsibilities
//! - **Palette store**: named anchor lists parsed from a text source.
//! - **Shade tables**: per-segment linear RGB interpolation and lookup.
//! - **Field generator**: three summed oscillators, normalized to `[0, 1]`.
//! - **Frames**: per-tick color buffers and the serpentine LED layout.
//!
//! # How it fits in the system
//! `plasma-runtime` owns the animation thread and the display backends; it
//! calls [`field::render_frame`] once per tick and pushes the resulting
//! [`frame::FrameBuffer`] to a display.

pub mod color;
pub mod error;
pub mod field;
pub mod frame;
pub mod palette;
pub mod shade;

pub use color::Rgb;
pub use error::PaletteError;
pub use field::{FieldGeometry, evaluate, normalize, render_frame};
pub use frame::{FrameBuffer, LedStrip};
pub use palette::{Palette, PaletteSet};
pub use shade::{RESOLUTION, ShadeTable};
