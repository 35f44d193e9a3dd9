//! Automatic stem hinting for PostScript (CFF/Type 2) glyph outlines.
//!
//! Given a glyph outline, this crate derives a set of non-conflicting
//! horizontal and vertical stem hints, counter hints for glyphs with evenly
//! spaced stems, flex markers, and a hint replacement schedule ("hintmasks")
//! that switches between overlapping stems along the outline.
//!
//! The entry points are [`hint_glyph`] for a single outline,
//! [`hint_masters`] for the masters of a variable glyph and [`hint_font`]
//! for a batch of glyphs processed on a worker pool.
//!
//! Outlines are built with [`PathBuilder`], which accepts drawing commands
//! directly, converts from [`kurbo::BezPath`] and (with the default `skrifa`
//! feature) implements [`skrifa::outline::OutlinePen`].

#![forbid(unsafe_code)]

mod diag;
mod error;
mod fd;
mod hint;
mod masters;
mod options;
mod overlap;
pub mod path;
mod report;
mod task;

#[cfg(test)]
mod testing;

pub use diag::{LogContext, LogRecord};
pub use error::{ConfigError, SkipReason};
pub use fd::{AlignmentZone, FdDict, ZoneKind};
pub use hint::{hint_glyph, hint_masters, report_glyph};
pub use options::{HintOptions, OverlapPolicy};
pub use overlap::{OverlapError, OverlapRemover};
pub use path::{Dimension, ElementHandle, HintMask, Path, PathBuilder, Stem};
pub use report::{GlyphReport, ZoneObservation};
pub use task::{hint_font, hint_glyphs, GlyphResult, GlyphTask, Outcome};

/// Re-export of the geometry crate used in the public API.
pub extern crate kurbo;
