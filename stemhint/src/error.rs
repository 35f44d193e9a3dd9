//! Error types.

use thiserror::Error;

use crate::path::{Dimension, UnsupportedOperator};

/// The reason a glyph was left unhinted.
///
/// Skipping a glyph never aborts a batch; the glyph's outlines are returned
/// exactly as they were provided.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum SkipReason {
    #[error("outline uses an unsupported operator: {0}")]
    UnsupportedOperator(UnsupportedOperator),
    #[error("master {master} is incompatible with the default master: {detail}")]
    IncompatibleMasters { master: usize, detail: String },
    #[error("expected one FdDict per master, found {fds} for {masters} masters")]
    MissingFdDict { masters: usize, fds: usize },
    #[error("glyph has no masters")]
    NoMasters,
}

/// An error in font-wide hinting configuration.
///
/// These abort the whole font rather than a single glyph.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum ConfigError {
    #[error("FdDict '{fd}' has no alignment zones")]
    MissingAlignmentZones { fd: String },
    #[error("FdDict '{fd}' has no dominant {dim} stem widths")]
    MissingStemWidths { fd: String, dim: Dimension },
    #[error("FdDict '{fd}' zone {index} is inverted ({bottom} > {top})")]
    InvertedZone {
        fd: String,
        index: usize,
        bottom: f64,
        top: f64,
    },
    #[error("FdDict '{fd}' zones {first} and {second} overlap")]
    OverlappingZones {
        fd: String,
        first: usize,
        second: usize,
    },
    #[error("FdDict '{fd}' has a non-positive {dim} stem width {width}")]
    InvalidStemWidth {
        fd: String,
        dim: Dimension,
        width: f64,
    },
    #[error("FdDict '{fd}' has a negative blue fuzz {fuzz}")]
    InvalidBlueFuzz { fd: String, fuzz: f64 },
    #[error("max_segments must be positive")]
    InvalidMaxSegments,
}
