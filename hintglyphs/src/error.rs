use std::path::PathBuf;

use stemhint::ConfigError;
use thiserror::Error;

/// Problems with the outline data of a single glyph.
#[derive(Debug, Error, PartialEq)]
pub enum GlyphError {
    #[error("contour {contour} has no on-curve points")]
    NoOnCurve { contour: usize },
    #[error("contour {contour} ends with off-curve points")]
    DanglingOffCurves { contour: usize },
    #[error("contour {contour} has {count} consecutive off-curve points")]
    TooManyOffCurves { contour: usize, count: usize },
    #[error("invalid hintmask '{0}'")]
    BadMask(String),
    #[error("no element {contour}:{element} for a hintmask or flex")]
    NoSuchElement { contour: usize, element: usize },
}

#[derive(Debug, Error)]
pub enum CliError {
    #[error("failed to read '{path}': {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to write '{path}': {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config '{path}': {source}")]
    Config {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("failed to parse glyph set '{path}': {source}")]
    GlyphSet {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("failed to serialize output: {0}")]
    Output(#[from] serde_json::Error),
    #[error("config has no [[fd]] tables")]
    NoFdDicts,
    #[error("glyph '{glyph}' uses unknown fd '{fd}'")]
    UnknownFd { glyph: String, fd: String },
    #[error("glyph '{glyph}': {source}")]
    Glyph { glyph: String, source: GlyphError },
    #[error(transparent)]
    Font(#[from] ConfigError),
}
