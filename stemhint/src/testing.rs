//! Helpers for unit tests.

use crate::{
    fd::{AlignmentZone, FdDict},
    path::{Path, PathBuilder},
};

pub(crate) fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// A counter-clockwise rectangle.
pub(crate) fn rect(x0: f64, y0: f64, x1: f64, y1: f64) -> Path {
    let mut builder = PathBuilder::new();
    builder.move_to((x0, y0));
    builder.line_to((x1, y0));
    builder.line_to((x1, y1));
    builder.line_to((x0, y1));
    builder.close();
    builder.finish()
}

/// A dict with only a baseline zone.
pub(crate) fn zone_fd() -> FdDict {
    FdDict {
        zones: vec![AlignmentZone::bottom(-15.0, 0.0)],
        h_stems: vec![50.0],
        v_stems: vec![100.0],
        ..Default::default()
    }
}
