//! Per-dimension hinting policy.
//!
//! The segment, stem and mask stages are written once and parameterized
//! by an [`AxisPolicy`]: alignment zones only apply to horizontal stems,
//! and the two dimensions disagree about which direction of travel counts
//! as "increasing".

use crate::{
    fd::{FdDict, ZoneKind},
    path::Dimension,
};

/// An alignment zone hit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Band {
    pub index: usize,
    pub kind: ZoneKind,
}

pub(crate) trait AxisPolicy {
    fn dim(&self) -> Dimension;

    fn is_vertical(&self) -> bool {
        self.dim() == Dimension::Vertical
    }

    /// The alignment zone containing `loc`, if any.
    fn band(&self, loc: f64) -> Option<Band>;

    fn in_band(&self, loc: f64) -> bool {
        self.band(loc).is_some()
    }

    fn dominant_stems(&self) -> &[f64];

    fn is_counter_glyph(&self) -> bool;

    /// Returns true if travel of `d_o` along the stem edge makes the edge
    /// the low side of a stem.
    ///
    /// With counter-clockwise outer contours, the bottom edge of a
    /// horizontal bar runs in +x and the left edge of a vertical stem runs
    /// in -y.
    fn increasing(&self, d_o: f64) -> bool;
}

/// Policy for horizontal stems (positions on the y axis).
pub(crate) struct Horizontal<'a> {
    fd: &'a FdDict,
    use_bands: bool,
    counter: bool,
}

impl<'a> Horizontal<'a> {
    pub fn new(fd: &'a FdDict, glyph: &str) -> Self {
        Self {
            fd,
            use_bands: !fd.no_blue_glyphs.contains(glyph),
            counter: fd.is_counter_glyph(Dimension::Horizontal, glyph),
        }
    }
}

impl AxisPolicy for Horizontal<'_> {
    fn dim(&self) -> Dimension {
        Dimension::Horizontal
    }

    fn band(&self, loc: f64) -> Option<Band> {
        if !self.use_bands {
            return None;
        }
        let index = self.fd.zone_at(loc)?;
        Some(Band {
            index,
            kind: self.fd.zones[index].kind,
        })
    }

    fn dominant_stems(&self) -> &[f64] {
        &self.fd.h_stems
    }

    fn is_counter_glyph(&self) -> bool {
        self.counter
    }

    fn increasing(&self, d_o: f64) -> bool {
        d_o > 0.0
    }
}

/// Policy for vertical stems (positions on the x axis).
pub(crate) struct Vertical<'a> {
    fd: &'a FdDict,
    counter: bool,
}

impl<'a> Vertical<'a> {
    pub fn new(fd: &'a FdDict, glyph: &str) -> Self {
        Self {
            fd,
            counter: fd.is_counter_glyph(Dimension::Vertical, glyph),
        }
    }
}

impl AxisPolicy for Vertical<'_> {
    fn dim(&self) -> Dimension {
        Dimension::Vertical
    }

    fn band(&self, _loc: f64) -> Option<Band> {
        None
    }

    fn dominant_stems(&self) -> &[f64] {
        &self.fd.v_stems
    }

    fn is_counter_glyph(&self) -> bool {
        self.counter
    }

    fn increasing(&self, d_o: f64) -> bool {
        d_o < 0.0
    }
}
