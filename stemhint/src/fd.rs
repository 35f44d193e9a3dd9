//! Per-region hinting parameters (the private dictionary of a font dict).

use std::collections::BTreeSet;

use crate::{error::ConfigError, options::HintOptions, path::Dimension};

/// Whether an alignment zone catches tops or bottoms of glyph features.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ZoneKind {
    /// Baseline and descender zones.
    Bottom,
    /// Overshoot zones above x-height, cap height and so on.
    Top,
}

/// A blue zone.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AlignmentZone {
    pub bottom: f64,
    pub top: f64,
    pub kind: ZoneKind,
}

impl AlignmentZone {
    pub fn bottom(bottom: f64, top: f64) -> Self {
        Self {
            bottom,
            top,
            kind: ZoneKind::Bottom,
        }
    }

    pub fn top(bottom: f64, top: f64) -> Self {
        Self {
            bottom,
            top,
            kind: ZoneKind::Top,
        }
    }

    /// Returns true if `loc` lies inside the zone widened by `fuzz`.
    pub fn contains(&self, loc: f64, fuzz: f64) -> bool {
        loc >= self.bottom - fuzz && loc <= self.top + fuzz
    }
}

/// Hinting parameters for a group of glyphs.
///
/// In a CFF font these come from the private dictionary of each font dict;
/// glyphs are assigned to a dict by the font container, which is outside
/// the scope of this crate.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct FdDict {
    pub name: String,
    /// Alignment zones in ascending order. The first bottom zone is the
    /// baseline zone.
    pub zones: Vec<AlignmentZone>,
    pub blue_fuzz: f64,
    /// Dominant horizontal stem widths (StdHW, StemSnapH).
    pub h_stems: Vec<f64>,
    /// Dominant vertical stem widths (StdVW, StemSnapV).
    pub v_stems: Vec<f64>,
    /// Glyphs that receive horizontal counter hints.
    pub h_counter_glyphs: BTreeSet<String>,
    /// Glyphs that receive vertical counter hints.
    pub v_counter_glyphs: BTreeSet<String>,
    /// Glyphs whose horizontal stems ignore the alignment zones.
    pub no_blue_glyphs: BTreeSet<String>,
    pub flex_ok: bool,
}

impl Default for FdDict {
    fn default() -> Self {
        let names = |names: &[&str]| names.iter().map(|name| name.to_string()).collect();
        Self {
            name: "default".into(),
            zones: Vec::new(),
            blue_fuzz: 0.0,
            h_stems: Vec::new(),
            v_stems: Vec::new(),
            h_counter_glyphs: names(&["element", "equivalence", "notelement", "divide"]),
            v_counter_glyphs: names(&["m", "M", "T", "ellipsis"]),
            no_blue_glyphs: BTreeSet::new(),
            flex_ok: false,
        }
    }
}

impl FdDict {
    /// Dominant stem widths for the given dimension.
    pub fn dominant_stems(&self, dim: Dimension) -> &[f64] {
        match dim {
            Dimension::Horizontal => &self.h_stems,
            Dimension::Vertical => &self.v_stems,
        }
    }

    /// Returns true if the glyph gets counter hints in the given dimension.
    pub fn is_counter_glyph(&self, dim: Dimension, name: &str) -> bool {
        match dim {
            Dimension::Horizontal => self.h_counter_glyphs.contains(name),
            Dimension::Vertical => self.v_counter_glyphs.contains(name),
        }
    }

    /// Returns the index of the zone containing `loc`, if any.
    pub fn zone_at(&self, loc: f64) -> Option<usize> {
        self.zones
            .iter()
            .position(|zone| zone.contains(loc, self.blue_fuzz))
    }

    /// Check the fields the hinter depends on.
    ///
    /// This checks zones (presence, orientation and overlap), dominant stem
    /// widths (presence and sign) and the blue fuzz. Missing zones or widths
    /// are accepted when the options allow them.
    pub fn validate(&self, options: &HintOptions) -> Result<(), ConfigError> {
        let fd = || self.name.clone();
        if self.zones.is_empty() && !options.allow_no_blues {
            return Err(ConfigError::MissingAlignmentZones { fd: fd() });
        }
        for (index, zone) in self.zones.iter().enumerate() {
            if zone.bottom > zone.top {
                return Err(ConfigError::InvertedZone {
                    fd: fd(),
                    index,
                    bottom: zone.bottom,
                    top: zone.top,
                });
            }
        }
        let mut order = (0..self.zones.len()).collect::<Vec<_>>();
        order.sort_by(|a, b| self.zones[*a].bottom.total_cmp(&self.zones[*b].bottom));
        for pair in order.windows(2) {
            let (first, second) = (pair[0].min(pair[1]), pair[0].max(pair[1]));
            if self.zones[pair[1]].bottom <= self.zones[pair[0]].top {
                return Err(ConfigError::OverlappingZones {
                    fd: fd(),
                    first,
                    second,
                });
            }
        }
        if self.blue_fuzz < 0.0 {
            return Err(ConfigError::InvalidBlueFuzz {
                fd: fd(),
                fuzz: self.blue_fuzz,
            });
        }
        for dim in Dimension::ALL {
            let widths = self.dominant_stems(dim);
            if widths.is_empty() && !options.allow_no_stems {
                return Err(ConfigError::MissingStemWidths { fd: fd(), dim });
            }
            if let Some(width) = widths.iter().find(|width| **width <= 0.0) {
                return Err(ConfigError::InvalidStemWidth {
                    fd: fd(),
                    dim,
                    width: *width,
                });
            }
        }
        if options.max_segments == 0 {
            return Err(ConfigError::InvalidMaxSegments);
        }
        Ok(())
    }
}
