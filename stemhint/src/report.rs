//! Analysis-only output.
//!
//! A report lists what the hinter would do for a glyph without changing
//! it: the widths of its main stems and the edges that would be caught by
//! (or fall outside) the alignment zones. Aggregating reports into
//! histograms is left to the caller.

use crate::{
    fd::FdDict,
    hint::HintState,
    path::{Dimension, GhostSide},
};

/// Raw observations for one glyph.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GlyphReport {
    pub name: String,
    /// Widths of the horizontal main stems, ascending.
    pub hstem_widths: Vec<f64>,
    /// Widths of the vertical main stems, ascending.
    pub vstem_widths: Vec<f64>,
    /// Tops of horizontal features, ascending.
    pub top_zones: Vec<ZoneObservation>,
    /// Bottoms of horizontal features, ascending.
    pub bottom_zones: Vec<ZoneObservation>,
}

/// A horizontal edge that is a candidate for an alignment zone.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ZoneObservation {
    pub loc: f64,
    /// Length of the edge.
    pub len: f64,
    /// Index of the zone that catches the edge.
    pub zone: Option<usize>,
}

pub(crate) fn build(name: &str, fd: &FdDict, states: &[HintState; 2]) -> GlyphReport {
    let mut report = GlyphReport {
        name: name.to_string(),
        ..Default::default()
    };
    for state in states {
        let widths = state
            .main_stems()
            .filter(|value| !value.is_ghost())
            .map(|value| value.hi - value.lo);
        match state.dim {
            Dimension::Horizontal => report.hstem_widths.extend(widths),
            Dimension::Vertical => report.vstem_widths.extend(widths),
        }
    }
    let horizontal = &states[Dimension::Horizontal.index()];
    let observe = |loc: f64, seg: usize| ZoneObservation {
        loc,
        len: horizontal.segments.get(seg).map_or(0.0, |seg| seg.len()),
        zone: fd.zone_at(loc),
    };
    for value in horizontal.main_stems() {
        match value.ghost {
            Some(GhostSide::Bottom) => {
                report.bottom_zones.push(observe(value.hi, value.lo_seg));
            }
            Some(GhostSide::Top) => report.top_zones.push(observe(value.lo, value.hi_seg)),
            None => {
                report.bottom_zones.push(observe(value.lo, value.lo_seg));
                report.top_zones.push(observe(value.hi, value.hi_seg));
            }
        }
    }
    report.hstem_widths.sort_by(f64::total_cmp);
    report.vstem_widths.sort_by(f64::total_cmp);
    report.top_zones.sort_by(|a, b| a.loc.total_cmp(&b.loc));
    report.bottom_zones.sort_by(|a, b| a.loc.total_cmp(&b.loc));
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        fd::AlignmentZone,
        hint::report_glyph,
        options::HintOptions,
        path::PathBuilder,
        testing::{rect, zone_fd},
    };
    use pretty_assertions::assert_eq;

    #[test]
    fn rectangle_report() {
        let path = rect(0.0, 0.0, 100.0, 700.0);
        let report = report_glyph("a", &path, &zone_fd(), &HintOptions::default()).unwrap();
        assert_eq!(
            report,
            GlyphReport {
                name: "a".into(),
                hstem_widths: vec![],
                vstem_widths: vec![100.0],
                top_zones: vec![],
                bottom_zones: vec![ZoneObservation {
                    loc: 0.0,
                    len: 100.0,
                    zone: Some(0),
                }],
            }
        );
        // reporting leaves the outline alone
        assert!(!path.is_hinted());
    }

    #[test]
    fn bar_edges_observed() {
        // a horizontal bar with its top outside every zone
        let mut builder = PathBuilder::new();
        builder.move_to((0.0, 0.0));
        builder.line_to((400.0, 0.0));
        builder.line_to((400.0, 50.0));
        builder.line_to((0.0, 50.0));
        let path = builder.finish();
        let fd = FdDict {
            zones: vec![AlignmentZone::bottom(-15.0, 0.0), AlignmentZone::top(500.0, 515.0)],
            h_stems: vec![50.0],
            v_stems: vec![100.0],
            ..Default::default()
        };
        let report = report_glyph("hyphen", &path, &fd, &HintOptions::default()).unwrap();
        assert_eq!(report.hstem_widths, [50.0]);
        assert_eq!(
            report.top_zones,
            [ZoneObservation {
                loc: 50.0,
                len: 400.0,
                zone: None,
            }]
        );
        assert_eq!(report.bottom_zones[0].zone, Some(0));
    }
}
