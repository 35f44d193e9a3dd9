//! Main stem selection.

use super::{
    segments::{Segment, SegmentKind},
    stems::{StemValue, MIN_VALUE},
};
use crate::path::{AxisView, Dimension, ElementHandle, Path};

/// Minimum gap kept between main stems.
pub(crate) const BAND_MARGIN: f64 = 30.0;
/// Score needed for every main stem after the first.
const MIN_MAIN_VALUE: f64 = 1.0 / 16.0;
/// Tolerance for equal widths and gaps in counter groups.
const COUNTER_TOLERANCE: f64 = 3.0;

/// Returns true if two spans come within `margin` of each other.
pub(crate) fn spans_conflict(a: (f64, f64), b: (f64, f64), margin: f64) -> bool {
    a.0 <= b.1 + margin && b.0 <= a.1 + margin
}

/// Greedily picks the highest scoring candidates that keep clear of each
/// other. Returns value indices ordered by position.
pub(crate) fn main_values(values: &[StemValue]) -> Vec<usize> {
    let mut remaining = (0..values.len())
        .filter(|ix| !values[*ix].pruned)
        .collect::<Vec<_>>();
    let mut main: Vec<usize> = Vec::new();
    loop {
        let floor = if main.is_empty() {
            MIN_VALUE
        } else {
            MIN_MAIN_VALUE
        };
        let mut best: Option<usize> = None;
        for &ix in &remaining {
            let score = values[ix].score();
            if score < floor {
                continue;
            }
            if best.map_or(true, |best| score > values[best].score()) {
                best = Some(ix);
            }
        }
        let Some(best) = best else {
            break;
        };
        main.push(best);
        let span = values[best].span();
        remaining.retain(|ix| !spans_conflict(values[*ix].span(), span, BAND_MARGIN));
    }
    main.sort_by(|a, b| values[*a].stem().cmp_position(&values[*b].stem()));
    main
}

/// Adds a stem spanning the bounds of a subpath (or the whole glyph when
/// `subpath` is `None`), with bounding box segments for its edges.
///
/// Returns the index of the new value.
pub(crate) fn add_bbox_value(
    path: &Path,
    dim: Dimension,
    subpath: Option<usize>,
    segments: &mut Vec<Segment>,
    values: &mut Vec<StemValue>,
) -> Option<usize> {
    let bounds = match subpath {
        Some(subpath) => path.subpath_bounds(subpath)?,
        None => path.bounds()?,
    };
    let (lo, hi, o0, o1) = match dim {
        Dimension::Horizontal => (bounds.min_y(), bounds.max_y(), bounds.min_x(), bounds.max_x()),
        Dimension::Vertical => (bounds.min_x(), bounds.max_x(), bounds.min_y(), bounds.max_y()),
    };
    if hi <= lo {
        return None;
    }
    let touching = |loc: f64| {
        path.handles()
            .filter(|h| subpath.map_or(true, |sp| h.subpath == sp))
            .filter(|h| {
                path.element(*h)
                    .is_some_and(|el| el.s.a(dim) == loc || el.e.a(dim) == loc)
            })
            .collect::<Vec<ElementHandle>>()
    };
    let mut edge = |loc: f64, increasing: bool| {
        segments.push(Segment {
            loc,
            min: o0,
            max: o1,
            kind: SegmentKind::BBox,
            increasing,
            elements: touching(loc),
            bonus: 1.0,
            best: None,
            generation: path.generation(),
        });
        segments.len() - 1
    };
    let lo_seg = edge(lo, true);
    let hi_seg = edge(hi, false);
    values.push(StemValue {
        lo,
        hi,
        value: MIN_VALUE,
        spc: 0.0,
        lo_seg,
        hi_seg,
        ghost: None,
        pruned: false,
        merged: false,
    });
    Some(values.len() - 1)
}

/// Looks for three evenly spaced, symmetric stems among the main stems.
pub(crate) fn counter_group(values: &[StemValue], main: &[usize]) -> Option<[usize; 3]> {
    let mut strongest = main
        .iter()
        .copied()
        .filter(|ix| !values[*ix].is_ghost())
        .collect::<Vec<_>>();
    if strongest.len() < 3 {
        return None;
    }
    strongest.sort_by(|a, b| values[*b].score().total_cmp(&values[*a].score()).then(a.cmp(b)));
    let mut group = [strongest[0], strongest[1], strongest[2]];
    group.sort_by(|a, b| values[*a].lo.total_cmp(&values[*b].lo));
    let [a, b, c] = group.map(|ix| &values[ix]);
    let gap1 = b.lo - a.hi;
    let gap2 = c.lo - b.hi;
    let symmetric = ((a.hi - a.lo) - (c.hi - c.lo)).abs() <= COUNTER_TOLERANCE;
    let even = (gap1 - gap2).abs() <= COUNTER_TOLERANCE;
    (gap1 > 0.0 && gap2 > 0.0 && symmetric && even).then_some(group)
}
