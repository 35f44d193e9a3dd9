//! Multi-master consistency.
//!
//! Variable fonts need the same hints, in the same order, in every master.
//! The default master is hinted normally and its stems are located in the
//! other masters through the segments that produced them.

use crate::{
    diag::Diagnostics,
    error::SkipReason,
    fd::FdDict,
    hint::{
        axis::{Horizontal, Vertical},
        prune::MAX_MERGE,
        segments::{self, Segment, SAME_LOC},
        HintState,
    },
    path::{AxisView, Dimension, ElementHandle, GhostSide, Path, PathElement, Stem},
};

/// Checks that all masters have the same structure, repairing missing
/// zero-length closing lines on the way.
pub(crate) fn reconcile(masters: &mut [Path]) -> Result<(), SkipReason> {
    let subpath_count = masters[0].subpaths().len();
    if let Some((master, path)) = masters
        .iter()
        .enumerate()
        .find(|(_, path)| path.subpaths().len() != subpath_count)
    {
        return Err(SkipReason::IncompatibleMasters {
            master,
            detail: format!(
                "{} subpaths, expected {subpath_count}",
                path.subpaths().len()
            ),
        });
    }
    for subpath in 0..subpath_count {
        let longest = masters
            .iter()
            .map(|path| path.subpaths()[subpath].len())
            .max()
            .unwrap_or_default();
        for path in masters.iter_mut() {
            let elements = &path.subpaths()[subpath];
            if elements.len() + 1 != longest || elements.last().is_some_and(|el| el.is_close) {
                continue;
            }
            // the subpath ends back at its start, so closing it is a no-op
            let Some(start) = elements.first().map(|el| el.s) else {
                continue;
            };
            let offset = elements.len();
            path.insert_element(
                ElementHandle::new(subpath, offset),
                PathElement::close_line(start, start),
            );
        }
    }
    let reference = &masters[0];
    for (master, path) in masters.iter().enumerate().skip(1) {
        for (subpath, (a, b)) in reference.subpaths().iter().zip(path.subpaths()).enumerate() {
            if a.len() != b.len() {
                return Err(SkipReason::IncompatibleMasters {
                    master,
                    detail: format!(
                        "subpath {subpath} has {} elements, expected {}",
                        b.len(),
                        a.len()
                    ),
                });
            }
            if let Some(offset) = a.iter().zip(b).position(|(a, b)| a.is_line() != b.is_line()) {
                return Err(SkipReason::IncompatibleMasters {
                    master,
                    detail: format!("subpath {subpath} element {offset} differs in kind"),
                });
            }
        }
    }
    Ok(())
}

/// Copies the hints of the hinted default master to `other`, moving each
/// stem edge to its location in `other`.
pub(crate) fn propagate(
    default: &Path,
    states: &[HintState; 2],
    other: &mut Path,
    fd: &FdDict,
    name: &str,
    diag: &Diagnostics,
) {
    other.start_mask = default.start_mask.clone();
    other.counter_masks = default.counter_masks.clone();
    for handle in default.handles() {
        let Some(source) = default.element(handle) else {
            continue;
        };
        let (mask, flex) = (source.mask.clone(), source.flex);
        if let Some(target) = other.element_mut(handle) {
            target.mask = mask;
            target.flex = flex;
        }
    }
    for dim in Dimension::ALL {
        let other_segments = match dim {
            Dimension::Horizontal => segments::generate(&Horizontal::new(fd, name), other),
            Dimension::Vertical => segments::generate(&Vertical::new(fd, name), other),
        };
        let resolver = Resolver {
            dim,
            default,
            other,
            default_segments: &states[dim.index()].segments,
            other_segments: &other_segments,
        };
        let diag = diag.with_dim(dim);
        let stems = default
            .stems(dim)
            .iter()
            .map(|stem| resolver.stem(stem, &diag))
            .collect();
        other.set_stems(dim, stems);
    }
}

struct Resolver<'a> {
    dim: Dimension,
    default: &'a Path,
    other: &'a Path,
    default_segments: &'a [Segment],
    other_segments: &'a [Segment],
}

impl Resolver<'_> {
    fn stem(&self, stem: &Stem, diag: &Diagnostics) -> Stem {
        if let (Some(side), Some(edge)) = (stem.ghost_side(), stem.ghost_edge()) {
            let edge = self.side(edge, side == GhostSide::Bottom, diag);
            return Stem::ghost(side, edge);
        }
        let lo = self.side(stem.lo, true, diag);
        let mut hi = self.side(stem.hi, false, diag);
        if hi < lo {
            diag.warn(format!(
                "stem {} {} inverts to {lo} {hi}; clamping",
                stem.lo, stem.hi
            ));
            hi = lo;
        }
        Stem::new(lo, hi)
    }

    /// Location of a stem side in the other master.
    fn side(&self, pos: f64, increasing: bool, diag: &Diagnostics) -> f64 {
        self.from_segments(pos, increasing)
            .or_else(|| self.from_points(pos))
            .unwrap_or_else(|| {
                diag.debug(format!("no counterpart for stem edge {pos}; keeping it"));
                pos
            })
    }

    /// Length-weighted location of the matching segments.
    ///
    /// Merged stems sit up to [`MAX_MERGE`] away from some of their
    /// segments; that offset is kept in the other master.
    fn from_segments(&self, pos: f64, increasing: bool) -> Option<f64> {
        let dim = self.dim;
        let (mut total, mut weight) = (0.0, 0.0);
        for seg in self
            .default_segments
            .iter()
            .filter(|seg| seg.increasing == increasing && (seg.loc - pos).abs() <= MAX_MERGE)
        {
            let shift = seg
                .elements
                .first()
                .and_then(|h| Some((self.default.element(*h)?, self.other.element(*h)?)))
                .map(|(a, b)| {
                    if (a.s.a(dim) - pos).abs() <= (a.e.a(dim) - pos).abs() {
                        b.s.a(dim) - a.s.a(dim)
                    } else {
                        b.e.a(dim) - a.e.a(dim)
                    }
                })
                .unwrap_or_default();
            let expected = pos + shift;
            let candidate = self
                .other_segments
                .iter()
                .filter(|c| c.increasing == increasing && c.shares_element(seg))
                .min_by(|a, b| {
                    (a.loc - expected)
                        .abs()
                        .total_cmp(&(b.loc - expected).abs())
                });
            if let Some(candidate) = candidate {
                let len = candidate.len().max(1.0);
                total += (candidate.loc + pos - seg.loc) * len;
                weight += len;
            }
        }
        (weight > 0.0).then(|| total / weight)
    }

    /// Average location of the other master's points corresponding to the
    /// default's on-curve points on this edge.
    fn from_points(&self, pos: f64) -> Option<f64> {
        let dim = self.dim;
        let (mut total, mut count) = (0.0, 0usize);
        for handle in self.default.handles() {
            let (Some(a), Some(b)) = (self.default.element(handle), self.other.element(handle)) else {
                continue;
            };
            if (a.s.a(dim) - pos).abs() <= SAME_LOC {
                total += b.s.a(dim);
                count += 1;
            }
        }
        (count > 0).then(|| total / count as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        diag::DirectLog,
        hint::{hint_masters, segments::SegmentKind},
        options::HintOptions,
        path::PathBuilder,
        testing::{rect, zone_fd},
    };
    use pretty_assertions::assert_eq;

    #[test]
    fn stems_follow_the_outline() {
        let fd = zone_fd();
        let mut masters = [rect(0.0, 0.0, 100.0, 700.0), rect(0.0, 0.0, 140.0, 700.0)];
        hint_masters("a", &mut masters, &[&fd, &fd], &HintOptions::default(), None).unwrap();
        assert_eq!(masters[0].vstems, [Stem::new(0.0, 100.0)]);
        assert_eq!(masters[1].vstems, [Stem::new(0.0, 140.0)]);
        assert_eq!(masters[1].hstems, [Stem::new(21.0, 0.0)]);
        assert_eq!(masters[0].start_mask, masters[1].start_mask);
    }

    #[test]
    fn shifted_ghost_keeps_its_side() {
        let fd = zone_fd();
        let mut masters = [rect(0.0, 0.0, 100.0, 700.0), rect(0.0, -5.0, 100.0, 700.0)];
        hint_masters("a", &mut masters, &[&fd, &fd], &HintOptions::default(), None).unwrap();
        assert_eq!(masters[1].hstems, [Stem::ghost(GhostSide::Bottom, -5.0)]);
    }

    #[test]
    fn incompatible_masters_rejected() {
        let mut second = PathBuilder::from_bezpath(&rect(0.0, 0.0, 100.0, 700.0).to_bezpath());
        second.move_to((200.0, 0.0));
        second.line_to((300.0, 0.0));
        second.line_to((300.0, 100.0));
        let mut masters = [rect(0.0, 0.0, 100.0, 700.0), second.finish()];
        let original = masters.clone();
        let result = reconcile(&mut masters);
        assert!(matches!(
            result,
            Err(SkipReason::IncompatibleMasters { master: 1, .. })
        ));
        assert_eq!(masters[0], original[0]);
    }

    #[test]
    fn missing_null_close_repaired() {
        let mut builder = PathBuilder::new();
        builder.move_to((0.0, 0.0));
        builder.line_to((100.0, 0.0));
        builder.line_to((100.0, 700.0));
        builder.line_to((0.0, 700.0));
        builder.line_to((0.0, 0.0));
        let closed = builder.finish();
        let mut builder = PathBuilder::new();
        builder.move_to((0.0, 0.0));
        builder.line_to((140.0, 0.0));
        builder.line_to((140.0, 700.0));
        builder.line_to((0.0, 700.0));
        builder.line_to((0.0, 1.0));
        let open = builder.finish();
        let mut masters = [closed.clone(), open];
        assert_eq!(reconcile(&mut masters), Ok(()));
        assert_eq!(masters[0].element_count(), 5);
        let close = masters[0].element(ElementHandle::new(0, 4)).unwrap();
        assert!(close.is_close);
        assert_eq!(close.s, close.e);
        // closing lines aren't drawn, so the outline is unchanged
        assert_eq!(masters[0].to_bezpath(), closed.to_bezpath());
    }

    #[test]
    fn merged_edge_follows_its_segment() {
        let segment = |loc: f64| Segment {
            loc,
            min: 0.0,
            max: 100.0,
            kind: SegmentKind::Line,
            increasing: true,
            elements: vec![ElementHandle::new(0, 0)],
            bonus: 0.0,
            best: None,
            generation: 0,
        };
        let sink = DirectLog;
        let diag = Diagnostics::new("a", &sink);
        let default = rect(0.0, 0.0, 100.0, 700.0);
        let other = rect(0.0, 10.0, 100.0, 700.0);
        // the stem was merged 1.5 units below the segment it came from
        let (default_segments, other_segments) = ([segment(1.5)], [segment(13.5)]);
        let resolver = Resolver {
            dim: Dimension::Horizontal,
            default: &default,
            other: &other,
            default_segments: &default_segments,
            other_segments: &other_segments,
        };
        assert_eq!(resolver.side(0.0, true, &diag), 12.0);
    }

    #[test]
    fn inverted_stems_clamped() {
        let sink = DirectLog;
        let diag = Diagnostics::new("a", &sink);
        let default = rect(0.0, 0.0, 100.0, 700.0);
        let other = rect(0.0, 0.0, 100.0, 700.0);
        let resolver = Resolver {
            dim: Dimension::Vertical,
            default: &default,
            other: &other,
            default_segments: &[],
            other_segments: &[],
        };
        // nothing supports the sides, so they come from the points
        assert_eq!(
            resolver.stem(&Stem::new(100.0, 0.5), &diag),
            Stem::new(100.0, 100.0)
        );
    }
}
