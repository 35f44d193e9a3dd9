//! Segment generation.
//!
//! A segment is a stretch of the outline that runs (nearly) parallel to
//! the stem edges of one dimension: a candidate for one side of a stem.

use kurbo::{
    common::{solve_cubic, solve_quadratic},
    ParamCurve, Point, Vec2,
};

use super::axis::AxisPolicy;
use crate::path::{AxisView, Dimension, ElementHandle, FlexPhase, Path, PathElement};

/// Maximum ratio of travel across the axis to travel along it for a
/// stretch to count as flat.
pub(crate) const THETA: f64 = 0.38;
/// Lines at or below this slope keep their full extent.
const FLAT_RATIO: f64 = 0.02;
/// Fraction of the way to the control point covered by a curve end
/// segment.
const CP_FRAC: f64 = 0.4;
/// Half length of a bend segment.
const BEND_LENGTH: f64 = 2.0;
/// Distance from an extremum at which its segment ends.
const EXTREMA_DIST: f64 = 20.0;
const MIN_EXTREMUM_DEPTH: f64 = 2.0;
/// Turns sharper than this (the sine of the angle between the two
/// tangents) make a spike, which gets bends in both directions.
const SPIKE_TURN: f64 = 0.05;
/// Locations closer than this are the same location.
pub(crate) const SAME_LOC: f64 = 0.5;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub(crate) enum SegmentKind {
    Line,
    Bend,
    Curve,
    /// Edge of a bounding box, used when nothing better is available.
    BBox,
    Ghost,
}

/// One candidate stem side.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Segment {
    /// Position on the hinting axis.
    pub loc: f64,
    /// Extent along the stem edge.
    pub min: f64,
    pub max: f64,
    pub kind: SegmentKind,
    pub increasing: bool,
    /// Originating elements; the first is the primary one.
    pub elements: Vec<ElementHandle>,
    pub bonus: f64,
    /// Index of the best stem value using this segment.
    pub best: Option<usize>,
    /// Path generation the handles refer to.
    pub generation: u32,
}

impl Segment {
    pub fn len(&self) -> f64 {
        self.max - self.min
    }

    pub fn overlaps(&self, other: &Segment) -> bool {
        self.min <= other.max && other.min <= self.max
    }

    pub fn shares_element(&self, other: &Segment) -> bool {
        self.elements.iter().any(|h| other.elements.contains(h))
    }
}

/// Generates the cleaned up segments for one dimension.
pub(crate) fn generate(axis: &impl AxisPolicy, path: &Path) -> Vec<Segment> {
    let dim = axis.dim();
    let generation = path.generation();
    let mut segments = Vec::new();
    let mut push = |loc: f64, o0: f64, o1: f64, kind, increasing, elements: Vec<ElementHandle>| {
        segments.push(Segment {
            loc,
            min: o0.min(o1),
            max: o0.max(o1),
            kind,
            increasing,
            elements,
            bonus: 0.0,
            best: None,
            generation,
        });
    };
    for handle in path.handles() {
        let (Some(el), Some(prev), Some(next)) = (
            path.element(handle),
            path.element(path.prev(handle)),
            path.element(path.next(handle)),
        ) else {
            continue;
        };
        let flex = flex_in_dim(path, handle, dim);
        // the junction at the start of this element
        if flex != Some(FlexPhase::Second) {
            for increasing in bend_directions(axis, prev, el) {
                let p = el.s;
                push(
                    p.a(dim),
                    p.o(dim) - BEND_LENGTH,
                    p.o(dim) + BEND_LENGTH,
                    SegmentKind::Bend,
                    increasing,
                    vec![handle, path.prev(handle)],
                );
            }
        }
        match flex {
            Some(FlexPhase::First) => {
                // the pair is hinted along its chord
                let second = path.next(handle);
                let after = path.element(path.next(second)).unwrap_or(next);
                let end = path.element(second).map_or(el.e, |second| second.e);
                if let Some(seg) = line_segment(axis, el.s, end, prev, after) {
                    push(
                        seg.loc,
                        seg.o0,
                        seg.o1,
                        SegmentKind::Line,
                        seg.increasing,
                        vec![handle, second],
                    );
                }
            }
            Some(_) => {}
            None if el.is_line() => {
                if let Some(seg) = line_segment(axis, el.s, el.e, prev, next) {
                    push(
                        seg.loc,
                        seg.o0,
                        seg.o1,
                        SegmentKind::Line,
                        seg.increasing,
                        vec![handle],
                    );
                }
            }
            None => {
                let start = el.start_tangent();
                if is_flat(start, dim) {
                    let p = el.s;
                    let o1 = p.o(dim) + start.o(dim) * CP_FRAC;
                    let increasing = axis.increasing(start.o(dim));
                    push(p.a(dim), p.o(dim), o1, SegmentKind::Curve, increasing, vec![handle]);
                }
                let end = el.end_tangent();
                if is_flat(end, dim) {
                    let p = el.e;
                    let o0 = p.o(dim) - end.o(dim) * CP_FRAC;
                    let increasing = axis.increasing(end.o(dim));
                    push(p.a(dim), o0, p.o(dim), SegmentKind::Curve, increasing, vec![handle]);
                }
                for ext in extrema(axis, el) {
                    push(ext.loc, ext.o0, ext.o1, SegmentKind::Curve, ext.increasing, vec![handle]);
                }
            }
        }
    }
    compact(&mut segments);
    remove_dominated_bends(&mut segments);
    if let Some(bounds) = path.bounds() {
        let (lo, hi) = match dim {
            Dimension::Horizontal => (bounds.min_y(), bounds.max_y()),
            Dimension::Vertical => (bounds.min_x(), bounds.max_x()),
        };
        for seg in &mut segments {
            if (seg.loc - lo).abs() < SAME_LOC || (seg.loc - hi).abs() < SAME_LOC {
                seg.bonus = 1.0;
            }
        }
    }
    segments.sort_by(|a, b| {
        a.loc
            .total_cmp(&b.loc)
            .then(a.min.total_cmp(&b.min))
            .then(a.increasing.cmp(&b.increasing))
    });
    segments
}

/// The flex role of an element, if its flex pair runs parallel to the
/// stem edges of `dim`.
fn flex_in_dim(path: &Path, handle: ElementHandle, dim: Dimension) -> Option<FlexPhase> {
    let el = path.element(handle)?;
    let (first, second) = match el.flex {
        FlexPhase::None => return None,
        FlexPhase::First => (el, path.element(path.next(handle))?),
        FlexPhase::Second => (path.element(path.prev(handle))?, el),
    };
    let chord = second.e - first.s;
    (chord.a(dim).abs() <= FLAT_RATIO * chord.o(dim).abs()).then_some(el.flex)
}

fn is_flat(v: Vec2, dim: Dimension) -> bool {
    v.o(dim) != 0.0 && v.a(dim).abs() <= THETA * v.o(dim).abs()
}

struct RawSegment {
    loc: f64,
    o0: f64,
    o1: f64,
    increasing: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Spot {
    Start,
    End,
    Mid,
}

/// Segment for a straight run from `p0` to `p1`.
fn line_segment(
    axis: &impl AxisPolicy,
    p0: Point,
    p1: Point,
    prev: &PathElement,
    next: &PathElement,
) -> Option<RawSegment> {
    let dim = axis.dim();
    let d = p1 - p0;
    if !is_flat(d, dim) {
        return None;
    }
    let increasing = axis.increasing(d.o(dim));
    let ratio = d.a(dim).abs() / d.o(dim).abs();
    if ratio <= FLAT_RATIO {
        let loc = match pick_spot(axis, p0, p1, prev, next) {
            _ if d.a(dim) == 0.0 => p0.a(dim),
            Spot::Start => p0.a(dim),
            Spot::End => p1.a(dim),
            Spot::Mid => (p0.a(dim) + p1.a(dim)) * 0.5,
        };
        return Some(RawSegment {
            loc,
            o0: p0.o(dim),
            o1: p1.o(dim),
            increasing,
        });
    }
    let reduced = d.o(dim) * (1.0 - ratio / THETA);
    let (loc, o0, o1) = match pick_spot(axis, p0, p1, prev, next) {
        Spot::Start => (p0.a(dim), p0.o(dim), p0.o(dim) + reduced),
        Spot::End => (p1.a(dim), p1.o(dim) - reduced, p1.o(dim)),
        Spot::Mid => {
            let mid = p0.midpoint(p1);
            (mid.a(dim), mid.o(dim) - reduced * 0.5, mid.o(dim) + reduced * 0.5)
        }
    };
    Some(RawSegment {
        loc,
        o0,
        o1,
        increasing,
    })
}

/// Chooses which end of a sloped run stands for it.
fn pick_spot(
    axis: &impl AxisPolicy,
    p0: Point,
    p1: Point,
    prev: &PathElement,
    next: &PathElement,
) -> Spot {
    let dim = axis.dim();
    let prefer = |at_start: bool, at_end: bool| match (at_start, at_end) {
        (true, false) => Some(Spot::Start),
        (false, true) => Some(Spot::End),
        _ => None,
    };
    let same = |a: Point, b: Point| (a.a(dim) - b.a(dim)).abs() < SAME_LOC;
    prefer(axis.in_band(p0.a(dim)), axis.in_band(p1.a(dim)))
        // the neighbouring control points continue flat from one end
        .or_else(|| prefer(same(prev.ce, p0) && prev.ce != p0, same(next.cs, p1) && next.cs != p1))
        // the neighbouring splines come back to the same location
        .or_else(|| prefer(same(prev.s, p0), same(next.e, p1)))
        .unwrap_or(Spot::Mid)
}

/// Directions of the bend segments at the junction between `prev` and
/// `el`, if the junction is a sharp extremum.
///
/// The direction follows from the turn at the junction: a convex extremum
/// of a counter-clockwise contour is an outer edge of the glyph and a
/// concave one an inner edge.
fn bend_directions(axis: &impl AxisPolicy, prev: &PathElement, el: &PathElement) -> Vec<bool> {
    let dim = axis.dim();
    let v_in = prev.end_tangent();
    let v_out = el.start_tangent();
    if v_in.hypot2() == 0.0 || v_out.hypot2() == 0.0 {
        return vec![];
    }
    if is_flat(v_in, dim) || is_flat(v_out, dim) {
        return vec![];
    }
    // an extremum: travel along the axis reverses
    if v_in.a(dim) * v_out.a(dim) >= 0.0 {
        return vec![];
    }
    let (n_in, n_out) = (v_in.normalize(), v_out.normalize());
    let turn = n_in.a(dim) * n_out.o(dim) - n_in.o(dim) * n_out.a(dim);
    if turn.abs() <= SPIKE_TURN {
        return vec![true, false];
    }
    // the edge through the junction runs along `o` in this direction
    let travel = if v_in.a(dim) < 0.0 { -turn } else { turn };
    vec![axis.increasing(travel)]
}

/// Segments at interior extrema of a curve.
fn extrema(axis: &impl AxisPolicy, el: &PathElement) -> Vec<RawSegment> {
    let dim = axis.dim();
    let cubic = el.to_cubic();
    let [p0, p1, p2, p3] = [el.s, el.cs, el.ce, el.e].map(|p| p.a(dim));
    // a(t) = c0 + c1 t + c2 t^2 + c3 t^3
    let c0 = p0;
    let c1 = 3.0 * (p1 - p0);
    let c2 = 3.0 * (p0 - 2.0 * p1 + p2);
    let c3 = -p0 + 3.0 * p1 - 3.0 * p2 + p3;
    let mut result = Vec::new();
    for t in solve_quadratic(c1, 2.0 * c2, 3.0 * c3) {
        if !(t > 0.0 && t < 1.0) {
            continue;
        }
        let ext = cubic.eval(t);
        let loc = ext.a(dim);
        if (loc - p0).abs() < MIN_EXTREMUM_DEPTH || (loc - p3).abs() < MIN_EXTREMUM_DEPTH {
            continue;
        }
        let target = if loc > p0 {
            loc - EXTREMA_DIST
        } else {
            loc + EXTREMA_DIST
        };
        let roots = solve_cubic(c0 - target, c1, c2, c3);
        let before = roots
            .iter()
            .copied()
            .filter(|r| *r >= 0.0 && *r < t)
            .fold(0.0, f64::max);
        let after = roots
            .iter()
            .copied()
            .filter(|r| *r > t && *r <= 1.0)
            .fold(1.0, f64::min);
        let o0 = cubic.eval(before).o(dim);
        let o1 = cubic.eval(after).o(dim);
        if o0 == o1 {
            continue;
        }
        result.push(RawSegment {
            loc,
            o0,
            o1,
            increasing: axis.increasing(o1 - o0),
        });
    }
    result
}

/// Joins same-direction segments at the same location whose extents
/// overlap.
fn compact(segments: &mut Vec<Segment>) {
    segments.sort_by(|a, b| {
        a.increasing
            .cmp(&b.increasing)
            .then(a.loc.total_cmp(&b.loc))
            .then(a.min.total_cmp(&b.min))
    });
    let mut result: Vec<Segment> = Vec::with_capacity(segments.len());
    for seg in segments.drain(..) {
        if let Some(last) = result.iter_mut().rev().find(|last| {
            last.increasing == seg.increasing
                && (last.loc - seg.loc).abs() < SAME_LOC
                && last.overlaps(&seg)
        }) {
            if last.kind == SegmentKind::Bend && seg.kind != SegmentKind::Bend {
                last.kind = seg.kind;
                last.loc = seg.loc;
                let mut elements = seg.elements.clone();
                elements.extend(last.elements.iter().filter(|h| !seg.elements.contains(h)));
                last.elements = elements;
            } else {
                let extra = seg
                    .elements
                    .iter()
                    .filter(|h| !last.elements.contains(h))
                    .copied()
                    .collect::<Vec<_>>();
                last.elements.extend(extra);
            }
            last.min = last.min.min(seg.min);
            last.max = last.max.max(seg.max);
            last.bonus = last.bonus.max(seg.bonus);
            continue;
        }
        result.push(seg);
    }
    *segments = result;
}

/// Drops bends that sit on a much longer opposing edge.
fn remove_dominated_bends(segments: &mut Vec<Segment>) {
    let dominated = segments
        .iter()
        .map(|bend| {
            bend.kind == SegmentKind::Bend
                && segments.iter().any(|seg| {
                    seg.kind != SegmentKind::Bend
                        && seg.increasing != bend.increasing
                        && (seg.loc - bend.loc).abs() < SAME_LOC
                        && seg.overlaps(bend)
                        && seg.len() >= 3.0 * bend.len()
                })
        })
        .collect::<Vec<_>>();
    let mut dominated = dominated.into_iter();
    segments.retain(|_| !dominated.next().unwrap_or(false));
}
