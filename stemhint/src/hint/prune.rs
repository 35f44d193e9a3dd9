//! Pruning, segment association and merging of stem candidates.

use super::{
    segments::{Segment, SegmentKind},
    stems::StemValue,
};
use crate::path::{Dimension, ElementHandle, Path};

/// A candidate is pruned by one this many times stronger...
const PRUNE_FACTOR: f64 = 3.0;
/// ...with both sides at most this far away.
const PRUNE_DISTANCE: f64 = 10.0;
/// Bend sides this close to a stronger stem's side are pruned.
const MAX_BEND_MERGE: f64 = 6.0;
/// Candidates this close to a stronger one on both sides are pruned.
const NEAR_FUZZ: f64 = 1.0;
/// Candidates this close to a stronger one on both sides are merged into
/// it.
pub(crate) const MAX_MERGE: f64 = 2.0;
/// Elements walked when looking for a path between two segments.
const CLOSE_STEPS: usize = 4;

/// Marks candidates dominated by nearby stronger candidates.
pub(crate) fn prune(values: &mut [StemValue], segments: &[Segment], path: &Path, dim: Dimension) {
    loop {
        let mut changed = false;
        for c in 0..values.len() {
            if values[c].pruned {
                continue;
            }
            let dominated = (0..values.len()).any(|d| {
                d != c
                    && !values[d].pruned
                    && dominates(&values[d], &values[c], segments, path, dim)
            });
            if dominated {
                values[c].pruned = true;
                changed = true;
            }
        }
        if !changed {
            break;
        }
    }
}

fn dominates(d: &StemValue, c: &StemValue, segments: &[Segment], path: &Path, dim: Dimension) -> bool {
    if d.is_ghost() != c.is_ghost() || d.value <= c.value {
        return false;
    }
    let lo_dist = (c.lo - d.lo).abs();
    let hi_dist = (c.hi - d.hi).abs();
    if d.value > c.value * PRUNE_FACTOR
        && lo_dist <= PRUNE_DISTANCE
        && hi_dist <= PRUNE_DISTANCE
        && close(&segments[c.lo_seg], &segments[d.lo_seg], path, dim)
        && close(&segments[c.hi_seg], &segments[d.hi_seg], path, dim)
    {
        return true;
    }
    let is_bend = |ix: usize| segments[ix].kind == SegmentKind::Bend;
    (is_bend(c.lo_seg) && lo_dist <= MAX_BEND_MERGE)
        || (is_bend(c.hi_seg) && hi_dist <= MAX_BEND_MERGE)
        || (lo_dist <= NEAR_FUZZ && hi_dist <= NEAR_FUZZ)
}

/// Returns true if two segments are on the same element or connected by a
/// short stretch of outline that stays near both.
pub(crate) fn close(a: &Segment, b: &Segment, path: &Path, dim: Dimension) -> bool {
    if a.shares_element(b) {
        return true;
    }
    let lo = a.loc.min(b.loc) - PRUNE_DISTANCE;
    let hi = a.loc.max(b.loc) + PRUNE_DISTANCE;
    let within = |handle: ElementHandle| {
        path.current(handle, a.generation).is_some_and(|el| {
            let (min, max) = el.a_range(dim);
            min >= lo && max <= hi
        })
    };
    let steps: [fn(&Path, ElementHandle) -> ElementHandle; 2] = [Path::next, Path::prev];
    for start in &a.elements {
        for step in steps {
            let mut handle = *start;
            for _ in 0..CLOSE_STEPS {
                handle = step(path, handle);
                if handle == *start || !within(handle) {
                    break;
                }
                if b.elements.contains(&handle) {
                    return true;
                }
            }
        }
    }
    false
}

/// Points each segment at its best candidate and drops candidates no
/// segment wants.
pub(crate) fn associate(values: &mut [StemValue], segments: &mut [Segment]) {
    for seg in segments.iter_mut() {
        seg.best = None;
    }
    for (ix, value) in values.iter().enumerate() {
        if value.pruned {
            continue;
        }
        for seg_ix in [value.lo_seg, value.hi_seg] {
            let seg = &mut segments[seg_ix];
            match seg.best {
                Some(best) if !value.beats(&values[best]) => {}
                _ => seg.best = Some(ix),
            }
        }
    }
    let mut used = vec![false; values.len()];
    for best in segments.iter().filter_map(|seg| seg.best) {
        used[best] = true;
    }
    for (value, used) in values.iter_mut().zip(used) {
        if !used {
            value.pruned = true;
        }
    }
}

/// Moves weaker candidates onto nearly coincident stronger ones.
pub(crate) fn merge(values: &mut [StemValue], segments: &[Segment], path: &Path, dim: Dimension) {
    let mut order = (0..values.len())
        .filter(|ix| !values[*ix].pruned)
        .collect::<Vec<_>>();
    order.sort_by(|a, b| values[*b].value.total_cmp(&values[*a].value).then(a.cmp(b)));
    for (k, &strong) in order.iter().enumerate() {
        for &weak in &order[k + 1..] {
            let (s, w) = (&values[strong], &values[weak]);
            if s.ghost != w.ghost || (s.lo == w.lo && s.hi == w.hi) {
                continue;
            }
            if (s.lo - w.lo).abs() <= MAX_MERGE
                && (s.hi - w.hi).abs() <= MAX_MERGE
                && close(&segments[s.lo_seg], &segments[w.lo_seg], path, dim)
                && close(&segments[s.hi_seg], &segments[w.hi_seg], path, dim)
            {
                let (lo, hi) = (s.lo, s.hi);
                values[weak].lo = lo;
                values[weak].hi = hi;
                values[weak].merged = true;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        fd::FdDict,
        hint::{axis::Horizontal, segments, stems},
        path::PathBuilder,
    };

    fn value(lo: f64, hi: f64, value: f64, lo_seg: usize, hi_seg: usize) -> StemValue {
        StemValue {
            lo,
            hi,
            value,
            spc: 0.0,
            lo_seg,
            hi_seg,
            ghost: None,
            pruned: false,
            merged: false,
        }
    }

    fn segment(loc: f64, increasing: bool, element: usize) -> Segment {
        Segment {
            loc,
            min: 0.0,
            max: 100.0,
            kind: SegmentKind::Line,
            increasing,
            elements: vec![ElementHandle::new(0, element)],
            bonus: 0.0,
            best: None,
            generation: 0,
        }
    }

    /// A bar with a slightly thinner notch on its right end.
    fn notched_bar() -> Path {
        let mut builder = PathBuilder::new();
        builder.move_to((0.0, 0.0));
        builder.line_to((400.0, 0.0));
        builder.line_to((400.0, 1.0));
        builder.line_to((420.0, 1.0));
        builder.line_to((420.0, 51.0));
        builder.line_to((0.0, 51.0));
        builder.finish()
    }

    #[test]
    fn near_coincident_weak_candidate_pruned() {
        let fd = FdDict::default();
        let path = notched_bar();
        let axis = Horizontal::new(&fd, "a");
        let mut segs = segments::generate(&axis, &path);
        let mut values = stems::evaluate(&axis, &segs);
        let strong = values.iter().position(|v| (v.lo, v.hi) == (0.0, 51.0)).unwrap();
        let weak = values.iter().position(|v| (v.lo, v.hi) == (1.0, 51.0)).unwrap();
        assert!(values[strong].value > values[weak].value * 20.0);
        prune(&mut values, &segs, &path, Dimension::Horizontal);
        associate(&mut values, &mut segs);
        assert!(values[weak].pruned);
        assert!(!values[strong].pruned);
        // the notch edge now belongs to the strong stem
        let notch = segs.iter().find(|seg| seg.loc == 1.0).unwrap();
        assert_eq!(notch.best, None);
        let top = segs.iter().find(|seg| seg.loc == 51.0).unwrap();
        assert_eq!(top.best, Some(strong));
    }

    #[test]
    fn ghosts_only_prune_ghosts() {
        let path = notched_bar();
        let segs = vec![segment(0.0, true, 0), segment(51.0, false, 4)];
        let mut values = vec![value(0.0, 51.0, 1000.0, 0, 1), value(21.0, 0.0, 1.0, 0, 0)];
        values[1].ghost = Some(crate::path::GhostSide::Bottom);
        prune(&mut values, &segs, &path, Dimension::Horizontal);
        assert!(!values[1].pruned);
    }

    #[test]
    fn bend_side_pruned() {
        let path = notched_bar();
        let mut segs = vec![segment(0.0, true, 0), segment(51.0, false, 4), segment(46.0, false, 3)];
        segs[2].kind = SegmentKind::Bend;
        let mut values = vec![value(0.0, 51.0, 10.0, 0, 1), value(0.0, 46.0, 9.0, 0, 2)];
        prune(&mut values, &segs, &path, Dimension::Horizontal);
        assert!(values[1].pruned);
        assert!(!values[0].pruned);
    }

    #[test]
    fn association_drops_unused() {
        let mut segs = vec![segment(0.0, true, 0), segment(50.0, false, 2), segment(60.0, false, 3)];
        let mut values = vec![value(0.0, 50.0, 10.0, 0, 1), value(0.0, 60.0, 5.0, 0, 2)];
        associate(&mut values, &mut segs);
        assert_eq!(segs[0].best, Some(0));
        assert_eq!(segs[1].best, Some(0));
        // the only segment unique to the weaker value still wants it
        assert_eq!(segs[2].best, Some(1));
        assert!(!values[1].pruned);
        segs.pop();
        values[1].hi_seg = 1;
        associate(&mut values, &mut segs);
        assert!(values[1].pruned);
    }

    #[test]
    fn merge_moves_weaker_value() {
        let path = notched_bar();
        let segs = vec![segment(0.0, true, 0), segment(51.0, false, 4), segment(1.5, true, 1)];
        let mut values = vec![value(0.0, 51.0, 10.0, 0, 1), value(1.5, 51.0, 8.0, 2, 1)];
        merge(&mut values, &segs, &path, Dimension::Horizontal);
        assert!(values[1].merged);
        assert_eq!((values[1].lo, values[1].hi), (0.0, 51.0));
    }

    #[test]
    fn closeness_follows_outline() {
        let path = notched_bar();
        // bottom edge and notch edge are two elements apart
        let a = segment(0.0, true, 0);
        let b = segment(1.0, true, 2);
        assert!(close(&a, &b, &path, Dimension::Horizontal));
        // every route to the top edge climbs out of the band
        let far = segment(1.0, true, 4);
        assert!(!close(&a, &far, &path, Dimension::Horizontal));
    }
}
