//! Stem candidate evaluation.
//!
//! Pairs an increasing segment (the low side of a stem) with a decreasing
//! segment above it and rates the pair. Long, overlapping, closely spaced
//! edges make the best stems.

use super::{
    axis::AxisPolicy,
    segments::{Segment, SegmentKind},
};
use crate::{
    fd::ZoneKind,
    path::{GhostSide, Stem},
};

pub(crate) const MIN_VALUE: f64 = 1.0 / 256.0;
pub(crate) const MAX_VALUE: f64 = 8_000_000.0;
/// Stems narrower than this are ignored.
const MIN_DIST: f64 = 7.0;
/// Stems wider than this factor of the widest dominant stem are penalized.
const BIG_DIST_FACTOR: f64 = 23.0 / 20.0;
/// Limit used when no dominant stems are known.
const DEFAULT_BIG_DIST: f64 = 150.0;
const NO_OVERLAP_PENALTY: f64 = 7.0 / 5.0;
const GAP_PENALTY: f64 = 8.0 / 5.0;
const GHOST_WIDTH: f64 = 20.0;
const GHOST_LENGTH: f64 = 4.0;
/// Weight of specialness in the selection score.
const SPECIAL_WEIGHT: f64 = 4.0;

/// A rated stem candidate.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct StemValue {
    pub lo: f64,
    pub hi: f64,
    pub value: f64,
    /// Specialness: alignment zone hits, glyph extremes and dominant widths.
    pub spc: f64,
    pub lo_seg: usize,
    pub hi_seg: usize,
    pub ghost: Option<GhostSide>,
    pub pruned: bool,
    pub merged: bool,
}

impl StemValue {
    pub fn stem(&self) -> Stem {
        match self.ghost {
            Some(GhostSide::Top) => Stem::ghost(GhostSide::Top, self.lo),
            Some(GhostSide::Bottom) => Stem::ghost(GhostSide::Bottom, self.hi),
            None => Stem::new(self.lo, self.hi),
        }
    }

    pub fn span(&self) -> (f64, f64) {
        self.stem().span()
    }

    pub fn score(&self) -> f64 {
        self.value * (1.0 + SPECIAL_WEIGHT * self.spc)
    }

    pub fn is_ghost(&self) -> bool {
        self.ghost.is_some()
    }

    /// Returns true if `self` should win over `other` for a segment.
    pub fn beats(&self, other: &StemValue) -> bool {
        self.value > other.value
            || (self.value == other.value && other.is_ghost() && !self.is_ghost())
    }

    fn same_location(&self, other: &StemValue) -> bool {
        self.lo.round() == other.lo.round()
            && self.hi.round() == other.hi.round()
            && self.ghost == other.ghost
    }
}

fn clamp_value(value: f64) -> f64 {
    value.clamp(MIN_VALUE, MAX_VALUE)
}

/// Rates every viable pair of segments, plus ghost stems for edges in
/// alignment zones.
pub(crate) fn evaluate(axis: &impl AxisPolicy, segments: &[Segment]) -> Vec<StemValue> {
    let dominant = axis.dominant_stems();
    let widest = dominant.iter().copied().fold(0.0, f64::max);
    let big_dist = if widest > 0.0 {
        widest * BIG_DIST_FACTOR
    } else {
        DEFAULT_BIG_DIST
    };
    let mut values = Vec::new();
    for (lo_ix, lo) in segments.iter().enumerate() {
        if !lo.increasing {
            continue;
        }
        for (hi_ix, hi) in segments.iter().enumerate() {
            if hi.increasing || hi.loc < lo.loc {
                continue;
            }
            if let Some((value, spc)) = rate_pair(axis, lo, hi, big_dist, dominant) {
                values.push(StemValue {
                    lo: lo.loc,
                    hi: hi.loc,
                    value,
                    spc,
                    lo_seg: lo_ix,
                    hi_seg: hi_ix,
                    ghost: None,
                    pruned: false,
                    merged: false,
                });
            }
        }
    }
    for (ix, seg) in segments.iter().enumerate() {
        if let Some(value) = ghost_value(axis, seg, ix) {
            values.push(value);
        }
    }
    combine_duplicates(&mut values);
    values
}

fn rate_pair(
    axis: &impl AxisPolicy,
    lo: &Segment,
    hi: &Segment,
    big_dist: f64,
    dominant: &[f64],
) -> Option<(f64, f64)> {
    let dist = hi.loc - lo.loc;
    if dist < MIN_DIST {
        return None;
    }
    let lo_band = axis.band(lo.loc);
    let hi_band = axis.band(hi.loc);
    let mut spc = 0.0;
    match (lo_band, hi_band) {
        (Some(a), Some(b)) if a.index != b.index => return None,
        (Some(_), Some(_)) => spc += 4.0,
        (Some(_), None) | (None, Some(_)) => spc += 2.0,
        (None, None) => {}
    }
    if lo.bonus > 0.0 && hi.bonus > 0.0 {
        spc += 2.0;
    }
    if dominant.iter().any(|width| width.round() == dist.round()) {
        spc += 1.0;
    }
    let overlap = lo.max.min(hi.max) - lo.min.max(hi.min);
    let effective = if overlap >= 0.0 {
        dist
    } else {
        dist * NO_OVERLAP_PENALTY - overlap * GAP_PENALTY
    };
    let (e1, e2) = (lo.len().max(1.0), hi.len().max(1.0));
    let mut value = clamp_value(1000.0 * e1 * e1 * e2 * e2 / effective.powi(4));
    if dist > big_dist {
        value *= (big_dist / dist).powi(8);
    }
    Some((value, spc))
}

fn ghost_value(axis: &impl AxisPolicy, seg: &Segment, ix: usize) -> Option<StemValue> {
    if seg.kind == SegmentKind::Bend {
        return None;
    }
    let band = axis.band(seg.loc)?;
    let side = match (band.kind, seg.increasing) {
        (ZoneKind::Bottom, true) => GhostSide::Bottom,
        (ZoneKind::Top, false) => GhostSide::Top,
        _ => return None,
    };
    let stem = Stem::ghost(side, seg.loc);
    let len = seg.len().max(1.0);
    let value = 1000.0 * len * len * GHOST_LENGTH * GHOST_LENGTH / GHOST_WIDTH.powi(4);
    Some(StemValue {
        lo: stem.lo,
        hi: stem.hi,
        value: clamp_value(value),
        spc: 2.0,
        lo_seg: ix,
        hi_seg: ix,
        ghost: Some(side),
        pruned: false,
        merged: false,
    })
}

/// Values found at the same location by different segment pairs reinforce
/// each other.
fn combine_duplicates(values: &mut [StemValue]) {
    let mut done = vec![false; values.len()];
    for i in 0..values.len() {
        if done[i] {
            continue;
        }
        let group = (i..values.len())
            .filter(|j| values[*j].same_location(&values[i]))
            .collect::<Vec<_>>();
        if group.len() < 2 {
            continue;
        }
        let total = group.iter().fold(0.0, |acc: f64, j| {
            let v = values[*j].value;
            acc + v + 2.0 * (acc * v).sqrt()
        });
        let spc = group.iter().map(|j| values[*j].spc).fold(0.0, f64::max);
        for j in group {
            values[j].value = clamp_value(total);
            values[j].spc = spc;
            done[j] = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        fd::{AlignmentZone, FdDict},
        hint::{
            axis::{Horizontal, Vertical},
            segments,
        },
        testing::{rect, zone_fd},
    };

    #[test]
    fn rectangle_candidates() {
        let fd = zone_fd();
        let path = rect(0.0, 0.0, 100.0, 700.0);
        let axis = Horizontal::new(&fd, "a");
        let segs = segments::generate(&axis, &path);
        let values = evaluate(&axis, &segs);
        assert_eq!(values.len(), 2);
        // the full height pair is far wider than any dominant stem
        let tall = &values[0];
        assert_eq!((tall.lo, tall.hi), (0.0, 700.0));
        assert!(tall.value < 1e-6);
        assert_eq!(tall.spc, 4.0);
        let ghost = &values[1];
        assert_eq!(ghost.stem(), Stem::new(21.0, 0.0));
        assert_eq!(ghost.ghost, Some(GhostSide::Bottom));
        assert_eq!(ghost.value, 1000.0);

        let axis = Vertical::new(&fd, "a");
        let segs = segments::generate(&axis, &path);
        let values = evaluate(&axis, &segs);
        assert_eq!(values.len(), 1);
        assert_eq!((values[0].lo, values[0].hi), (0.0, 100.0));
        assert_eq!(values[0].value, 2_401_000.0);
        // dominant width plus both edges on the glyph extremes
        assert_eq!(values[0].spc, 3.0);
    }

    #[test]
    fn different_bands_rejected() {
        let fd = FdDict {
            zones: vec![
                AlignmentZone::bottom(-15.0, 0.0),
                AlignmentZone::top(500.0, 515.0),
            ],
            ..Default::default()
        };
        let path = rect(0.0, 0.0, 100.0, 510.0);
        let axis = Horizontal::new(&fd, "a");
        let segs = segments::generate(&axis, &path);
        let values = evaluate(&axis, &segs);
        // only the two ghosts survive
        assert_eq!(values.len(), 2);
        assert!(values.iter().all(StemValue::is_ghost));
    }

    #[test]
    fn duplicates_reinforce() {
        let value = |lo: f64, value: f64| StemValue {
            lo,
            hi: 100.0,
            value,
            spc: 0.0,
            lo_seg: 0,
            hi_seg: 1,
            ghost: None,
            pruned: false,
            merged: false,
        };
        let mut values = vec![value(0.0, 4.0), value(0.2, 9.0), value(30.0, 1.0)];
        combine_duplicates(&mut values);
        assert_eq!(values[0].value, 25.0);
        assert_eq!(values[1].value, 25.0);
        assert_eq!(values[2].value, 1.0);
    }

    #[test]
    fn ghost_loses_ties() {
        let real = StemValue {
            lo: 0.0,
            hi: 50.0,
            value: 10.0,
            spc: 0.0,
            lo_seg: 0,
            hi_seg: 1,
            ghost: None,
            pruned: false,
            merged: false,
        };
        let ghost = StemValue {
            lo: 21.0,
            hi: 0.0,
            ghost: Some(GhostSide::Bottom),
            ..real.clone()
        };
        assert!(real.beats(&ghost));
        assert!(!ghost.beats(&real));
    }
}
