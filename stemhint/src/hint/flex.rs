//! Flex detection.
//!
//! A flex is a pair of curves forming a shallow bump or dip off a straight
//! chord, such as a cupped serif. Rasterizers flatten marked pairs at small
//! sizes.

use crate::path::{AxisView, Dimension, ElementHandle, FlexPhase, Path, PathElement};

/// Maximum depth of a flex.
const MAX_FLEX: f64 = 20.0;
/// The chord must be at least this many times longer than the depth.
const FLEX_LENGTH_RATIO: f64 = 3.0;
/// Slack for coordinates that should coincide.
const FLEX_TOLERANCE: f64 = 1.0;

/// Marks flex pairs in place, returning the number of pairs found.
///
/// Subpaths are closed, so the last curve of a subpath can pair with the
/// first.
pub(crate) fn mark_flex(path: &mut Path) -> usize {
    let mut pairs = Vec::new();
    for (subpath, elements) in path.subpaths().iter().enumerate() {
        let is_pair = |first: usize, second: usize| {
            Dimension::ALL
                .iter()
                .any(|dim| is_flex(&elements[first], &elements[second], *dim))
        };
        let mut used = vec![false; elements.len()];
        let mut offset = 0;
        while offset + 1 < elements.len() {
            if is_pair(offset, offset + 1) {
                pairs.push(ElementHandle::new(subpath, offset));
                used[offset] = true;
                used[offset + 1] = true;
                offset += 2;
            } else {
                offset += 1;
            }
        }
        let last = elements.len().saturating_sub(1);
        if last > 1 && !used[last] && !used[0] && is_pair(last, 0) {
            pairs.push(ElementHandle::new(subpath, last));
        }
    }
    for handle in &pairs {
        let second = path.next(*handle);
        if let Some(el) = path.element_mut(*handle) {
            el.flex = FlexPhase::First;
        }
        if let Some(el) = path.element_mut(second) {
            el.flex = FlexPhase::Second;
        }
    }
    pairs.len()
}

/// Returns true if the curves form a flex whose chord runs along the stem
/// edges of `dim`.
fn is_flex(first: &PathElement, second: &PathElement, dim: Dimension) -> bool {
    if first.is_line() || second.is_line() || first.flex != FlexPhase::None {
        return false;
    }
    let (start, join, end) = (first.s, first.e, second.e);
    if (start.a(dim) - end.a(dim)).abs() > f64::EPSILON {
        return false;
    }
    let depth = join.a(dim) - start.a(dim);
    if depth == 0.0 || depth.abs() > MAX_FLEX {
        return false;
    }
    let chord = end.o(dim) - start.o(dim);
    if chord.abs() < FLEX_LENGTH_RATIO * depth.abs() {
        return false;
    }
    // travel along the chord doesn't double back
    if (join.o(dim) - start.o(dim)) * chord <= 0.0 || (end.o(dim) - join.o(dim)) * chord <= 0.0 {
        return false;
    }
    // the join is an extremum with a tangent parallel to the chord
    if (first.ce.a(dim) - join.a(dim)).abs() > FLEX_TOLERANCE
        || (second.cs.a(dim) - join.a(dim)).abs() > FLEX_TOLERANCE
    {
        return false;
    }
    // control points stay between the chord and the join
    [first.cs, first.ce, second.cs, second.ce].iter().all(|p| {
        let t = (p.a(dim) - start.a(dim)) / depth;
        (-FLEX_TOLERANCE / depth.abs()..=1.0 + FLEX_TOLERANCE / depth.abs()).contains(&t)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::PathBuilder;

    /// A slab serif bottom with a shallow cup.
    fn cupped(depth: f64) -> Path {
        let mut builder = PathBuilder::new();
        builder.move_to((0.0, 0.0));
        builder.curve_to((30.0, 0.0), (60.0, depth), (100.0, depth));
        builder.curve_to((140.0, depth), (170.0, 0.0), (200.0, 0.0));
        builder.line_to((200.0, 100.0));
        builder.line_to((0.0, 100.0));
        builder.finish()
    }

    #[test]
    fn shallow_cup_is_flex() {
        let mut path = cupped(8.0);
        assert_eq!(mark_flex(&mut path), 1);
        let phases = path.subpaths()[0]
            .iter()
            .map(|el| el.flex)
            .collect::<Vec<_>>();
        assert_eq!(
            phases,
            [
                FlexPhase::First,
                FlexPhase::Second,
                FlexPhase::None,
                FlexPhase::None,
                FlexPhase::None
            ]
        );
    }

    #[test]
    fn deep_cup_is_not_flex() {
        let mut path = cupped(30.0);
        assert_eq!(mark_flex(&mut path), 0);
        assert!(path.subpaths()[0].iter().all(|el| el.flex == FlexPhase::None));
    }

    #[test]
    fn flex_across_the_subpath_start() {
        // the cup from `cupped`, with the subpath starting at its bottom
        let mut builder = PathBuilder::new();
        builder.move_to((100.0, 8.0));
        builder.curve_to((140.0, 8.0), (170.0, 0.0), (200.0, 0.0));
        builder.line_to((200.0, 100.0));
        builder.line_to((0.0, 100.0));
        builder.line_to((0.0, 0.0));
        builder.curve_to((30.0, 0.0), (60.0, 8.0), (100.0, 8.0));
        let mut path = builder.finish();
        assert_eq!(path.subpaths()[0].len(), 5);
        assert_eq!(mark_flex(&mut path), 1);
        let phases = path.subpaths()[0]
            .iter()
            .map(|el| el.flex)
            .collect::<Vec<_>>();
        assert_eq!(
            phases,
            [
                FlexPhase::Second,
                FlexPhase::None,
                FlexPhase::None,
                FlexPhase::None,
                FlexPhase::First
            ]
        );
    }

    #[test]
    fn uneven_ends_are_not_flex() {
        let mut builder = PathBuilder::new();
        builder.move_to((0.0, 0.0));
        builder.curve_to((30.0, 0.0), (60.0, 8.0), (100.0, 8.0));
        builder.curve_to((140.0, 8.0), (170.0, 4.0), (200.0, 4.0));
        builder.line_to((200.0, 100.0));
        let mut path = builder.finish();
        assert_eq!(mark_flex(&mut path), 0);
    }
}
