//! Analysis of overlapping outlines.
//!
//! Stems that cross an overlap produce bogus candidates, so glyphs can be
//! analyzed on the union of their contours instead. The union is computed by
//! an external [`OverlapRemover`]; its elements are mapped back to the
//! original outline so that hints still attach to the original elements.

use std::collections::HashMap;

use kurbo::{BezPath, ParamCurveNearest, Point};
use thiserror::Error;

use crate::{
    diag::Diagnostics,
    hint::{
        axis::AxisPolicy,
        segments::{self, Segment},
    },
    path::{ElementHandle, Path, PathElement},
};

/// Distance within which a point is considered to lie on an element.
const OVERLAP_TOLERANCE: f64 = 1.0;
/// Distance within which two endpoints are the same.
const SAME_POINT: f64 = 1e-3;
/// Accuracy of nearest point queries.
const NEAREST_ACCURACY: f64 = 1e-3;

/// Failure reported by an [`OverlapRemover`].
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("overlap removal failed: {0}")]
pub struct OverlapError(pub String);

/// Computes the union of the contours of an outline.
pub trait OverlapRemover: Send + Sync {
    fn union(&self, path: &BezPath) -> Result<BezPath, OverlapError>;
}

/// An overlap-free copy of an outline with each of its elements mapped to
/// the element of the original it was cut from.
#[derive(Clone, Debug)]
pub(crate) struct OverlapMap {
    path: Path,
    map: HashMap<ElementHandle, ElementHandle>,
}

impl OverlapMap {
    /// Segments of the overlap-free outline, referring to the elements of
    /// `original`.
    pub fn segments(&self, axis: &impl AxisPolicy, original: &Path) -> Vec<Segment> {
        segments::generate(axis, &self.path)
            .into_iter()
            .filter_map(|mut seg| {
                let mut elements = Vec::with_capacity(seg.elements.len());
                for handle in seg.elements.iter().filter_map(|h| self.map.get(h)) {
                    if !elements.contains(handle) {
                        elements.push(*handle);
                    }
                }
                if elements.is_empty() {
                    return None;
                }
                seg.elements = elements;
                seg.generation = original.generation();
                Some(seg)
            })
            .collect()
    }

    #[cfg(test)]
    fn original_of(&self, handle: ElementHandle) -> Option<ElementHandle> {
        self.map.get(&handle).copied()
    }
}

/// Removes overlaps from `original`.
///
/// Returns `None` if the outline has no overlaps or the union failed, in
/// which case the original is analyzed as is.
pub(crate) fn remove_overlap(
    original: &Path,
    remover: &dyn OverlapRemover,
    diag: &Diagnostics,
) -> Option<OverlapMap> {
    let union = match remover.union(&original.to_bezpath()) {
        Ok(union) => union,
        Err(err) => {
            diag.warn(format!("{err}; using the original outline"));
            return None;
        }
    };
    let path = Path::from_bezpath(&union);
    if path.geometry_eq(original) {
        return None;
    }
    let mut map = HashMap::new();
    let mut unmapped = 0;
    for handle in path.handles() {
        match path
            .element(handle)
            .and_then(|el| find_original(el, original))
        {
            Some(source) => {
                map.insert(handle, source);
            }
            None => unmapped += 1,
        }
    }
    if unmapped > 0 {
        diag.debug(format!("{unmapped} elements of the union have no source"));
    }
    Some(OverlapMap { path, map })
}

/// Finds the element of `original` that `el` was cut from.
fn find_original(el: &PathElement, original: &Path) -> Option<ElementHandle> {
    let same = |a: Point, b: Point| (a - b).hypot() <= SAME_POINT;
    let on = |p: Point, source: &PathElement| {
        source.to_seg().nearest(p, NEAREST_ACCURACY).distance_sq
            <= OVERLAP_TOLERANCE * OVERLAP_TOLERANCE
    };
    let candidates = || {
        original
            .handles()
            .filter_map(|handle| Some((handle, original.element(handle)?)))
    };
    // untouched
    if let Some((handle, _)) = candidates().find(|(_, source)| {
        (same(source.s, el.s) && same(source.e, el.e))
            || (same(source.s, el.e) && same(source.e, el.s))
    }) {
        return Some(handle);
    }
    // cut at one end
    if let Some((handle, _)) = candidates().find(|(_, source)| {
        [(el.s, el.e), (el.e, el.s)].iter().any(|(shared, other)| {
            (same(source.s, *shared) || same(source.e, *shared)) && on(*other, source)
        })
    }) {
        return Some(handle);
    }
    // cut at both ends
    if let Some((handle, _)) = candidates().find(|(_, source)| on(el.s, source) && on(el.e, source))
    {
        return Some(handle);
    }
    let bounds = el.bounds();
    let center = bounds.center();
    candidates()
        .filter(|(_, source)| {
            let near = source.bounds().inflate(OVERLAP_TOLERANCE, OVERLAP_TOLERANCE);
            near.x0 <= bounds.x1
                && bounds.x0 <= near.x1
                && near.y0 <= bounds.y1
                && bounds.y0 <= near.y1
        })
        .min_by(|(_, a), (_, b)| {
            let da = (a.bounds().center() - center).hypot2();
            let db = (b.bounds().center() - center).hypot2();
            da.total_cmp(&db)
        })
        .map(|(handle, _)| handle)
}
