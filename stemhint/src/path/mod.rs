//! Outline model consumed and produced by the hinter.
//!
//! A [`Path`] is a list of implicitly closed subpaths made of lines and
//! cubic curves. Along with the geometry it carries the hint data produced
//! by hinting: stem lists, counter masks, an initial hintmask and the
//! hintmask changes attached to individual elements.

mod builder;
mod mask;

use std::fmt;

use kurbo::{BezPath, CubicBez, Line, ParamCurveExtrema, PathSeg, Point, Rect, Vec2};

pub use builder::PathBuilder;
pub use mask::HintMask;

/// Width of a stem that marks the top edge of a feature.
pub const TOP_GHOST_WIDTH: f64 = -20.0;
/// Width of a stem that marks the bottom edge of a feature.
pub const BOTTOM_GHOST_WIDTH: f64 = -21.0;

/// Ghost edges are kept on the 16.16 fixed point grid of charstring
/// numbers, where adding a ghost width is exact.
const GHOST_EDGE_SCALE: f64 = 65536.0;
/// Stems read from elsewhere may carry rounding error in a ghost width.
const GHOST_WIDTH_TOLERANCE: f64 = 1.0 / GHOST_EDGE_SCALE;

/// Direction of a family of stems.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Dimension {
    /// Horizontal stems, positioned along the y axis.
    Horizontal,
    /// Vertical stems, positioned along the x axis.
    Vertical,
}

impl Dimension {
    pub const ALL: [Dimension; 2] = [Dimension::Horizontal, Dimension::Vertical];

    pub fn index(self) -> usize {
        match self {
            Self::Horizontal => 0,
            Self::Vertical => 1,
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Horizontal => f.write_str("horizontal"),
            Self::Vertical => f.write_str("vertical"),
        }
    }
}

/// Views a point through a hinting dimension.
///
/// `a` is the coordinate a stem is positioned on and `o` runs along the
/// stem edge: for vertical stems `a = x` and `o = y`, for horizontal stems
/// the two are swapped.
pub trait AxisView {
    fn a(self, dim: Dimension) -> f64;
    fn o(self, dim: Dimension) -> f64;
}

impl AxisView for Point {
    fn a(self, dim: Dimension) -> f64 {
        match dim {
            Dimension::Horizontal => self.y,
            Dimension::Vertical => self.x,
        }
    }

    fn o(self, dim: Dimension) -> f64 {
        match dim {
            Dimension::Horizontal => self.x,
            Dimension::Vertical => self.y,
        }
    }
}

impl AxisView for Vec2 {
    fn a(self, dim: Dimension) -> f64 {
        self.to_point().a(dim)
    }

    fn o(self, dim: Dimension) -> f64 {
        self.to_point().o(dim)
    }
}

/// Position of an element within a [`Path`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ElementHandle {
    pub subpath: usize,
    pub offset: usize,
}

impl ElementHandle {
    pub const fn new(subpath: usize, offset: usize) -> Self {
        Self { subpath, offset }
    }
}

/// Role of a curve in a flex pair.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FlexPhase {
    #[default]
    None,
    First,
    Second,
}

/// Charstring operators the hinter can't process.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum UnsupportedOperator {
    /// Accented character composition (`endchar` with four arguments).
    Seac,
    /// Absolute positioning (`callothersubr`-style `setcurrentpoint`).
    AbsolutePosition,
}

impl fmt::Display for UnsupportedOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Seac => f.write_str("seac"),
            Self::AbsolutePosition => f.write_str("absolute positioning"),
        }
    }
}

/// A line or cubic curve.
///
/// Lines carry their endpoints as control points so that tangent queries
/// work the same way for both kinds.
#[derive(Clone, Debug, PartialEq)]
pub struct PathElement {
    pub s: Point,
    pub cs: Point,
    pub ce: Point,
    pub e: Point,
    is_line: bool,
    /// The line implied by closing a subpath.
    pub is_close: bool,
    /// Hintmask taking effect at the start of this element.
    pub mask: Option<HintMask>,
    pub flex: FlexPhase,
}

impl PathElement {
    pub fn line(s: Point, e: Point) -> Self {
        Self {
            s,
            cs: s,
            ce: e,
            e,
            is_line: true,
            is_close: false,
            mask: None,
            flex: FlexPhase::None,
        }
    }

    pub fn curve(s: Point, cs: Point, ce: Point, e: Point) -> Self {
        Self {
            s,
            cs,
            ce,
            e,
            is_line: false,
            is_close: false,
            mask: None,
            flex: FlexPhase::None,
        }
    }

    pub(crate) fn close_line(s: Point, e: Point) -> Self {
        Self {
            is_close: true,
            ..Self::line(s, e)
        }
    }

    pub fn is_line(&self) -> bool {
        self.is_line
    }

    pub fn is_curve(&self) -> bool {
        !self.is_line
    }

    pub fn to_cubic(&self) -> CubicBez {
        CubicBez::new(self.s, self.cs, self.ce, self.e)
    }

    pub fn to_seg(&self) -> PathSeg {
        if self.is_line {
            PathSeg::Line(Line::new(self.s, self.e))
        } else {
            PathSeg::Cubic(self.to_cubic())
        }
    }

    /// Exact bounds of the element.
    pub fn bounds(&self) -> Rect {
        self.to_seg().bounding_box()
    }

    /// Distance between the endpoints.
    pub fn chord_len(&self) -> f64 {
        (self.e - self.s).hypot()
    }

    /// Range covered by the element and its control points along `a`.
    pub(crate) fn a_range(&self, dim: Dimension) -> (f64, f64) {
        [self.cs, self.ce, self.e]
            .iter()
            .fold((self.s.a(dim), self.s.a(dim)), |(lo, hi), p| {
                (lo.min(p.a(dim)), hi.max(p.a(dim)))
            })
    }

    /// Direction of travel leaving the start point.
    pub(crate) fn start_tangent(&self) -> Vec2 {
        [self.cs, self.ce, self.e]
            .iter()
            .map(|p| *p - self.s)
            .find(|v| v.hypot2() > 0.0)
            .unwrap_or_default()
    }

    /// Direction of travel arriving at the end point.
    pub(crate) fn end_tangent(&self) -> Vec2 {
        [self.ce, self.cs, self.s]
            .iter()
            .map(|p| self.e - *p)
            .find(|v| v.hypot2() > 0.0)
            .unwrap_or_default()
    }

    fn same_geometry(&self, other: &PathElement) -> bool {
        self.is_line == other.is_line
            && self.s == other.s
            && self.cs == other.cs
            && self.ce == other.ce
            && self.e == other.e
    }

    fn clear_hints(&mut self) {
        self.mask = None;
        self.flex = FlexPhase::None;
    }
}

/// Which edge of a feature a ghost stem marks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GhostSide {
    Top,
    Bottom,
}

/// A stem hint.
///
/// Ordinary stems have `hi >= lo`. Ghost stems mark a single edge using
/// the reserved widths -20 (top edge at `lo`) and -21 (bottom edge at
/// `hi`).
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Stem {
    pub lo: f64,
    pub hi: f64,
}

impl Stem {
    pub const fn new(lo: f64, hi: f64) -> Self {
        Self { lo, hi }
    }

    /// A ghost stem for the edge at `edge`.
    ///
    /// The edge is rounded to the fixed point grid, so the width is
    /// exactly [`TOP_GHOST_WIDTH`] or [`BOTTOM_GHOST_WIDTH`].
    pub fn ghost(side: GhostSide, edge: f64) -> Self {
        let edge = (edge * GHOST_EDGE_SCALE).round() / GHOST_EDGE_SCALE;
        match side {
            GhostSide::Top => Self::new(edge, edge + TOP_GHOST_WIDTH),
            GhostSide::Bottom => Self::new(edge - BOTTOM_GHOST_WIDTH, edge),
        }
    }

    pub fn width(&self) -> f64 {
        self.hi - self.lo
    }

    pub fn ghost_side(&self) -> Option<GhostSide> {
        let width = self.width();
        if (width - TOP_GHOST_WIDTH).abs() <= GHOST_WIDTH_TOLERANCE {
            Some(GhostSide::Top)
        } else if (width - BOTTOM_GHOST_WIDTH).abs() <= GHOST_WIDTH_TOLERANCE {
            Some(GhostSide::Bottom)
        } else {
            None
        }
    }

    pub fn is_ghost(&self) -> bool {
        self.ghost_side().is_some()
    }

    /// The edge a ghost stem stands for.
    pub fn ghost_edge(&self) -> Option<f64> {
        self.ghost_side().map(|side| match side {
            GhostSide::Top => self.lo,
            GhostSide::Bottom => self.hi,
        })
    }

    /// Interval covered by the stem, ordered.
    pub fn span(&self) -> (f64, f64) {
        (self.lo.min(self.hi), self.lo.max(self.hi))
    }

    /// Returns true if the two stems can't be active at the same time.
    pub fn conflicts_with(&self, other: &Stem) -> bool {
        let (a0, a1) = self.span();
        let (b0, b1) = other.span();
        a0 <= b1 && b0 <= a1
    }

    /// Returns true if `loc` is one of the hinted edges of this stem.
    pub(crate) fn has_edge(&self, loc: f64, tolerance: f64) -> bool {
        match self.ghost_edge() {
            Some(edge) => (edge - loc).abs() <= tolerance,
            None => (self.lo - loc).abs() <= tolerance || (self.hi - loc).abs() <= tolerance,
        }
    }

    /// Ordering used for emitted stem lists.
    pub(crate) fn cmp_position(&self, other: &Stem) -> std::cmp::Ordering {
        let (a0, a1) = self.span();
        let (b0, b1) = other.span();
        a0.total_cmp(&b0).then(a1.total_cmp(&b1))
    }
}

/// A glyph outline with optional hint data.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Path {
    subpaths: Vec<Vec<PathElement>>,
    pub hstems: Vec<Stem>,
    pub vstems: Vec<Stem>,
    /// Counter hint groups.
    pub counter_masks: Vec<HintMask>,
    /// Hintmask in effect from the start of the outline. `None` means the
    /// outline doesn't use hint replacement.
    pub start_mask: Option<HintMask>,
    /// Set by outline converters that met an operator the hinter can't
    /// handle.
    pub unsupported: Option<UnsupportedOperator>,
    generation: u32,
}

impl Path {
    /// Creates a path from subpaths, discarding empty ones.
    pub fn new(subpaths: Vec<Vec<PathElement>>) -> Self {
        Self {
            subpaths: subpaths.into_iter().filter(|sp| !sp.is_empty()).collect(),
            ..Default::default()
        }
    }

    pub fn from_bezpath(path: &BezPath) -> Self {
        PathBuilder::from_bezpath(path).finish()
    }

    pub fn subpaths(&self) -> &[Vec<PathElement>] {
        &self.subpaths
    }

    pub fn is_empty(&self) -> bool {
        self.subpaths.is_empty()
    }

    pub fn element_count(&self) -> usize {
        self.subpaths.iter().map(Vec::len).sum()
    }

    /// Counter bumped on every geometry edit.
    pub fn generation(&self) -> u32 {
        self.generation
    }

    pub fn element(&self, handle: ElementHandle) -> Option<&PathElement> {
        self.subpaths.get(handle.subpath)?.get(handle.offset)
    }

    /// Mutable access for hint data. Geometry edits go through
    /// [`Path::replace_element`].
    pub(crate) fn element_mut(&mut self, handle: ElementHandle) -> Option<&mut PathElement> {
        self.subpaths.get_mut(handle.subpath)?.get_mut(handle.offset)
    }

    /// Resolves a handle recorded against a given generation, returning
    /// `None` if the geometry has changed since.
    pub fn current(&self, handle: ElementHandle, generation: u32) -> Option<&PathElement> {
        if generation != self.generation {
            return None;
        }
        self.element(handle)
    }

    /// Replaces the geometry of an element, invalidating outstanding
    /// handles.
    pub fn replace_element(&mut self, handle: ElementHandle, element: PathElement) -> bool {
        match self.element_mut(handle) {
            Some(slot) => {
                *slot = element;
                self.generation += 1;
                true
            }
            None => false,
        }
    }

    /// Inserts an element, invalidating outstanding handles.
    pub(crate) fn insert_element(&mut self, handle: ElementHandle, element: PathElement) {
        if let Some(subpath) = self.subpaths.get_mut(handle.subpath) {
            subpath.insert(handle.offset.min(subpath.len()), element);
            self.generation += 1;
        }
    }

    /// Iterates over all element handles in outline order.
    pub fn handles(&self) -> impl Iterator<Item = ElementHandle> + '_ {
        self.subpaths.iter().enumerate().flat_map(|(subpath, elements)| {
            (0..elements.len()).map(move |offset| ElementHandle::new(subpath, offset))
        })
    }

    /// The element before `handle`, wrapping around its subpath.
    pub fn prev(&self, handle: ElementHandle) -> ElementHandle {
        let len = self.subpaths.get(handle.subpath).map_or(1, Vec::len).max(1);
        ElementHandle::new(handle.subpath, (handle.offset + len - 1) % len)
    }

    /// The element after `handle`, wrapping around its subpath.
    pub fn next(&self, handle: ElementHandle) -> ElementHandle {
        let len = self.subpaths.get(handle.subpath).map_or(1, Vec::len).max(1);
        ElementHandle::new(handle.subpath, (handle.offset + 1) % len)
    }

    /// Groups elements into the stops visited when distributing hints.
    ///
    /// The closing line of a subpath ends at the subpath's start point and
    /// is governed by the mask in effect there, so it is visited together
    /// with the first element of its subpath.
    pub(crate) fn hint_order(&self) -> Vec<HintStop> {
        let mut stops = Vec::with_capacity(self.element_count());
        for (subpath, elements) in self.subpaths.iter().enumerate() {
            let last = elements.len() - 1;
            let has_close = last > 0 && elements[last].is_close;
            let mut first = HintStop {
                anchor: ElementHandle::new(subpath, 0),
                elements: vec![],
            };
            if has_close {
                first.elements.push(ElementHandle::new(subpath, last));
            }
            first.elements.push(first.anchor);
            stops.push(first);
            let end = if has_close { last } else { elements.len() };
            stops.extend((1..end).map(|offset| {
                let anchor = ElementHandle::new(subpath, offset);
                HintStop {
                    anchor,
                    elements: vec![anchor],
                }
            }));
        }
        stops
    }

    /// Bounds of the outline, or `None` if it is empty.
    pub fn bounds(&self) -> Option<Rect> {
        self.subpaths
            .iter()
            .flatten()
            .map(PathElement::bounds)
            .reduce(|acc, rect| acc.union(rect))
    }

    /// Bounds of a single subpath.
    pub(crate) fn subpath_bounds(&self, subpath: usize) -> Option<Rect> {
        self.subpaths
            .get(subpath)?
            .iter()
            .map(PathElement::bounds)
            .reduce(|acc, rect| acc.union(rect))
    }

    pub fn stems(&self, dim: Dimension) -> &[Stem] {
        match dim {
            Dimension::Horizontal => &self.hstems,
            Dimension::Vertical => &self.vstems,
        }
    }

    pub(crate) fn set_stems(&mut self, dim: Dimension, stems: Vec<Stem>) {
        match dim {
            Dimension::Horizontal => self.hstems = stems,
            Dimension::Vertical => self.vstems = stems,
        }
    }

    /// Returns true if the path carries any hint data.
    pub fn is_hinted(&self) -> bool {
        !self.hstems.is_empty()
            || !self.vstems.is_empty()
            || self.start_mask.is_some()
            || self
                .subpaths
                .iter()
                .flatten()
                .any(|el| el.mask.is_some() || el.flex != FlexPhase::None)
    }

    /// Returns true if hint replacement is used.
    pub fn uses_masks(&self) -> bool {
        self.start_mask.is_some()
    }

    /// Removes all hint data, keeping the geometry.
    pub fn clear_hints(&mut self) {
        self.hstems.clear();
        self.vstems.clear();
        self.counter_masks.clear();
        self.start_mask = None;
        self.subpaths
            .iter_mut()
            .flatten()
            .for_each(PathElement::clear_hints);
    }

    /// Returns true if both paths describe the same outline, ignoring hints.
    pub fn geometry_eq(&self, other: &Path) -> bool {
        self.subpaths.len() == other.subpaths.len()
            && self
                .subpaths
                .iter()
                .zip(&other.subpaths)
                .all(|(a, b)| {
                    a.len() == b.len() && a.iter().zip(b).all(|(a, b)| a.same_geometry(b))
                })
    }

    /// Converts the outline to a kurbo path. Closing lines become
    /// `ClosePath`.
    pub fn to_bezpath(&self) -> BezPath {
        let mut path = BezPath::new();
        for subpath in &self.subpaths {
            let Some(first) = subpath.first() else {
                continue;
            };
            path.move_to(first.s);
            for el in subpath {
                if el.is_close {
                    continue;
                }
                if el.is_line {
                    path.line_to(el.e);
                } else {
                    path.curve_to(el.cs, el.ce, el.e);
                }
            }
            path.close_path();
        }
        path
    }
}

/// A position along the hint walk: the element where a mask change would
/// be attached and the elements whose hints apply there.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct HintStop {
    pub anchor: ElementHandle,
    pub elements: Vec<ElementHandle>,
}
