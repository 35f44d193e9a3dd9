//! Construction of paths from drawing commands.

use kurbo::{BezPath, PathEl, Point};

use super::{Path, PathElement, UnsupportedOperator};

/// Accumulates drawing commands into a [`Path`].
///
/// Every subpath is closed: `close` (or a following `move_to`) adds the
/// closing line when the current point differs from the subpath start.
/// Subpaths with no drawing commands, or whose commands never leave the
/// start point, are discarded.
#[derive(Clone, Debug, Default)]
pub struct PathBuilder {
    subpaths: Vec<Vec<PathElement>>,
    current: Vec<PathElement>,
    start: Point,
    last: Point,
    unsupported: Option<UnsupportedOperator>,
}

impl PathBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replays a kurbo path. Quadratic segments are elevated to cubics.
    pub fn from_bezpath(path: &BezPath) -> Self {
        let mut builder = Self::new();
        for el in path.elements() {
            match *el {
                PathEl::MoveTo(p) => builder.move_to(p),
                PathEl::LineTo(p) => builder.line_to(p),
                PathEl::QuadTo(c, p) => builder.quad_to(c, p),
                PathEl::CurveTo(c0, c1, p) => builder.curve_to(c0, c1, p),
                PathEl::ClosePath => builder.close(),
            }
        }
        builder
    }

    pub fn move_to(&mut self, p: impl Into<Point>) {
        self.close();
        self.start = p.into();
        self.last = self.start;
    }

    pub fn line_to(&mut self, p: impl Into<Point>) {
        let p = p.into();
        self.current.push(PathElement::line(self.last, p));
        self.last = p;
    }

    pub fn quad_to(&mut self, c: impl Into<Point>, p: impl Into<Point>) {
        let (c, p) = (c.into(), p.into());
        let c0 = self.last.lerp(c, 2.0 / 3.0);
        let c1 = p.lerp(c, 2.0 / 3.0);
        self.curve_to(c0, c1, p);
    }

    pub fn curve_to(&mut self, c0: impl Into<Point>, c1: impl Into<Point>, p: impl Into<Point>) {
        let p = p.into();
        self.current
            .push(PathElement::curve(self.last, c0.into(), c1.into(), p));
        self.last = p;
    }

    /// Closes the current subpath, if any.
    pub fn close(&mut self) {
        let start = self.start;
        if self
            .current
            .iter()
            .all(|el| [el.s, el.cs, el.ce, el.e].iter().all(|p| *p == start))
        {
            // a single point
            self.current.clear();
            self.last = self.start;
            return;
        }
        if self.last != self.start {
            self.current
                .push(PathElement::close_line(self.last, self.start));
        }
        self.subpaths.push(std::mem::take(&mut self.current));
        self.last = self.start;
    }

    /// Records that the source outline used an operator the hinter can't
    /// process. Hinting such a path is skipped.
    pub fn mark_unsupported(&mut self, op: UnsupportedOperator) {
        self.unsupported.get_or_insert(op);
    }

    pub fn finish(mut self) -> Path {
        self.close();
        let mut path = Path::new(self.subpaths);
        path.unsupported = self.unsupported;
        path
    }
}

#[cfg(feature = "skrifa")]
impl skrifa::outline::OutlinePen for PathBuilder {
    fn move_to(&mut self, x: f32, y: f32) {
        PathBuilder::move_to(self, (x as f64, y as f64));
    }

    fn line_to(&mut self, x: f32, y: f32) {
        PathBuilder::line_to(self, (x as f64, y as f64));
    }

    fn quad_to(&mut self, cx0: f32, cy0: f32, x: f32, y: f32) {
        PathBuilder::quad_to(self, (cx0 as f64, cy0 as f64), (x as f64, y as f64));
    }

    fn curve_to(&mut self, cx0: f32, cy0: f32, cx1: f32, cy1: f32, x: f32, y: f32) {
        PathBuilder::curve_to(
            self,
            (cx0 as f64, cy0 as f64),
            (cx1 as f64, cy1 as f64),
            (x as f64, y as f64),
        );
    }

    fn close(&mut self) {
        PathBuilder::close(self);
    }
}
