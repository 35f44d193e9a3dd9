//! The JSON glyph set format.
//!
//! Contours are lists of UFO style points: on-curve points are `line`,
//! `curve` or `move` (the start of an open contour) and the control points
//! of a curve are `offcurve` points preceding it. Closed contours wrap, so
//! a contour may start with the control points of its last curve.
//!
//! Hints refer to elements: the drawing segments of a contour in order,
//! including the closing line when the last point differs from the first.

use serde::{Deserialize, Serialize};
use stemhint::{
    path::{ElementHandle, FlexPhase},
    HintMask, Path, PathBuilder, Stem,
};

use crate::error::GlyphError;

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct GlyphSet {
    pub glyphs: Vec<GlyphRecord>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct GlyphRecord {
    pub name: String,
    /// Name of the FdDict, if not the first one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fd: Option<String>,
    /// Outlines of each master, the default first.
    pub masters: Vec<Outline>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct Outline {
    pub contours: Vec<Vec<Point>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hints: Option<Hints>,
}

#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
    #[serde(rename = "type", default)]
    pub kind: PointKind,
}

#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PointKind {
    Move,
    #[default]
    Line,
    Curve,
    OffCurve,
}

/// Hint data of one master. Masks are hex strings of the charstring
/// hintmask bytes.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct Hints {
    pub hstems: Vec<Stem>,
    pub vstems: Vec<Stem>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_mask: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub mask_changes: Vec<MaskChange>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub counter_masks: Vec<String>,
    /// First elements of flex pairs.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub flex: Vec<ElementHandle>,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct MaskChange {
    #[serde(flatten)]
    pub at: ElementHandle,
    pub mask: String,
}

impl Outline {
    /// Builds the outline, with its existing hints.
    pub fn to_path(&self) -> Result<Path, GlyphError> {
        let mut builder = PathBuilder::new();
        for (contour, points) in self.contours.iter().enumerate() {
            draw_contour(contour, points, &mut builder)?;
        }
        let mut path = builder.finish();
        if let Some(hints) = &self.hints {
            hints.apply(&mut path)?;
        }
        Ok(path)
    }

    /// Replaces the hints with those of `path`.
    pub fn set_hints(&mut self, path: &Path) {
        self.hints = path.is_hinted().then(|| Hints::from_path(path));
    }
}

fn draw_contour(contour: usize, points: &[Point], builder: &mut PathBuilder) -> Result<(), GlyphError> {
    if points.is_empty() {
        return Ok(());
    }
    let open = points[0].kind == PointKind::Move;
    let start = points
        .iter()
        .position(|p| p.kind != PointKind::OffCurve)
        .ok_or(GlyphError::NoOnCurve { contour })?;
    let mut sequence = points[start..]
        .iter()
        .chain(&points[..start])
        .copied()
        .collect::<Vec<_>>();
    let first = sequence[0];
    if !open && first.kind == PointKind::Curve {
        // the curve back to the start point; straight returns are left to
        // the closing line
        sequence.push(first);
    }
    builder.move_to((first.x, first.y));
    let mut controls: Vec<(f64, f64)> = Vec::new();
    for point in &sequence[1..] {
        let p = (point.x, point.y);
        match point.kind {
            PointKind::OffCurve => {
                controls.push(p);
                continue;
            }
            PointKind::Move | PointKind::Line if controls.is_empty() => builder.line_to(p),
            PointKind::Move | PointKind::Line | PointKind::Curve => match controls[..] {
                [] => builder.line_to(p),
                [c] => builder.quad_to(c, p),
                [c0, c1] => builder.curve_to(c0, c1, p),
                _ => {
                    return Err(GlyphError::TooManyOffCurves {
                        contour,
                        count: controls.len(),
                    })
                }
            },
        }
        controls.clear();
    }
    if !controls.is_empty() {
        return Err(GlyphError::DanglingOffCurves { contour });
    }
    builder.close();
    Ok(())
}

impl Hints {
    fn from_path(path: &Path) -> Self {
        let mut hints = Hints {
            hstems: path.hstems.clone(),
            vstems: path.vstems.clone(),
            start_mask: path.start_mask.as_ref().map(|mask| to_hex(&mask.to_bytes())),
            counter_masks: path
                .counter_masks
                .iter()
                .map(|mask| to_hex(&mask.to_bytes()))
                .collect(),
            ..Default::default()
        };
        for handle in path.handles() {
            let Some(el) = path.element(handle) else {
                continue;
            };
            if let Some(mask) = &el.mask {
                hints.mask_changes.push(MaskChange {
                    at: handle,
                    mask: to_hex(&mask.to_bytes()),
                });
            }
            if el.flex == FlexPhase::First {
                hints.flex.push(handle);
            }
        }
        hints
    }

    fn apply(&self, path: &mut Path) -> Result<(), GlyphError> {
        let (h, v) = (self.hstems.len(), self.vstems.len());
        let mask = |hex: &str| from_hex(hex).map(|bytes| HintMask::from_bytes(&bytes, h, v));
        path.hstems = self.hstems.clone();
        path.vstems = self.vstems.clone();
        path.start_mask = self.start_mask.as_deref().map(mask).transpose()?;
        path.counter_masks = self
            .counter_masks
            .iter()
            .map(|hex| mask(hex))
            .collect::<Result<_, _>>()?;
        for change in &self.mask_changes {
            let mask = mask(&change.mask)?;
            update(path, change.at, |el| el.mask = Some(mask))?;
        }
        for first in &self.flex {
            update(path, *first, |el| el.flex = FlexPhase::First)?;
            let second = path.next(*first);
            update(path, second, |el| el.flex = FlexPhase::Second)?;
        }
        Ok(())
    }
}

fn update(
    path: &mut Path,
    handle: ElementHandle,
    f: impl FnOnce(&mut stemhint::path::PathElement),
) -> Result<(), GlyphError> {
    let mut el = path
        .element(handle)
        .cloned()
        .ok_or(GlyphError::NoSuchElement {
            contour: handle.subpath,
            element: handle.offset,
        })?;
    f(&mut el);
    path.replace_element(handle, el);
    Ok(())
}

fn to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|byte| format!("{byte:02x}")).collect()
}

fn from_hex(hex: &str) -> Result<Vec<u8>, GlyphError> {
    let bad = || GlyphError::BadMask(hex.to_string());
    if hex.len() % 2 != 0 || !hex.is_ascii() {
        return Err(bad());
    }
    (0..hex.len())
        .step_by(2)
        .map(|ix| u8::from_str_radix(&hex[ix..ix + 2], 16).map_err(|_| bad()))
        .collect()
}
