//! Glyph hinting.
//!
//! Each dimension runs the same pipeline: segments are generated from the
//! outline, paired into rated stem candidates, pruned and merged, and the
//! best non-overlapping candidates become the main stems. The mask stage
//! then combines both dimensions into stem lists and hintmasks.

pub(crate) mod axis;
mod flex;
mod mask;
pub(crate) mod prune;
pub(crate) mod segments;
mod select;
pub(crate) mod stems;

use kurbo::{Line, ParamCurveNearest};

use self::{
    axis::{AxisPolicy, Horizontal, Vertical},
    segments::Segment,
    stems::StemValue,
};
use crate::{
    diag::{Diagnostics, DirectLog},
    error::SkipReason,
    fd::FdDict,
    masters,
    options::HintOptions,
    overlap::{self, OverlapMap, OverlapRemover},
    path::{Dimension, ElementHandle, Path, PathElement},
    report::{self, GlyphReport},
    task::Outcome,
};

/// Curves whose control points are this close to the chord become lines
/// when geometry changes are allowed.
const LINEAR_CURVE_TOLERANCE: f64 = 0.5;

/// Results of analyzing one dimension of a glyph.
#[derive(Clone, Debug)]
pub(crate) struct HintState {
    pub dim: Dimension,
    pub segments: Vec<Segment>,
    pub values: Vec<StemValue>,
    /// Indices of the main stem values, in position order.
    pub main: Vec<usize>,
    /// Counter group, if the glyph is counter hinted in this dimension.
    pub counter: Option<[usize; 3]>,
    /// The dimension was not analyzed.
    pub skipped: bool,
}

impl HintState {
    fn skipped(dim: Dimension) -> Self {
        Self {
            dim,
            segments: vec![],
            values: vec![],
            main: vec![],
            counter: None,
            skipped: true,
        }
    }

    /// Main stems in position order.
    pub fn main_stems(&self) -> impl Iterator<Item = &StemValue> + '_ {
        self.main.iter().map(|ix| &self.values[*ix])
    }
}

/// Hints a single-master glyph in place.
///
/// On error the path is left untouched.
pub fn hint_glyph(
    name: &str,
    path: &mut Path,
    fd: &FdDict,
    options: &HintOptions,
) -> Result<Outcome, SkipReason> {
    let sink = DirectLog;
    let diag = Diagnostics::new(name, &sink);
    hint_masters_with(name, std::slice::from_mut(path), &[fd], options, None, &diag)
}

/// Hints the masters of a glyph in place.
///
/// The first master is the default: it is analyzed and its stems are
/// propagated to the others, so that every master carries the same stems
/// and masks. `fds` holds one FdDict per master. On error all masters are
/// left untouched.
pub fn hint_masters(
    name: &str,
    masters: &mut [Path],
    fds: &[&FdDict],
    options: &HintOptions,
    remover: Option<&dyn OverlapRemover>,
) -> Result<Outcome, SkipReason> {
    let sink = DirectLog;
    let diag = Diagnostics::new(name, &sink);
    hint_masters_with(name, masters, fds, options, remover, &diag)
}

/// Analyzes a glyph without modifying it.
pub fn report_glyph(
    name: &str,
    path: &Path,
    fd: &FdDict,
    options: &HintOptions,
) -> Result<GlyphReport, SkipReason> {
    let sink = DirectLog;
    let diag = Diagnostics::new(name, &sink);
    report_with(name, path, fd, options, &diag)
}

pub(crate) fn report_with(
    name: &str,
    path: &Path,
    fd: &FdDict,
    options: &HintOptions,
    diag: &Diagnostics,
) -> Result<GlyphReport, SkipReason> {
    if let Some(op) = path.unsupported {
        return Err(SkipReason::UnsupportedOperator(op));
    }
    let states = [
        analyze(&Horizontal::new(fd, name), path, None, options, diag),
        analyze(&Vertical::new(fd, name), path, None, options, diag),
    ];
    Ok(report::build(name, fd, &states))
}

pub(crate) fn hint_masters_with(
    name: &str,
    masters: &mut [Path],
    fds: &[&FdDict],
    options: &HintOptions,
    remover: Option<&dyn OverlapRemover>,
    diag: &Diagnostics,
) -> Result<Outcome, SkipReason> {
    if masters.is_empty() {
        return Err(SkipReason::NoMasters);
    }
    if fds.len() != masters.len() {
        return Err(SkipReason::MissingFdDict {
            masters: masters.len(),
            fds: fds.len(),
        });
    }
    if let Some(op) = masters.iter().find_map(|master| master.unsupported) {
        return Err(SkipReason::UnsupportedOperator(op));
    }
    if masters[0].is_empty() {
        diag.debug("empty outline");
        return Ok(Outcome::Unchanged);
    }
    if !options.force && masters.iter().any(Path::is_hinted) {
        diag.info("already hinted; skipping");
        return Ok(Outcome::Unchanged);
    }
    let mut work = masters.to_vec();
    work.iter_mut().for_each(Path::clear_hints);
    if work.len() > 1 {
        masters::reconcile(&mut work)?;
    }
    if options.allow_geometry_changes {
        let count = straighten_linear_curves(&mut work);
        if count > 0 {
            diag.info(format!("converted {count} straight curves to lines"));
        }
    }
    let analysis = match remover {
        Some(remover) if options.removes_overlap(work.len()) => {
            overlap::remove_overlap(&work[0], remover, diag)
        }
        _ => None,
    };
    let (default, others) = work.split_at_mut(1);
    let default = &mut default[0];
    let states = hint_default(
        name,
        default,
        fds[0],
        options,
        analysis.as_ref(),
        &diag.with_master(0),
    );
    for (ix, other) in others.iter_mut().enumerate() {
        let master = ix + 1;
        masters::propagate(
            default,
            &states,
            other,
            fds[master],
            name,
            &diag.with_master(master),
        );
    }
    masters.clone_from_slice(&work);
    Ok(Outcome::Hinted)
}

/// Hints the default master, returning the analysis used for it.
fn hint_default(
    name: &str,
    path: &mut Path,
    fd: &FdDict,
    options: &HintOptions,
    analysis: Option<&OverlapMap>,
    diag: &Diagnostics,
) -> [HintState; 2] {
    if options.flex && fd.flex_ok {
        let count = flex::mark_flex(path);
        if count > 0 {
            diag.debug(format!("marked {count} flex pairs"));
        }
    }
    let states = [
        analyze(&Horizontal::new(fd, name), path, analysis, options, diag),
        analyze(&Vertical::new(fd, name), path, analysis, options, diag),
    ];
    mask::distribute(path, &states, options.hint_substitution, diag);
    states
}

/// Runs the candidate pipeline for one dimension.
pub(crate) fn analyze(
    axis: &impl AxisPolicy,
    path: &Path,
    analysis: Option<&OverlapMap>,
    options: &HintOptions,
    diag: &Diagnostics,
) -> HintState {
    let dim = axis.dim();
    let diag = diag.with_dim(dim);
    let subpaths = path.subpaths().len();
    if subpaths > options.max_segments && !options.explicit_glyph_selection() {
        diag.warn(format!(
            "{subpaths} subpaths exceed the limit of {}; leaving {dim} stems empty",
            options.max_segments
        ));
        return HintState::skipped(dim);
    }
    let segments = match analysis {
        Some(map) => map.segments(axis, path),
        None => segments::generate(axis, path),
    };
    log::trace!(
        "{}: {} {dim} segments",
        diag.context(),
        segments.len()
    );
    if axis.is_counter_glyph() {
        if let Some(state) = counter_state(axis, path, segments.clone()) {
            return state;
        }
        diag.info("no evenly spaced stems for counter hints; using general selection");
    }
    general_state(axis, path, segments, &diag)
}

fn general_state(
    axis: &impl AxisPolicy,
    path: &Path,
    mut segments: Vec<Segment>,
    diag: &Diagnostics,
) -> HintState {
    let dim = axis.dim();
    let mut values = stems::evaluate(axis, &segments);
    prune::prune(&mut values, &segments, path, dim);
    prune::associate(&mut values, &mut segments);
    prune::merge(&mut values, &segments, path, dim);
    let mut main = select::main_values(&values);
    if main.is_empty() {
        if let Some(ix) = select::add_bbox_value(path, dim, None, &mut segments, &mut values) {
            diag.debug("no stems found; using the bounding box");
            let (lo_seg, hi_seg) = (values[ix].lo_seg, values[ix].hi_seg);
            segments[lo_seg].best = Some(ix);
            segments[hi_seg].best = Some(ix);
            main.push(ix);
        }
    }
    HintState {
        dim,
        segments,
        values,
        main,
        counter: None,
        skipped: false,
    }
}

/// Tries to find a counter group, first among the stems as found and then
/// with the bounding boxes of each subpath added.
fn counter_state(axis: &impl AxisPolicy, path: &Path, mut segments: Vec<Segment>) -> Option<HintState> {
    let dim = axis.dim();
    let mut values = stems::evaluate(axis, &segments);
    prune::associate(&mut values, &mut segments);
    prune::merge(&mut values, &segments, path, dim);
    let mut group = select::counter_group(&values, &select::main_values(&values));
    if group.is_none() {
        for subpath in 0..path.subpaths().len() {
            select::add_bbox_value(path, dim, Some(subpath), &mut segments, &mut values);
        }
        prune::associate(&mut values, &mut segments);
        group = select::counter_group(&values, &select::main_values(&values));
    }
    let group = group?;
    let mut main = group.to_vec();
    main.sort_by(|a, b| values[*a].stem().cmp_position(&values[*b].stem()));
    Some(HintState {
        dim,
        segments,
        values,
        main,
        counter: Some(group),
        skipped: false,
    })
}

/// Turns curves that are straight in every master into lines.
fn straighten_linear_curves(masters: &mut [Path]) -> usize {
    let handles = masters[0]
        .handles()
        .filter(|handle| {
            masters
                .iter()
                .all(|master| master.element(*handle).is_some_and(is_linear_curve))
        })
        .collect::<Vec<ElementHandle>>();
    for master in masters.iter_mut() {
        for handle in &handles {
            if let Some((s, e)) = master.element(*handle).map(|el| (el.s, el.e)) {
                master.replace_element(*handle, PathElement::line(s, e));
            }
        }
    }
    handles.len()
}

fn is_linear_curve(el: &PathElement) -> bool {
    if el.is_line() || el.s == el.e {
        return false;
    }
    let chord = Line::new(el.s, el.e);
    let limit = LINEAR_CURVE_TOLERANCE * LINEAR_CURVE_TOLERANCE;
    [el.cs, el.ce]
        .iter()
        .all(|p| chord.nearest(*p, 1e-6).distance_sq <= limit)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        diag::ChannelLog,
        path::{HintMask, PathBuilder, Stem},
        testing::{init_logging, rect, zone_fd},
    };
    use pretty_assertions::assert_eq;
    use std::sync::mpsc;

    #[test]
    fn rectangle() {
        init_logging();
        let mut path = rect(0.0, 0.0, 100.0, 700.0);
        let outcome = hint_glyph("a", &mut path, &zone_fd(), &HintOptions::default());
        assert_eq!(outcome, Ok(Outcome::Hinted));
        assert_eq!(path.hstems, [Stem::new(21.0, 0.0)]);
        assert_eq!(path.vstems, [Stem::new(0.0, 100.0)]);
        assert!(!path.uses_masks());
    }

    #[test]
    fn overlapping_stems_use_hint_replacement() {
        // two bars at different heights whose horizontal stems overlap
        let mut builder = PathBuilder::new();
        for (x, y) in [(0.0, 0.0), (300.0, 50.0)] {
            builder.move_to((x, y));
            builder.line_to((x + 100.0, y));
            builder.line_to((x + 100.0, y + 100.0));
            builder.line_to((x, y + 100.0));
            builder.close();
        }
        let mut path = builder.finish();
        let fd = FdDict {
            h_stems: vec![100.0],
            v_stems: vec![100.0],
            ..Default::default()
        };
        assert_eq!(
            hint_glyph("a", &mut path, &fd, &HintOptions::default()),
            Ok(Outcome::Hinted)
        );
        assert_eq!(path.hstems, [Stem::new(0.0, 100.0), Stem::new(50.0, 150.0)]);
        assert_eq!(path.vstems, [Stem::new(0.0, 100.0), Stem::new(300.0, 400.0)]);
        assert_eq!(
            path.start_mask,
            Some(HintMask::from_indices(2, 2, [0], [0, 1]))
        );
        let second = path.element(ElementHandle::new(1, 0)).unwrap();
        assert_eq!(second.mask, Some(HintMask::from_indices(2, 2, [1], [1])));
    }

    #[test]
    fn no_substitution_keeps_single_mask() {
        let mut builder = PathBuilder::new();
        for (x, y) in [(0.0, 0.0), (300.0, 50.0)] {
            builder.move_to((x, y));
            builder.line_to((x + 100.0, y));
            builder.line_to((x + 100.0, y + 100.0));
            builder.line_to((x, y + 100.0));
            builder.close();
        }
        let mut path = builder.finish();
        let options = HintOptions {
            hint_substitution: false,
            ..Default::default()
        };
        hint_glyph("a", &mut path, &FdDict::default(), &options).unwrap();
        assert_eq!(path.hstems, [Stem::new(0.0, 100.0)]);
        assert!(!path.uses_masks());
    }

    #[test]
    fn diamond_hinted_at_its_points() {
        // no flat edges, only sharp extrema
        let mut builder = PathBuilder::new();
        builder.move_to((50.0, 0.0));
        builder.line_to((100.0, 50.0));
        builder.line_to((50.0, 100.0));
        builder.line_to((0.0, 50.0));
        let mut path = builder.finish();
        hint_glyph("a", &mut path, &FdDict::default(), &HintOptions::default()).unwrap();
        assert_eq!(path.hstems, [Stem::new(0.0, 100.0)]);
        assert_eq!(path.vstems, [Stem::new(0.0, 100.0)]);
    }

    #[test]
    fn counter_hints_for_m() {
        // three equal stems with equal counters
        let mut builder = PathBuilder::new();
        for x in [0.0, 200.0, 400.0] {
            builder.move_to((x, 0.0));
            builder.line_to((x + 80.0, 0.0));
            builder.line_to((x + 80.0, 500.0));
            builder.line_to((x, 500.0));
            builder.close();
        }
        let mut path = builder.finish();
        let fd = FdDict {
            v_stems: vec![80.0],
            ..Default::default()
        };
        hint_glyph("m", &mut path, &fd, &HintOptions::default()).unwrap();
        assert_eq!(
            path.vstems,
            [
                Stem::new(0.0, 80.0),
                Stem::new(200.0, 280.0),
                Stem::new(400.0, 480.0)
            ]
        );
        assert_eq!(
            path.counter_masks,
            [HintMask::from_indices(1, 3, [], [0, 1, 2])]
        );
    }

    #[test]
    fn straight_curves_become_lines() {
        let mut builder = PathBuilder::new();
        builder.move_to((0.0, 0.0));
        builder.curve_to((30.0, 0.2), (70.0, -0.2), (100.0, 0.0));
        builder.line_to((100.0, 100.0));
        builder.line_to((0.0, 100.0));
        let path = builder.finish();
        let mut changed = path.clone();
        let options = HintOptions {
            allow_geometry_changes: true,
            ..Default::default()
        };
        hint_glyph("a", &mut changed, &FdDict::default(), &options).unwrap();
        assert!(changed.subpaths()[0][0].is_line());
        let mut unchanged = path.clone();
        hint_glyph("a", &mut unchanged, &FdDict::default(), &HintOptions::default()).unwrap();
        assert!(unchanged.geometry_eq(&path));
    }

    #[test]
    fn subpath_limit_warns_per_dimension() {
        let fd = zone_fd();
        let mut builder = PathBuilder::new();
        for x in [0.0, 200.0, 400.0] {
            builder.move_to((x, 0.0));
            builder.line_to((x + 100.0, 0.0));
            builder.line_to((x + 100.0, 100.0));
            builder.line_to((x, 100.0));
            builder.close();
        }
        let mut path = builder.finish();
        let options = HintOptions {
            max_segments: 2,
            ..Default::default()
        };
        let (sender, receiver) = mpsc::channel();
        {
            let sink = ChannelLog(sender);
            let diag = Diagnostics::new("dots", &sink);
            let masters = std::slice::from_mut(&mut path);
            let outcome = hint_masters_with("dots", masters, &[&fd], &options, None, &diag);
            assert_eq!(outcome, Ok(Outcome::Hinted));
        }
        let warnings = receiver
            .iter()
            .filter(|record| record.level == log::Level::Warn)
            .collect::<Vec<_>>();
        let dims = warnings
            .iter()
            .map(|record| record.context.dim)
            .collect::<Vec<_>>();
        assert_eq!(dims, [Some(Dimension::Horizontal), Some(Dimension::Vertical)]);
        assert!(warnings
            .iter()
            .all(|record| record.message.starts_with("3 subpaths exceed the limit of 2")));
        assert!(path.hstems.is_empty());
        assert!(path.vstems.is_empty());
    }

    #[test]
    fn unsupported_operators_skip() {
        let mut path = rect(0.0, 0.0, 100.0, 100.0);
        path.unsupported = Some(crate::path::UnsupportedOperator::Seac);
        let original = path.clone();
        let result = hint_glyph("a", &mut path, &zone_fd(), &HintOptions::default());
        assert!(matches!(result, Err(SkipReason::UnsupportedOperator(_))));
        assert_eq!(path, original);
    }
}
