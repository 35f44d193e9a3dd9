//! Hinting many glyphs at once.
//!
//! Glyphs are independent: each [`GlyphTask`] is hinted on a worker of a
//! rayon pool. Workers don't log directly; their records are sent to a
//! single drain thread, which drops duplicates (the same warning for the
//! same glyph and master) before forwarding them to the `log` facade.

use std::{
    collections::HashSet,
    num::NonZeroUsize,
    sync::{
        mpsc::{self, Receiver, Sender},
        Arc,
    },
    thread,
};

use rayon::{prelude::*, ThreadPoolBuilder};

use crate::{
    diag::{ChannelLog, Diagnostics, LogRecord},
    error::{ConfigError, SkipReason},
    fd::FdDict,
    hint::{hint_masters_with, report_with},
    options::HintOptions,
    overlap::OverlapRemover,
    path::Path,
    report::GlyphReport,
};

/// One glyph to hint: its masters, default first, and the FdDict of each
/// master.
#[derive(Clone, Debug)]
pub struct GlyphTask {
    pub name: String,
    pub masters: Vec<Path>,
    pub fds: Vec<Arc<FdDict>>,
}

impl GlyphTask {
    /// A task for a glyph with a single master.
    pub fn new(name: impl Into<String>, path: Path, fd: Arc<FdDict>) -> Self {
        Self {
            name: name.into(),
            masters: vec![path],
            fds: vec![fd],
        }
    }
}

/// What happened to a glyph that wasn't skipped.
#[derive(Clone, Debug, PartialEq)]
pub enum Outcome {
    /// New hints were written.
    Hinted,
    /// The glyph was left as is: it was empty, already hinted or not
    /// selected.
    Unchanged,
    /// Analysis results; the glyph was left as is.
    Report(GlyphReport),
}

/// The result of a [`GlyphTask`].
///
/// `masters` holds the hinted outlines, or the untouched input when the
/// glyph was skipped.
#[derive(Clone, Debug)]
pub struct GlyphResult {
    pub name: String,
    pub masters: Vec<Path>,
    pub outcome: Result<Outcome, SkipReason>,
}

/// Validates every FdDict, then hints the glyphs.
///
/// A configuration error aborts the whole font before any glyph is
/// touched.
pub fn hint_font(
    tasks: Vec<GlyphTask>,
    options: &HintOptions,
    remover: Option<Arc<dyn OverlapRemover>>,
) -> Result<Vec<GlyphResult>, ConfigError> {
    let mut checked: Vec<&Arc<FdDict>> = Vec::new();
    for fd in tasks.iter().flat_map(|task| &task.fds) {
        if checked.iter().any(|seen| Arc::ptr_eq(seen, fd)) {
            continue;
        }
        fd.validate(options)?;
        checked.push(fd);
    }
    Ok(hint_glyphs(tasks, options, remover))
}

/// Hints the glyphs on a worker pool, returning results in task order.
pub fn hint_glyphs(
    tasks: Vec<GlyphTask>,
    options: &HintOptions,
    remover: Option<Arc<dyn OverlapRemover>>,
) -> Vec<GlyphResult> {
    if tasks.is_empty() {
        return Vec::new();
    }
    let options = Arc::new(options.clone());
    let jobs = options
        .jobs
        .unwrap_or_else(|| thread::available_parallelism().map_or(1, NonZeroUsize::get))
        .clamp(1, tasks.len());
    log::debug!("hinting {} glyphs with {jobs} workers", tasks.len());
    let (sender, receiver) = mpsc::channel();
    let drain = thread::spawn(move || drain(receiver));
    let remover = remover.as_deref();
    let results = match ThreadPoolBuilder::new().num_threads(jobs).build() {
        Ok(pool) => pool.install(|| {
            tasks
                .into_par_iter()
                .map_with((sender.clone(), options.clone()), |(sender, options), task| {
                    run_task(task, options, remover, sender)
                })
                .collect()
        }),
        Err(err) => {
            log::warn!("failed to start worker pool ({err}); hinting on this thread");
            tasks
                .into_iter()
                .map(|task| run_task(task, &options, remover, &sender))
                .collect()
        }
    };
    drop(sender);
    match drain.join() {
        Ok(count) => log::trace!("{count} log records"),
        Err(_) => log::error!("log drain panicked"),
    }
    results
}

fn run_task(
    task: GlyphTask,
    options: &HintOptions,
    remover: Option<&dyn OverlapRemover>,
    sender: &Sender<LogRecord>,
) -> GlyphResult {
    let GlyphTask {
        name,
        mut masters,
        fds,
    } = task;
    if !options.selects(&name) {
        return GlyphResult {
            name,
            masters,
            outcome: Ok(Outcome::Unchanged),
        };
    }
    let sink = ChannelLog(sender.clone());
    let diag = Diagnostics::new(&name, &sink);
    let fds = fds.iter().map(Arc::as_ref).collect::<Vec<_>>();
    let outcome = if options.report_only {
        match (masters.first(), fds.first()) {
            (None, _) => Err(SkipReason::NoMasters),
            (Some(_), None) => Err(SkipReason::MissingFdDict {
                masters: masters.len(),
                fds: 0,
            }),
            (Some(path), Some(fd)) => {
                report_with(&name, path, fd, options, &diag).map(Outcome::Report)
            }
        }
    } else {
        hint_masters_with(&name, &mut masters, &fds, options, remover, &diag)
    };
    if let Err(reason) = &outcome {
        diag.warn(format!("skipped: {reason}"));
    }
    GlyphResult {
        name,
        masters,
        outcome,
    }
}

/// Emits each distinct record once, returning the number emitted.
fn drain(receiver: Receiver<LogRecord>) -> usize {
    let mut seen = HashSet::new();
    for record in receiver {
        if !seen.contains(&record) {
            record.emit();
            seen.insert(record);
        }
    }
    seen.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        diag::LogContext,
        path::Stem,
        testing::{init_logging, rect, zone_fd},
    };
    use pretty_assertions::assert_eq;
    use std::collections::BTreeSet;

    fn tasks(count: usize) -> Vec<GlyphTask> {
        let fd = Arc::new(zone_fd());
        (0..count)
            .map(|ix| {
                let width = 60.0 + ix as f64;
                GlyphTask::new(format!("g{ix}"), rect(0.0, 0.0, width, 700.0), fd.clone())
            })
            .collect()
    }

    #[test]
    fn results_keep_task_order() {
        init_logging();
        let options = HintOptions {
            jobs: Some(3),
            ..Default::default()
        };
        let results = hint_glyphs(tasks(20), &options, None);
        assert_eq!(results.len(), 20);
        for (ix, result) in results.iter().enumerate() {
            assert_eq!(result.name, format!("g{ix}"));
            assert_eq!(result.outcome, Ok(Outcome::Hinted));
            assert_eq!(
                result.masters[0].vstems,
                [Stem::new(0.0, 60.0 + ix as f64)]
            );
        }
    }

    #[test]
    fn report_only_leaves_outlines_alone() {
        let options = HintOptions {
            report_only: true,
            ..Default::default()
        };
        let results = hint_glyphs(tasks(2), &options, None);
        for result in &results {
            assert!(matches!(result.outcome, Ok(Outcome::Report(_))));
            assert!(!result.masters[0].is_hinted());
        }
    }

    #[test]
    fn unselected_glyphs_unchanged() {
        let options = HintOptions {
            glyphs: Some(BTreeSet::from(["g1".to_string()])),
            ..Default::default()
        };
        let results = hint_glyphs(tasks(3), &options, None);
        let outcomes = results
            .iter()
            .map(|result| result.outcome.clone())
            .collect::<Vec<_>>();
        assert_eq!(
            outcomes,
            [Ok(Outcome::Unchanged), Ok(Outcome::Hinted), Ok(Outcome::Unchanged)]
        );
        assert!(!results[0].masters[0].is_hinted());
    }

    #[test]
    fn skipped_glyph_reported() {
        let mut tasks = tasks(2);
        tasks[1].masters.clear();
        let results = hint_glyphs(tasks, &HintOptions::default(), None);
        assert_eq!(results[0].outcome, Ok(Outcome::Hinted));
        assert_eq!(results[1].outcome, Err(SkipReason::NoMasters));
    }

    #[test]
    fn invalid_fd_aborts_the_font() {
        let mut tasks = tasks(2);
        tasks[1].fds[0] = Arc::new(FdDict {
            name: "bad".into(),
            ..Default::default()
        });
        let result = hint_font(tasks, &HintOptions::default(), None);
        assert_eq!(
            result.err(),
            Some(ConfigError::MissingAlignmentZones { fd: "bad".into() })
        );
    }

    #[test]
    fn duplicate_records_dropped() {
        let (sender, receiver) = mpsc::channel();
        let record = |message: &str| LogRecord {
            level: log::Level::Warn,
            context: LogContext {
                glyph: "a".into(),
                master: Some(1),
                dim: None,
            },
            message: message.into(),
        };
        for message in ["x", "y", "x", "x"] {
            sender.send(record(message)).unwrap();
        }
        drop(sender);
        assert_eq!(drain(receiver), 2);
    }
}
