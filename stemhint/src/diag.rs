//! Log records carrying glyph context.
//!
//! Hinting runs on a worker pool; records are tagged with the glyph, master
//! and dimension they concern and either sent to a drain thread or logged
//! directly.

use std::{fmt, sync::mpsc::Sender};

use log::Level;

use crate::path::Dimension;

/// Where a log record came from.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct LogContext {
    pub glyph: String,
    pub master: Option<usize>,
    pub dim: Option<Dimension>,
}

impl fmt::Display for LogContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.glyph)?;
        if let Some(master) = self.master {
            write!(f, " (master {master})")?;
        }
        if let Some(dim) = self.dim {
            write!(f, " [{dim}]")?;
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct LogRecord {
    pub level: Level,
    pub context: LogContext,
    pub message: String,
}

impl LogRecord {
    pub(crate) fn emit(&self) {
        log::log!(self.level, "{}: {}", self.context, self.message);
    }
}

/// Destination for log records.
pub(crate) trait LogSink: Sync {
    fn record(&self, record: LogRecord);
}

/// Logs records immediately on the calling thread.
pub(crate) struct DirectLog;

impl LogSink for DirectLog {
    fn record(&self, record: LogRecord) {
        record.emit();
    }
}

/// Forwards records to a drain thread.
pub(crate) struct ChannelLog(pub Sender<LogRecord>);

impl LogSink for ChannelLog {
    fn record(&self, record: LogRecord) {
        // the drain only goes away after all workers are done, but don't
        // lose the record if it did
        if let Err(err) = self.0.send(record) {
            err.0.emit();
        }
    }
}

/// Context-aware logging handle threaded through the hinter.
#[derive(Clone)]
pub(crate) struct Diagnostics<'a> {
    context: LogContext,
    sink: &'a dyn LogSink,
}

impl<'a> Diagnostics<'a> {
    pub fn new(glyph: &str, sink: &'a dyn LogSink) -> Self {
        Self {
            context: LogContext {
                glyph: glyph.to_string(),
                ..Default::default()
            },
            sink,
        }
    }

    pub fn with_master(&self, master: usize) -> Self {
        let mut diag = self.clone();
        diag.context.master = Some(master);
        diag
    }

    pub fn with_dim(&self, dim: Dimension) -> Self {
        let mut diag = self.clone();
        diag.context.dim = Some(dim);
        diag
    }

    pub fn context(&self) -> &LogContext {
        &self.context
    }

    fn log(&self, level: Level, message: String) {
        self.sink.record(LogRecord {
            level,
            context: self.context.clone(),
            message,
        });
    }

    pub fn warn(&self, message: impl Into<String>) {
        self.log(Level::Warn, message.into());
    }

    pub fn info(&self, message: impl Into<String>) {
        self.log(Level::Info, message.into());
    }

    pub fn debug(&self, message: impl Into<String>) {
        self.log(Level::Debug, message.into());
    }
}
