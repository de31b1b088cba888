use std::fs::{File, OpenOptions};
use std::io::{self, LineWriter, Write};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

use tracing::warn;

use crate::trace::event::ProbeTraceEvent;

/// JSONL sink for trace events, one object per line.
///
/// A failed write is reported through `tracing` and the event dropped, so a
/// broken trace file never fails a run.
#[derive(Debug, Default)]
pub struct TraceLogger {
    sink: Option<Mutex<LineWriter<File>>>,
    written: AtomicUsize,
}

impl TraceLogger {
    /// Open `path` for appending, creating it if needed.
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            sink: Some(Mutex::new(LineWriter::new(file))),
            written: AtomicUsize::new(0),
        })
    }

    /// Like [`TraceLogger::open`], degrading to a disabled logger.
    pub fn new(path: &str) -> Self {
        Self::open(path).unwrap_or_else(|e| {
            warn!(path, error = %e, "trace file unavailable, tracing disabled");
            Self::disabled()
        })
    }

    pub fn disabled() -> Self {
        Self::default()
    }

    pub fn is_enabled(&self) -> bool {
        self.sink.is_some()
    }

    /// Events written so far.
    pub fn written(&self) -> usize {
        self.written.load(Ordering::Relaxed)
    }

    pub fn log(&self, event: &ProbeTraceEvent) {
        let Some(sink) = &self.sink else {
            return;
        };

        let appended = serde_json::to_string(event)
            .map_err(io::Error::from)
            .and_then(|line| append_line(sink, &line));

        match appended {
            Ok(()) => {
                self.written.fetch_add(1, Ordering::Relaxed);
            }
            Err(e) => warn!(error = %e, "dropped trace event"),
        }
    }
}

// A panic mid-write leaves at worst a torn line; later events still go out.
fn append_line(sink: &Mutex<LineWriter<File>>, line: &str) -> io::Result<()> {
    let mut writer = sink.lock().unwrap_or_else(PoisonError::into_inner);
    writeln!(writer, "{}", line)
}
