use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::config::FeatureKind;

/// Receives a notification after each artifact is written.
///
/// Implementations are shared between workers and must not fail the run.
pub trait ProgressReporter: Send + Sync {
    fn item_done(&self, identifier: &str, shape: (usize, usize));
}

/// Prints `"{n}: Processed {identifier}, {KIND} shape: ({F}, {T})"` with a
/// 1-based counter that increases by one per call, across threads.
pub struct ConsoleReporter<W: Write + Send = std::io::Stdout> {
    kind: FeatureKind,
    counter: AtomicUsize,
    out: Mutex<W>,
}

impl ConsoleReporter {
    pub fn stdout(kind: FeatureKind) -> Self {
        Self::new(kind, std::io::stdout())
    }
}

impl<W: Write + Send> ConsoleReporter<W> {
    pub fn new(kind: FeatureKind, out: W) -> Self {
        Self {
            kind,
            counter: AtomicUsize::new(0),
            out: Mutex::new(out),
        }
    }

    /// Number of items reported so far.
    pub fn count(&self) -> usize {
        self.counter.load(Ordering::SeqCst)
    }

    pub fn into_inner(self) -> W {
        match self.out.into_inner() {
            Ok(w) => w,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl<W: Write + Send> ProgressReporter for ConsoleReporter<W> {
    fn item_done(&self, identifier: &str, shape: (usize, usize)) {
        // Hold the lock while numbering so lines come out in counter order.
        let mut out = match self.out.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let n = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        let _ = writeln!(
            out,
            "{n}: Processed {identifier}, {} shape: ({}, {})",
            self.kind, shape.0, shape.1
        );
    }
}
