//! Output sinks the demos write into.
//!
//! A [`Transcript`] is the append-only log a demo narrates into, one line per
//! observable step; tests assert on the exact line order. A [`ListPanel`]
//! models a display that is replaced wholesale on every update, like the call
//! stack and queue panels of the walkthrough.

use std::sync::{Arc, Mutex};

#[derive(Default)]
struct TranscriptInner {
    lines: Mutex<Vec<String>>,
    echo: bool,
}

/// An append-only line log shared between a demo and its observers.
///
/// Clones share the same underlying log, so a handler can move one clone
/// into a callback while the caller keeps another to inspect afterwards.
#[derive(Clone, Default)]
pub struct Transcript {
    inner: Arc<TranscriptInner>,
}

impl Transcript {
    /// An empty transcript.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// An empty transcript that also prints each line to stdout as it is
    /// appended. Demo binaries use this to narrate in real time.
    #[must_use]
    pub fn echoing() -> Self {
        Self {
            inner: Arc::new(TranscriptInner {
                lines: Mutex::new(Vec::new()),
                echo: true,
            }),
        }
    }

    /// Appends one line.
    pub fn push(&self, line: impl Into<String>) {
        let line = line.into();
        if self.inner.echo {
            println!("{line}");
        }
        self.inner.lines.lock().unwrap().push(line);
    }

    /// All lines appended so far, in order.
    #[must_use]
    pub fn lines(&self) -> Vec<String> {
        self.inner.lines.lock().unwrap().clone()
    }

    /// The most recent line, if any.
    #[must_use]
    pub fn last(&self) -> Option<String> {
        self.inner.lines.lock().unwrap().last().cloned()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.lines.lock().unwrap().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.lines.lock().unwrap().is_empty()
    }

    /// Removes every line. The walkthrough resets its output this way before
    /// each replay.
    pub fn clear(&self) {
        self.inner.lines.lock().unwrap().clear();
    }
}

impl std::fmt::Display for Transcript {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for line in self.inner.lines.lock().unwrap().iter() {
            writeln!(f, "{line}")?;
        }
        Ok(())
    }
}

/// A display list that is replaced wholesale on every update.
///
/// Readers only ever see the latest snapshot; there is no append operation.
#[derive(Clone)]
pub struct ListPanel<T> {
    items: Arc<Mutex<Vec<T>>>,
}

impl<T> ListPanel<T> {
    /// An empty panel.
    #[must_use]
    pub fn new() -> Self {
        Self {
            items: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Replaces the panel's contents.
    pub fn set(&self, items: Vec<T>) {
        *self.items.lock().unwrap() = items;
    }

    /// Empties the panel.
    pub fn clear(&self) {
        self.items.lock().unwrap().clear();
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.lock().unwrap().is_empty()
    }
}

impl<T: Clone> ListPanel<T> {
    /// The current snapshot.
    #[must_use]
    pub fn items(&self) -> Vec<T> {
        self.items.lock().unwrap().clone()
    }
}

impl<T> Default for ListPanel<T> {
    fn default() -> Self {
        Self::new()
    }
}
