//! Captured output streams
//!
//! Batched sinks for the sandboxed run's stdout and stderr. A sink is
//! installed for each stream before execution begins and receives text
//! chunks in arrival order; after execution settles each buffer is joined
//! into one string with no separator beyond what the chunks contained.

use std::sync::{Arc, Mutex};

/// Which standard stream a sink captures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamKind {
    Stdout,
    Stderr,
}

/// Append-only ordered buffer of text chunks for one stream.
///
/// Cloning yields another handle to the same buffer, so a sink can be
/// handed to the interpreter backend while the harness keeps its own
/// handle for the final join.
#[derive(Debug, Clone, Default)]
pub struct StreamBuffer {
    chunks: Arc<Mutex<Vec<String>>>,
}

impl StreamBuffer {
    /// Create an empty buffer
    pub fn new() -> Self {
        StreamBuffer::default()
    }

    /// Append one chunk in arrival order
    pub fn push(&self, text: impl Into<String>) {
        let text = text.into();
        if text.is_empty() {
            return;
        }
        self.lock().push(text);
    }

    /// True if nothing has been captured
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Number of chunks captured so far
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Join all chunks in order, with no inserted separator
    pub fn join(&self) -> String {
        self.lock().concat()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<String>> {
        // A poisoned lock only means a panic elsewhere; the chunks are
        // still intact.
        self.chunks.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// The pair of capture buffers installed for one execution
#[derive(Debug, Clone, Default)]
pub struct OutputCapture {
    /// Standard-output chunks
    pub stdout: StreamBuffer,
    /// Standard-error chunks
    pub stderr: StreamBuffer,
}

impl OutputCapture {
    /// Create a fresh pair of empty buffers
    pub fn new() -> Self {
        OutputCapture::default()
    }

    /// Get the sink handle for one stream kind
    pub fn sink(&self, kind: StreamKind) -> StreamBuffer {
        match kind {
            StreamKind::Stdout => self.stdout.clone(),
            StreamKind::Stderr => self.stderr.clone(),
        }
    }
}
