//! Leveled diagnostics capability shared by all components.

use std::sync::Arc;

/// Sink for the diagnostic messages components emit while they work.
///
/// Every method defaults to doing nothing, so an implementation only
/// overrides the levels it cares about.
pub trait Logger: Send + Sync {
    /// Fine-grained trace output.
    fn debug(&self, _message: &str) {}

    /// Progress information.
    fn info(&self, _message: &str) {}

    /// Something degraded but the run continues.
    fn warning(&self, _message: &str) {}

    /// The run is failing.
    fn error(&self, _message: &str) {}
}

/// Discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopLogger;

impl Logger for NoopLogger {}

/// A shared no-op logger, the default for components built without one.
pub fn noop() -> Arc<dyn Logger> {
    Arc::new(NoopLogger)
}

/// Forwards to the `log` facade under the `revapp` target.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogLogger;

impl Logger for LogLogger {
    fn debug(&self, message: &str) {
        log::debug!(target: "revapp", "{message}");
    }

    fn info(&self, message: &str) {
        log::info!(target: "revapp", "{message}");
    }

    fn warning(&self, message: &str) {
        log::warn!(target: "revapp", "{message}");
    }

    fn error(&self, message: &str) {
        log::error!(target: "revapp", "{message}");
    }
}

/// Collects messages in memory, for tests that assert on diagnostics.
#[derive(Debug, Default)]
pub struct MemoryLogger {
    entries: std::sync::Mutex<Vec<(Level, String)>>,
}

/// Severity of a [`MemoryLogger`] entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Debug,
    Info,
    Warning,
    Error,
}

impl MemoryLogger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all recorded entries in emission order.
    pub fn entries(&self) -> Vec<(Level, String)> {
        self.entries
            .lock()
            .map(|entries| entries.clone())
            .unwrap_or_default()
    }

    /// Messages recorded at `level`.
    pub fn messages(&self, level: Level) -> Vec<String> {
        self.entries()
            .into_iter()
            .filter(|(l, _)| *l == level)
            .map(|(_, m)| m)
            .collect()
    }

    fn push(&self, level: Level, message: &str) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.push((level, message.to_string()));
        }
    }
}

impl Logger for MemoryLogger {
    fn debug(&self, message: &str) {
        self.push(Level::Debug, message);
    }

    fn info(&self, message: &str) {
        self.push(Level::Info, message);
    }

    fn warning(&self, message: &str) {
        self.push(Level::Warning, message);
    }

    fn error(&self, message: &str) {
        self.push(Level::Error, message);
    }
}
