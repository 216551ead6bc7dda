//! GitHub Actions runner surface: step outputs and workflow commands.

use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;

use crate::diagnostics::Logger;
use crate::error::ReviewAppError;
use crate::Result;

/// Environment variable naming the file step outputs are appended to.
pub const GITHUB_OUTPUT: &str = "GITHUB_OUTPUT";
/// Set to `true` by the runner.
pub const GITHUB_ACTIONS: &str = "GITHUB_ACTIONS";

const HEREDOC_DELIMITER: &str = "ghadelimiter_revapp";

/// Named step outputs in insertion order.
///
/// # Examples
///
/// ```
/// use revapp_core::Outputs;
///
/// let mut outputs = Outputs::new();
/// outputs.set("app_id", "app_9");
/// outputs.set_optional("web_url", None);
/// assert_eq!(outputs.get("app_id"), Some("app_9"));
/// assert_eq!(outputs.get("web_url"), Some(""));
/// assert_eq!(outputs.to_string(), "app_id=app_9\nweb_url=\n");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Outputs {
    entries: Vec<(String, String)>,
}

impl Outputs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `name`, replacing an earlier value.
    pub fn set(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        match self.entries.iter_mut().find(|(n, _)| n == name) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name.to_string(), value)),
        }
    }

    /// Set `name`, writing an empty string for an absent value.
    pub fn set_optional(&mut self, name: &str, value: Option<&str>) {
        self.set(name, value.unwrap_or_default());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    /// Outputs as a JSON object.
    pub fn to_json(&self) -> serde_json::Value {
        let map = self
            .entries
            .iter()
            .map(|(n, v)| (n.clone(), serde_json::Value::String(v.clone())))
            .collect();
        serde_json::Value::Object(map)
    }

    /// Append the outputs to the runner's output file.
    ///
    /// Single-line values are written as `name=value`; values containing a
    /// line break use the runner's heredoc form.
    ///
    /// # Errors
    ///
    /// Returns [`ReviewAppError::Io`] if the file cannot be written or a
    /// value contains the heredoc delimiter.
    pub fn append_to_file(&self, path: &Path) -> Result<()> {
        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        file.write_all(self.to_file_format()?.as_bytes())?;
        Ok(())
    }

    fn to_file_format(&self) -> Result<String> {
        let mut text = String::new();
        for (name, value) in &self.entries {
            if value.contains('\n') || value.contains('\r') {
                if value.contains(HEREDOC_DELIMITER) {
                    return Err(ReviewAppError::Io(std::io::Error::new(
                        std::io::ErrorKind::InvalidInput,
                        format!("output {name} contains the heredoc delimiter"),
                    )));
                }
                text.push_str(&format!(
                    "{name}<<{HEREDOC_DELIMITER}\n{value}\n{HEREDOC_DELIMITER}\n"
                ));
            } else {
                text.push_str(&format!("{name}={value}\n"));
            }
        }
        Ok(text)
    }
}

impl fmt::Display for Outputs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (name, value) in &self.entries {
            writeln!(f, "{name}={value}")?;
        }
        Ok(())
    }
}

/// Escape a message for use as workflow command data.
///
/// # Examples
///
/// ```
/// use revapp_core::workflow::escape_data;
///
/// assert_eq!(escape_data("50%\ndone"), "50%25%0Adone");
/// ```
pub fn escape_data(message: &str) -> String {
    message
        .replace('%', "%25")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}

/// Format a workflow command line such as `::warning::message`.
pub fn command(name: &str, message: &str) -> String {
    format!("::{name}::{}", escape_data(message))
}

/// Emits diagnostics as workflow commands the Actions runner understands.
///
/// Info messages are written as plain lines.
pub struct WorkflowLogger<W: Write + Send = std::io::Stdout> {
    out: Mutex<W>,
}

impl WorkflowLogger {
    /// Logger writing to stdout, where the runner reads commands.
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write + Send> WorkflowLogger<W> {
    pub fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    /// Recover the writer.
    pub fn into_inner(self) -> W {
        match self.out.into_inner() {
            Ok(out) => out,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn emit(&self, line: &str) {
        if let Ok(mut out) = self.out.lock() {
            let _ = writeln!(out, "{line}");
            let _ = out.flush();
        }
    }
}

impl<W: Write + Send> Logger for WorkflowLogger<W> {
    fn debug(&self, message: &str) {
        self.emit(&command("debug", message));
    }

    fn info(&self, message: &str) {
        self.emit(message);
    }

    fn warning(&self, message: &str) {
        self.emit(&command("warning", message));
    }

    fn error(&self, message: &str) {
        self.emit(&command("error", message));
    }
}
