//! Grouped, non-interleaved report output.

use std::fmt::Write as _;
use std::io::Write;
use std::sync::{Arc, PoisonError};

use tokio::sync::Mutex;

use crate::types::RootReport;

const GREEN: &str = "\x1b[32m";
const RED: &str = "\x1b[31m";
const RESET: &str = "\x1b[0m";

/// Renders one root's block: header, one line per direct dependency, blank line.
#[must_use]
pub fn render_block(report: &RootReport, color: bool) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "# {}", report.root);
    for result in &report.results {
        let (tag, message, code) = match &result.violation {
            None => ("[OK]", result.subject.to_string(), GREEN),
            Some(violation) => ("[NG]", violation.to_string(), RED),
        };
        if color {
            let _ = writeln!(out, "{code}{tag} {message}{RESET}");
        } else {
            let _ = writeln!(out, "{tag} {message}");
        }
    }
    out.push('\n');
    out
}

/// Serializes report blocks onto a shared sink.
pub struct Reporter {
    sink: Mutex<Box<dyn Write + Send>>,
    color: bool,
}

impl Reporter {
    /// Creates a reporter writing to `sink`.
    #[must_use]
    pub fn new(sink: Box<dyn Write + Send>, color: bool) -> Self {
        Self {
            sink: Mutex::new(sink),
            color,
        }
    }

    /// Creates a reporter writing to standard output.
    #[must_use]
    pub fn stdout(color: bool) -> Self {
        Self::new(Box::new(std::io::stdout()), color)
    }

    /// Writes a root's whole block while holding the sink lock.
    ///
    /// # Errors
    ///
    /// Returns the sink's write error.
    pub async fn print_block(&self, report: &RootReport) -> std::io::Result<()> {
        let block = render_block(report, self.color);
        let mut sink = self.sink.lock().await;
        sink.write_all(block.as_bytes())?;
        sink.flush()
    }
}

/// In-memory sink whose contents can be read back after a run.
#[derive(Debug, Clone, Default)]
pub struct MemorySink(Arc<std::sync::Mutex<Vec<u8>>>);

impl MemorySink {
    /// Creates an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything written so far.
    #[must_use]
    pub fn contents(&self) -> String {
        let buf = self.0.lock().unwrap_or_else(PoisonError::into_inner);
        String::from_utf8_lossy(&buf).into_owned()
    }
}

impl Write for MemorySink {
    fn write(&mut self, data: &[u8]) -> std::io::Result<usize> {
        self.0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}
