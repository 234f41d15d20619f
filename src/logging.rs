use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Verbose,
    Debug,
    Info,
    Warning,
    Error,
    Silent,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Severity::Verbose => "VERBOSE",
            Severity::Debug => "DEBUG",
            Severity::Info => "INFO",
            Severity::Warning => "WARNING",
            Severity::Error => "ERROR",
            Severity::Silent => "SILENT",
        };
        f.write_str(s)
    }
}

/// Diagnostic sink with a queryable threshold. Callers check `enabled`
/// before formatting anything expensive.
pub trait Logger {
    fn min_severity(&self) -> Severity;

    fn log(&self, severity: Severity, message: &str);

    fn enabled(&self, severity: Severity) -> bool {
        severity != Severity::Silent && severity >= self.min_severity()
    }
}

impl<L: Logger + ?Sized> Logger for &L {
    fn min_severity(&self) -> Severity {
        (**self).min_severity()
    }

    fn log(&self, severity: Severity, message: &str) {
        (**self).log(severity, message)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct StderrLogger {
    min: Severity,
}

impl StderrLogger {
    pub fn new(min: Severity) -> Self {
        Self { min }
    }
}

impl Logger for StderrLogger {
    fn min_severity(&self) -> Severity {
        self.min
    }

    fn log(&self, severity: Severity, message: &str) {
        if self.enabled(severity) {
            eprintln!("[{}] {}", severity, message);
        }
    }
}

/// Collects enabled messages in memory.
#[derive(Debug)]
pub struct BufferLogger {
    min: Severity,
    lines: Mutex<Vec<(Severity, String)>>,
}

impl BufferLogger {
    pub fn new(min: Severity) -> Self {
        Self { min, lines: Mutex::new(Vec::new()) }
    }

    pub fn lines(&self) -> Vec<(Severity, String)> {
        self.lines.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

impl Logger for BufferLogger {
    fn min_severity(&self) -> Severity {
        self.min
    }

    fn log(&self, severity: Severity, message: &str) {
        if !self.enabled(severity) {
            return;
        }
        self.lines
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push((severity, message.to_string()));
    }
}
