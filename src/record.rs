use chrono::{DateTime, Utc};

/// A single log record handed to the shipper by the host logging framework.
///
/// Records are created once, enqueued once and never mutated afterwards.
#[derive(Debug, Clone)]
pub struct LogRecord {
    pub timestamp: DateTime<Utc>,
    pub level: Level,
    /// Fully qualified logger name (package-style, e.g. `app.service.Orders`).
    pub logger: String,
    /// Name of the thread that emitted the record.
    pub thread: String,
    pub message: String,
    /// Structured error attached to the record, if any.
    pub error: Option<ErrorInfo>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
    Fatal,
}

impl Level {
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Trace => "TRACE",
            Level::Debug => "DEBUG",
            Level::Info => "INFO",
            Level::Warn => "WARN",
            Level::Error => "ERROR",
            Level::Fatal => "FATAL",
        }
    }
}

impl std::fmt::Display for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rendered form of an error captured alongside a log record.
#[derive(Debug, Clone)]
pub struct ErrorInfo {
    /// Error type name (e.g. `io::Error`, `NullPointerException`).
    pub kind: String,
    pub message: String,
    /// Stack frames, outermost call last (conventional top-down order).
    pub frames: Vec<String>,
}
