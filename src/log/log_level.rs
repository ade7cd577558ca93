use std::fmt;

/// Defines the severity levels for log messages.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    /// Very fine-grained events (every candidate, every signaling frame).
    Trace,
    /// Events useful while debugging negotiation order.
    Debug,
    /// Lifecycle progress: call started, offer sent, connected.
    Info,
    /// Recoverable oddities such as late or unexpected messages.
    Warn,
    /// Failures that tear the call down.
    Error,
}

impl LogLevel {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            LogLevel::Trace => "TRACE",
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
