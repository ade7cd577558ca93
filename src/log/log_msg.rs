use crate::log::log_level::LogLevel;

/// A single log line travelling from a producer to the logger worker.
#[derive(Debug, Clone)]
pub struct LogMsg {
    /// Severity of the entry.
    pub level: LogLevel,
    /// Milliseconds since the UNIX epoch.
    pub ts_ms: u128,
    /// Rendered message text.
    pub text: String,
    /// Origin of the entry, normally `module_path!()`.
    pub target: &'static str,
}

impl LogMsg {
    /// Creates a new `LogMsg`.
    ///
    /// ```rust,ignore
    /// let msg = LogMsg::new(LogLevel::Info, "offer sent", module_path!(), now_millis());
    /// ```
    pub fn new(
        level: LogLevel,
        text: impl Into<String>,
        target: &'static str,
        ts_ms: u128,
    ) -> Self {
        Self {
            level,
            ts_ms,
            text: text.into(),
            target,
        }
    }

    /// Formats the entry the way it is written to the log file.
    #[must_use]
    pub fn render(&self) -> String {
        format!("[{}] {} {} | {}", self.level, self.ts_ms, self.target, self.text)
    }
}
