use std::sync::Mutex;

use crate::log::log_level::LogLevel;

/// Destination for log lines. Every component holds an `Arc<dyn LogSink>`.
pub trait LogSink: Send + Sync {
    fn log(&self, level: LogLevel, msg: &str, target: &'static str);
}

#[derive(Debug, Clone, Default)]
pub struct NoopLogSink;

impl LogSink for NoopLogSink {
    #[inline]
    fn log(&self, _level: LogLevel, _msg: &str, _target: &'static str) {}
}

/// Keeps every line in memory. Used by tests to assert on what was logged.
#[derive(Debug, Default)]
pub struct MemoryLogSink {
    lines: Mutex<Vec<(LogLevel, String)>>,
}

impl MemoryLogSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the captured lines, oldest first.
    #[must_use]
    pub fn lines(&self) -> Vec<(LogLevel, String)> {
        self.lines.lock().map(|l| l.clone()).unwrap_or_default()
    }

    #[must_use]
    pub fn contains(&self, level: LogLevel, needle: &str) -> bool {
        self.lines()
            .iter()
            .any(|(lvl, text)| *lvl == level && text.contains(needle))
    }
}

impl LogSink for MemoryLogSink {
    fn log(&self, level: LogLevel, msg: &str, _target: &'static str) {
        if let Ok(mut lines) = self.lines.lock() {
            lines.push((level, msg.to_owned()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_sink_keeps_order_and_level() {
        let sink = MemoryLogSink::new();
        sink.log(LogLevel::Info, "first", "t");
        sink.log(LogLevel::Error, "second", "t");

        let lines = sink.lines();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], (LogLevel::Info, "first".to_owned()));
        assert!(sink.contains(LogLevel::Error, "sec"));
        assert!(!sink.contains(LogLevel::Info, "second"));
    }
}
