use std::sync::mpsc;

use crate::log::{log_level::LogLevel, log_msg::LogMsg, log_sink::LogSink, now_millis};

/// Cloneable, lock-free handle onto the process logger.
///
/// Calls never block: when the bounded queue is full the line is dropped.
#[derive(Clone)]
pub struct LoggerHandle {
    pub(super) tx: mpsc::SyncSender<LogMsg>,
}

impl LogSink for LoggerHandle {
    #[inline]
    fn log(&self, level: LogLevel, msg: &str, target: &'static str) {
        let _ = self.try_log(level, msg, target);
    }
}

impl LoggerHandle {
    /// Attempts to enqueue a log line.
    ///
    /// # Errors
    /// - `TrySendError::Full` when the queue is at capacity.
    /// - `TrySendError::Disconnected` when the logger worker is gone.
    pub fn try_log<S: Into<String>>(
        &self,
        level: LogLevel,
        text: S,
        target: &'static str,
    ) -> Result<(), mpsc::TrySendError<LogMsg>> {
        self.tx
            .try_send(LogMsg::new(level, text, target, now_millis()))
    }
}
