//! Leveled, non-blocking logging shared by every component of the call stack.
pub mod log_level;
pub mod log_macros;
pub mod log_msg;
pub mod log_sink;
pub mod logger;
pub mod logger_handle;

pub use log_level::LogLevel;
pub use log_sink::{LogSink, MemoryLogSink, NoopLogSink};

use std::time::SystemTime;

/// Milliseconds since the UNIX epoch, or 0 if the clock is before it.
#[must_use]
pub fn now_millis() -> u128 {
    SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default()
}
