//! Leveled logging macros over any `LogSink`.
//!
//! # Feature Flags
//! Levels are controlled by cargo features:
//! `log-trace`, `log-debug`, `log-info`, `log-warn`, `log-error`.
//!
//! A disabled level expands to a dead `if false` branch: the arguments are
//! still type-checked (and count as used) but never formatted.

#[macro_export]
macro_rules! sink_log {
    ($sink:expr, $lvl:expr, $($arg:tt)*) => {{
        let __msg = format!($($arg)*);
        $sink.log($lvl, &__msg, module_path!());
    }};
}

// ---------------------- TRACE ----------------------
#[cfg(feature = "log-trace")]
#[macro_export]
macro_rules! sink_trace {
    ($sink:expr, $($arg:tt)*) => {
        $crate::sink_log!($sink, $crate::log::log_level::LogLevel::Trace, $($arg)*)
    };
}

#[cfg(not(feature = "log-trace"))]
#[macro_export]
macro_rules! sink_trace {
    ($sink:expr, $($arg:tt)*) => {
        if false {
            $crate::sink_log!($sink, $crate::log::log_level::LogLevel::Trace, $($arg)*)
        }
    };
}

// ---------------------- DEBUG ----------------------
#[cfg(feature = "log-debug")]
#[macro_export]
macro_rules! sink_debug {
    ($sink:expr, $($arg:tt)*) => {
        $crate::sink_log!($sink, $crate::log::log_level::LogLevel::Debug, $($arg)*)
    };
}

#[cfg(not(feature = "log-debug"))]
#[macro_export]
macro_rules! sink_debug {
    ($sink:expr, $($arg:tt)*) => {
        if false {
            $crate::sink_log!($sink, $crate::log::log_level::LogLevel::Debug, $($arg)*)
        }
    };
}

// ---------------------- INFO ----------------------
#[cfg(feature = "log-info")]
#[macro_export]
macro_rules! sink_info {
    ($sink:expr, $($arg:tt)*) => {
        $crate::sink_log!($sink, $crate::log::log_level::LogLevel::Info, $($arg)*)
    };
}

#[cfg(not(feature = "log-info"))]
#[macro_export]
macro_rules! sink_info {
    ($sink:expr, $($arg:tt)*) => {
        if false {
            $crate::sink_log!($sink, $crate::log::log_level::LogLevel::Info, $($arg)*)
        }
    };
}

// ---------------------- WARN ----------------------
#[cfg(feature = "log-warn")]
#[macro_export]
macro_rules! sink_warn {
    ($sink:expr, $($arg:tt)*) => {
        $crate::sink_log!($sink, $crate::log::log_level::LogLevel::Warn, $($arg)*)
    };
}

#[cfg(not(feature = "log-warn"))]
#[macro_export]
macro_rules! sink_warn {
    ($sink:expr, $($arg:tt)*) => {
        if false {
            $crate::sink_log!($sink, $crate::log::log_level::LogLevel::Warn, $($arg)*)
        }
    };
}

// ---------------------- ERROR ----------------------
// Generally always enabled, but kept symmetric so it can be compiled out.
#[cfg(feature = "log-error")]
#[macro_export]
macro_rules! sink_error {
    ($sink:expr, $($arg:tt)*) => {
        $crate::sink_log!($sink, $crate::log::log_level::LogLevel::Error, $($arg)*)
    };
}

#[cfg(not(feature = "log-error"))]
#[macro_export]
macro_rules! sink_error {
    ($sink:expr, $($arg:tt)*) => {
        if false {
            $crate::sink_log!($sink, $crate::log::log_level::LogLevel::Error, $($arg)*)
        }
    };
}
