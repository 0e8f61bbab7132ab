//! Logging setup and conditional logging macros gated on a module-level `ENABLE_LOGS` flag.
//!
//! Usage:
//! ```ignore
//! // In your module, define the flag first:
//! const ENABLE_LOGS: bool = true;
//!
//! // Then use the macros (they're exported at the crate root):
//! use crate::{log_debug, log_info, log_warn};
//!
//! log_debug!("only emitted when ENABLE_LOGS is true and RUST_LOG allows debug");
//! ```

use std::sync::OnceLock;

/// Initialize `env_logger` from `RUST_LOG`, defaulting to `info`.
///
/// Safe to call more than once; later calls are ignored so tests and embedding hosts
/// can both call it.
pub fn init() {
    let env = env_logger::Env::default().default_filter_or("info");
    if env_logger::Builder::from_env(env).try_init().is_ok() {
        log::info!("reelfeed logging initialized");
    }
}

/// Whether `REELFEED_DEBUG` asks for per-tick logging.
pub fn debug_mode() -> bool {
    static DEBUG_MODE: OnceLock<bool> = OnceLock::new();
    *DEBUG_MODE.get_or_init(|| {
        std::env::var("REELFEED_DEBUG")
            .map(|value| value == "1" || value.eq_ignore_ascii_case("true"))
            .unwrap_or(false)
    })
}

#[doc(hidden)]
#[macro_export]
macro_rules! __feed_log {
    ($level:expr, $($arg:tt)+) => {
        if ENABLE_LOGS {
            ::log::log!($level, $($arg)+);
        }
    };
}

/// Debug logging, checked against the calling module's `ENABLE_LOGS`.
#[macro_export]
macro_rules! log_debug {
    ($($arg:tt)+) => {
        $crate::__feed_log!(::log::Level::Debug, $($arg)+)
    };
}

/// Info logging, checked against the calling module's `ENABLE_LOGS`.
#[macro_export]
macro_rules! log_info {
    ($($arg:tt)+) => {
        $crate::__feed_log!(::log::Level::Info, $($arg)+)
    };
}

/// Warn logging, checked against the calling module's `ENABLE_LOGS`.
#[macro_export]
macro_rules! log_warn {
    ($($arg:tt)+) => {
        $crate::__feed_log!(::log::Level::Warn, $($arg)+)
    };
}

/// Error logging, checked against the calling module's `ENABLE_LOGS`.
#[macro_export]
macro_rules! log_error {
    ($($arg:tt)+) => {
        $crate::__feed_log!(::log::Level::Error, $($arg)+)
    };
}
