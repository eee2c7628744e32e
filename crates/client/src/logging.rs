//! Logging macros.
//!
//! Every module logs through `log_info!` and friends so the backend can be
//! swapped in one place. They currently route to `tracing` under the
//! `iterbene_client` target; the desktop binary installs the subscriber.

use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "iterbene_client=debug";

/// Install the global `tracing` subscriber. `RUST_LOG` overrides the
/// default filter. Calling it twice is harmless.
pub fn init() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

pub fn log_info_impl(msg: &str) {
    tracing::info!(target: "iterbene_client", "{}", msg);
}

pub fn log_error_impl(msg: &str) {
    tracing::error!(target: "iterbene_client", "{}", msg);
}

pub fn log_warn_impl(msg: &str) {
    tracing::warn!(target: "iterbene_client", "{}", msg);
}

pub fn log_debug_impl(msg: &str) {
    tracing::debug!(target: "iterbene_client", "{}", msg);
}

/// Log an info message
#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => {
        $crate::logging::log_info_impl(&format!($($arg)*))
    };
}

/// Log an error message
#[macro_export]
macro_rules! log_error {
    ($($arg:tt)*) => {
        $crate::logging::log_error_impl(&format!($($arg)*))
    };
}

/// Log a warning message
#[macro_export]
macro_rules! log_warn {
    ($($arg:tt)*) => {
        $crate::logging::log_warn_impl(&format!($($arg)*))
    };
}

/// Log a debug message
#[macro_export]
macro_rules! log_debug {
    ($($arg:tt)*) => {
        $crate::logging::log_debug_impl(&format!($($arg)*))
    };
}
