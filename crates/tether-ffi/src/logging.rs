//! Logging bootstrap for embedders.
//!
//! The library crates only emit `tracing` events. An embedder that wants
//! them on stderr calls [`tether_log_init`] once, typically right after
//! `tether_init`.

use std::ffi::{c_char, CStr};

use tracing_subscriber::EnvFilter;

use crate::status::TetherStatus;

/// Environment variable consulted when no directive is passed.
pub const LOG_ENV: &str = "TETHER_LOG";

/// Filter used when neither a directive nor [`LOG_ENV`] is usable.
pub const DEFAULT_FILTER: &str = "warn";

/// Build the filter: `directive` if it parses, then [`LOG_ENV`], then
/// [`DEFAULT_FILTER`].
pub fn filter_for(directive: Option<&str>) -> EnvFilter {
    directive
        .filter(|d| !d.trim().is_empty())
        .and_then(|d| EnvFilter::try_new(d).ok())
        .or_else(|| EnvFilter::try_from_env(LOG_ENV).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_FILTER))
}

/// Install a stderr `fmt` subscriber. Returns `false` if a global
/// subscriber was already set, in which case nothing changes.
pub fn init(directive: Option<&str>) -> bool {
    tracing_subscriber::fmt()
        .with_env_filter(filter_for(directive))
        .with_writer(std::io::stderr)
        .with_target(true)
        .try_init()
        .is_ok()
}

/// Install the stderr subscriber. `filter` may be null.
///
/// Calling this more than once is harmless. Returns `TETHER_STATUS_OK`, or
/// `TETHER_STATUS_INVALID_ARGUMENT` if `filter` is not valid UTF-8.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn tether_log_init(filter: *const c_char) -> i32 {
    ffi_guard!({
        let directive = if filter.is_null() {
            None
        } else {
            // SAFETY: filter is non-null and NUL-terminated per caller contract.
            match unsafe { CStr::from_ptr(filter) }.to_str() {
                Ok(s) => Some(s),
                Err(_) => return TetherStatus::InvalidArgument as i32,
            }
        };
        if !init(directive) {
            tracing::debug!("log subscriber already installed");
        }
        TetherStatus::Ok as i32
    })
}
