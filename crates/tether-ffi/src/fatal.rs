//! Process termination on unrecoverable failures.
//!
//! Native code calling the allocator or the handle cache has no way to
//! receive an error, so a [`FatalError`] ends the process. Only the entry
//! points in this crate call [`terminate`]; library crates return the
//! error instead.

use std::ffi::CString;
use std::io::Write;

use tether_core::FatalError;

use crate::state;

/// Diagnostic line written to stderr and passed to `on_fatal`.
pub fn diagnostic(err: &FatalError) -> String {
    format!("tether: fatal error: {err}")
}

/// Log `err`, notify the embedder and abort.
pub fn terminate(err: &FatalError) -> ! {
    tracing::error!(error = %err, "unrecoverable failure at the call boundary");
    abort_with(&diagnostic(err))
}

/// Notify the embedder's `on_fatal` hook, flush stderr and abort.
pub(crate) fn abort_with(message: &str) -> ! {
    if let Some(hook) = state::boundary().and_then(|b| b.on_fatal) {
        if let Ok(text) = CString::new(message) {
            hook(text.as_ptr());
        }
    }
    let mut stderr = std::io::stderr().lock();
    let _ = writeln!(stderr, "{message}");
    let _ = stderr.flush();
    std::process::abort()
}
