//! C ABI for the Tether call-boundary glue.
//!
//! Exposes the per-thread transient arena and the process-wide handle
//! cache to a native shim. This crate is one of two that may contain
//! `unsafe` code (along with `tether-arena`).
//!
//! Every entry point is wrapped in `ffi_guard!` so panics never unwind
//! into C. Failures the caller can act on are reported as
//! [`TetherStatus`] codes; unrecoverable failures terminate the process
//! through [`fatal`].

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(unsafe_code)]

/// Run an entry-point body, mapping a caught panic to
/// [`TetherStatus::Panicked`].
macro_rules! ffi_guard {
    ($body:block) => {
        match ::std::panic::catch_unwind(::std::panic::AssertUnwindSafe(|| -> i32 { $body })) {
            Ok(code) => code,
            Err(_) => {
                ::tracing::error!("panic caught at the C boundary");
                $crate::status::TetherStatus::Panicked as i32
            }
        }
    };
}

/// Lock a mutex inside `ffi_guard!`, returning
/// [`TetherStatus::InternalError`] from the entry point if it is poisoned.
macro_rules! ffi_lock {
    ($mutex:expr) => {
        match $mutex.lock() {
            Ok(guard) => guard,
            Err(_) => return $crate::status::TetherStatus::InternalError as i32,
        }
    };
}

pub mod arena;
pub mod fatal;
pub mod handles;
pub mod init;
pub mod logging;
pub mod options;
pub mod runtime;
mod state;
pub mod stats;
pub mod status;

pub use options::TetherOptions;
pub use runtime::TetherRuntimeVTable;
pub use stats::TetherStats;
pub use status::TetherStatus;
