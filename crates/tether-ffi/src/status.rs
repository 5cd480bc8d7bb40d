//! C-compatible status codes.
//!
//! [`TetherStatus`] is a `repr(i32)` enum covering every recoverable
//! condition at the C boundary. Fatal conditions never produce a status:
//! they terminate the process through [`crate::fatal`].

use tether_arena::ArenaError;
use tether_handles::CacheError;

/// C-compatible status code returned by the fallible FFI functions.
///
/// `Ok` = 0, all errors are negative. Values are ABI-stable.
#[repr(i32)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TetherStatus {
    /// Success.
    Ok = 0,
    /// An argument is null, out of range, or otherwise invalid.
    InvalidArgument = -1,
    /// `tether_init` has not been called.
    NotInitialized = -2,
    /// Configuration validation error.
    ConfigError = -3,
    /// `tether_call_exit` without a matching `tether_call_enter`.
    EpisodeUnderflow = -4,
    /// A pointer passed to `tether_realloc` is not owned by the arena.
    UnknownBlock = -5,
    /// Internal error (e.g. poisoned mutex after a prior panic).
    InternalError = -6,
    /// Table pre-allocation failed during initialisation.
    AllocationFailed = -7,
    /// `tether_call_enter` beyond the configured nesting limit.
    EpisodeOverflow = -8,
    /// A Rust panic was caught at the FFI boundary.
    Panicked = -128,
}

impl From<&ArenaError> for TetherStatus {
    fn from(e: &ArenaError) -> Self {
        match e {
            ArenaError::Fatal(_) => TetherStatus::AllocationFailed,
            ArenaError::UnknownBlock { .. } => TetherStatus::UnknownBlock,
            ArenaError::EpisodeUnderflow => TetherStatus::EpisodeUnderflow,
            ArenaError::EpisodeOverflow { .. } => TetherStatus::EpisodeOverflow,
            ArenaError::InvalidConfig { .. } => TetherStatus::ConfigError,
        }
    }
}

impl From<&CacheError> for TetherStatus {
    fn from(e: &CacheError) -> Self {
        match e {
            CacheError::Fatal(_) => TetherStatus::AllocationFailed,
            CacheError::InvalidConfig { .. } => TetherStatus::ConfigError,
        }
    }
}
