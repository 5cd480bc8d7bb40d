//! Arena-specific error types.

use std::error::Error;
use std::fmt;

use tether_core::FatalError;

/// Errors that can occur during arena and episode operations.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ArenaError {
    /// An unrecoverable allocation or nesting failure.
    Fatal(FatalError),
    /// `reallocate` was given a pointer this arena did not hand out
    /// (or one that was already drained).
    UnknownBlock {
        /// Address of the unrecognised block.
        addr: usize,
    },
    /// `exit` was called with no matching `enter`.
    EpisodeUnderflow,
    /// `enter` would nest deeper than the configured limit.
    EpisodeOverflow {
        /// The configured nesting limit.
        max_depth: u32,
    },
    /// Configuration failed validation.
    InvalidConfig {
        /// Description of the violated constraint.
        reason: String,
    },
}

impl fmt::Display for ArenaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fatal(e) => write!(f, "fatal: {e}"),
            Self::UnknownBlock { addr } => {
                write!(f, "block {addr:#x} is not owned by the transient arena")
            }
            Self::EpisodeUnderflow => write!(f, "foreign call exit without matching enter"),
            Self::EpisodeOverflow { max_depth } => {
                write!(f, "foreign call nesting exceeds {max_depth} levels")
            }
            Self::InvalidConfig { reason } => write!(f, "invalid arena config: {reason}"),
        }
    }
}

impl Error for ArenaError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Fatal(e) => Some(e),
            _ => None,
        }
    }
}

impl From<FatalError> for ArenaError {
    fn from(e: FatalError) -> Self {
        Self::Fatal(e)
    }
}

impl ArenaError {
    /// The fatal cause, if this error must terminate the process.
    pub fn as_fatal(&self) -> Option<&FatalError> {
        match self {
            Self::Fatal(e) => Some(e),
            _ => None,
        }
    }
}
