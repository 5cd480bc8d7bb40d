//! Handle-cache error types.

use std::error::Error;
use std::fmt;

use tether_core::FatalError;

/// Errors from handle-cache construction and growth.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CacheError {
    /// The record table could not grow.
    Fatal(FatalError),
    /// Configuration failed validation.
    InvalidConfig {
        /// Description of the violated constraint.
        reason: String,
    },
}

impl fmt::Display for CacheError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fatal(e) => write!(f, "fatal: {e}"),
            Self::InvalidConfig { reason } => write!(f, "invalid cache config: {reason}"),
        }
    }
}

impl Error for CacheError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Fatal(e) => Some(e),
            Self::InvalidConfig { .. } => None,
        }
    }
}

impl From<FatalError> for CacheError {
    fn from(e: FatalError) -> Self {
        Self::Fatal(e)
    }
}
