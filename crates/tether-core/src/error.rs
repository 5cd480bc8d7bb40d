//! Fatal error taxonomy for the native/managed boundary.
//!
//! Nothing here is recoverable by catching and retrying. Native code
//! that called an allocator mid-computation has no error path, so the
//! C ABI layer turns every [`FatalError`] into a logged, flushed process
//! termination at the top of the call. Everything else in Tether is a
//! total function or returns an ordinary error value.

use std::error::Error;
use std::fmt;

/// Which internal table failed to grow.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TableKind {
    /// The transient arena's allocation-tracking table.
    Arena,
    /// The handle cache's record table.
    Handles,
}

impl fmt::Display for TableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Arena => write!(f, "transient arena table"),
            Self::Handles => write!(f, "handle cache table"),
        }
    }
}

/// The single sanctioned unrecoverable failure class.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FatalError {
    /// The system allocator returned no memory for a transient block.
    AllocationFailed {
        /// Size of the failed request in bytes.
        bytes: usize,
    },
    /// `count * element_size` does not fit in `usize`.
    SizeOverflow {
        /// Requested element count.
        count: usize,
        /// Requested element size in bytes.
        element_size: usize,
    },
    /// A tracking table could not double its backing storage.
    TableGrowthFailed {
        /// The table that failed to grow.
        table: TableKind,
        /// The capacity the table tried to grow to.
        requested: usize,
    },
}

impl fmt::Display for FatalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AllocationFailed { bytes } => {
                write!(f, "transient allocation of {bytes} bytes failed")
            }
            Self::SizeOverflow {
                count,
                element_size,
            } => {
                write!(
                    f,
                    "transient allocation size overflow: {count} elements of {element_size} bytes"
                )
            }
            Self::TableGrowthFailed { table, requested } => {
                write!(f, "{table} expansion to {requested} entries failed")
            }
        }
    }
}

impl Error for FatalError {}
