//! Arena configuration parameters.

use crate::error::ArenaError;

/// Configuration for the transient arena and its episode tracker.
///
/// Validated at construction; all values are immutable after creation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArenaConfig {
    /// Initial capacity of the block-tracking table.
    ///
    /// Default: 0 (the first allocation grows the table to 1). Must be
    /// zero or a power of two.
    pub initial_capacity: usize,

    /// Maximum nesting depth of foreign-call episodes.
    ///
    /// Default: 32. Entering one level deeper is fatal.
    pub max_depth: u32,

    /// Alignment of every block handed to native code, in bytes.
    ///
    /// Default: 16, matching `max_align_t` on mainstream 64-bit targets.
    /// Must be a power of two.
    pub alignment: usize,
}

impl ArenaConfig {
    /// Default tracking-table capacity.
    pub const DEFAULT_INITIAL_CAPACITY: usize = 0;

    /// Default maximum episode nesting depth.
    pub const DEFAULT_MAX_DEPTH: u32 = 32;

    /// Default block alignment in bytes.
    pub const DEFAULT_ALIGNMENT: usize = 16;

    /// Check every invariant, returning the first violation.
    pub fn validate(&self) -> Result<(), ArenaError> {
        if self.initial_capacity != 0 && !self.initial_capacity.is_power_of_two() {
            return Err(ArenaError::InvalidConfig {
                reason: format!(
                    "initial_capacity {} is not a power of two",
                    self.initial_capacity
                ),
            });
        }
        if self.max_depth == 0 {
            return Err(ArenaError::InvalidConfig {
                reason: "max_depth must be at least 1".into(),
            });
        }
        if !self.alignment.is_power_of_two() {
            return Err(ArenaError::InvalidConfig {
                reason: format!("alignment {} is not a power of two", self.alignment),
            });
        }
        Ok(())
    }
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            initial_capacity: Self::DEFAULT_INITIAL_CAPACITY,
            max_depth: Self::DEFAULT_MAX_DEPTH,
            alignment: Self::DEFAULT_ALIGNMENT,
        }
    }
}
