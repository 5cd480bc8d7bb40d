//! Handle-cache configuration.

use crate::error::CacheError;

/// Configuration for a [`HandleCache`](crate::HandleCache).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CacheConfig {
    /// Initial capacity of the record table. Zero or a power of two.
    pub initial_capacity: usize,
}

impl CacheConfig {
    /// Check every invariant, returning the first violation.
    pub fn validate(&self) -> Result<(), CacheError> {
        if self.initial_capacity != 0 && !self.initial_capacity.is_power_of_two() {
            return Err(CacheError::InvalidConfig {
                reason: format!(
                    "initial_capacity {} is not a power of two",
                    self.initial_capacity
                ),
            });
        }
        Ok(())
    }
}
