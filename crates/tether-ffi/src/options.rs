//! Initialisation options passed across the C boundary.

use tether_arena::ArenaConfig;
use tether_handles::CacheConfig;

/// C-compatible initialisation options.
///
/// A zero `max_call_depth` or `alignment` selects the default, so a
/// zero-initialised struct is equivalent to passing null.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TetherOptions {
    /// Pre-sized capacity of each thread's transient arena table.
    pub arena_initial_capacity: usize,
    /// Pre-sized capacity of the handle cache table.
    pub handle_initial_capacity: usize,
    /// Minimum alignment of transient blocks, in bytes.
    pub alignment: usize,
    /// Maximum nesting depth of foreign-call episodes.
    pub max_call_depth: u32,
}

impl Default for TetherOptions {
    fn default() -> Self {
        Self {
            arena_initial_capacity: ArenaConfig::DEFAULT_INITIAL_CAPACITY,
            handle_initial_capacity: 0,
            alignment: ArenaConfig::DEFAULT_ALIGNMENT,
            max_call_depth: ArenaConfig::DEFAULT_MAX_DEPTH,
        }
    }
}

impl TetherOptions {
    /// Arena configuration implied by these options.
    pub fn arena_config(&self) -> ArenaConfig {
        ArenaConfig {
            initial_capacity: self.arena_initial_capacity,
            max_depth: match self.max_call_depth {
                0 => ArenaConfig::DEFAULT_MAX_DEPTH,
                n => n,
            },
            alignment: match self.alignment {
                0 => ArenaConfig::DEFAULT_ALIGNMENT,
                n => n,
            },
        }
    }

    /// Cache configuration implied by these options.
    pub fn cache_config(&self) -> CacheConfig {
        CacheConfig {
            initial_capacity: self.handle_initial_capacity,
        }
    }
}
