//! C-compatible statistics snapshot.

use tether_arena::ArenaStats;
use tether_handles::CacheStats;

use crate::state;
use crate::status::TetherStatus;

/// Snapshot of the calling thread's arena and the shared handle cache.
///
/// Counters are fixed-width `u64` for ABI portability.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TetherStats {
    /// Transient blocks currently tracked on this thread.
    pub arena_live_blocks: u64,
    /// Bytes requested by those blocks.
    pub arena_live_bytes: u64,
    /// Transient allocations made on this thread since it started.
    pub arena_total_allocations: u64,
    /// Drains that freed at least one block.
    pub arena_drains: u64,
    /// Capacity of this thread's arena tracking table.
    pub arena_capacity: u64,
    /// Live handles in the cache.
    pub handles_live: u64,
    /// Live permanent handles.
    pub handles_permanent: u64,
    /// Lookups answered from the cache.
    pub handle_hits: u64,
    /// Lookups that created a handle.
    pub handle_misses: u64,
    /// Handles dropped by release.
    pub handle_releases: u64,
    /// Capacity of the handle table.
    pub handle_capacity: u64,
    /// Foreign-call nesting depth on this thread.
    pub call_depth: u32,
    /// Nonzero during the shutdown phase.
    pub shutdown: u8,
}

impl TetherStats {
    /// Combine per-thread and shared statistics.
    pub fn from_parts(
        arena: &ArenaStats,
        call_depth: u32,
        cache: Option<&CacheStats>,
        shutdown: bool,
    ) -> Self {
        let cache = cache.copied().unwrap_or_default();
        Self {
            arena_live_blocks: arena.live_blocks as u64,
            arena_live_bytes: arena.live_bytes as u64,
            arena_total_allocations: arena.total_allocations,
            arena_drains: arena.drains,
            arena_capacity: arena.capacity as u64,
            handles_live: cache.live as u64,
            handles_permanent: cache.permanent as u64,
            handle_hits: cache.hits,
            handle_misses: cache.misses,
            handle_releases: cache.releases,
            handle_capacity: cache.capacity as u64,
            call_depth,
            shutdown: u8::from(shutdown),
        }
    }
}

/// Write a statistics snapshot to `out`.
///
/// Before `tether_init` the handle fields are zero.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn tether_stats(out: *mut TetherStats) -> i32 {
    ffi_guard!({
        if out.is_null() {
            return TetherStatus::InvalidArgument as i32;
        }
        let (arena, depth) = match state::with_episode(|ep| (ep.arena().stats(), ep.depth())) {
            Ok(parts) => parts,
            Err(e) => return TetherStatus::from(&e) as i32,
        };
        let (cache, shutdown) = match state::boundary() {
            Some(boundary) => {
                let cache = ffi_lock!(boundary.cache);
                (Some(cache.stats()), cache.is_shutdown())
            }
            None => (None, false),
        };
        let stats = TetherStats::from_parts(&arena, depth, cache.as_ref(), shutdown);
        // SAFETY: out is non-null and valid per caller contract.
        unsafe { *out = stats };
        TetherStatus::Ok as i32
    })
}
