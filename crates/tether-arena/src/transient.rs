//! The call-scoped transient allocator.
//!
//! [`TransientArena`] hands native code raw, `malloc`-like blocks that
//! are never freed individually. Every block is tracked in a
//! [`GrowableTable`] and released together by [`TransientArena::drain`],
//! which the episode tracker runs when the outermost foreign call
//! returns.

use std::alloc::Layout;
use std::ptr::NonNull;

use tether_core::{FatalError, TableKind};

use crate::config::ArenaConfig;
use crate::error::ArenaError;
use crate::raw;
use crate::table::GrowableTable;

/// One tracked allocation.
struct Block {
    ptr: NonNull<u8>,
    layout: Layout,
    /// Bytes the caller asked for. `layout.size()` is at least 1 even
    /// for zero-byte requests.
    requested: usize,
    /// Whether every requested byte has been written by us. False for
    /// plain `allocate` and for blocks grown from one.
    initialized: bool,
}

/// Point-in-time counters for a [`TransientArena`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ArenaStats {
    /// Blocks allocated since the last drain.
    pub live_blocks: usize,
    /// Bytes requested since the last drain.
    pub live_bytes: usize,
    /// Blocks allocated over the arena's lifetime.
    pub total_allocations: u64,
    /// Drains that released at least one block.
    pub drains: u64,
    /// Current capacity of the tracking table.
    pub capacity: usize,
}

/// Episode-scoped raw allocator.
///
/// Blocks are aligned to [`ArenaConfig::alignment`]. A zero-byte request
/// still produces a distinct, tracked one-byte block so that it is freed
/// uniformly at drain time.
pub struct TransientArena {
    blocks: GrowableTable<Block>,
    alignment: usize,
    live_bytes: usize,
    total_allocations: u64,
    drains: u64,
}

impl TransientArena {
    /// Create an arena with default configuration.
    pub fn new() -> Self {
        Self {
            blocks: GrowableTable::new(TableKind::Arena),
            alignment: ArenaConfig::DEFAULT_ALIGNMENT,
            live_bytes: 0,
            total_allocations: 0,
            drains: 0,
        }
    }

    /// Create an arena from a validated configuration.
    pub fn with_config(config: &ArenaConfig) -> Result<Self, ArenaError> {
        config.validate()?;
        Ok(Self {
            blocks: GrowableTable::with_capacity(TableKind::Arena, config.initial_capacity)?,
            alignment: config.alignment,
            live_bytes: 0,
            total_allocations: 0,
            drains: 0,
        })
    }

    /// Allocate `count * element_size` bytes of uninitialised memory.
    ///
    /// The block stays valid until the next [`drain`](Self::drain).
    /// Failure is fatal: the caller must terminate the process.
    pub fn allocate(
        &mut self,
        count: usize,
        element_size: usize,
    ) -> Result<NonNull<u8>, FatalError> {
        self.alloc_block(count, element_size, false, false)
    }

    /// Allocate `count * element_size` zero-filled bytes.
    ///
    /// The block is zeroed by the allocator before it is returned, so a
    /// caller never observes uninitialised memory.
    pub fn zero_allocate(
        &mut self,
        count: usize,
        element_size: usize,
    ) -> Result<NonNull<u8>, FatalError> {
        self.alloc_block(count, element_size, true, true)
    }

    #[allow(unsafe_code)]
    fn alloc_block(
        &mut self,
        count: usize,
        element_size: usize,
        zeroed: bool,
        initialized: bool,
    ) -> Result<NonNull<u8>, FatalError> {
        let overflow = FatalError::SizeOverflow {
            count,
            element_size,
        };
        let bytes = count.checked_mul(element_size).ok_or(overflow.clone())?;
        let layout = Layout::from_size_align(bytes.max(1), self.alignment).map_err(|_| overflow)?;
        let ptr = raw::alloc_block(layout, zeroed).ok_or(FatalError::AllocationFailed { bytes })?;

        let block = Block {
            ptr,
            layout,
            requested: bytes,
            initialized,
        };
        if let Err(e) = self.blocks.push(block) {
            // SAFETY: ptr came from alloc_block with this layout a moment
            // ago and was never tracked, so nothing else can free it.
            unsafe { raw::free_block(ptr, layout) };
            return Err(e);
        }
        self.live_bytes += bytes;
        self.total_allocations += 1;
        tracing::trace!(bytes, zeroed, addr = ptr.as_ptr() as usize, "transient block");
        Ok(ptr)
    }

    /// Grow a block obtained from this arena.
    ///
    /// If `new_count <= old_count` the original pointer is returned.
    /// Otherwise a new zero-filled block is allocated and the first
    /// `old_count * element_size` bytes are copied into it; the old
    /// block stays tracked until the drain. The new block is readable
    /// through [`contents`](Self::contents) only if the old one was.
    #[allow(unsafe_code)]
    pub fn reallocate(
        &mut self,
        ptr: NonNull<u8>,
        old_count: usize,
        new_count: usize,
        element_size: usize,
    ) -> Result<NonNull<u8>, ArenaError> {
        let (old_len, old_initialized) = match self.blocks.iter().find(|(_, b)| b.ptr == ptr) {
            Some((_, block)) => (block.requested, block.initialized),
            None => {
                return Err(ArenaError::UnknownBlock {
                    addr: ptr.as_ptr() as usize,
                })
            }
        };
        if new_count <= old_count {
            return Ok(ptr);
        }
        let old_bytes = old_count
            .checked_mul(element_size)
            .ok_or(FatalError::SizeOverflow {
                count: old_count,
                element_size,
            })?;
        let new_ptr = self.alloc_block(new_count, element_size, true, old_initialized)?;
        // SAFETY: ptr is tracked, so it is live with `old_len` bytes;
        // new_ptr is a fresh block of at least `old_bytes` bytes, distinct
        // from ptr. Table growth moves records, never blocks.
        unsafe { raw::copy_block(ptr, new_ptr, old_bytes.min(old_len)) };
        Ok(new_ptr)
    }

    /// Free every tracked block and reset the high-water mark.
    ///
    /// Idempotent: draining an empty arena does nothing. The tracking
    /// table keeps its capacity. Returns the number of blocks freed.
    #[allow(unsafe_code)]
    pub fn drain(&mut self) -> usize {
        let mut freed = 0;
        for block in self.blocks.drain() {
            // SAFETY: each block is owned by exactly one table slot and
            // draining consumes the slot, so it is freed once, with the
            // layout it was allocated with.
            unsafe { raw::free_block(block.ptr, block.layout) };
            freed += 1;
        }
        if freed > 0 {
            self.drains += 1;
            tracing::debug!(freed, bytes = self.live_bytes, "transient arena drained");
        }
        self.live_bytes = 0;
        freed
    }

    /// Whether `ptr` is the start of a block owned by this arena.
    pub fn owns(&self, ptr: NonNull<u8>) -> bool {
        self.blocks.position(|b| b.ptr == ptr).is_some()
    }

    /// The requested bytes of a live block, for diagnostics and tests.
    ///
    /// `None` for pointers this arena does not own and for blocks from
    /// [`allocate`](Self::allocate), whose bytes may be uninitialised.
    #[allow(unsafe_code)]
    pub fn contents(&self, ptr: NonNull<u8>) -> Option<&[u8]> {
        let (_, block) = self.blocks.iter().find(|(_, b)| b.ptr == ptr)?;
        if !block.initialized {
            return None;
        }
        // SAFETY: the block is live and fully initialised. It is freed
        // only by `drain`, which needs `&mut self`, so it outlives the
        // returned borrow of `self`.
        Some(unsafe { raw::block_bytes(block.ptr, block.requested) })
    }

    /// Number of blocks allocated since the last drain.
    pub fn live_count(&self) -> usize {
        self.blocks.high_water_mark()
    }

    /// Current capacity of the tracking table.
    pub fn capacity(&self) -> usize {
        self.blocks.capacity()
    }

    /// Snapshot of the arena's counters.
    pub fn stats(&self) -> ArenaStats {
        ArenaStats {
            live_blocks: self.live_count(),
            live_bytes: self.live_bytes,
            total_allocations: self.total_allocations,
            drains: self.drains,
            capacity: self.capacity(),
        }
    }
}

impl Default for TransientArena {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for TransientArena {
    fn drop(&mut self) {
        self.drain();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_allocate_reads_back_zero() {
        let mut arena = TransientArena::new();
        let p = arena.zero_allocate(10, 1).unwrap();
        let bytes = arena.contents(p).unwrap();
        assert_eq!(bytes.len(), 10);
        assert!(bytes.iter().all(|&b| b == 0));
    }

    #[test]
    fn blocks_respect_alignment() {
        let mut arena = TransientArena::new();
        for n in [1usize, 3, 17, 64] {
            let p = arena.allocate(n, 1).unwrap();
            assert_eq!(p.as_ptr() as usize % ArenaConfig::DEFAULT_ALIGNMENT, 0);
        }
    }

    #[test]
    fn drain_frees_everything_and_keeps_capacity() {
        let mut arena = TransientArena::new();
        arena.allocate(8, 1).unwrap();
        arena.allocate(16, 1).unwrap();
        arena.allocate(32, 1).unwrap();
        assert_eq!(arena.live_count(), 3);
        assert_eq!(arena.stats().live_bytes, 56);
        let capacity = arena.capacity();

        assert_eq!(arena.drain(), 3);
        assert_eq!(arena.live_count(), 0);
        assert_eq!(arena.stats().live_bytes, 0);
        assert_eq!(arena.capacity(), capacity);
    }

    #[test]
    fn drain_is_idempotent() {
        let mut arena = TransientArena::new();
        arena.allocate(4, 4).unwrap();
        assert_eq!(arena.drain(), 1);
        assert_eq!(arena.drain(), 0);
        assert_eq!(arena.stats().drains, 1);
    }

    #[test]
    fn zero_sized_request_is_tracked() {
        let mut arena = TransientArena::new();
        let a = arena.zero_allocate(0, 8).unwrap();
        let b = arena.allocate(5, 0).unwrap();
        assert_ne!(a, b);
        assert_eq!(arena.live_count(), 2);
        assert_eq!(arena.contents(a).unwrap().len(), 0);
        assert_eq!(arena.drain(), 2);
    }

    #[test]
    fn size_overflow_is_fatal() {
        let mut arena = TransientArena::new();
        let err = arena.allocate(usize::MAX, 2).unwrap_err();
        assert!(matches!(err, FatalError::SizeOverflow { .. }));
        assert_eq!(arena.live_count(), 0);
    }

    #[test]
    fn pointers_survive_table_growth() {
        let mut arena = TransientArena::new();
        let first = arena.zero_allocate(4, 1).unwrap();
        arena.contents(first).unwrap();
        // Cross the 1 -> 2 -> 4 -> 8 boundaries.
        let mut later = Vec::new();
        for _ in 0..7 {
            later.push(arena.allocate(4, 1).unwrap());
        }
        assert_eq!(arena.capacity(), 8);
        assert!(arena.owns(first));
        assert_eq!(arena.contents(first).unwrap(), &[0, 0, 0, 0]);
        for p in later {
            assert!(arena.owns(p));
        }
    }

    #[test]
    fn allocation_after_drain_starts_at_slot_zero() {
        let mut arena = TransientArena::new();
        let old: Vec<_> = (0..3).map(|i| arena.allocate(8 << i, 1).unwrap()).collect();
        arena.drain();
        for p in &old {
            assert!(!arena.owns(*p));
        }
        let fresh = arena.allocate(8, 1).unwrap();
        assert_eq!(arena.live_count(), 1);
        assert!(arena.owns(fresh));
    }

    #[test]
    fn reallocate_shrink_returns_same_pointer() {
        let mut arena = TransientArena::new();
        let p = arena.zero_allocate(8, 4).unwrap();
        assert_eq!(arena.reallocate(p, 8, 4, 4).unwrap(), p);
        assert_eq!(arena.reallocate(p, 8, 8, 4).unwrap(), p);
        assert_eq!(arena.live_count(), 1);
    }

    #[test]
    #[allow(unsafe_code)]
    fn reallocate_grow_copies_prefix_and_zeroes_tail() {
        let mut arena = TransientArena::new();
        let p = arena.zero_allocate(2, 1).unwrap();
        // Native code writes into its block.
        unsafe {
            p.as_ptr().write(7);
            p.as_ptr().add(1).write(9);
        }
        let q = arena.reallocate(p, 2, 6, 1).unwrap();
        assert_ne!(p, q);
        assert_eq!(arena.contents(q).unwrap(), &[7, 9, 0, 0, 0, 0]);
        // Old block is still tracked until the drain.
        assert!(arena.owns(p));
        assert_eq!(arena.live_count(), 2);
    }

    #[test]
    fn uninitialised_blocks_are_not_readable() {
        let mut arena = TransientArena::new();
        let p = arena.allocate(4, 1).unwrap();
        assert!(arena.owns(p));
        assert_eq!(arena.contents(p), None);
        // Growing an uninitialised block copies unknown bytes.
        let q = arena.reallocate(p, 4, 8, 1).unwrap();
        assert_eq!(arena.contents(q), None);
        let z = arena.zero_allocate(4, 1).unwrap();
        assert_eq!(arena.contents(z), Some(&[0u8, 0, 0, 0][..]));
    }

    #[test]
    fn reallocate_foreign_pointer_is_rejected() {
        let mut arena = TransientArena::new();
        let mut local = 0u8;
        let foreign = NonNull::from(&mut local);
        assert!(matches!(
            arena.reallocate(foreign, 1, 2, 1),
            Err(ArenaError::UnknownBlock { .. })
        ));
    }

    #[test]
    fn with_config_preallocates_table() {
        let config = ArenaConfig {
            initial_capacity: 16,
            ..ArenaConfig::default()
        };
        let arena = TransientArena::with_config(&config).unwrap();
        assert_eq!(arena.capacity(), 16);
    }

    #[test]
    fn with_config_rejects_invalid() {
        let config = ArenaConfig {
            alignment: 3,
            ..ArenaConfig::default()
        };
        assert!(TransientArena::with_config(&config).is_err());
    }

    #[cfg(not(miri))]
    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn drain_always_returns_live_count_to_zero(
                sizes in proptest::collection::vec(0usize..256, 0..64),
            ) {
                let mut arena = TransientArena::new();
                for &n in &sizes {
                    arena.allocate(n, 1).unwrap();
                }
                prop_assert_eq!(arena.live_count(), sizes.len());
                prop_assert_eq!(arena.stats().live_bytes, sizes.iter().sum::<usize>());
                prop_assert_eq!(arena.drain(), sizes.len());
                prop_assert_eq!(arena.live_count(), 0);
            }

            #[test]
            fn zeroed_blocks_are_zero(count in 0usize..128, size in 1usize..16) {
                let mut arena = TransientArena::new();
                let p = arena.zero_allocate(count, size).unwrap();
                prop_assert!(arena.contents(p).unwrap().iter().all(|&b| b == 0));
            }
        }
    }
}
