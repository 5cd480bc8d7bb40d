//! Workload profiles for benchmarking the call boundary.
//!
//! A [`CallProfile`] describes one foreign call: how much scratch memory
//! native code requests and how many managed objects it touches.
//! [`simulate_call`] replays that shape against an [`Episode`] and a
//! [`HandleCache`].

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use tether_arena::{ArenaError, Episode};
use tether_core::{HandleKind, ManagedRuntime, ObjectRef};
use tether_handles::HandleCache;

/// Shape of one simulated foreign call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CallProfile {
    /// Transient blocks allocated per call.
    pub blocks: usize,
    /// Size of each block in bytes.
    pub block_bytes: usize,
    /// Handle lookups per call.
    pub lookups: u64,
    /// Distinct objects the lookups cycle through.
    pub distinct_objects: u64,
}

impl CallProfile {
    /// A short call: a few small buffers, a handful of arguments.
    pub const SMALL: Self = Self {
        blocks: 4,
        block_bytes: 64,
        lookups: 4,
        distinct_objects: 4,
    };

    /// A call that walks a large structure: many buffers and objects.
    pub const WIDE: Self = Self {
        blocks: 256,
        block_bytes: 256,
        lookups: 512,
        distinct_objects: 128,
    };
}

/// Run one outermost call described by `profile`.
///
/// Objects are numbered from `first_object`. Every other block is
/// zero-filled. Returns the number of live handles afterwards.
pub fn simulate_call<R>(
    episode: &mut Episode,
    cache: &mut HandleCache<R>,
    profile: &CallProfile,
    first_object: u64,
) -> Result<usize, ArenaError>
where
    R: ManagedRuntime<Object = ObjectRef>,
{
    let mut guard = episode.scope()?;
    for i in 0..profile.blocks {
        if i % 2 == 0 {
            guard.arena().zero_allocate(profile.block_bytes, 1)?;
        } else {
            guard.arena().allocate(profile.block_bytes, 1)?;
        }
    }
    let distinct = profile.distinct_objects.max(1);
    for i in 0..profile.lookups {
        let object = ObjectRef(first_object + i % distinct);
        cache.lookup_or_create(&object, HandleKind::Transient)?;
    }
    Ok(cache.live_count())
}
