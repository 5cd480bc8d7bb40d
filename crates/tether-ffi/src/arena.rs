//! Foreign-call episodes and transient allocation.
//!
//! All functions act on the calling thread's episode. Allocation never
//! returns null: failure terminates the process, since the native caller
//! has no error channel.

use std::ffi::c_void;
use std::panic::{self, AssertUnwindSafe};
use std::ptr::{self, NonNull};

use tether_arena::{ArenaError, Episode, TransientArena};

use crate::fatal;
use crate::state;
use crate::status::TetherStatus;

/// Map a recoverable error to its status; terminate on a fatal one.
fn settle(e: &ArenaError) -> i32 {
    if let Some(err) = e.as_fatal() {
        fatal::terminate(err);
    }
    TetherStatus::from(e) as i32
}

/// Mark entry into a foreign call on this thread.
///
/// Nesting deeper than the configured maximum returns
/// `TETHER_STATUS_EPISODE_OVERFLOW` and leaves the depth unchanged.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn tether_call_enter() -> i32 {
    ffi_guard!({
        match state::with_episode(Episode::enter).and_then(|r| r) {
            Ok(_) => TetherStatus::Ok as i32,
            Err(e) => settle(&e),
        }
    })
}

/// Mark return from a foreign call on this thread.
///
/// Leaving the outermost call frees every transient block the thread
/// allocated. Returns `TETHER_STATUS_EPISODE_UNDERFLOW` without a matching
/// enter.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn tether_call_exit() -> i32 {
    ffi_guard!({
        match state::with_episode(Episode::exit).and_then(|r| r) {
            Ok(_) => TetherStatus::Ok as i32,
            Err(e) => settle(&e),
        }
    })
}

/// Run an allocating operation against this thread's arena.
fn transient_block(
    op: impl FnOnce(&mut TransientArena) -> Result<NonNull<u8>, ArenaError>,
) -> *mut c_void {
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
        state::with_episode(|episode| op(episode.arena_mut())).and_then(|r| r)
    }));
    match outcome {
        Ok(Ok(block)) => block.as_ptr().cast(),
        Ok(Err(ArenaError::Fatal(err))) => fatal::terminate(&err),
        Ok(Err(ArenaError::UnknownBlock { addr })) => {
            tracing::warn!(addr, "realloc of a block the arena does not own");
            ptr::null_mut()
        }
        Ok(Err(other)) => fatal::abort_with(&format!("tether: transient allocation: {other}")),
        Err(_) => {
            tracing::error!("panic caught during transient allocation");
            fatal::abort_with("tether: panic during transient allocation")
        }
    }
}

/// Allocate `count * size` bytes of uninitialised transient memory.
///
/// The block is freed when the thread's outermost foreign call returns.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn tether_alloc(count: usize, size: usize) -> *mut c_void {
    transient_block(|arena| Ok(arena.allocate(count, size)?))
}

/// Allocate `count * size` bytes of zero-filled transient memory.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn tether_zalloc(count: usize, size: usize) -> *mut c_void {
    transient_block(|arena| Ok(arena.zero_allocate(count, size)?))
}

/// Grow a transient block from `old_count` to `new_count` elements.
///
/// Returns `block` itself when not growing. Otherwise returns a new
/// zero-filled block holding a copy of the old contents. A null `block`
/// behaves like `tether_zalloc(new_count, size)`. Returns null, without
/// terminating, if `block` was not handed out by this thread's arena.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn tether_realloc(
    block: *mut c_void,
    old_count: usize,
    new_count: usize,
    size: usize,
) -> *mut c_void {
    match NonNull::new(block.cast::<u8>()) {
        Some(block) => transient_block(|arena| arena.reallocate(block, old_count, new_count, size)),
        None => tether_zalloc(new_count, size),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outermost_exit_frees_blocks() {
        assert_eq!(tether_call_enter(), TetherStatus::Ok as i32);
        let a = tether_alloc(4, 8);
        let b = tether_zalloc(2, 2);
        assert!(!a.is_null() && !b.is_null());
        let live = state::with_episode(|ep| ep.arena().live_count()).unwrap();
        assert_eq!(live, 2);
        assert_eq!(tether_call_exit(), TetherStatus::Ok as i32);
        let live = state::with_episode(|ep| ep.arena().live_count()).unwrap();
        assert_eq!(live, 0);
    }

    #[test]
    fn nesting_past_the_limit_is_an_error() {
        let limit = tether_arena::ArenaConfig::DEFAULT_MAX_DEPTH;
        for _ in 0..limit {
            assert_eq!(tether_call_enter(), TetherStatus::Ok as i32);
        }
        tether_alloc(8, 1);
        assert_eq!(tether_call_enter(), TetherStatus::EpisodeOverflow as i32);
        assert_eq!(state::with_episode(|ep| ep.depth()).unwrap(), limit);
        for _ in 0..limit {
            assert_eq!(tether_call_exit(), TetherStatus::Ok as i32);
        }
        let live = state::with_episode(|ep| ep.arena().live_count()).unwrap();
        assert_eq!(live, 0);
    }

    #[test]
    fn exit_without_enter_is_reported() {
        assert_eq!(tether_call_exit(), TetherStatus::EpisodeUnderflow as i32);
    }

    #[test]
    fn realloc_of_foreign_pointer_is_null() {
        let mut local = 0u64;
        let foreign = (&mut local as *mut u64).cast::<c_void>();
        assert!(tether_realloc(foreign, 1, 2, 8).is_null());
    }

    #[test]
    fn realloc_of_null_allocates_zeroed() {
        tether_call_enter();
        let p = tether_realloc(ptr::null_mut(), 0, 3, 1);
        assert!(!p.is_null());
        let zeroed = state::with_episode(|ep| {
            let block = NonNull::new(p.cast::<u8>()).unwrap();
            ep.arena().contents(block).map(<[u8]>::to_vec)
        })
        .unwrap();
        assert_eq!(zeroed, Some(vec![0, 0, 0]));
        tether_call_exit();
    }
}
