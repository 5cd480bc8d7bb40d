//! Process-wide and per-thread boundary state.
//!
//! The handle cache is shared by every native thread and lives behind a
//! mutex. Each native thread gets its own [`Episode`] (depth counter plus
//! transient arena), created on first use and drained when the thread
//! exits.

use std::cell::RefCell;
use std::ffi::c_char;
use std::sync::{Mutex, OnceLock};

use tether_arena::{ArenaConfig, ArenaError, Episode};
use tether_handles::HandleCache;

use crate::runtime::CallbackRuntime;

/// Everything `tether_init` installs.
pub(crate) struct Boundary {
    pub(crate) cache: Mutex<HandleCache<CallbackRuntime>>,
    pub(crate) arena: ArenaConfig,
    pub(crate) on_fatal: Option<extern "C" fn(*const c_char)>,
}

static BOUNDARY: OnceLock<Boundary> = OnceLock::new();

thread_local! {
    /// Foreign-call episode of the current native thread.
    static EPISODE: RefCell<Option<Episode>> = const { RefCell::new(None) };
}

/// The installed boundary, or `None` before `tether_init`.
pub(crate) fn boundary() -> Option<&'static Boundary> {
    BOUNDARY.get()
}

/// Install `boundary` unless one is already present. Returns whether
/// this call installed it.
pub(crate) fn install(boundary: Boundary) -> bool {
    BOUNDARY.set(boundary).is_ok()
}

/// Arena configuration for newly created episodes. Threads that allocate
/// before `tether_init` get the defaults.
fn arena_config() -> ArenaConfig {
    boundary()
        .map(|b| b.arena.clone())
        .unwrap_or_default()
}

/// Run `f` against the calling thread's episode, creating it if needed.
pub(crate) fn with_episode<T>(f: impl FnOnce(&mut Episode) -> T) -> Result<T, ArenaError> {
    EPISODE.with(|cell| {
        let mut slot = cell.borrow_mut();
        let episode = match slot.as_mut() {
            Some(episode) => episode,
            None => slot.insert(Episode::new(&arena_config())?),
        };
        Ok(f(episode))
    })
}
