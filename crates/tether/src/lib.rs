//! Tether: call-boundary glue between a managed runtime and native
//! extension code.
//!
//! This is the top-level facade crate that re-exports the public API of
//! the Tether sub-crates. Native shims written in C use `tether-ffi`
//! instead.
//!
//! # Quick start
//!
//! ```rust
//! use tether::prelude::*;
//! use std::cell::Cell;
//!
//! // A runtime whose handles are just the object token plus a tag.
//! struct Tagged {
//!     released: Cell<u32>,
//! }
//! impl ManagedRuntime for Tagged {
//!     type Object = ObjectRef;
//!     type Handle = NativeHandle;
//!     fn create_handle(&self, object: &ObjectRef) -> NativeHandle {
//!         NativeHandle(object.0 | 1 << 63)
//!     }
//!     fn release_handle(&self, _handle: NativeHandle) {
//!         self.released.set(self.released.get() + 1);
//!     }
//!     fn is_same_object(&self, handle: NativeHandle, object: &ObjectRef) -> bool {
//!         handle.0 & !(1 << 63) == object.0
//!     }
//! }
//!
//! let runtime = Tagged { released: Cell::new(0) };
//! let mut cache = HandleCache::new(&runtime);
//! let mut episode = Episode::new(&ArenaConfig::default()).unwrap();
//!
//! {
//!     let mut call = episode.scope().unwrap();
//!     let scratch = call.arena().zero_allocate(16, 4).unwrap();
//!     assert!(call.arena().owns(scratch));
//!     let h = cache.lookup_or_create(&ObjectRef(7), HandleKind::Transient).unwrap();
//!     assert_eq!(cache.find_existing(&ObjectRef(7)), Some(h));
//! }
//! // The outermost return drained the arena; the handle persists.
//! assert_eq!(episode.arena().live_count(), 0);
//! assert_eq!(cache.live_count(), 1);
//!
//! cache.release(&ObjectRef(7));
//! assert_eq!(runtime.released.get(), 1);
//! ```
//!
//! # Modules
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `tether-core` | Object and handle IDs, `ManagedRuntime`, `FatalError` |
//! | [`arena`] | `tether-arena` | Transient arena, growable table, episodes |
//! | [`handles`] | `tether-handles` | Deduplicating handle cache |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Core IDs, the runtime trait, and the fatal error type (`tether-core`).
pub use tether_core as types;

/// Transient arena, tracking table, and episode tracking (`tether-arena`).
///
/// Memory from [`arena::TransientArena`] lives until the outermost
/// [`arena::Episode`] level exits.
pub use tether_arena as arena;

/// Handle cache (`tether-handles`).
///
/// [`handles::HandleCache`] deduplicates handles per object identity and
/// keeps them across episodes until released.
pub use tether_handles as handles;

/// Common imports for typical Tether usage.
///
/// ```rust
/// use tether::prelude::*;
/// ```
pub mod prelude {
    // Core
    pub use tether_core::{FatalError, HandleKind, ManagedRuntime, NativeHandle, ObjectRef};

    // Arena
    pub use tether_arena::{ArenaConfig, ArenaError, Episode, EpisodeGuard, TransientArena};

    // Handles
    pub use tether_handles::{CacheConfig, CacheError, HandleCache};
}
