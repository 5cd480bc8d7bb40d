//! Test utilities and mock types for Tether development.
//!
//! Provides [`MockRuntime`], an in-process stand-in for a managed
//! runtime. It hands out sequential handles, keeps every live pin in
//! creation order, and lets tests model a moving collector by aliasing
//! a new object token to an existing identity.

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

use std::collections::HashMap;
use std::sync::Mutex;

use indexmap::IndexMap;
use tether_core::{ManagedRuntime, NativeHandle, ObjectRef};

#[derive(Default)]
struct State {
    next_handle: u64,
    /// Live pins in creation order: handle -> object identity.
    live: IndexMap<NativeHandle, u64>,
    /// Token -> identity overrides for "moved" objects.
    aliases: HashMap<ObjectRef, u64>,
    created: u64,
    released: u64,
    /// Releases of handles that were not live.
    bad_releases: u64,
}

impl State {
    fn identity_of(&self, object: &ObjectRef) -> u64 {
        self.aliases.get(object).copied().unwrap_or(object.0)
    }
}

/// Mock implementation of [`ManagedRuntime`].
///
/// Identity is the object token's value unless [`alias`](Self::alias)
/// says otherwise. Handles start at `0x1000` so they are never confused
/// with small object tokens in assertions.
pub struct MockRuntime {
    state: Mutex<State>,
}

impl MockRuntime {
    pub const FIRST_HANDLE: u64 = 0x1000;

    pub fn new() -> Self {
        Self {
            state: Mutex::new(State {
                next_handle: Self::FIRST_HANDLE,
                ..State::default()
            }),
        }
    }

    /// Make `token` denote the same managed object as `target`.
    pub fn alias(&self, token: ObjectRef, target: ObjectRef) {
        let mut state = self.state.lock().unwrap();
        let identity = state.identity_of(&target);
        state.aliases.insert(token, identity);
    }

    /// Handles created so far.
    pub fn created(&self) -> u64 {
        self.state.lock().unwrap().created
    }

    /// Handles released so far.
    pub fn released(&self) -> u64 {
        self.state.lock().unwrap().released
    }

    /// Releases of handles that were not live (double release, or a
    /// handle this runtime never issued).
    pub fn bad_releases(&self) -> u64 {
        self.state.lock().unwrap().bad_releases
    }

    /// Number of live pins.
    pub fn live_count(&self) -> usize {
        self.state.lock().unwrap().live.len()
    }

    /// Whether `handle` is still pinned.
    pub fn is_live(&self, handle: NativeHandle) -> bool {
        self.state.lock().unwrap().live.contains_key(&handle)
    }

    /// Live handles in creation order.
    pub fn live_handles(&self) -> Vec<NativeHandle> {
        self.state.lock().unwrap().live.keys().copied().collect()
    }
}

impl Default for MockRuntime {
    fn default() -> Self {
        Self::new()
    }
}

impl ManagedRuntime for MockRuntime {
    type Object = ObjectRef;
    type Handle = NativeHandle;

    fn create_handle(&self, object: &ObjectRef) -> NativeHandle {
        let mut state = self.state.lock().unwrap();
        let handle = NativeHandle(state.next_handle);
        state.next_handle += 1;
        let identity = state.identity_of(object);
        state.live.insert(handle, identity);
        state.created += 1;
        handle
    }

    fn release_handle(&self, handle: NativeHandle) {
        let mut state = self.state.lock().unwrap();
        if state.live.shift_remove(&handle).is_some() {
            state.released += 1;
        } else {
            state.bad_releases += 1;
        }
    }

    fn is_same_object(&self, handle: NativeHandle, object: &ObjectRef) -> bool {
        let state = self.state.lock().unwrap();
        let identity = state.identity_of(object);
        state.live.get(&handle) == Some(&identity)
    }
}
