//! Managed-runtime callbacks supplied by the embedder.

use std::ffi::c_char;

use tether_core::{ManagedRuntime, NativeHandle, ObjectRef};

/// Callback table through which the cache reaches the managed runtime.
///
/// `create_handle`, `release_handle` and `is_same_object` are required;
/// `on_fatal` may be null. Callbacks are invoked while the cache lock is
/// held and must not call back into any `tether_handle_*` function.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default)]
pub struct TetherRuntimeVTable {
    /// Pin `object` and return a native handle for it.
    pub create_handle: Option<extern "C" fn(object: u64) -> u64>,
    /// Drop the pin behind `handle`.
    pub release_handle: Option<extern "C" fn(handle: u64)>,
    /// Nonzero when `handle` denotes the same managed object as `object`.
    pub is_same_object: Option<extern "C" fn(handle: u64, object: u64) -> u8>,
    /// Called with a NUL-terminated diagnostic just before the process
    /// aborts on an unrecoverable failure.
    pub on_fatal: Option<extern "C" fn(message: *const c_char)>,
}

/// [`ManagedRuntime`] backed by a validated [`TetherRuntimeVTable`].
#[derive(Clone, Copy, Debug)]
pub(crate) struct CallbackRuntime {
    create: extern "C" fn(u64) -> u64,
    release: extern "C" fn(u64),
    same: extern "C" fn(u64, u64) -> u8,
}

impl CallbackRuntime {
    /// `None` if any required callback is missing.
    pub(crate) fn from_vtable(vtable: &TetherRuntimeVTable) -> Option<Self> {
        Some(Self {
            create: vtable.create_handle?,
            release: vtable.release_handle?,
            same: vtable.is_same_object?,
        })
    }
}

impl ManagedRuntime for CallbackRuntime {
    type Object = ObjectRef;
    type Handle = NativeHandle;

    fn create_handle(&self, object: &ObjectRef) -> NativeHandle {
        NativeHandle((self.create)(object.0))
    }

    fn release_handle(&self, handle: NativeHandle) {
        (self.release)(handle.0)
    }

    fn is_same_object(&self, handle: NativeHandle, object: &ObjectRef) -> bool {
        (self.same)(handle.0, object.0) != 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    extern "C" fn create(object: u64) -> u64 {
        object | 0x8000
    }

    extern "C" fn release(_handle: u64) {}

    extern "C" fn same(handle: u64, object: u64) -> u8 {
        u8::from(handle & !0x8000 == object)
    }

    #[test]
    fn missing_required_callback_is_rejected() {
        let vtable = TetherRuntimeVTable {
            create_handle: Some(create),
            release_handle: None,
            is_same_object: Some(same),
            on_fatal: None,
        };
        assert!(CallbackRuntime::from_vtable(&vtable).is_none());
        assert!(CallbackRuntime::from_vtable(&TetherRuntimeVTable::default()).is_none());
    }

    #[test]
    fn callbacks_are_forwarded() {
        let vtable = TetherRuntimeVTable {
            create_handle: Some(create),
            release_handle: Some(release),
            is_same_object: Some(same),
            on_fatal: None,
        };
        let rt = CallbackRuntime::from_vtable(&vtable).unwrap();
        let h = rt.create_handle(&ObjectRef(3));
        assert_eq!(h, NativeHandle(0x8003));
        assert!(rt.is_same_object(h, &ObjectRef(3)));
        assert!(!rt.is_same_object(h, &ObjectRef(4)));
        rt.release_handle(h);
    }
}
