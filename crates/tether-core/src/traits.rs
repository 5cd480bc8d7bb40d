//! The managed-runtime capability consumed by the handle cache.

/// Up-call primitives supplied by the managed runtime.
///
/// The handle cache never assumes that equal object tokens mean equal
/// objects, nor that distinct tokens mean distinct objects: a moving
/// collector or a boxed/unboxed pair can make either assumption false.
/// Identity is always decided by [`is_same_object`](Self::is_same_object).
pub trait ManagedRuntime {
    /// The runtime's token for an object crossing into native code.
    type Object;

    /// The native handle the runtime creates for an object. Handles are
    /// compared by value on the native side, so they must be `Eq`.
    type Handle: Copy + Eq + std::fmt::Debug;

    /// Create a new cross-runtime reference (a pin) for `object`.
    ///
    /// Every call creates a fresh resource; deduplication is the cache's
    /// job, not the runtime's.
    fn create_handle(&self, object: &Self::Object) -> Self::Handle;

    /// Release a reference previously returned by
    /// [`create_handle`](Self::create_handle).
    fn release_handle(&self, handle: Self::Handle);

    /// Whether `handle` refers to the same managed object as `object`.
    fn is_same_object(&self, handle: Self::Handle, object: &Self::Object) -> bool;
}

impl<R: ManagedRuntime + ?Sized> ManagedRuntime for &R {
    type Object = R::Object;
    type Handle = R::Handle;

    fn create_handle(&self, object: &Self::Object) -> Self::Handle {
        (**self).create_handle(object)
    }

    fn release_handle(&self, handle: Self::Handle) {
        (**self).release_handle(handle)
    }

    fn is_same_object(&self, handle: Self::Handle, object: &Self::Object) -> bool {
        (**self).is_same_object(handle, object)
    }
}
