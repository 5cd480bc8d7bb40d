//! Low-level primitives for raw block memory.
//!
//! The allocator calls live here. Functions whose soundness depends on
//! the caller are `unsafe fn`; callers in `transient` state at each call
//! site why the preconditions hold.

#![allow(unsafe_code)]

use std::alloc::{self, Layout};
use std::ptr::NonNull;

/// Allocate a block for `layout`, zero-filled if `zeroed` is set.
///
/// Returns `None` if the global allocator reports failure. `layout`
/// must have a non-zero size.
pub(crate) fn alloc_block(layout: Layout, zeroed: bool) -> Option<NonNull<u8>> {
    debug_assert!(layout.size() > 0);
    // SAFETY: layout has a non-zero size (callers round zero-byte
    // requests up to one byte).
    let ptr = unsafe {
        if zeroed {
            alloc::alloc_zeroed(layout)
        } else {
            alloc::alloc(layout)
        }
    };
    NonNull::new(ptr)
}

/// Return a block to the global allocator.
///
/// # Safety
///
/// `ptr` must have been returned by [`alloc_block`] with this exact
/// `layout` and must not have been freed already.
pub(crate) unsafe fn free_block(ptr: NonNull<u8>, layout: Layout) {
    // SAFETY: upheld by the caller.
    unsafe { alloc::dealloc(ptr.as_ptr(), layout) }
}

/// Copy `len` bytes from `src` into `dst`.
///
/// # Safety
///
/// Both pointers must be live blocks of at least `len` bytes and the two
/// ranges must not overlap.
pub(crate) unsafe fn copy_block(src: NonNull<u8>, dst: NonNull<u8>, len: usize) {
    // SAFETY: upheld by the caller.
    unsafe { std::ptr::copy_nonoverlapping(src.as_ptr(), dst.as_ptr(), len) }
}

/// View `len` bytes of a live block.
///
/// # Safety
///
/// `ptr` must be a block of at least `len` initialised bytes that stays
/// allocated and unmodified for all of `'a`.
pub(crate) unsafe fn block_bytes<'a>(ptr: NonNull<u8>, len: usize) -> &'a [u8] {
    // SAFETY: upheld by the caller.
    unsafe { std::slice::from_raw_parts(ptr.as_ptr(), len) }
}
