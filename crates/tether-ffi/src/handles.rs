//! Handle-cache entry points.
//!
//! Every call locks the process-wide cache for the duration of one scan or
//! mutation. Runtime callbacks run under that lock.

use tether_core::{HandleKind, NativeHandle, ObjectRef};

use crate::fatal;
use crate::state;
use crate::status::TetherStatus;

#[allow(unsafe_code)]
fn write_handle(out: *mut u64, handle: NativeHandle) {
    // SAFETY: callers check `out` for null; validity is the caller's contract.
    unsafe { *out = handle.0 };
}

/// Return the cached handle for `object`, creating and registering one on
/// a miss.
///
/// `permanent != 0` requests a handle that `tether_handle_release` never
/// drops. An object already cached keeps its existing handle and kind.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn tether_handle_get(object: u64, permanent: u8, handle_out: *mut u64) -> i32 {
    ffi_guard!({
        if handle_out.is_null() {
            return TetherStatus::InvalidArgument as i32;
        }
        let Some(boundary) = state::boundary() else {
            return TetherStatus::NotInitialized as i32;
        };
        let result = ffi_lock!(boundary.cache)
            .lookup_or_create(&ObjectRef(object), HandleKind::from(permanent != 0));
        match result {
            Ok(handle) => {
                write_handle(handle_out, handle);
                TetherStatus::Ok as i32
            }
            Err(e) => fatal::terminate(&e),
        }
    })
}

/// Look up the handle for `object` without creating one.
///
/// Writes 1 to `found_out` and the handle to `handle_out` on a hit,
/// 0 to `found_out` on a miss.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn tether_handle_find(object: u64, handle_out: *mut u64, found_out: *mut u8) -> i32 {
    ffi_guard!({
        if handle_out.is_null() || found_out.is_null() {
            return TetherStatus::InvalidArgument as i32;
        }
        let Some(boundary) = state::boundary() else {
            return TetherStatus::NotInitialized as i32;
        };
        let found = ffi_lock!(boundary.cache).find_existing(&ObjectRef(object));
        if let Some(handle) = found {
            write_handle(handle_out, handle);
        }
        // SAFETY: found_out is non-null and valid per caller contract.
        unsafe { *found_out = u8::from(found.is_some()) };
        TetherStatus::Ok as i32
    })
}

/// Create and register a new handle for `object` unconditionally.
///
/// Prefer `tether_handle_get`, which deduplicates.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn tether_handle_create(object: u64, permanent: u8, handle_out: *mut u64) -> i32 {
    ffi_guard!({
        if handle_out.is_null() {
            return TetherStatus::InvalidArgument as i32;
        }
        let Some(boundary) = state::boundary() else {
            return TetherStatus::NotInitialized as i32;
        };
        let result = ffi_lock!(boundary.cache)
            .create_and_register(&ObjectRef(object), HandleKind::from(permanent != 0));
        match result {
            Ok(handle) => {
                write_handle(handle_out, handle);
                TetherStatus::Ok as i32
            }
            Err(e) => fatal::terminate(&e),
        }
    })
}

/// Drop every non-permanent handle registered for `object`.
///
/// Releasing an object with no handle, or one with only a permanent
/// handle, is a no-op, as is any release during the shutdown phase.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn tether_handle_release(object: u64) -> i32 {
    ffi_guard!({
        let Some(boundary) = state::boundary() else {
            return TetherStatus::NotInitialized as i32;
        };
        ffi_lock!(boundary.cache).release(&ObjectRef(object));
        TetherStatus::Ok as i32
    })
}

/// Pin `object` for the life of the process and write its handle.
///
/// An object that already has a handle keeps it unchanged.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn tether_preserve(object: u64, handle_out: *mut u64) -> i32 {
    ffi_guard!({
        if handle_out.is_null() {
            return TetherStatus::InvalidArgument as i32;
        }
        let Some(boundary) = state::boundary() else {
            return TetherStatus::NotInitialized as i32;
        };
        let result = ffi_lock!(boundary.cache).preserve(&ObjectRef(object));
        match result {
            Ok(handle) => {
                write_handle(handle_out, handle);
                TetherStatus::Ok as i32
            }
            Err(e) => fatal::terminate(&e),
        }
    })
}
