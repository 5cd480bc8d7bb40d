//! Runtime registration and the shutdown phase.

use std::sync::Mutex;

use tether_handles::HandleCache;

use crate::options::TetherOptions;
use crate::runtime::{CallbackRuntime, TetherRuntimeVTable};
use crate::state::{self, Boundary};
use crate::status::TetherStatus;

/// Register the managed runtime and create the handle cache.
///
/// `options` may be null to select defaults. Idempotent: once a runtime
/// is installed, later calls return `TETHER_STATUS_OK` without touching the
/// populated cache or the options in force.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn tether_init(
    vtable: *const TetherRuntimeVTable,
    options: *const TetherOptions,
) -> i32 {
    ffi_guard!({
        if vtable.is_null() {
            return TetherStatus::InvalidArgument as i32;
        }
        // SAFETY: vtable is non-null and valid per caller contract.
        let vtable = unsafe { *vtable };
        let runtime = match CallbackRuntime::from_vtable(&vtable) {
            Some(rt) => rt,
            None => return TetherStatus::InvalidArgument as i32,
        };
        if state::boundary().is_some() {
            tracing::debug!("runtime already registered");
            return TetherStatus::Ok as i32;
        }

        let options = if options.is_null() {
            TetherOptions::default()
        } else {
            // SAFETY: options is non-null and valid per caller contract.
            unsafe { *options }
        };
        let arena = options.arena_config();
        if let Err(e) = arena.validate() {
            tracing::warn!(error = %e, "rejected arena options");
            return TetherStatus::from(&e) as i32;
        }
        let cache = match HandleCache::with_config(runtime, &options.cache_config()) {
            Ok(c) => c,
            Err(e) => {
                tracing::warn!(error = %e, "rejected handle cache options");
                return TetherStatus::from(&e) as i32;
            }
        };

        let installed = state::install(Boundary {
            cache: Mutex::new(cache),
            arena,
            on_fatal: vtable.on_fatal,
        });
        if installed {
            tracing::info!(
                max_call_depth = options.arena_config().max_depth,
                alignment = options.arena_config().alignment,
                "managed runtime registered"
            );
        }
        TetherStatus::Ok as i32
    })
}

/// Enter (`flag != 0`) or leave the shutdown phase.
///
/// While shutting down, `tether_handle_release` is a no-op: the runtime
/// may already have torn down the objects it would unpin.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn tether_set_shutdown(flag: u8) -> i32 {
    ffi_guard!({
        let Some(boundary) = state::boundary() else {
            return TetherStatus::NotInitialized as i32;
        };
        ffi_lock!(boundary.cache).set_shutdown(flag != 0);
        TetherStatus::Ok as i32
    })
}
