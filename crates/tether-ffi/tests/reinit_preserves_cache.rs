//! A second `tether_init` with different options keeps the cache built by
//! the first one: live handles stay findable and the table is not rebuilt.

use std::sync::OnceLock;

use tether_core::{ManagedRuntime, NativeHandle, ObjectRef};
use tether_ffi::handles::{tether_handle_find, tether_handle_get};
use tether_ffi::init::tether_init;
use tether_ffi::stats::tether_stats;
use tether_ffi::{TetherOptions, TetherRuntimeVTable, TetherStats, TetherStatus};
use tether_test_utils::MockRuntime;

const OK: i32 = TetherStatus::Ok as i32;

fn runtime() -> &'static MockRuntime {
    static RUNTIME: OnceLock<MockRuntime> = OnceLock::new();
    RUNTIME.get_or_init(MockRuntime::new)
}

extern "C" fn create(object: u64) -> u64 {
    runtime().create_handle(&ObjectRef(object)).0
}

extern "C" fn release(handle: u64) {
    runtime().release_handle(NativeHandle(handle))
}

extern "C" fn same(handle: u64, object: u64) -> u8 {
    u8::from(runtime().is_same_object(NativeHandle(handle), &ObjectRef(object)))
}

fn vtable() -> TetherRuntimeVTable {
    TetherRuntimeVTable {
        create_handle: Some(create),
        release_handle: Some(release),
        is_same_object: Some(same),
        on_fatal: None,
    }
}

fn stats() -> TetherStats {
    let mut out = TetherStats::default();
    assert_eq!(tether_stats(&mut out), OK);
    out
}

#[test]
fn second_init_keeps_live_handles_and_capacity() {
    let first = TetherOptions {
        handle_initial_capacity: 8,
        ..TetherOptions::default()
    };
    assert_eq!(tether_init(&vtable(), &first), OK);

    let object = 0x5151;
    let mut handle = 0;
    assert_eq!(tether_handle_get(object, 0, &mut handle), OK);
    let before = stats();
    let created = runtime().created();

    let second = TetherOptions {
        handle_initial_capacity: 64,
        alignment: 64,
        ..TetherOptions::default()
    };
    assert_eq!(tether_init(&vtable(), &second), OK);

    let mut found_handle = 0;
    let mut found = 0u8;
    assert_eq!(tether_handle_find(object, &mut found_handle, &mut found), OK);
    assert_eq!(found, 1);
    assert_eq!(found_handle, handle);

    let after = stats();
    assert_eq!(after.handle_capacity, 8);
    assert_eq!(after.handle_capacity, before.handle_capacity);
    assert_eq!(after.handles_live, before.handles_live);
    assert_eq!(runtime().created(), created);
}
