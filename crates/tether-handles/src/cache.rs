//! The handle cache proper.

use smallvec::SmallVec;
use tether_arena::GrowableTable;
use tether_core::{FatalError, HandleKind, ManagedRuntime, TableKind};

use crate::config::CacheConfig;
use crate::error::CacheError;

/// One live cache slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HandleRecord<H> {
    /// The runtime-created handle native code holds copies of.
    pub handle: H,
    /// Whether the normal release path may free it.
    pub kind: HandleKind,
}

/// Point-in-time counters for a [`HandleCache`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Live records, permanent ones included.
    pub live: usize,
    /// Live permanent records.
    pub permanent: usize,
    /// `lookup_or_create` calls answered from the cache.
    pub hits: u64,
    /// `lookup_or_create` calls that created a handle.
    pub misses: u64,
    /// Handles released back to the runtime.
    pub releases: u64,
    /// Current capacity of the record table.
    pub capacity: usize,
}

/// Managed-object identity to native handle cache.
///
/// The cache owns the runtime resource behind each handle and is the
/// only party that releases it. Released slots become tombstones and
/// are skipped by later scans; they are never compacted.
pub struct HandleCache<R: ManagedRuntime> {
    runtime: R,
    table: GrowableTable<HandleRecord<R::Handle>>,
    shutdown: bool,
    hits: u64,
    misses: u64,
    releases: u64,
}

impl<R: ManagedRuntime> HandleCache<R> {
    /// Create an empty cache over `runtime`.
    pub fn new(runtime: R) -> Self {
        Self {
            runtime,
            table: GrowableTable::new(TableKind::Handles),
            shutdown: false,
            hits: 0,
            misses: 0,
            releases: 0,
        }
    }

    /// Create a cache from a validated configuration.
    pub fn with_config(runtime: R, config: &CacheConfig) -> Result<Self, CacheError> {
        config.validate()?;
        let mut cache = Self::new(runtime);
        cache.table = GrowableTable::with_capacity(TableKind::Handles, config.initial_capacity)?;
        Ok(cache)
    }

    /// The handle already issued for `object`, if any.
    ///
    /// Scans live records in insertion order and returns the first whose
    /// handle the runtime reports as the same object. A miss is ordinary
    /// control flow, not an error.
    pub fn find_existing(&self, object: &R::Object) -> Option<R::Handle> {
        self.find_record(object).map(|r| r.handle)
    }

    fn find_record(&self, object: &R::Object) -> Option<&HandleRecord<R::Handle>> {
        self.table
            .iter()
            .map(|(_, r)| r)
            .find(|r| self.runtime.is_same_object(r.handle, object))
    }

    /// Lifetime class of the handle issued for `object`, if any.
    pub fn kind_of(&self, object: &R::Object) -> Option<HandleKind> {
        self.find_record(object).map(|r| r.kind)
    }

    /// Create a new handle for `object` and register it, without
    /// checking for an existing one.
    ///
    /// Use [`lookup_or_create`](Self::lookup_or_create) when
    /// deduplication is wanted.
    pub fn create_and_register(
        &mut self,
        object: &R::Object,
        kind: HandleKind,
    ) -> Result<R::Handle, FatalError> {
        let handle = self.runtime.create_handle(object);
        let record = HandleRecord { handle, kind };
        match self.table.push(record) {
            Ok(slot) => {
                tracing::trace!(slot, ?handle, %kind, "handle registered");
                Ok(handle)
            }
            Err(e) => {
                self.runtime.release_handle(handle);
                Err(e)
            }
        }
    }

    /// The handle for `object`, creating one on first sight.
    ///
    /// Two calls for the same object identity return the same handle
    /// until it is released. A hit returns the existing handle unchanged,
    /// whatever `kind` the caller asks for.
    pub fn lookup_or_create(
        &mut self,
        object: &R::Object,
        kind: HandleKind,
    ) -> Result<R::Handle, FatalError> {
        if let Some(record) = self.find_record(object) {
            if kind.is_permanent() && !record.kind.is_permanent() {
                tracing::debug!(handle = ?record.handle, "permanent request hit a transient handle");
            }
            let handle = record.handle;
            self.hits += 1;
            return Ok(handle);
        }
        self.misses += 1;
        self.create_and_register(object, kind)
    }

    /// Pin `object` for the rest of the process.
    pub fn preserve(&mut self, object: &R::Object) -> Result<R::Handle, FatalError> {
        self.lookup_or_create(object, HandleKind::Permanent)
    }

    /// Release every transient handle for `object`.
    ///
    /// Permanent handles are untouched. No match, or only permanent
    /// matches, is a no-op. In shutdown mode nothing is released, because
    /// the runtime must not be re-entered while it tears down. Returns
    /// the handles that were released.
    pub fn release(&mut self, object: &R::Object) -> SmallVec<[R::Handle; 1]> {
        let mut released = SmallVec::new();
        if self.shutdown {
            tracing::debug!("release ignored during shutdown");
            return released;
        }
        let slots: SmallVec<[usize; 2]> = self
            .table
            .iter()
            .filter(|(_, r)| !r.kind.is_permanent() && self.runtime.is_same_object(r.handle, object))
            .map(|(i, _)| i)
            .collect();
        for slot in slots {
            if let Some(record) = self.table.take(slot) {
                self.runtime.release_handle(record.handle);
                tracing::trace!(slot, handle = ?record.handle, "handle released");
                released.push(record.handle);
            }
        }
        self.releases += released.len() as u64;
        released
    }

    /// Enter or leave shutdown mode.
    pub fn set_shutdown(&mut self, shutdown: bool) {
        if shutdown != self.shutdown {
            tracing::debug!(shutdown, "handle cache shutdown phase changed");
        }
        self.shutdown = shutdown;
    }

    /// Whether the cache is in shutdown mode.
    pub fn is_shutdown(&self) -> bool {
        self.shutdown
    }

    /// Number of live handles.
    pub fn live_count(&self) -> usize {
        self.table.live_count()
    }

    /// Current capacity of the record table.
    pub fn capacity(&self) -> usize {
        self.table.capacity()
    }

    /// Live records in insertion order.
    pub fn records(&self) -> impl Iterator<Item = &HandleRecord<R::Handle>> {
        self.table.iter().map(|(_, r)| r)
    }

    /// The runtime this cache up-calls into.
    pub fn runtime(&self) -> &R {
        &self.runtime
    }

    /// Snapshot of the cache's counters.
    pub fn stats(&self) -> CacheStats {
        let mut live = 0;
        let mut permanent = 0;
        for record in self.records() {
            live += 1;
            if record.kind.is_permanent() {
                permanent += 1;
            }
        }
        CacheStats {
            live,
            permanent,
            hits: self.hits,
            misses: self.misses,
            releases: self.releases,
            capacity: self.capacity(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tether_core::{NativeHandle, ObjectRef};
    use tether_test_utils::MockRuntime;

    const A: ObjectRef = ObjectRef(0xA);
    const B: ObjectRef = ObjectRef(0xB);

    fn cache(rt: &MockRuntime) -> HandleCache<&MockRuntime> {
        HandleCache::new(rt)
    }

    #[test]
    fn lookup_twice_returns_same_handle() {
        let rt = MockRuntime::new();
        let mut c = cache(&rt);
        let h1 = c.lookup_or_create(&A, HandleKind::Transient).unwrap();
        let h2 = c.lookup_or_create(&A, HandleKind::Transient).unwrap();
        assert_eq!(h1, h2);
        assert_eq!(rt.created(), 1);
        assert_eq!(c.stats().hits, 1);
        assert_eq!(c.stats().misses, 1);
    }

    #[test]
    fn find_existing_misses_on_empty_cache() {
        let rt = MockRuntime::new();
        let c = cache(&rt);
        assert_eq!(c.find_existing(&A), None);
    }

    #[test]
    fn release_then_lookup_creates_new_handle() {
        let rt = MockRuntime::new();
        let mut c = cache(&rt);
        let h1 = c.lookup_or_create(&A, HandleKind::Transient).unwrap();
        assert_eq!(c.release(&A).as_slice(), &[h1]);
        assert_eq!(c.find_existing(&A), None);
        let h2 = c.lookup_or_create(&A, HandleKind::Transient).unwrap();
        assert_ne!(h1, h2);
        assert_eq!(rt.released(), 1);
    }

    #[test]
    fn permanent_handle_survives_release() {
        let rt = MockRuntime::new();
        let mut c = cache(&rt);
        let h = c.lookup_or_create(&B, HandleKind::Permanent).unwrap();
        assert!(c.release(&B).is_empty());
        assert!(c.release(&B).is_empty());
        assert_eq!(c.find_existing(&B), Some(h));
        assert_eq!(rt.released(), 0);
    }

    #[test]
    fn release_of_unknown_object_is_noop() {
        let rt = MockRuntime::new();
        let mut c = cache(&rt);
        c.lookup_or_create(&A, HandleKind::Transient).unwrap();
        assert!(c.release(&B).is_empty());
        assert_eq!(c.live_count(), 1);
    }

    #[test]
    fn create_and_register_does_not_dedup() {
        let rt = MockRuntime::new();
        let mut c = cache(&rt);
        let h1 = c.create_and_register(&A, HandleKind::Transient).unwrap();
        let h2 = c.create_and_register(&A, HandleKind::Transient).unwrap();
        assert_ne!(h1, h2);
        // find_existing returns the first match.
        assert_eq!(c.find_existing(&A), Some(h1));
        // release clears every transient match.
        assert_eq!(c.release(&A).len(), 2);
        assert_eq!(c.live_count(), 0);
    }

    #[test]
    fn release_skips_permanent_but_clears_transient_duplicate() {
        let rt = MockRuntime::new();
        let mut c = cache(&rt);
        let keep = c.create_and_register(&A, HandleKind::Permanent).unwrap();
        let drop = c.create_and_register(&A, HandleKind::Transient).unwrap();
        assert_eq!(c.release(&A).as_slice(), &[drop]);
        assert_eq!(c.find_existing(&A), Some(keep));
    }

    #[test]
    fn permanent_request_on_transient_hit_keeps_existing() {
        let rt = MockRuntime::new();
        let mut c = cache(&rt);
        let h = c.lookup_or_create(&A, HandleKind::Transient).unwrap();
        assert_eq!(c.preserve(&A).unwrap(), h);
        assert_eq!(c.kind_of(&A), Some(HandleKind::Transient));
    }

    #[test]
    fn identity_follows_runtime_not_token() {
        let rt = MockRuntime::new();
        // A moved object: a new token for the same managed identity.
        let moved = ObjectRef(0xA0A);
        rt.alias(moved, A);
        let mut c = cache(&rt);
        let h1 = c.lookup_or_create(&A, HandleKind::Transient).unwrap();
        let h2 = c.lookup_or_create(&moved, HandleKind::Transient).unwrap();
        assert_eq!(h1, h2);
        assert_eq!(c.release(&moved).as_slice(), &[h1]);
        assert_eq!(c.find_existing(&A), None);
    }

    #[test]
    fn shutdown_suppresses_release() {
        let rt = MockRuntime::new();
        let mut c = cache(&rt);
        let h = c.lookup_or_create(&A, HandleKind::Transient).unwrap();
        c.set_shutdown(true);
        assert!(c.is_shutdown());
        assert!(c.release(&A).is_empty());
        assert_eq!(c.find_existing(&A), Some(h));
        assert_eq!(rt.released(), 0);
    }

    #[test]
    fn handles_survive_table_growth() {
        let rt = MockRuntime::new();
        let mut c = cache(&rt);
        let mut issued: Vec<(ObjectRef, NativeHandle)> = Vec::new();
        for i in 0..5u64 {
            let obj = ObjectRef(i);
            issued.push((obj, c.lookup_or_create(&obj, HandleKind::Transient).unwrap()));
        }
        assert_eq!(c.capacity(), 8);
        for (obj, h) in issued {
            assert_eq!(c.find_existing(&obj), Some(h));
        }
    }

    #[test]
    fn stats_count_permanent_and_live() {
        let rt = MockRuntime::new();
        let mut c = cache(&rt);
        c.lookup_or_create(&A, HandleKind::Transient).unwrap();
        c.preserve(&B).unwrap();
        c.release(&A);
        let stats = c.stats();
        assert_eq!(stats.live, 1);
        assert_eq!(stats.permanent, 1);
        assert_eq!(stats.releases, 1);
        assert_eq!(stats.misses, 2);
    }

    #[test]
    fn with_config_preallocates() {
        let rt = MockRuntime::new();
        let c = HandleCache::with_config(
            &rt,
            &CacheConfig {
                initial_capacity: 32,
            },
        )
        .unwrap();
        assert_eq!(c.capacity(), 32);
        assert!(HandleCache::with_config(
            &rt,
            &CacheConfig {
                initial_capacity: 5
            }
        )
        .is_err());
    }

    #[cfg(not(miri))]
    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn at_most_one_live_handle_per_identity(
                ops in proptest::collection::vec((0u64..8, any::<bool>(), any::<bool>()), 1..64),
            ) {
                let rt = MockRuntime::new();
                let mut c = cache(&rt);
                for (id, permanent, release) in ops {
                    let obj = ObjectRef(id);
                    if release {
                        c.release(&obj);
                    } else {
                        c.lookup_or_create(&obj, HandleKind::from(permanent)).unwrap();
                    }
                }
                for id in 0u64..8 {
                    let obj = ObjectRef(id);
                    let matches = c
                        .records()
                        .filter(|r| rt.is_same_object(r.handle, &obj))
                        .count();
                    prop_assert!(matches <= 1);
                }
                prop_assert_eq!(c.live_count(), rt.live_count());
            }
        }
    }
}
