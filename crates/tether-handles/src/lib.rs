//! Deduplicating handle cache for managed objects crossing into native code.
//!
//! Every managed object handed to native code passes through
//! [`HandleCache::lookup_or_create`], which guarantees at most one live
//! native handle per object identity. Native code compares handles by
//! value, so a second handle for the same object would silently break
//! its "have I seen this before" checks.
//!
//! The cache is a linear-scan table (no secondary index): live handle
//! counts are small, and identity comparison is an up-call whose
//! semantics belong to the managed runtime, not to a hash function.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod cache;
pub mod config;
pub mod error;

pub use cache::{CacheStats, HandleCache, HandleRecord};
pub use config::CacheConfig;
pub use error::CacheError;
