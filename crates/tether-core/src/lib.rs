//! Core types and traits for the Tether native/managed boundary.
//!
//! This is the leaf crate with zero internal dependencies. It defines
//! the vocabulary shared by the transient arena, the handle cache and
//! the C ABI layer: opaque object and handle identifiers, the
//! [`ManagedRuntime`] capability the handle cache is parameterised
//! over, and the [`FatalError`] taxonomy for the one unrecoverable
//! failure class (allocation failure mid native call).

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod error;
pub mod id;
pub mod traits;

pub use error::{FatalError, TableKind};
pub use id::{HandleKind, NativeHandle, ObjectRef};
pub use traits::ManagedRuntime;
