//! Call-scoped transient allocation for native extension code.
//!
//! Native code running inside a foreign call asks for C-style scratch
//! memory and never frees it; the memory lives until the outermost
//! foreign call of the episode returns, at which point the arena is
//! drained. This crate is one of two that may contain `unsafe` code
//! (along with `tether-ffi`), and all of it lives in `raw.rs`.
//!
//! # Architecture
//!
//! ```text
//! Episode (depth counter, drains at outermost exit)
//! └── TransientArena
//!     └── GrowableTable<Block> (doubling tracking table, reused across drains)
//!         └── Block → raw allocation from the global allocator
//! ```
//!
//! The tracking table is the only thing that is ever reallocated on
//! growth. Blocks themselves never move, so pointers handed to native
//! code stay valid until the drain.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(unsafe_code)]

pub mod config;
pub mod episode;
pub mod error;
mod raw;
pub mod table;
pub mod transient;

pub use config::ArenaConfig;
pub use episode::{Episode, EpisodeGuard};
pub use error::ArenaError;
pub use table::GrowableTable;
pub use transient::{ArenaStats, TransientArena};
