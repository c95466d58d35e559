//! Scoped, capacity-bounded arena regions with bulk release.
//!
//! A [`Region`] owns a list of raw memory chunks and bump-carves
//! aligned slots from them, up to a capacity fixed at creation. When
//! the region closes, every chunk is released in one bulk operation —
//! no object graph is walked, no per-object teardown runs. That turns
//! teardown of a deeply-chained object graph from O(objects) into
//! O(chunks).
//!
//! # Architecture
//!
//! ```text
//! scope (per-thread LIFO stack, created lazily per thread)
//! └── Region (fixed capacity, open flag)
//!     ├── ChunkList → Chunk[] (raw bump-carved byte chunks)
//!     └── RegionCtl (Rc-shared: closed flag + live-object accounting)
//! ```
//!
//! The innermost open scope is the active allocation target for
//! capability-bearing types; see [`scope`]. [`RegionCtl`] is the part
//! of a region that outlives bulk release: handles into the region keep
//! it alive and consult its closed flag so that access after close is
//! detected deterministically instead of reading reclaimed memory.
//!
//! This crate is one of two that contain `unsafe` code (along with
//! `billhook-rc`), bounded to `chunk.rs` where chunk memory is
//! reserved, carved, and released.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

mod chunk;
pub mod config;
pub mod error;
pub mod region;
pub mod scope;

pub use config::RegionConfig;
pub use error::{RegionError, ScopeError};
pub use region::{Region, RegionCtl, SharedRegionCtl};
pub use scope::{Scope, ScopeHandle};
