//! Billhook: a dual-mode allocator for reference-counted object graphs.
//!
//! Objects normally live on the general-purpose heap with individual,
//! reference-count-driven teardown. Opening a bounded arena scope
//! redirects construction of opted-in types into a pre-reserved region;
//! when the scope closes, the region's chunks are released in one bulk
//! operation — no matter how many objects were built or how deeply they
//! reference each other. That makes tearing down long chains and deep
//! trees cheap and bounded.
//!
//! This is the top-level facade crate that re-exports the public API
//! from the Billhook sub-crates. For most users, adding `billhook` as a
//! single dependency is sufficient.
//!
//! # Quick start
//!
//! ```rust
//! use billhook::prelude::*;
//!
//! // Opt a type into arena placement; the layout is declared once,
//! // at definition time.
//! struct Node {
//!     next: Option<Strong<Node>>,
//! }
//! impl Allocatable for Node {}
//!
//! // Open a scope: eligible constructions are carved from its region.
//! let scope = Scope::enter(64 * 1024);
//! let leaf = Strong::new(Node { next: None })?;
//! let root = Strong::new(Node { next: Some(leaf) })?;
//! assert_eq!(root.placement(), Placement::Arena);
//!
//! // Dropping the last handle releases payloads; closing the scope
//! // releases the backing chunks in bulk.
//! drop(root);
//! scope.close()?;
//!
//! // With no scope open, the same construction goes to the heap.
//! let heap_node = Strong::new(Node { next: None })?;
//! assert_eq!(heap_node.placement(), Placement::Heap);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Modules
//!
//! Each module corresponds to a sub-crate. Use them for types not in
//! the prelude:
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`arena`] | `billhook-arena` | Regions, chunks, scope stack, errors |
//! | [`rc`] | `billhook-rc` | The [`Strong`] handle and teardown runtime |
//! | [`types`] | `billhook-core` | The capability trait, placement tag, IDs |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Regions, chunk bookkeeping, and the per-thread scope stack
/// (`billhook-arena`).
pub use billhook_arena as arena;

/// Core types and the allocation capability (`billhook-core`).
pub use billhook_core as types;

/// The dual-mode reference-counted handle (`billhook-rc`).
pub use billhook_rc as rc;

pub use billhook_arena::{Region, RegionConfig, RegionError, Scope, ScopeError, ScopeHandle};
pub use billhook_core::{Allocatable, Placement, RegionId};
pub use billhook_rc::Strong;

/// The most commonly used items in one import.
pub mod prelude {
    pub use billhook_arena::scope::{enter, exit, Scope, ScopeHandle};
    pub use billhook_arena::{RegionConfig, RegionError, ScopeError};
    pub use billhook_core::{Allocatable, Placement, RegionId};
    pub use billhook_rc::Strong;
}
