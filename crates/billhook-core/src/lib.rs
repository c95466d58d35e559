//! Core types and traits for the Billhook allocator.
//!
//! This is the leaf crate with zero internal dependencies. It defines
//! the fundamental abstractions shared by the rest of the workspace:
//! the [`Allocatable`] capability that makes a type eligible for arena
//! placement, the [`Placement`] tag recording which allocator serviced
//! an instance, and the strongly-typed [`RegionId`].

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod capability;
pub mod id;

pub use capability::{Allocatable, Placement};
pub use id::RegionId;
