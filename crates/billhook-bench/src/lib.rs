//! Benchmark profiles for the Billhook allocator.
//!
//! The reference workload reproduces the allocator's motivating
//! micro-benchmark: build a root plus [`CHAIN_LINKS`] chained nodes,
//! drop every external reference, and tear the graph down — once
//! through an arena scope (bulk release), once through the heap
//! (per-object release).

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use billhook::RegionConfig;

/// Links in the reference chain workload (the root makes it 20 001
/// nodes).
pub const CHAIN_LINKS: usize = 20_000;

/// Capacity bound used by the reference workload's scope.
pub const CHAIN_CAPACITY: usize = 1 << 32;

/// Region configuration for the reference chain workload.
pub fn reference_region() -> RegionConfig {
    RegionConfig::new(CHAIN_CAPACITY)
}

/// A small region configuration for carve-throughput measurements:
/// 1 MiB capacity in 64 KiB chunks.
pub fn small_region() -> RegionConfig {
    RegionConfig::new(1 << 20)
}
