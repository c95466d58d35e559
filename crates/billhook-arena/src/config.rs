//! Region configuration parameters.

/// Configuration for an arena region.
///
/// Controls the total capacity bound and the chunk granularity.
/// All values are immutable after the region is created.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RegionConfig {
    /// Total bytes the region may hand out, fixed at creation.
    ///
    /// Allocation requests whose cumulative requested size would exceed
    /// this bound fail with an overflow error; they are never silently
    /// redirected to the heap.
    pub capacity_bytes: usize,

    /// Size of each backing chunk in bytes.
    ///
    /// Default: 65 536 (64 KiB). The region reserves one chunk up front
    /// and appends further chunks as earlier ones fill; a request
    /// larger than the chunk size gets a dedicated chunk of its own.
    pub chunk_bytes: usize,
}

impl RegionConfig {
    /// Default chunk size: 64 KiB.
    pub const DEFAULT_CHUNK_BYTES: usize = 64 * 1024;

    /// Create a config with the given capacity and the default chunk size.
    pub fn new(capacity_bytes: usize) -> Self {
        Self {
            capacity_bytes,
            chunk_bytes: Self::DEFAULT_CHUNK_BYTES,
        }
    }

    /// Override the chunk size.
    ///
    /// # Panics
    ///
    /// Panics if `chunk_bytes` is zero.
    pub fn with_chunk_bytes(mut self, chunk_bytes: usize) -> Self {
        assert!(chunk_bytes > 0, "chunk size must be non-zero");
        self.chunk_bytes = chunk_bytes;
        self
    }

    /// Upper bound on the number of chunks a fully-used region reserves,
    /// ignoring dedicated oversized chunks.
    pub fn max_chunks(&self) -> usize {
        self.capacity_bytes.div_ceil(self.chunk_bytes.max(1))
    }
}

impl Default for RegionConfig {
    fn default() -> Self {
        Self::new(0)
    }
}
