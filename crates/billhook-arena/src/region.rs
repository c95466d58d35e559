//! The region manager: capacity-bounded carving and bulk release.
//!
//! A [`Region`] owns the backing chunks for one arena scope. Carving is
//! bump allocation against a capacity fixed at creation; close releases
//! every chunk at once. The [`RegionCtl`] control block is `Rc`-shared
//! with every handle allocated from the region — it is the only part of
//! a region that survives bulk release, so a stale handle can be
//! detected without touching reclaimed memory.

use std::alloc::Layout;
use std::cell::{Cell, RefCell};
use std::ptr::NonNull;
use std::rc::Rc;

use indexmap::IndexMap;

use billhook_core::RegionId;

use crate::chunk::ChunkList;
use crate::config::RegionConfig;
use crate::error::RegionError;

/// Shared handle to a region's control block.
///
/// Held by the region itself and by every handle allocated from it.
pub type SharedRegionCtl = Rc<RegionCtl>;

/// The part of a region that outlives its chunks.
///
/// Carries the closed flag consulted on every handle access, plus
/// live-object accounting per payload type (insertion-ordered, so the
/// close-time diagnostics report types in allocation order).
pub struct RegionCtl {
    id: RegionId,
    closed: Cell<bool>,
    live: Cell<usize>,
    live_by_type: RefCell<IndexMap<&'static str, usize>>,
}

impl RegionCtl {
    fn new(id: RegionId) -> Self {
        Self {
            id,
            closed: Cell::new(false),
            live: Cell::new(0),
            live_by_type: RefCell::new(IndexMap::new()),
        }
    }

    /// The owning region's ID.
    pub fn id(&self) -> RegionId {
        self.id
    }

    /// Whether the region has been closed and its chunks released.
    pub fn is_closed(&self) -> bool {
        self.closed.get()
    }

    /// Error with [`RegionError::Closed`] if the region is closed.
    pub fn ensure_open(&self) -> Result<(), RegionError> {
        if self.closed.get() {
            Err(RegionError::Closed { region: self.id })
        } else {
            Ok(())
        }
    }

    /// Number of objects allocated from the region whose strong count
    /// has not yet reached zero.
    pub fn live(&self) -> usize {
        self.live.get()
    }

    /// Live-object counts per payload type, in allocation order.
    pub fn live_by_type(&self) -> Vec<(&'static str, usize)> {
        self.live_by_type
            .borrow()
            .iter()
            .map(|(&name, &n)| (name, n))
            .collect()
    }

    /// Record the construction of an object in the region.
    ///
    /// Called by the reference-count runtime after a successful carve.
    pub fn record_alloc(&self, type_name: &'static str) {
        self.live.set(self.live.get() + 1);
        *self.live_by_type.borrow_mut().entry(type_name).or_insert(0) += 1;
    }

    /// Record an object's strong count reaching zero.
    pub fn record_release(&self, type_name: &'static str) {
        self.live.set(self.live.get() - 1);
        if let Some(n) = self.live_by_type.borrow_mut().get_mut(type_name) {
            *n -= 1;
        }
    }

    fn mark_closed(&self) {
        self.closed.set(true);
    }
}

/// An arena region: a fixed capacity, a list of backing chunks, and a
/// bump cursor over them.
///
/// Regions are single-thread resources; the scope stack in [`crate::scope`]
/// owns one per open scope. A region can also be used standalone for raw
/// carving.
pub struct Region {
    config: RegionConfig,
    chunks: ChunkList,
    used: usize,
    ctl: SharedRegionCtl,
}

impl Region {
    /// Create a region with the given configuration, reserving the
    /// initial chunk up front.
    pub fn new(config: RegionConfig) -> Self {
        let mut chunks = ChunkList::new(config.chunk_bytes);
        if config.capacity_bytes > 0 {
            chunks.reserve_initial(config.chunk_bytes.min(config.capacity_bytes));
        }
        Self {
            config,
            chunks,
            used: 0,
            ctl: Rc::new(RegionCtl::new(RegionId::next())),
        }
    }

    /// Carve an aligned slot of `layout` bytes from the region.
    ///
    /// Fails with [`RegionError::CapacityExceeded`] if the cumulative
    /// requested size would exceed the fixed capacity — the request is
    /// never redirected to the heap, and the used-bytes counter is left
    /// unchanged. Fails with [`RegionError::Closed`] after close.
    ///
    /// Zero-size requests return a dangling, suitably-aligned pointer
    /// without touching the chunks.
    pub fn allocate(&mut self, layout: Layout) -> Result<NonNull<u8>, RegionError> {
        self.ctl.ensure_open()?;
        let size = layout.size();
        if size == 0 {
            return Ok(NonNull::new(layout.align() as *mut u8)
                .expect("alignment is non-zero"));
        }
        if size > self.config.capacity_bytes - self.used {
            return Err(RegionError::CapacityExceeded {
                requested: size,
                capacity: self.config.capacity_bytes,
            });
        }
        let ptr = self.chunks.carve(size, layout.align());
        self.used += size;
        Ok(ptr)
    }

    /// Close the region and release every chunk in one bulk operation.
    ///
    /// No object graph is walked and no per-object teardown runs — the
    /// chunks are reclaimed as raw bytes. Objects still live at close
    /// are reported per payload type; their handles become permanently
    /// invalid. Idempotent: closing an already-closed region is a no-op.
    pub fn close(&mut self) {
        if self.ctl.is_closed() {
            return;
        }
        if self.ctl.live() > 0 {
            for (type_name, live) in self.ctl.live_by_type() {
                if live > 0 {
                    tracing::warn!(
                        region = %self.id(),
                        type_name,
                        live,
                        "objects still alive at region close; storage reclaimed in bulk, field teardown skipped"
                    );
                }
            }
        }
        self.ctl.mark_closed();
        let chunks = self.chunks.release();
        tracing::debug!(
            region = %self.id(),
            chunks,
            bytes = self.used,
            "region closed, chunks released in bulk"
        );
    }

    /// The region's unique ID.
    pub fn id(&self) -> RegionId {
        self.ctl.id()
    }

    /// Whether the region has been closed.
    pub fn is_closed(&self) -> bool {
        self.ctl.is_closed()
    }

    /// The fixed capacity in bytes.
    pub fn capacity_bytes(&self) -> usize {
        self.config.capacity_bytes
    }

    /// Cumulative requested bytes handed out so far.
    ///
    /// Alignment padding consumed inside chunks is not counted; the
    /// counter tracks exactly what callers asked for.
    pub fn bytes_used(&self) -> usize {
        self.used
    }

    /// Bytes still available under the capacity bound.
    pub fn bytes_remaining(&self) -> usize {
        self.config.capacity_bytes - self.used
    }

    /// Number of chunks currently reserved.
    pub fn chunk_count(&self) -> usize {
        self.chunks.chunk_count()
    }

    /// Total bytes reserved from the global allocator across all chunks.
    pub fn reserved_bytes(&self) -> usize {
        self.chunks.reserved_bytes()
    }

    /// Number of live objects allocated from this region.
    pub fn live_objects(&self) -> usize {
        self.ctl.live()
    }

    /// Whether `ptr` points into the region's chunks.
    ///
    /// Always `false` after close.
    pub fn contains(&self, ptr: *const u8) -> bool {
        self.chunks.contains(ptr)
    }

    /// The region's configuration.
    pub fn config(&self) -> &RegionConfig {
        &self.config
    }

    /// A shared handle to the control block, for embedding in handles
    /// allocated from this region.
    pub fn ctl_handle(&self) -> SharedRegionCtl {
        Rc::clone(&self.ctl)
    }
}

impl Drop for Region {
    fn drop(&mut self) {
        self.close();
    }
}
