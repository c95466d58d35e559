//! The dual-mode strong reference.
//!
//! [`Strong<T>`] owns one strong reference to a reference-counted cell.
//! Where the cell lives is decided once, at construction, and recorded
//! in the handle: heap cells are individually freed when the count
//! reaches zero; arena cells leave their storage to the owning region's
//! bulk release.
//!
//! Every handle into an arena region carries the region's shared
//! control block, so validity is checked against the closed flag before
//! any access to the cell — reclaimed memory is never read. Access
//! through a closed region is a deterministic error ([`Strong::try_get`])
//! or panic ([`Strong::get`], `Deref`), never silent reuse.

use std::any;
use std::fmt;
use std::ops::Deref;
use std::ptr::NonNull;

use billhook_arena::region::SharedRegionCtl;
use billhook_arena::scope;
use billhook_arena::RegionError;
use billhook_core::{Allocatable, Placement, RegionId};

use crate::cell::{cell_layout, new_heap_cell, CellBox, Header};
use crate::teardown::{self, PendingRelease};

/// A single-thread strong reference to a heap- or arena-resident cell.
///
/// Cloning increments the strong count; dropping decrements it. The
/// handle is `!Send` and `!Sync`: counts are non-atomic and arena
/// regions belong to the thread that opened them.
pub struct Strong<T: 'static> {
    cell: NonNull<CellBox<T>>,
    /// `Some` for arena cells (the construction-time placement tag),
    /// `None` for heap cells. Carried by the handle rather than the
    /// cell because bulk release invalidates cell memory — teardown
    /// must branch without touching it.
    region: Option<SharedRegionCtl>,
}

impl<T: Allocatable> Strong<T> {
    /// Construct a cell for `value`, routed through the scope stack.
    ///
    /// With a scope open on this thread, the cell is carved from the
    /// innermost region and fails with
    /// [`RegionError::CapacityExceeded`] when the region's fixed
    /// capacity would be exceeded — the caller may retry under a larger
    /// scope or fall back to [`Strong::heap`]. With no scope open, the
    /// cell goes to the general-purpose heap and construction cannot
    /// fail.
    pub fn new(value: T) -> Result<Self, RegionError> {
        scope::with_active(|active| match active {
            Some(region) => {
                let raw = region.allocate(cell_layout::<T>())?;
                let cell = raw.cast::<CellBox<T>>();
                // SAFETY: the region handed out a fresh, exclusive slot
                // sized and aligned for CellBox<T>.
                unsafe {
                    cell.as_ptr().write(CellBox {
                        header: Header::new(),
                        value,
                    });
                }
                let ctl = region.ctl_handle();
                ctl.record_alloc(any::type_name::<T>());
                Ok(Self {
                    cell,
                    region: Some(ctl),
                })
            }
            None => Ok(Self::heap(value)),
        })
    }
}

impl<T: 'static> Strong<T> {
    /// Construct a cell for `value` on the general-purpose heap,
    /// regardless of any open scope.
    ///
    /// This is the only constructor for types without the
    /// [`Allocatable`] capability, which keeps them off the arena by
    /// construction.
    pub fn heap(value: T) -> Self {
        Self {
            cell: new_heap_cell(value),
            region: None,
        }
    }

    /// Which allocator serviced this cell. Fixed at construction.
    pub fn placement(&self) -> Placement {
        if self.region.is_some() {
            Placement::Arena
        } else {
            Placement::Heap
        }
    }

    /// The owning region's ID for arena cells, `None` for heap cells.
    pub fn region_id(&self) -> Option<RegionId> {
        self.region.as_ref().map(|ctl| ctl.id())
    }

    /// Whether the cell's storage is still valid.
    ///
    /// Heap cells are valid for the handle's whole lifetime; arena
    /// cells become invalid when their region closes.
    pub fn is_valid(&self) -> bool {
        self.region.as_ref().map_or(true, |ctl| !ctl.is_closed())
    }

    /// Borrow the payload, or report that the owning region closed.
    pub fn try_get(&self) -> Result<&T, RegionError> {
        if let Some(ctl) = &self.region {
            ctl.ensure_open()?;
        }
        // SAFETY: the cell is live — heap cells outlive their handles
        // by construction, and the arena region was just checked open.
        Ok(unsafe { &self.cell.as_ref().value })
    }

    /// Borrow the payload.
    ///
    /// # Panics
    ///
    /// Panics if the owning region has been closed. Use
    /// [`Strong::try_get`] for a checked borrow.
    pub fn get(&self) -> &T {
        match self.try_get() {
            Ok(value) => value,
            Err(err) => panic!("{err}"),
        }
    }

    /// Borrow the payload mutably if this is the only handle to it.
    ///
    /// Returns `None` when other handles exist or the owning region has
    /// closed.
    pub fn get_mut(&mut self) -> Option<&mut T> {
        if !self.is_valid() {
            return None;
        }
        // SAFETY: the cell is live (checked above); a strong count of
        // one means no other handle can alias the payload.
        unsafe {
            if self.cell.as_ref().header.strong() == 1 {
                Some(&mut self.cell.as_mut().value)
            } else {
                None
            }
        }
    }

    /// Number of strong references to the cell.
    ///
    /// # Panics
    ///
    /// Panics if the owning region has been closed — the count died
    /// with the region's storage.
    pub fn strong_count(&self) -> usize {
        self.live_header().strong()
    }

    /// Whether two handles reference the same cell.
    pub fn ptr_eq(this: &Self, other: &Self) -> bool {
        this.cell == other.cell
    }

    /// The header, after asserting the cell's storage is still valid.
    fn live_header(&self) -> &Header {
        if let Some(ctl) = &self.region {
            if let Err(err) = ctl.ensure_open() {
                panic!("{err}");
            }
        }
        // SAFETY: heap cells are always live; the arena region was just
        // checked open.
        unsafe { &self.cell.as_ref().header }
    }
}

impl<T: 'static> Clone for Strong<T> {
    /// Add a strong reference to the cell.
    ///
    /// # Panics
    ///
    /// Panics if the owning region has been closed.
    fn clone(&self) -> Self {
        self.live_header().increment();
        Self {
            cell: self.cell,
            region: self.region.clone(),
        }
    }
}

impl<T: 'static> Deref for Strong<T> {
    type Target = T;

    /// # Panics
    ///
    /// Panics if the owning region has been closed. Use
    /// [`Strong::try_get`] for a checked borrow.
    fn deref(&self) -> &T {
        self.get()
    }
}

impl<T: fmt::Debug + 'static> fmt::Debug for Strong<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.try_get() {
            Ok(value) => f.debug_tuple("Strong").field(value).finish(),
            Err(_) => f.write_str("Strong(<region closed>)"),
        }
    }
}

impl<T: 'static> Drop for Strong<T> {
    fn drop(&mut self) {
        match &self.region {
            Some(ctl) if ctl.is_closed() => {
                // The cell — count included — was reclaimed by the
                // region's bulk release; nothing left to do.
            }
            Some(ctl) => {
                // SAFETY: the region is open, so the cell is live.
                let remaining = unsafe { self.cell.as_ref().header.decrement() };
                if remaining == 0 {
                    ctl.record_release(any::type_name::<T>());
                    // Payload teardown releases held references now —
                    // heap referents must not wait for region close —
                    // but the storage stays until bulk release.
                    teardown::release(PendingRelease::arena(self.cell));
                }
            }
            None => {
                // SAFETY: heap cells are live until this count hits zero.
                let remaining = unsafe { self.cell.as_ref().header.decrement() };
                if remaining == 0 {
                    teardown::release(PendingRelease::heap(self.cell));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use billhook_arena::scope::Scope;
    use std::cell::RefCell;

    #[derive(Debug)]
    struct Node {
        next: RefCell<Option<Strong<Node>>>,
        weight: u64,
    }

    impl Allocatable for Node {}

    impl Node {
        fn leaf(weight: u64) -> Self {
            Self {
                next: RefCell::new(None),
                weight,
            }
        }
    }

    /// Deliberately lacks the `Allocatable` capability.
    struct PlainPayload {
        label: &'static str,
    }

    #[test]
    fn heap_routing_without_scope() {
        let node = Strong::new(Node::leaf(7)).unwrap();
        assert_eq!(node.placement(), Placement::Heap);
        assert_eq!(node.region_id(), None);
        assert_eq!(node.weight, 7);
        assert_eq!(node.strong_count(), 1);
    }

    #[test]
    fn arena_routing_with_scope() {
        let scope = Scope::enter(64 * 1024);
        let node = Strong::new(Node::leaf(1)).unwrap();
        assert_eq!(node.placement(), Placement::Arena);
        assert_eq!(node.region_id(), Some(scope.region()));
        let in_region = scope::with_active(|r| {
            r.unwrap().contains(node.cell.as_ptr().cast::<u8>())
        });
        assert!(in_region);
        drop(node);
        scope.close().unwrap();
    }

    #[test]
    fn clone_and_drop_track_the_count() {
        let a = Strong::heap(Node::leaf(3));
        let b = a.clone();
        assert_eq!(a.strong_count(), 2);
        assert!(Strong::ptr_eq(&a, &b));
        drop(b);
        assert_eq!(a.strong_count(), 1);
    }

    #[test]
    fn capability_isolation_under_open_scope() {
        let scope = Scope::enter(64 * 1024);
        let used_before = scope::with_active(|r| r.unwrap().bytes_used());
        let plain = Strong::heap(PlainPayload { label: "plain" });
        assert_eq!(plain.placement(), Placement::Heap);
        assert_eq!(plain.label, "plain");
        let used_after = scope::with_active(|r| r.unwrap().bytes_used());
        assert_eq!(used_before, used_after);
        scope.close().unwrap();
    }

    #[test]
    fn overflow_surfaces_and_heap_fallback_works() {
        let scope = Scope::enter(1);
        let err = Strong::new(Node::leaf(0)).unwrap_err();
        assert!(matches!(err, RegionError::CapacityExceeded { .. }));
        // Explicit heap construction is the documented fallback.
        let node = Strong::heap(Node::leaf(0));
        assert_eq!(node.placement(), Placement::Heap);
        scope.close().unwrap();
    }

    #[test]
    fn try_get_reports_closed_region() {
        let scope = Scope::enter(64 * 1024);
        let node = Strong::new(Node::leaf(9)).unwrap();
        assert_eq!(node.try_get().unwrap().weight, 9);
        let region = scope.region();
        scope.close().unwrap();
        assert!(!node.is_valid());
        assert_eq!(node.try_get().unwrap_err(), RegionError::Closed { region });
        // Dropping the stale handle is a no-op, not a fault.
        drop(node);
    }

    #[test]
    #[should_panic(expected = "is closed")]
    fn deref_after_close_panics() {
        let scope = Scope::enter(64 * 1024);
        let node = Strong::new(Node::leaf(0)).unwrap();
        scope.close().unwrap();
        let _ = node.weight;
    }

    #[test]
    #[should_panic(expected = "is closed")]
    fn clone_after_close_panics() {
        let scope = Scope::enter(64 * 1024);
        let node = Strong::new(Node::leaf(0)).unwrap();
        scope.close().unwrap();
        let _ = node.clone();
    }

    #[test]
    fn get_mut_requires_unique_handle() {
        let mut a = Strong::heap(Node::leaf(5));
        assert!(a.get_mut().is_some());
        let b = a.clone();
        assert!(a.get_mut().is_none());
        drop(b);
        a.get_mut().unwrap().weight = 6;
        assert_eq!(a.weight, 6);
    }

    #[test]
    fn arena_release_runs_payload_drop_but_keeps_bytes() {
        let scope = Scope::enter(64 * 1024);
        let child = Strong::new(Node::leaf(1)).unwrap();
        let parent = Strong::new(Node::leaf(2)).unwrap();
        *parent.next.borrow_mut() = Some(child.clone());
        drop(child);
        assert_eq!(scope::with_active(|r| r.unwrap().live_objects()), 2);
        let used = scope::with_active(|r| r.unwrap().bytes_used());
        drop(parent);
        // Both cells released; the region still holds their bytes.
        assert_eq!(scope::with_active(|r| r.unwrap().live_objects()), 0);
        assert_eq!(scope::with_active(|r| r.unwrap().bytes_used()), used);
        scope.close().unwrap();
    }

    #[test]
    fn debug_formats_closed_handles() {
        #[derive(Debug)]
        struct Tag(u64);
        impl Allocatable for Tag {}

        let scope = Scope::enter(64 * 1024);
        let tag = Strong::new(Tag(4)).unwrap();
        assert_eq!(format!("{tag:?}"), "Strong(Tag(4))");
        scope.close().unwrap();
        assert_eq!(format!("{tag:?}"), "Strong(<region closed>)");
    }
}
