//! Iterative teardown of released cells.
//!
//! A decrement-to-zero never tears its cell down directly: the cell is
//! pushed onto a thread-local worklist, and only the outermost release
//! on the thread drains it. A payload drop that releases further
//! references enqueues them instead of recursing, so tearing down a
//! chain of any depth uses constant stack.

use std::alloc::{dealloc, Layout};
use std::cell::RefCell;
use std::ptr;

use smallvec::SmallVec;

use crate::cell::CellBox;

/// A cell whose payload (and, for heap cells, storage) awaits teardown.
pub(crate) struct PendingRelease {
    ptr: *mut u8,
    run: unsafe fn(*mut u8),
}

impl PendingRelease {
    /// Queue entry for a heap cell: payload drop plus storage free.
    pub(crate) fn heap<T>(cell: ptr::NonNull<CellBox<T>>) -> Self {
        Self {
            ptr: cell.as_ptr().cast(),
            run: run_heap::<T>,
        }
    }

    /// Queue entry for an arena cell: payload drop only; the storage is
    /// reclaimed by the owning region's bulk release.
    pub(crate) fn arena<T>(cell: ptr::NonNull<CellBox<T>>) -> Self {
        Self {
            ptr: cell.as_ptr().cast(),
            run: run_arena::<T>,
        }
    }
}

struct Worklist {
    pending: SmallVec<[PendingRelease; 8]>,
    draining: bool,
}

thread_local! {
    static WORKLIST: RefCell<Worklist> = RefCell::new(Worklist {
        pending: SmallVec::new(),
        draining: false,
    });
}

/// Reset the draining flag when the drain loop exits, so a panicking
/// payload drop leaves later releases able to drain what remains.
struct DrainGuard<'a>(&'a RefCell<Worklist>);

impl Drop for DrainGuard<'_> {
    fn drop(&mut self) {
        self.0.borrow_mut().draining = false;
    }
}

/// Schedule a released cell for teardown.
///
/// If this is the outermost release on the thread, drain the worklist
/// before returning; otherwise the entry is picked up by the drain loop
/// already running further up the stack.
pub(crate) fn release(item: PendingRelease) {
    WORKLIST.with(|list| {
        {
            let mut worklist = list.borrow_mut();
            worklist.pending.push(item);
            if worklist.draining {
                return;
            }
            worklist.draining = true;
        }
        let _guard = DrainGuard(list);
        loop {
            let next = list.borrow_mut().pending.pop();
            match next {
                // SAFETY: each cell is scheduled exactly once, by the
                // decrement that took its count to zero, so `run` has
                // exclusive access to it.
                Some(pending) => unsafe { (pending.run)(pending.ptr) },
                None => break,
            }
        }
    });
}

/// Teardown for a heap cell: drop the payload, then return the storage
/// to the global allocator.
pub(crate) unsafe fn run_heap<T>(raw: *mut u8) {
    let cell = raw.cast::<CellBox<T>>();
    // SAFETY: the cell is live with a zero strong count; the payload is
    // dropped exactly once, and the storage matches the allocation in
    // `cell::new_heap_cell`.
    unsafe {
        ptr::drop_in_place(ptr::addr_of_mut!((*cell).value));
        dealloc(cell.cast::<u8>(), Layout::new::<CellBox<T>>());
    }
}

/// Teardown for an arena cell: drop the payload only.
pub(crate) unsafe fn run_arena<T>(raw: *mut u8) {
    let cell = raw.cast::<CellBox<T>>();
    // SAFETY: as for `run_heap`; the storage itself stays in place until
    // the owning region bulk-releases its chunks.
    unsafe {
        ptr::drop_in_place(ptr::addr_of_mut!((*cell).value));
    }
}
