//! In-memory layout of reference-counted cells.

use std::alloc::{alloc, handle_alloc_error, Layout};
use std::cell::Cell;
use std::ptr::NonNull;

use billhook_core::Allocatable;

/// Strong-reference count header preceding every cell payload.
///
/// Counts are non-atomic; cells never cross threads.
pub(crate) struct Header {
    strong: Cell<usize>,
}

impl Header {
    /// A fresh header with one strong reference.
    pub(crate) fn new() -> Self {
        Self {
            strong: Cell::new(1),
        }
    }

    pub(crate) fn strong(&self) -> usize {
        self.strong.get()
    }

    pub(crate) fn increment(&self) {
        let n = self
            .strong
            .get()
            .checked_add(1)
            .expect("strong count overflow");
        self.strong.set(n);
    }

    /// Decrement and return the new count.
    pub(crate) fn decrement(&self) -> usize {
        let n = self.strong.get() - 1;
        self.strong.set(n);
        n
    }
}

/// A reference-counted cell: header followed by the payload.
///
/// `repr(C)` so the in-memory layout is exactly the header layout
/// extended by the layout the capability declares — what the allocation
/// router carves from a region.
#[repr(C)]
pub(crate) struct CellBox<T> {
    pub(crate) header: Header,
    pub(crate) value: T,
}

/// The slot layout for an arena-eligible payload, derived from the
/// capability-declared [`Allocatable::LAYOUT`].
pub(crate) fn cell_layout<T: Allocatable>() -> Layout {
    let (layout, offset) = Layout::new::<Header>()
        .extend(T::LAYOUT)
        .expect("cell layout fits in isize");
    debug_assert_eq!(offset, std::mem::offset_of!(CellBox<T>, value));
    layout.pad_to_align()
}

/// Allocate a heap cell from the global allocator and move `value` in.
///
/// The matching release is `teardown::run_heap`.
pub(crate) fn new_heap_cell<T>(value: T) -> NonNull<CellBox<T>> {
    let layout = Layout::new::<CellBox<T>>();
    // SAFETY: `layout` has non-zero size — the header is never zero-sized.
    let raw = unsafe { alloc(layout) };
    let Some(cell) = NonNull::new(raw.cast::<CellBox<T>>()) else {
        handle_alloc_error(layout);
    };
    // SAFETY: the allocation is fresh, exclusive, and sized for CellBox<T>.
    unsafe {
        cell.as_ptr().write(CellBox {
            header: Header::new(),
            value,
        });
    }
    cell
}
