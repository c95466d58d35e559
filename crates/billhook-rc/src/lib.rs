//! Dual-mode reference counting over heap and arena storage.
//!
//! [`Strong<T>`] is a single-thread strong reference whose storage is
//! chosen once, at construction: while an arena scope is open on the
//! current thread, capability-bearing types are carved from the
//! innermost region; otherwise (and for types without the capability)
//! the cell lives on the general-purpose heap.
//!
//! # Teardown asymmetry
//!
//! When a heap cell's strong count reaches zero, its payload is dropped
//! and its storage returned to the global allocator. When an arena
//! cell's count reaches zero, only the payload is dropped — releasing
//! every strong reference it holds, including references to heap
//! objects, immediately — while the storage stays in place until the
//! owning region's bulk release. Bulk release never visits objects, so
//! an arena object still live when its region closes keeps its heap
//! referents alive forever; the region reports such objects at close.
//!
//! Both release paths run through an iterative, thread-local worklist:
//! dropping the last handle to a chain of any depth uses constant
//! stack.
//!
//! Reference cycles are not collected, as with [`std::rc::Rc`].
//!
//! This crate is one of two that contain `unsafe` code (along with
//! `billhook-arena`), bounded to `cell.rs` (cell layout and heap
//! storage), `teardown.rs` (deferred payload drops), and the handle
//! internals in `strong.rs` that read through the cell pointer.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

mod cell;
pub mod strong;
mod teardown;

pub use strong::Strong;
