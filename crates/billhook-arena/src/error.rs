//! Region and scope error types.

use std::error::Error;
use std::fmt;

use billhook_core::RegionId;

/// Errors from region allocation and access.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RegionError {
    /// The cumulative requested size would exceed the region's fixed
    /// capacity. The region remains open and its used-bytes counter is
    /// unchanged; the caller may retry with a larger region or fall
    /// back to explicit heap construction.
    CapacityExceeded {
        /// Number of bytes requested by the failing allocation.
        requested: usize,
        /// The region's fixed capacity in bytes.
        capacity: usize,
    },
    /// The region has been closed; its chunks were released in bulk and
    /// any handle into it is permanently invalid.
    Closed {
        /// The closed region.
        region: RegionId,
    },
}

impl fmt::Display for RegionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CapacityExceeded {
                requested,
                capacity,
            } => {
                write!(
                    f,
                    "region capacity exceeded: requested {requested} bytes, capacity {capacity} bytes"
                )
            }
            Self::Closed { region } => {
                write!(f, "region {region} is closed")
            }
        }
    }
}

impl Error for RegionError {}

/// Errors from scope-stack operations.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScopeError {
    /// The handle does not reference the innermost open scope. Scopes
    /// close in strict last-in-first-out order; an inner scope must
    /// close before an outer one. This is a programming error and is
    /// not recovered automatically.
    NotInnermost {
        /// The region the handle references.
        handle: RegionId,
        /// The region currently at the top of this thread's stack.
        innermost: RegionId,
    },
    /// No scope for this handle's region is open on the current thread.
    /// Handles are bound to the thread that opened the scope.
    NotOpen {
        /// The region the handle references.
        handle: RegionId,
    },
}

impl fmt::Display for ScopeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotInnermost { handle, innermost } => {
                write!(
                    f,
                    "scope nesting violation: region {handle} is not the innermost open scope (innermost is {innermost})"
                )
            }
            Self::NotOpen { handle } => {
                write!(f, "no open scope for region {handle} on this thread")
            }
        }
    }
}

impl Error for ScopeError {}
