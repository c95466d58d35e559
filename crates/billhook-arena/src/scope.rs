//! The per-thread scope stack of open arena regions.
//!
//! Each thread owns an independent stack, created lazily on first use.
//! [`enter`] pushes a fresh [`Region`] and returns a move-only
//! [`ScopeHandle`]; [`exit`] consumes the handle, enforces strict
//! last-in-first-out nesting, and closes the region (bulk-releasing its
//! chunks). The innermost open region is the active allocation target
//! for capability-bearing types, reached through [`with_active`].
//!
//! Handles cannot be cloned or re-used: once a scope is exited its
//! handle is gone, so "allocate through a closed scope" is a compile
//! error rather than a runtime hazard. The [`Scope`] guard wraps the
//! pair for panic safety — its drop path closes the scope on unwinding.
//! A thread that exits with scopes still open has them closed (and
//! reported) by the stack's destructor.

use std::cell::RefCell;

use billhook_core::RegionId;

use crate::config::RegionConfig;
use crate::error::ScopeError;
use crate::region::Region;

thread_local! {
    static SCOPES: RefCell<ScopeStack> = RefCell::new(ScopeStack { frames: Vec::new() });
}

/// The thread's stack of open regions, innermost last.
struct ScopeStack {
    frames: Vec<Region>,
}

impl Drop for ScopeStack {
    fn drop(&mut self) {
        if !self.frames.is_empty() {
            tracing::warn!(
                open = self.frames.len(),
                "thread exited with open arena scopes; closing innermost-first"
            );
            while let Some(mut region) = self.frames.pop() {
                region.close();
            }
        }
    }
}

/// Opaque, move-only handle to an open scope.
///
/// Returned by [`enter`] and consumed by [`exit`]. The handle is bound
/// to the thread that opened the scope.
#[derive(Debug)]
#[must_use = "an unclosed scope holds its region's memory until thread exit"]
pub struct ScopeHandle {
    region: RegionId,
}

impl ScopeHandle {
    /// The region this handle's scope allocates from.
    pub fn region(&self) -> RegionId {
        self.region
    }
}

/// Open a scope with the given capacity bound and the default chunk
/// size, pushing a fresh region onto this thread's stack.
pub fn enter(capacity_bytes: usize) -> ScopeHandle {
    enter_with(RegionConfig::new(capacity_bytes))
}

/// Open a scope with an explicit region configuration.
pub fn enter_with(config: RegionConfig) -> ScopeHandle {
    SCOPES.with(|stack| {
        let mut stack = stack.borrow_mut();
        let region = Region::new(config);
        let id = region.id();
        tracing::debug!(
            region = %id,
            depth = stack.frames.len() + 1,
            capacity = config.capacity_bytes,
            "arena scope opened"
        );
        stack.frames.push(region);
        ScopeHandle { region: id }
    })
}

/// Close the scope the handle refers to, bulk-releasing its region.
///
/// The handle must reference the innermost open scope on the current
/// thread: scopes close in strict last-in-first-out order. On success
/// the region's chunks are released in one operation regardless of how
/// many objects were carved from them.
pub fn exit(handle: ScopeHandle) -> Result<(), ScopeError> {
    let mut region = SCOPES.with(|stack| {
        let mut stack = stack.borrow_mut();
        let frames = &mut stack.frames;
        let innermost = frames.last().map(Region::id);
        match innermost {
            Some(id) if id == handle.region => {
                Ok(frames.pop().expect("stack verified non-empty"))
            }
            Some(id) => {
                if frames.iter().any(|r| r.id() == handle.region) {
                    Err(ScopeError::NotInnermost {
                        handle: handle.region,
                        innermost: id,
                    })
                } else {
                    Err(ScopeError::NotOpen {
                        handle: handle.region,
                    })
                }
            }
            None => Err(ScopeError::NotOpen {
                handle: handle.region,
            }),
        }
    })?;
    region.close();
    Ok(())
}

/// Run `f` with mutable access to the innermost open region, or `None`
/// if this thread has no open scope.
///
/// This is the allocation-routing hook: construction of a
/// capability-bearing type calls it once and carves from the region it
/// yields. The closure must not re-enter the scope API
/// ([`enter`]/[`exit`]/`with_active`) — doing so panics on the
/// thread-local borrow.
pub fn with_active<R>(f: impl FnOnce(Option<&mut Region>) -> R) -> R {
    SCOPES.with(|stack| {
        let mut stack = stack.borrow_mut();
        f(stack.frames.last_mut())
    })
}

/// Number of scopes currently open on this thread.
pub fn depth() -> usize {
    SCOPES.with(|stack| stack.borrow().frames.len())
}

/// The innermost open region's ID, if any scope is open.
pub fn active_region() -> Option<RegionId> {
    SCOPES.with(|stack| stack.borrow().frames.last().map(Region::id))
}

/// RAII guard pairing [`enter`] with a guaranteed [`exit`].
///
/// Dropping the guard closes the scope on every exit path, including
/// unwinding, so a failure partway through graph construction still
/// ends in bulk release. Prefer [`Scope::close`] on the normal path —
/// the drop path cannot propagate a nesting error and only reports it.
#[must_use = "the scope closes as soon as the guard is dropped"]
pub struct Scope {
    handle: Option<ScopeHandle>,
}

impl Scope {
    /// Open a scope with the given capacity bound.
    pub fn enter(capacity_bytes: usize) -> Self {
        Self {
            handle: Some(enter(capacity_bytes)),
        }
    }

    /// Open a scope with an explicit region configuration.
    pub fn enter_with(config: RegionConfig) -> Self {
        Self {
            handle: Some(enter_with(config)),
        }
    }

    /// The region this scope allocates from.
    pub fn region(&self) -> RegionId {
        self.handle
            .as_ref()
            .expect("handle is present until close consumes it")
            .region()
    }

    /// Close the scope now, surfacing any nesting violation.
    pub fn close(mut self) -> Result<(), ScopeError> {
        let handle = self
            .handle
            .take()
            .expect("handle is present until close consumes it");
        exit(handle)
    }
}

impl Drop for Scope {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            if let Err(err) = exit(handle) {
                tracing::error!(error = %err, "scope guard failed to close its region");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::alloc::Layout;

    #[test]
    fn enter_exit_round_trip() {
        assert_eq!(depth(), 0);
        let handle = enter(1024);
        assert_eq!(depth(), 1);
        assert_eq!(active_region(), Some(handle.region()));
        exit(handle).unwrap();
        assert_eq!(depth(), 0);
        assert_eq!(active_region(), None);
    }

    #[test]
    fn innermost_scope_is_the_allocation_target() {
        let outer = enter(1024);
        let inner = enter(2048);
        with_active(|region| {
            let region = region.unwrap();
            assert_eq!(region.id(), inner.region());
            region.allocate(Layout::new::<u64>()).unwrap();
        });
        exit(inner).unwrap();
        with_active(|region| {
            let region = region.unwrap();
            assert_eq!(region.id(), outer.region());
            assert_eq!(region.bytes_used(), 0);
        });
        exit(outer).unwrap();
    }

    #[test]
    fn closing_outer_before_inner_is_a_nesting_violation() {
        let outer = enter(1024);
        let inner = enter(1024);
        let err = exit(outer).unwrap_err();
        match err {
            ScopeError::NotInnermost { innermost, .. } => {
                assert_eq!(innermost, inner.region());
            }
            other => panic!("expected NotInnermost, got {other:?}"),
        }
        // The stack is intact; closing in order still works.
        let outer = ScopeHandle {
            region: active_region_below_top(),
        };
        exit(inner).unwrap();
        exit(outer).unwrap();
    }

    /// The outer handle was consumed by the failed exit; rebuild it from
    /// the stack for the cleanup half of the test.
    fn active_region_below_top() -> RegionId {
        SCOPES.with(|stack| {
            let stack = stack.borrow();
            stack.frames[stack.frames.len() - 2].id()
        })
    }

    #[test]
    fn handle_from_another_thread_is_not_open() {
        let handle = enter(256);
        let foreign = std::thread::spawn(|| enter(256))
            .join()
            .expect("spawned thread opens its own scope");
        let err = exit(foreign).unwrap_err();
        assert!(matches!(err, ScopeError::NotOpen { .. }));
        exit(handle).unwrap();
    }

    #[test]
    fn guard_closes_on_drop() {
        {
            let _scope = Scope::enter(512);
            assert_eq!(depth(), 1);
        }
        assert_eq!(depth(), 0);
    }

    #[test]
    fn guard_close_surfaces_errors() {
        let outer = Scope::enter(512);
        let inner = Scope::enter(512);
        assert!(matches!(
            outer.close(),
            Err(ScopeError::NotInnermost { .. })
        ));
        inner.close().unwrap();
        // The outer guard was consumed by the failed close; its region
        // is closed by the stack at thread exit.
    }

    #[test]
    fn guard_closes_on_panic() {
        let result = std::panic::catch_unwind(|| {
            let _scope = Scope::enter(512);
            panic!("construction failed");
        });
        assert!(result.is_err());
        assert_eq!(depth(), 0);
    }
}
