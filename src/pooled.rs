//! Pooled resource wrapper and lifecycle state machine
//!
//! [`PooledResource`] is the engine's internal record for one live resource:
//! the value slot, the lifecycle state, and the timing metadata the evictor
//! consults. [`Pooled`] is the opaque handle a borrower receives; it derefs
//! to the resource and reports back to the pool if dropped without being
//! released.

use std::sync::atomic::{AtomicU64, Ordering};
use tokio::time::Instant;

/// Process-wide id source so handles from different pools never collide.
static NEXT_ID: AtomicU64 = AtomicU64::new(1);

pub(crate) fn next_resource_id() -> u64 {
    NEXT_ID.fetch_add(1, Ordering::Relaxed)
}

/// Lifecycle state of a pooled resource.
///
/// `Invalid` is terminal: the resource has been unreferenced from every
/// engine bucket and destruction has begun.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ResourceState {
    /// Sitting in the idle cache, ready to be dispensed
    Idle,
    /// Lent out to a borrower
    Allocated,
    /// Undergoing factory validation
    Validation,
    /// Returned by a borrower, disposition not yet recorded
    Returning,
    /// Condemned; awaiting or undergoing factory destroy
    Invalid,
}

/// Internal record for one live resource.
///
/// The value slot is `Some` only while the engine itself holds the resource
/// (idle); during a loan, validation, or destruction the value is owned by
/// the borrower or the spawned factory task.
pub(crate) struct PooledResource<T> {
    id: u64,
    value: Option<T>,
    state: ResourceState,
    created_at: Instant,
    last_borrowed_at: Option<Instant>,
    last_returned_at: Option<Instant>,
    last_idle_at: Option<Instant>,
}

impl<T> PooledResource<T> {
    /// A freshly created resource enters the pool idle.
    pub(crate) fn new(id: u64, value: T) -> Self {
        let now = Instant::now();
        Self {
            id,
            value: Some(value),
            state: ResourceState::Idle,
            created_at: now,
            last_borrowed_at: None,
            last_returned_at: None,
            last_idle_at: Some(now),
        }
    }

    pub(crate) fn state(&self) -> ResourceState {
        self.state
    }

    /// `Some` iff the state is `Idle`.
    pub(crate) fn last_idle_at(&self) -> Option<Instant> {
        self.last_idle_at
    }

    pub(crate) fn take_value(&mut self) -> T {
        self.value.take().expect("pooled resource value already taken")
    }

    /// Idle → Allocated, on dispatch to a waiter.
    pub(crate) fn allocate(&mut self) {
        debug_assert_eq!(self.state, ResourceState::Idle);
        self.state = ResourceState::Allocated;
        self.last_borrowed_at = Some(Instant::now());
        self.last_idle_at = None;
    }

    /// Idle → Validation, for test-on-borrow.
    pub(crate) fn test(&mut self) {
        debug_assert_eq!(self.state, ResourceState::Idle);
        self.state = ResourceState::Validation;
        self.last_idle_at = None;
    }

    /// Allocated → Returning, on release.
    pub(crate) fn returning(&mut self) {
        debug_assert_eq!(self.state, ResourceState::Allocated);
        self.state = ResourceState::Returning;
        self.last_returned_at = Some(Instant::now());
    }

    /// Returning → Validation, for test-on-return.
    pub(crate) fn begin_return_validation(&mut self) {
        debug_assert_eq!(self.state, ResourceState::Returning);
        self.state = ResourceState::Validation;
    }

    /// Any non-terminal state → Idle, storing the value back in the record.
    pub(crate) fn make_idle(&mut self, value: T) {
        debug_assert_ne!(self.state, ResourceState::Invalid);
        self.state = ResourceState::Idle;
        self.last_idle_at = Some(Instant::now());
        self.value = Some(value);
    }

    /// Any → Invalid. Terminal.
    pub(crate) fn invalidate(&mut self) {
        self.state = ResourceState::Invalid;
        self.last_idle_at = None;
    }
}

impl<T> std::fmt::Debug for PooledResource<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PooledResource")
            .field("id", &self.id)
            .field("state", &self.state)
            .field("created_at", &self.created_at)
            .field("last_borrowed_at", &self.last_borrowed_at)
            .field("last_returned_at", &self.last_returned_at)
            .field("last_idle_at", &self.last_idle_at)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Pooled<T> — the borrower-visible handle
// ---------------------------------------------------------------------------

/// An opaque handle to a borrowed resource.
///
/// Derefs to the resource. Return it with [`Pool::release`] or
/// [`Pool::destroy`]; if the handle is dropped instead, the pool treats the
/// resource as unreturnable and destroys it.
///
/// [`Pool::release`]: crate::Pool::release
/// [`Pool::destroy`]: crate::Pool::destroy
pub struct Pooled<T> {
    id: u64,
    value: Option<T>,
    on_drop: Option<Box<dyn FnOnce(u64, T) + Send>>,
}

impl<T> Pooled<T> {
    pub(crate) fn new<F>(id: u64, value: T, on_drop: F) -> Self
    where
        F: FnOnce(u64, T) + Send + 'static,
    {
        Self {
            id,
            value: Some(value),
            on_drop: Some(Box::new(on_drop)),
        }
    }

    pub(crate) fn id(&self) -> u64 {
        self.id
    }

    /// Dismantle the handle without firing the drop callback. Only the pool
    /// does this, when the handle comes back through release/destroy.
    pub(crate) fn take_parts(mut self) -> (u64, T) {
        self.on_drop.take();
        let value = self.value.take().expect("handle already dismantled");
        (self.id, value)
    }
}

impl<T> std::ops::Deref for Pooled<T> {
    type Target = T;

    fn deref(&self) -> &T {
        self.value.as_ref().expect("handle already dismantled")
    }
}

impl<T> std::ops::DerefMut for Pooled<T> {
    fn deref_mut(&mut self) -> &mut T {
        self.value.as_mut().expect("handle already dismantled")
    }
}

impl<T> Drop for Pooled<T> {
    fn drop(&mut self) {
        if let (Some(value), Some(on_drop)) = (self.value.take(), self.on_drop.take()) {
            on_drop(self.id, value);
        }
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for Pooled<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pooled")
            .field("id", &self.id)
            .field("value", &self.value)
            .finish()
    }
}
