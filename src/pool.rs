//! The pool engine
//!
//! Composes the waiter queue, idle cache, eviction policy, and loan
//! bookkeeping into the lifecycle engine: every resource is tracked from
//! creation through borrow, return, validation, idle eviction, and
//! destruction.
//!
//! All bookkeeping lives under a single `parking_lot::Mutex` and is mutated
//! only at public method entries and factory-task completions. Factory
//! `create`/`validate`/`destroy` calls run in spawned tasks, never under the
//! lock, and re-enter the engine through `dispense` when they finish.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::time::Instant;

use futures::future::BoxFuture;
use parking_lot::Mutex;
use tokio::sync::Notify;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

use crate::config::PoolConfig;
use crate::error::{Error, Result};
use crate::events::{EventBus, PoolEvent};
use crate::evictor::{EvictionPolicy, should_evict};
use crate::factory::Factory;
use crate::idle::IdleCache;
use crate::loan::Loan;
use crate::pooled::{Pooled, PooledResource, ResourceState, next_resource_id};
use crate::queue::PriorityQueue;
use crate::request::Request;

// ---------------------------------------------------------------------------
// PoolStats
// ---------------------------------------------------------------------------

/// A point-in-time snapshot of pool state and lifetime counters.
#[derive(Debug, Clone, Default)]
pub struct PoolStats {
    /// Live resources plus in-flight creations.
    pub size: usize,
    /// Idle resources ready to dispense.
    pub available: usize,
    /// Resources currently out on loan.
    pub borrowed: usize,
    /// Acquire requests waiting in the queue.
    pub pending: usize,
    /// Resources undergoing factory validation.
    pub validating: usize,
    /// Room left before the pool hits `max`.
    pub spare_capacity: usize,
    /// Total successful acquisitions.
    pub total_acquisitions: u64,
    /// Total releases back to the pool.
    pub total_releases: u64,
    /// Total resources ever created.
    pub created: u64,
    /// Total resources ever destroyed.
    pub destroyed: u64,
}

#[derive(Debug, Default)]
struct Counters {
    total_acquisitions: u64,
    total_releases: u64,
    created: u64,
    destroyed: u64,
}

// ---------------------------------------------------------------------------
// Engine state
// ---------------------------------------------------------------------------

/// Every invariant-bearing field, guarded by one mutex.
struct PoolState<T> {
    /// All live resources, any state.
    all: HashMap<u64, PooledResource<T>>,
    /// Ids of resources in the `Idle` state, in dispense order.
    available: IdleCache,
    /// Callers waiting for a resource.
    waiters: PriorityQueue<Pooled<T>>,
    /// Outstanding borrows, keyed by resource id.
    loans: HashMap<u64, Loan>,
    /// Resources pulled out of `available` for borrow validation.
    testing_on_borrow: HashSet<u64>,
    /// In-flight factory operations.
    creating: usize,
    validating: usize,
    destroying: usize,
    started: bool,
    draining: bool,
    counters: Counters,
}

struct PoolInner<F: Factory> {
    factory: F,
    config: PoolConfig,
    state: Mutex<PoolState<F::Resource>>,
    /// Signalled after every state change; `ready`/`drain`/`clear` wait on it.
    changed: Notify,
    events: EventBus,
    evictor_stop: CancellationToken,
    next_request_id: AtomicU64,
}

// ---------------------------------------------------------------------------
// Pool<F>
// ---------------------------------------------------------------------------

/// Generic resource pool.
///
/// Lends resources produced by a [`Factory`], bounded by `max`, replenished
/// to `min`, with priority-ordered waiters, optional borrow/return
/// validation, and background idle eviction.
///
/// Cloning is cheap and shares the same pool.
pub struct Pool<F: Factory> {
    inner: Arc<PoolInner<F>>,
}

impl<F: Factory> Clone for Pool<F> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<F: Factory> std::fmt::Debug for Pool<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let stats = self.stats();
        f.debug_struct("Pool").field("stats", &stats).finish()
    }
}

impl<F: Factory> Pool<F> {
    /// Create a new pool around `factory`.
    ///
    /// The configuration is normalized first (`max ≥ 1`, `min ≤ max`,
    /// `priority_range ≥ 1`). With `autostart` (the default) the pool starts
    /// immediately; this must then happen inside a Tokio runtime.
    pub fn new(factory: F, config: PoolConfig) -> Self {
        let config = config.normalized();

        #[cfg(feature = "tracing")]
        tracing::debug!(
            max = config.max,
            min = config.min,
            fifo = config.fifo,
            "created resource pool"
        );

        let pool = Self {
            inner: Arc::new(PoolInner {
                state: Mutex::new(PoolState {
                    all: HashMap::new(),
                    available: IdleCache::new(),
                    waiters: PriorityQueue::new(config.priority_range),
                    loans: HashMap::new(),
                    testing_on_borrow: HashSet::new(),
                    creating: 0,
                    validating: 0,
                    destroying: 0,
                    started: false,
                    draining: false,
                    counters: Counters::default(),
                }),
                factory,
                config,
                changed: Notify::new(),
                events: EventBus::default(),
                evictor_stop: CancellationToken::new(),
                next_request_id: AtomicU64::new(1),
            }),
        };
        if pool.inner.config.autostart {
            pool.start();
        }
        pool
    }

    /// Start the pool: schedule the evictor (when configured) and replenish
    /// to `min`. Idempotent.
    pub fn start(&self) {
        {
            let mut st = self.inner.state.lock();
            if st.started {
                return;
            }
            st.started = true;
        }

        let interval = self.inner.config.eviction_run_interval;
        if !interval.is_zero() {
            let weak = Arc::downgrade(&self.inner);
            let stop = self.inner.evictor_stop.clone();
            tokio::spawn(async move {
                loop {
                    tokio::select! {
                        () = stop.cancelled() => break,
                        () = tokio::time::sleep(interval) => {}
                    }
                    let Some(inner) = weak.upgrade() else { break };
                    inner.run_eviction_sweep();
                }
            });
        }

        self.inner.ensure_minimum();
    }

    /// Acquire a resource at the default (highest) priority.
    pub async fn acquire(&self) -> Result<Pooled<F::Resource>> {
        self.acquire_with_priority(0).await
    }

    /// Acquire a resource, queueing at `priority` if none is free.
    ///
    /// Priorities outside `[0, priority_range)` are clamped to the lowest.
    ///
    /// # Errors
    /// `Draining` if the pool is shutting down, `QueueFull` when the waiter
    /// cap is hit with no spare capacity, `Timeout` when `acquire_timeout`
    /// elapses first.
    pub async fn acquire_with_priority(&self, priority: usize) -> Result<Pooled<F::Resource>> {
        let inner = &self.inner;
        let request_id = inner.next_request_id.fetch_add(1, Ordering::Relaxed);

        let (mut future, deadline) = {
            let mut st = inner.state.lock();
            if st.draining {
                return Err(Error::Draining);
            }
            if let Some(limit) = inner.config.max_waiting_clients {
                let spare = inner.config.max.saturating_sub(st.all.len() + st.creating);
                if spare < 1 && st.available.is_empty() && st.waiters.len() >= limit {
                    return Err(Error::QueueFull {
                        waiters: st.waiters.len(),
                        max_waiting: limit,
                    });
                }
            }
            let (request, future) = Request::new(request_id);
            let deadline = inner.config.acquire_timeout.map(|t| request.deadline(t));
            st.waiters.enqueue(request, priority);
            (future, deadline)
        };
        inner.dispense();

        let Some(deadline) = deadline else {
            return future.await;
        };
        match tokio::time::timeout_at(deadline, &mut future).await {
            Ok(result) => result,
            Err(_elapsed) => {
                let timeout = inner
                    .config
                    .acquire_timeout
                    .expect("deadline implies a configured timeout");
                if let Some(mut request) = inner.state.lock().waiters.remove(request_id) {
                    // Still pending: reject it and withdraw from the queue.
                    request.reject(Error::timeout(timeout));
                    inner.changed.notify_waiters();
                }
                // Otherwise dispatch beat the timer: the resolution happened
                // under the state lock before the request could be withdrawn,
                // so the completion is already settled either way.
                match future.try_settle() {
                    Some(result) => result,
                    None => Err(Error::timeout(timeout)),
                }
            }
        }
    }

    /// Return a borrowed resource to the pool.
    ///
    /// With `test_on_return` the resource is validated out-of-band after this
    /// returns; a failed validation destroys it.
    ///
    /// # Errors
    /// `UnknownResource` if the handle has no active loan here (e.g. it came
    /// from a different pool). The handle is then reclaimed by its own pool.
    pub async fn release(&self, handle: Pooled<F::Resource>) -> Result<()> {
        let inner = &self.inner;
        let validate = {
            let mut st = inner.state.lock();
            if !st.loans.contains_key(&handle.id()) {
                return Err(Error::UnknownResource);
            }
            let (id, value) = handle.take_parts();
            let mut loan = st.loans.remove(&id).expect("presence checked above");
            loan.settle();
            st.counters.total_releases += 1;

            let rec = st.all.get_mut(&id).expect("loaned resource is tracked");
            rec.returning();
            if inner.config.test_on_return {
                rec.begin_return_validation();
                st.validating += 1;
                Some((id, value))
            } else {
                rec.make_idle(value);
                Self::add_available(&mut st, inner.config.fifo, id);
                None
            }
        };
        if let Some((id, value)) = validate {
            inner.spawn_return_validation(id, value);
        }
        inner.changed.notify_waiters();
        inner.dispense();
        Ok(())
    }

    /// Return a borrowed resource for destruction instead of reuse.
    ///
    /// # Errors
    /// `UnknownResource` if the handle has no active loan here.
    pub async fn destroy(&self, handle: Pooled<F::Resource>) -> Result<()> {
        let inner = &self.inner;
        let value = {
            let mut st = inner.state.lock();
            if !st.loans.contains_key(&handle.id()) {
                return Err(Error::UnknownResource);
            }
            let (id, value) = handle.take_parts();
            let mut loan = st.loans.remove(&id).expect("presence checked above");
            loan.settle();
            let mut rec = st.all.remove(&id).expect("loaned resource is tracked");
            rec.invalidate();
            st.destroying += 1;
            value
        };
        inner.spawn_destroy(value);
        inner.changed.notify_waiters();
        inner.dispense();
        Ok(())
    }

    /// Acquire a resource, run `work` on it, then release on success or
    /// destroy on failure, propagating `work`'s result.
    pub async fn run<U>(
        &self,
        work: impl for<'a> FnOnce(&'a mut F::Resource) -> BoxFuture<'a, Result<U>>,
    ) -> Result<U> {
        self.run_with_priority(work, 0).await
    }

    /// [`run`](Self::run) with an explicit queue priority.
    pub async fn run_with_priority<U>(
        &self,
        work: impl for<'a> FnOnce(&'a mut F::Resource) -> BoxFuture<'a, Result<U>>,
        priority: usize,
    ) -> Result<U> {
        let mut handle = self.acquire_with_priority(priority).await?;
        match work(&mut *handle).await {
            Ok(value) => {
                self.release(handle).await?;
                Ok(value)
            }
            Err(error) => {
                self.destroy(handle).await?;
                Err(error)
            }
        }
    }

    /// True if `handle` is an active loan from this pool.
    pub fn is_borrowed(&self, handle: &Pooled<F::Resource>) -> bool {
        self.inner.state.lock().loans.contains_key(&handle.id())
    }

    /// Resolves once the idle cache holds at least `min` resources.
    pub async fn ready(&self) {
        let min = self.inner.config.min;
        self.inner
            .wait_until(|st| st.available.len() >= min)
            .await;
    }

    /// Gracefully shut the pool down.
    ///
    /// Stops accepting acquires, de-schedules the evictor, waits for every
    /// queued waiter to settle (they may still be served by returned
    /// resources), then waits for all outstanding loans to come back.
    pub async fn drain(&self) {
        let inner = &self.inner;
        inner.state.lock().draining = true;
        inner.evictor_stop.cancel();
        inner.changed.notify_waiters();

        #[cfg(feature = "tracing")]
        tracing::debug!("pool draining");

        inner
            .wait_until(|st| {
                st.waiters.purge_canceled();
                st.waiters.is_empty()
            })
            .await;

        let observers: Vec<_> = {
            let mut st = inner.state.lock();
            st.loans.values_mut().filter_map(Loan::take_observer).collect()
        };
        // Each observer settles on release, destroy, or loan teardown; a
        // failed loan counts as settled and does not short-circuit the rest.
        let _ = futures::future::join_all(observers).await;
    }

    /// Destroy every idle resource.
    ///
    /// Waits for in-flight creations to settle first and for the resulting
    /// destroys to finish afterwards. Unless the pool is draining, the
    /// minimum is replenished again once the cache is empty.
    pub async fn clear(&self) {
        let inner = &self.inner;
        inner.wait_until(|st| st.creating == 0).await;

        let condemned: Vec<F::Resource> = {
            let mut st = inner.state.lock();
            let mut values = Vec::with_capacity(st.available.len());
            while let Some(id) = st.available.shift() {
                let mut rec = st.all.remove(&id).expect("idle entries are tracked");
                rec.invalidate();
                values.push(rec.take_value());
                st.destroying += 1;
            }
            values
        };
        for value in condemned {
            inner.spawn_destroy(value);
        }
        inner.changed.notify_waiters();
        inner.wait_until(|st| st.destroying == 0).await;

        if !inner.state.lock().draining {
            inner.ensure_minimum();
        }
    }

    /// Subscribe to factory-error events.
    pub fn subscribe(&self) -> broadcast::Receiver<PoolEvent> {
        self.inner.events.subscribe()
    }

    // -- Introspection -------------------------------------------------------

    /// Live resources plus in-flight creations.
    pub fn size(&self) -> usize {
        let st = self.inner.state.lock();
        st.all.len() + st.creating
    }

    /// Idle resources ready to dispense.
    pub fn available(&self) -> usize {
        self.inner.state.lock().available.len()
    }

    /// Resources currently out on loan.
    pub fn borrowed(&self) -> usize {
        self.inner.state.lock().loans.len()
    }

    /// Acquire requests waiting in the queue.
    pub fn pending(&self) -> usize {
        self.inner.state.lock().waiters.len()
    }

    /// Room left before the pool hits `max`.
    pub fn spare_capacity(&self) -> usize {
        let st = self.inner.state.lock();
        self.inner.config.max.saturating_sub(st.all.len() + st.creating)
    }

    /// The configured ceiling.
    #[must_use]
    pub fn max(&self) -> usize {
        self.inner.config.max
    }

    /// The configured floor.
    #[must_use]
    pub fn min(&self) -> usize {
        self.inner.config.min
    }

    /// True once [`drain`](Self::drain) has begun.
    pub fn is_draining(&self) -> bool {
        self.inner.state.lock().draining
    }

    /// Snapshot of gauges and lifetime counters.
    #[must_use]
    pub fn stats(&self) -> PoolStats {
        let st = self.inner.state.lock();
        PoolStats {
            size: st.all.len() + st.creating,
            available: st.available.len(),
            borrowed: st.loans.len(),
            pending: st.waiters.len(),
            validating: st.validating,
            spare_capacity: self.inner.config.max.saturating_sub(st.all.len() + st.creating),
            total_acquisitions: st.counters.total_acquisitions,
            total_releases: st.counters.total_releases,
            created: st.counters.created,
            destroyed: st.counters.destroyed,
        }
    }

    fn add_available(st: &mut PoolState<F::Resource>, fifo: bool, id: u64) {
        if fifo {
            st.available.push_back(id);
        } else {
            st.available.push_front(id);
        }
    }
}

// ---------------------------------------------------------------------------
// Engine internals
// ---------------------------------------------------------------------------

impl<F: Factory> PoolInner<F> {
    /// Block until `ready` returns true, re-checking after every state
    /// change. The check runs under the state lock.
    async fn wait_until(&self, mut ready: impl FnMut(&mut PoolState<F::Resource>) -> bool) {
        loop {
            let notified = self.changed.notified();
            tokio::pin!(notified);
            // Register for wakeups before checking, so a notification landing
            // between the check and the await is not lost.
            notified.as_mut().enable();
            if ready(&mut self.state.lock()) {
                return;
            }
            notified.await;
        }
    }

    /// Match waiters to resources: start however many creations fit under
    /// `max`, then route idle resources to waiters, through validation when
    /// `test_on_borrow` is set.
    ///
    /// Invoked after every event that could unblock a waiter.
    fn dispense(self: &Arc<Self>) {
        let mut to_validate: Vec<(u64, F::Resource)> = Vec::new();
        let mut creations = 0;
        {
            let mut st = self.state.lock();
            st.waiters.purge_canceled();
            let waiting = st.waiters.len();
            if waiting > 0 {
                let potential = st.available.len() + st.testing_on_borrow.len() + st.creating;
                let shortfall = waiting.saturating_sub(potential);
                let spare = self.config.max.saturating_sub(st.all.len() + st.creating);
                creations = if st.draining { 0 } else { spare.min(shortfall) };
                st.creating += creations;

                if self.config.test_on_borrow {
                    let need = waiting.saturating_sub(st.testing_on_borrow.len());
                    let moves = st.available.len().min(need);
                    for _ in 0..moves {
                        let id = st.available.shift().expect("count checked above");
                        let rec = st.all.get_mut(&id).expect("idle entries are tracked");
                        rec.test();
                        let value = rec.take_value();
                        st.testing_on_borrow.insert(id);
                        st.validating += 1;
                        to_validate.push((id, value));
                    }
                } else {
                    let dispatches = st.available.len().min(waiting);
                    for _ in 0..dispatches {
                        let id = st.available.shift().expect("count checked above");
                        let value = st
                            .all
                            .get_mut(&id)
                            .expect("idle entries are tracked")
                            .take_value();
                        self.dispatch_to_next_waiter(&mut st, id, value);
                    }
                }
            }
        }
        self.changed.notify_waiters();
        for _ in 0..creations {
            self.spawn_create();
        }
        for (id, value) in to_validate {
            self.spawn_borrow_validation(id, value);
        }
    }

    /// Hand a resource to the next live waiter, or return it to the head of
    /// the idle cache when every remaining waiter has given up.
    fn dispatch_to_next_waiter(
        self: &Arc<Self>,
        st: &mut PoolState<F::Resource>,
        id: u64,
        mut value: F::Resource,
    ) {
        loop {
            let Some(mut request) = st.waiters.dequeue() else {
                let rec = st.all.get_mut(&id).expect("dispatched resource is tracked");
                rec.make_idle(value);
                st.available.push_front(id);
                return;
            };
            if request.is_canceled() {
                continue;
            }
            match request.resolve(self.make_handle(id, value)) {
                Ok(()) => {
                    let rec = st.all.get_mut(&id).expect("dispatched resource is tracked");
                    rec.allocate();
                    st.loans.insert(id, Loan::new());
                    st.counters.total_acquisitions += 1;
                    return;
                }
                Err(handle) => {
                    // The issuer vanished between the liveness check and the
                    // send; recover the resource and try the next waiter.
                    let (_, recovered) = handle.take_parts();
                    value = recovered;
                }
            }
        }
    }

    fn make_handle(self: &Arc<Self>, id: u64, value: F::Resource) -> Pooled<F::Resource> {
        let inner = Arc::clone(self);
        Pooled::new(id, value, move |id, value| inner.reclaim_dropped(id, value))
    }

    /// A borrower dropped its handle instead of releasing it. The resource
    /// cannot be trusted back into circulation, so it is destroyed.
    fn reclaim_dropped(self: &Arc<Self>, id: u64, value: F::Resource) {
        let had_loan = {
            let mut st = self.state.lock();
            match st.loans.remove(&id) {
                Some(mut loan) => {
                    loan.settle();
                    if let Some(mut rec) = st.all.remove(&id) {
                        rec.invalidate();
                    }
                    st.destroying += 1;
                    true
                }
                None => false,
            }
        };
        if had_loan {
            #[cfg(feature = "tracing")]
            tracing::debug!(resource_id = id, "handle dropped without release; destroying");
            self.spawn_destroy(value);
            self.dispense();
        } else {
            drop(value);
        }
        self.changed.notify_waiters();
    }

    /// Creation pipeline. `creating` was already incremented by the caller
    /// so capacity accounting holds before the task starts.
    fn spawn_create(self: &Arc<Self>) {
        let inner = Arc::clone(self);
        tokio::spawn(async move {
            let result = inner.factory.create().await;
            let failure = {
                let mut st = inner.state.lock();
                st.creating -= 1;
                match result {
                    Ok(value) => {
                        let id = next_resource_id();
                        st.all.insert(id, PooledResource::new(id, value));
                        if inner.config.fifo {
                            st.available.push_back(id);
                        } else {
                            st.available.push_front(id);
                        }
                        st.counters.created += 1;
                        #[cfg(feature = "tracing")]
                        tracing::debug!(resource_id = id, "created pooled resource");
                        None
                    }
                    Err(error) => Some(error),
                }
            };
            if let Some(error) = failure {
                #[cfg(feature = "tracing")]
                tracing::debug!(error = %error, "factory create failed");
                inner.events.emit(PoolEvent::CreateError {
                    error: Arc::new(error),
                });
            }
            inner.changed.notify_waiters();
            inner.dispense();
        });
    }

    /// Destruction pipeline. The resource is already invalidated and removed
    /// from the engine; `destroying` was incremented by the caller.
    fn spawn_destroy(self: &Arc<Self>, value: F::Resource) {
        let inner = Arc::clone(self);
        tokio::spawn(async move {
            let outcome = match inner.config.destroy_timeout {
                Some(limit) => match tokio::time::timeout(limit, inner.factory.destroy(value)).await
                {
                    Ok(result) => result,
                    Err(_elapsed) => Err(Error::destroy_timeout(limit)),
                },
                None => inner.factory.destroy(value).await,
            };
            if let Err(error) = outcome {
                #[cfg(feature = "tracing")]
                tracing::debug!(error = %error, "factory destroy failed");
                inner.events.emit(PoolEvent::DestroyError {
                    error: Arc::new(error),
                });
            }
            {
                let mut st = inner.state.lock();
                st.destroying -= 1;
                st.counters.destroyed += 1;
            }
            inner.changed.notify_waiters();
            inner.ensure_minimum();
        });
    }

    /// Borrow-side validation: on success the resource goes to the next
    /// waiter, on failure it is destroyed and dispensing re-runs.
    fn spawn_borrow_validation(self: &Arc<Self>, id: u64, value: F::Resource) {
        let inner = Arc::clone(self);
        tokio::spawn(async move {
            let verdict = inner.factory.validate(&value).await;
            let condemned = {
                let mut st = inner.state.lock();
                st.testing_on_borrow.remove(&id);
                st.validating -= 1;
                match verdict {
                    Ok(true) => {
                        let rec = st.all.get_mut(&id).expect("validating resource is tracked");
                        rec.make_idle(value);
                        let value = rec.take_value();
                        inner.dispatch_to_next_waiter(&mut st, id, value);
                        None
                    }
                    Ok(false) | Err(_) => {
                        #[cfg(feature = "tracing")]
                        tracing::debug!(resource_id = id, "resource failed borrow validation");
                        let mut rec = st.all.remove(&id).expect("validating resource is tracked");
                        rec.invalidate();
                        st.destroying += 1;
                        Some(value)
                    }
                }
            };
            if let Some(value) = condemned {
                inner.spawn_destroy(value);
            }
            inner.changed.notify_waiters();
            inner.dispense();
        });
    }

    /// Return-side validation: on success the resource re-idles, on failure
    /// it is destroyed.
    fn spawn_return_validation(self: &Arc<Self>, id: u64, value: F::Resource) {
        let inner = Arc::clone(self);
        tokio::spawn(async move {
            let verdict = inner.factory.validate(&value).await;
            let condemned = {
                let mut st = inner.state.lock();
                st.validating -= 1;
                match verdict {
                    Ok(true) => {
                        let rec = st.all.get_mut(&id).expect("validating resource is tracked");
                        rec.make_idle(value);
                        if inner.config.fifo {
                            st.available.push_back(id);
                        } else {
                            st.available.push_front(id);
                        }
                        None
                    }
                    Ok(false) | Err(_) => {
                        #[cfg(feature = "tracing")]
                        tracing::debug!(resource_id = id, "resource failed return validation");
                        let mut rec = st.all.remove(&id).expect("validating resource is tracked");
                        rec.invalidate();
                        st.destroying += 1;
                        Some(value)
                    }
                }
            };
            if let Some(value) = condemned {
                inner.spawn_destroy(value);
            }
            inner.changed.notify_waiters();
            inner.dispense();
        });
    }

    /// Replenish to `min` while started and not draining.
    fn ensure_minimum(self: &Arc<Self>) {
        let to_create = {
            let mut st = self.state.lock();
            if !st.started || st.draining {
                0
            } else {
                let have = st.all.len() + st.creating;
                let need = self.config.min.saturating_sub(have);
                st.creating += need;
                need
            }
        };
        for _ in 0..to_create {
            self.spawn_create();
        }
    }

    /// One evictor tick: advance the persistent cursor up to
    /// `num_tests_per_eviction_run` steps and destroy condemned entries.
    fn run_eviction_sweep(self: &Arc<Self>) {
        let policy = EvictionPolicy {
            soft_idle_timeout: self.config.soft_idle_timeout,
            idle_timeout: self.config.idle_timeout,
            min: self.config.min,
        };
        let mut condemned: Vec<F::Resource> = Vec::new();
        {
            let mut st = self.state.lock();
            if !st.started || st.draining {
                return;
            }
            let now = Instant::now();
            for _ in 0..self.config.num_tests_per_eviction_run {
                let Some(id) = st.available.next_candidate() else {
                    break;
                };
                let rec = st.all.get(&id).expect("idle entries are tracked");
                debug_assert_eq!(rec.state(), ResourceState::Idle);
                let idle_since = rec
                    .last_idle_at()
                    .expect("idle entries carry an idle timestamp");
                if should_evict(&policy, idle_since, st.available.len(), now) {
                    st.available.remove(id);
                    let mut rec = st.all.remove(&id).expect("idle entries are tracked");
                    rec.invalidate();
                    condemned.push(rec.take_value());
                    st.destroying += 1;
                    #[cfg(feature = "tracing")]
                    tracing::trace!(resource_id = id, "evicting idle resource");
                }
            }
        }
        if !condemned.is_empty() {
            for value in condemned {
                self.spawn_destroy(value);
            }
            self.changed.notify_waiters();
        }
    }
}
