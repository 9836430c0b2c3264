//! Pending acquisition requests
//!
//! A [`Request`] pairs a one-shot completion with its creation time. The
//! caller that issued the acquire holds the matching [`DeferredFuture`]; the
//! engine keeps the request queued until a resource can be dispatched to it.

use std::time::{Duration, Instant};

use crate::deferred::{Deferred, DeferredFuture};
use crate::error::Error;

/// A caller waiting for a resource.
///
/// Timeouts are armed relative to the request's creation: the effective
/// delay is `max(delay - age, 0)`, so re-arming a timer later in the
/// request's life never extends the original deadline.
pub(crate) struct Request<V> {
    id: u64,
    created_at: Instant,
    deferred: Deferred<V>,
}

impl<V> Request<V> {
    /// Create a request and the future its issuer awaits.
    pub(crate) fn new(id: u64) -> (Self, DeferredFuture<V>) {
        let (deferred, future) = Deferred::new();
        (
            Self {
                id,
                created_at: Instant::now(),
                deferred,
            },
            future,
        )
    }

    pub(crate) fn id(&self) -> u64 {
        self.id
    }

    /// Absolute expiry instant for a timeout of `delay`, measured from the
    /// request's creation so that elapsed age counts against the delay.
    pub(crate) fn deadline(&self, delay: Duration) -> tokio::time::Instant {
        tokio::time::Instant::from_std(self.created_at + delay)
    }

    /// Fulfil the request. On failure the payload is handed back: the
    /// request was already settled or its issuer stopped waiting.
    pub(crate) fn resolve(&mut self, value: V) -> Result<(), V> {
        self.deferred.resolve(value)
    }

    /// Reject the request. No-op if already settled.
    pub(crate) fn reject(&mut self, error: Error) {
        self.deferred.reject(error);
    }

    /// True if the issuer dropped its future; the request can never be
    /// delivered and should be skipped at dispatch.
    pub(crate) fn is_canceled(&self) -> bool {
        self.deferred.is_canceled()
    }
}
