//! One-shot completion primitive
//!
//! A [`Deferred`] is a pending handle that can be completed exactly once with
//! a value or an error. The matching [`DeferredFuture`] is the read side an
//! observer awaits. Completion is idempotent: only the first `resolve` or
//! `reject` takes effect.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::sync::oneshot;

use crate::error::{Error, Result};

/// The write side of a one-shot completion.
pub(crate) struct Deferred<V> {
    tx: Option<oneshot::Sender<Result<V>>>,
}

/// The read side of a one-shot completion.
///
/// Resolves to the value or error passed to the [`Deferred`]. If the write
/// side is dropped without completing, resolves to an internal error.
pub(crate) struct DeferredFuture<V> {
    rx: oneshot::Receiver<Result<V>>,
}

impl<V> Deferred<V> {
    /// Create a connected write/read pair.
    pub(crate) fn new() -> (Self, DeferredFuture<V>) {
        let (tx, rx) = oneshot::channel();
        (Self { tx: Some(tx) }, DeferredFuture { rx })
    }

    /// Complete with a value.
    ///
    /// Returns the value back if the completion did not take effect: either
    /// this deferred already completed, or the observer is gone.
    pub(crate) fn resolve(&mut self, value: V) -> std::result::Result<(), V> {
        match self.tx.take() {
            Some(tx) => tx.send(Ok(value)).map_err(|sent| match sent {
                Ok(v) => v,
                Err(_) => unreachable!("send returns the payload it was given"),
            }),
            None => Err(value),
        }
    }

    /// Complete with an error. No-op if already completed.
    pub(crate) fn reject(&mut self, error: Error) {
        if let Some(tx) = self.tx.take() {
            let _ = tx.send(Err(error));
        }
    }

    /// True if the observer has stopped waiting (its future was dropped).
    pub(crate) fn is_canceled(&self) -> bool {
        match &self.tx {
            Some(tx) => tx.is_closed(),
            None => false,
        }
    }
}

impl<V> DeferredFuture<V> {
    /// Take the settled value without awaiting, if completion has already
    /// happened. Used to recover a value that raced a timeout.
    pub(crate) fn try_settle(&mut self) -> Option<Result<V>> {
        self.rx.try_recv().ok()
    }
}

impl<V> Future for DeferredFuture<V> {
    type Output = Result<V>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match Pin::new(&mut self.rx).poll(cx) {
            Poll::Ready(Ok(result)) => Poll::Ready(result),
            Poll::Ready(Err(_closed)) => {
                Poll::Ready(Err(Error::internal("request abandoned by the pool")))
            }
            Poll::Pending => Poll::Pending,
        }
    }
}
