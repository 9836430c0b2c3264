//! Loan bookkeeping for borrowed resources

use crate::deferred::{Deferred, DeferredFuture};

/// Records one outstanding borrow: a completion that settles when the
/// borrower returns the resource (or the loan is torn down). The engine's
/// loan map keys these by resource id.
///
/// `drain` takes the observer side to wait for loans to settle; everything
/// else only ever resolves the loan.
pub(crate) struct Loan {
    done: Deferred<()>,
    observer: Option<DeferredFuture<()>>,
}

impl Loan {
    pub(crate) fn new() -> Self {
        let (done, observer) = Deferred::new();
        Self {
            done,
            observer: Some(observer),
        }
    }

    /// Mark the loan complete. Idempotent.
    pub(crate) fn settle(&mut self) {
        let _ = self.done.resolve(());
    }

    /// Take the observer future, if nobody has claimed it yet. Settles with
    /// an error if the loan is dropped unresolved, which observers treat the
    /// same as completion.
    pub(crate) fn take_observer(&mut self) -> Option<DeferredFuture<()>> {
        self.observer.take()
    }
}
