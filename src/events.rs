//! Factory-error event broadcasting
//!
//! Factory create/destroy failures are consumed by the engine (they never
//! poison a caller's acquire) and re-published here for operators, backed by
//! `tokio::sync::broadcast`.

use std::sync::Arc;

use tokio::sync::broadcast;

use crate::error::Error;

/// Events emitted when a factory operation fails.
///
/// Errors are shared behind `Arc` so every subscriber receives the same
/// underlying error.
#[derive(Debug, Clone)]
pub enum PoolEvent {
    /// `factory.create` failed; the capacity slot was released and
    /// dispensing re-ran.
    CreateError {
        /// The creation failure.
        error: Arc<Error>,
    },
    /// `factory.destroy` failed or exceeded the destroy timeout. The
    /// resource was already removed from the pool either way.
    DestroyError {
        /// The destruction failure.
        error: Arc<Error>,
    },
}

/// Broadcast-based event bus for factory errors.
///
/// Emission is fire-and-forget: with no subscribers, or with the channel
/// full, events are dropped rather than applying backpressure to the engine.
pub(crate) struct EventBus {
    sender: broadcast::Sender<PoolEvent>,
}

impl EventBus {
    pub(crate) fn new(buffer_size: usize) -> Self {
        let (sender, _) = broadcast::channel(buffer_size);
        Self { sender }
    }

    pub(crate) fn emit(&self, event: PoolEvent) {
        // Ignore the error — it just means there are no active receivers.
        let _ = self.sender.send(event);
    }

    pub(crate) fn subscribe(&self) -> broadcast::Receiver<PoolEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(1024)
    }
}
