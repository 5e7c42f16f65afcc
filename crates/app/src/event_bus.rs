//! In-process journal bus backed by a tokio broadcast channel.

use std::future::Future;

use tokio::sync::broadcast;

use homesim_domain::error::SimError;
use homesim_domain::event::SimEvent;

use crate::ports::EventPublisher;

/// In-process journal bus using a tokio [`broadcast`] channel.
///
/// Publishing succeeds even when there are no active subscribers
/// (the record is simply dropped). Slow subscribers observe
/// [`broadcast::error::RecvError::Lagged`] and skip ahead.
pub struct InProcessEventBus {
    sender: broadcast::Sender<SimEvent>,
}

impl InProcessEventBus {
    /// Create a new bus with the given channel capacity.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Subscribe to records on this bus.
    ///
    /// Returns a receiver that will get all records published *after*
    /// the subscription is created.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<SimEvent> {
        self.sender.subscribe()
    }
}

impl EventPublisher for InProcessEventBus {
    fn publish(&self, event: SimEvent) -> impl Future<Output = Result<(), SimError>> + Send {
        // send only fails without receivers
        let _ = self.sender.send(event);
        async { Ok(()) }
    }
}
