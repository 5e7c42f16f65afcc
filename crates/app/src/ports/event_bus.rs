//! Event bus port — publish journal records to interested subscribers.

use std::future::Future;

use homesim_domain::error::SimError;
use homesim_domain::event::SimEvent;

/// Publishes journal records to interested subscribers.
pub trait EventPublisher {
    /// Publish a record to all current subscribers.
    fn publish(&self, event: SimEvent) -> impl Future<Output = Result<(), SimError>> + Send;
}

impl<T: EventPublisher + Send + Sync> EventPublisher for std::sync::Arc<T> {
    fn publish(&self, event: SimEvent) -> impl Future<Output = Result<(), SimError>> + Send {
        (**self).publish(event)
    }
}
