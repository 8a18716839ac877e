//! Signal bus port — publish/subscribe for engine diagnostics.

use std::future::Future;
use std::sync::Arc;

use nudge_domain::error::NudgeError;
use nudge_domain::signal::EngineSignal;

/// Publishes engine signals to interested observers.
pub trait SignalPublisher {
    /// Publish a signal to all current subscribers.
    fn publish(&self, signal: EngineSignal)
    -> impl Future<Output = Result<(), NudgeError>> + Send;
}

impl<T: SignalPublisher + Send + Sync> SignalPublisher for Arc<T> {
    fn publish(
        &self,
        signal: EngineSignal,
    ) -> impl Future<Output = Result<(), NudgeError>> + Send {
        (**self).publish(signal)
    }
}
