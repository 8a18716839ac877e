//! In-process signal bus backed by a tokio broadcast channel.

use std::future::Future;

use tokio::sync::broadcast;

use nudge_domain::error::NudgeError;
use nudge_domain::signal::EngineSignal;

use crate::ports::SignalPublisher;

/// In-process diagnostics bus using a tokio [`broadcast`] channel.
///
/// Publishing succeeds even when there are no active subscribers
/// (the signal is simply dropped).
pub struct InProcessSignalBus {
    sender: broadcast::Sender<EngineSignal>,
}

impl InProcessSignalBus {
    /// Create a new bus with the given channel capacity.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Subscribe to signals on this bus.
    ///
    /// Returns a receiver that will get all signals published *after*
    /// the subscription is created.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<EngineSignal> {
        self.sender.subscribe()
    }
}

impl SignalPublisher for InProcessSignalBus {
    fn publish(
        &self,
        signal: EngineSignal,
    ) -> impl Future<Output = Result<(), NudgeError>> + Send {
        // broadcast::send fails only when there are zero receivers,
        // which is fine — we simply ignore the error.
        let _ = self.sender.send(signal);
        async { Ok(()) }
    }
}
