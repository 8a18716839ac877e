//! Execution buffer — pending records and their delivery lifecycle.
//!
//! Records accumulate here until a batch containing them is acknowledged by
//! the collection service. Delivery is atomic per batch: on failure the
//! whole batch is prepended back ahead of anything queued since, so nothing
//! is lost and order is preserved (at the price of possible duplicates on
//! retry). Page teardown additionally gets a fire-and-forget beacon of
//! whatever is pending.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use nudge_domain::error::NudgeError;
use nudge_domain::execution::ExecutionRecord;
use nudge_domain::id::WebsiteId;

use crate::ports::DeliveryTransport;

/// Ordered list of pending execution records.
pub struct ExecutionBuffer<T> {
    website_id: WebsiteId,
    transport: T,
    pending: Mutex<Vec<ExecutionRecord>>,
}

impl<T: DeliveryTransport> ExecutionBuffer<T> {
    /// Create an empty buffer.
    pub fn new(website_id: WebsiteId, transport: T) -> Self {
        Self {
            website_id,
            transport,
            pending: Mutex::new(Vec::new()),
        }
    }

    /// Queue a record for the next flush.
    pub fn push(&self, record: ExecutionRecord) {
        self.pending
            .lock()
            .expect("buffer lock poisoned")
            .push(record);
    }

    /// Number of records currently pending.
    #[must_use]
    pub fn pending_len(&self) -> usize {
        self.pending.lock().expect("buffer lock poisoned").len()
    }

    /// Deliver everything pending as one batch.
    ///
    /// Returns the number of records delivered; `0` when the buffer was
    /// empty. On failure the entire batch is requeued ahead of records
    /// pushed while the delivery was in flight.
    ///
    /// # Errors
    ///
    /// Propagates the transport error after requeuing the batch.
    #[tracing::instrument(skip(self))]
    pub async fn flush(&self) -> Result<usize, NudgeError> {
        let batch = {
            let mut pending = self.pending.lock().expect("buffer lock poisoned");
            if pending.is_empty() {
                return Ok(0);
            }
            std::mem::take(&mut *pending)
        };

        match self.transport.deliver(self.website_id, &batch).await {
            Ok(()) => {
                tracing::debug!(count = batch.len(), "execution batch delivered");
                Ok(batch.len())
            }
            Err(err) => {
                tracing::warn!(count = batch.len(), error = %err,
                    "batch delivery failed; requeuing");
                let mut pending = self.pending.lock().expect("buffer lock poisoned");
                let newcomers = std::mem::take(&mut *pending);
                *pending = batch;
                pending.extend(newcomers);
                Err(err)
            }
        }
    }

    /// Fire the unload-safe beacon with everything currently pending.
    ///
    /// The buffer is not cleared: no acknowledgment is read on this path,
    /// and if the page survives, the periodic flush delivers the records
    /// properly (the collection service dedupes).
    pub fn flush_unload(&self) {
        let snapshot = self.pending.lock().expect("buffer lock poisoned").clone();
        if snapshot.is_empty() {
            return;
        }
        tracing::debug!(count = snapshot.len(), "beaconing pending executions");
        self.transport.beacon(self.website_id, snapshot);
    }
}

impl<T> ExecutionBuffer<T>
where
    T: DeliveryTransport + Send + Sync + 'static,
{
    /// Spawn the periodic flush task. Runs for the page lifetime; flush
    /// failures are already requeued, so the loop just keeps ticking.
    pub fn spawn_flush_loop(self: Arc<Self>, period: Duration) -> tokio::task::JoinHandle<()> {
        let buffer = self;
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            // The first tick completes immediately; skip it so the first
            // real flush happens one full period after startup.
            interval.tick().await;
            loop {
                interval.tick().await;
                let _ = buffer.flush().await;
            }
        })
    }
}
