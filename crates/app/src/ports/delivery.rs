//! Delivery port — execution-record transport to the collection service.

use std::future::Future;
use std::sync::Arc;

use nudge_domain::error::NudgeError;
use nudge_domain::execution::ExecutionRecord;
use nudge_domain::id::WebsiteId;

/// Ships execution records to the collection service.
///
/// Both paths post the same batch shape; they differ in their delivery
/// contract. `deliver` is acknowledged and may be retried by the caller.
/// `beacon` is the unload-safe path: non-blocking, fire-and-forget, with no
/// acknowledgment read — it must be safe to call while the page is being
/// torn down.
pub trait DeliveryTransport {
    /// Deliver a batch and wait for acknowledgment.
    fn deliver(
        &self,
        website_id: WebsiteId,
        records: &[ExecutionRecord],
    ) -> impl Future<Output = Result<(), NudgeError>> + Send;

    /// Best-effort, non-blocking send of a batch. Never fails, never waits.
    fn beacon(&self, website_id: WebsiteId, records: Vec<ExecutionRecord>);
}

impl<T: DeliveryTransport + Send + Sync> DeliveryTransport for Arc<T> {
    fn deliver(
        &self,
        website_id: WebsiteId,
        records: &[ExecutionRecord],
    ) -> impl Future<Output = Result<(), NudgeError>> + Send {
        (**self).deliver(website_id, records)
    }

    fn beacon(&self, website_id: WebsiteId, records: Vec<ExecutionRecord>) {
        (**self).beacon(website_id, records);
    }
}
