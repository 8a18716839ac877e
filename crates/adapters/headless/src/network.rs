//! Offline network doubles — fixed automation source and collecting sink.

use std::future::Future;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use nudge_app::ports::{AutomationSource, DeliveryTransport};
use nudge_domain::automation::Automation;
use nudge_domain::error::NudgeError;
use nudge_domain::execution::ExecutionRecord;
use nudge_domain::id::WebsiteId;

/// `AutomationSource` serving a fixed list. Used by offline hosts and
/// integration tests.
#[derive(Debug, Default)]
pub struct StaticAutomationSource {
    automations: Vec<Automation>,
}

impl StaticAutomationSource {
    /// Serve the given definitions.
    #[must_use]
    pub fn new(automations: Vec<Automation>) -> Self {
        Self { automations }
    }

    /// Serve nothing; the engine runs but matches no events.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }
}

impl AutomationSource for StaticAutomationSource {
    fn fetch_active(
        &self,
        _website_id: WebsiteId,
    ) -> impl Future<Output = Result<Vec<Automation>, NudgeError>> + Send {
        let automations = self.automations.clone();
        async { Ok(automations) }
    }
}

/// `DeliveryTransport` that collects batches in memory.
///
/// [`fail_next_delivery`](Self::fail_next_delivery) injects one delivery
/// failure, for exercising the buffer's requeue path.
#[derive(Debug, Default)]
pub struct MemoryDeliverySink {
    delivered: Mutex<Vec<Vec<ExecutionRecord>>>,
    beaconed: Mutex<Vec<Vec<ExecutionRecord>>>,
    fail_next: AtomicBool,
}

impl MemoryDeliverySink {
    /// Create an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `deliver` call fail once.
    pub fn fail_next_delivery(&self) {
        self.fail_next.store(true, Ordering::SeqCst);
    }

    /// Batches delivered through the acknowledged path.
    #[must_use]
    pub fn delivered(&self) -> Vec<Vec<ExecutionRecord>> {
        self.delivered.lock().expect("sink lock poisoned").clone()
    }

    /// Batches sent through the beacon path.
    #[must_use]
    pub fn beaconed(&self) -> Vec<Vec<ExecutionRecord>> {
        self.beaconed.lock().expect("sink lock poisoned").clone()
    }
}

impl DeliveryTransport for MemoryDeliverySink {
    fn deliver(
        &self,
        _website_id: WebsiteId,
        records: &[ExecutionRecord],
    ) -> impl Future<Output = Result<(), NudgeError>> + Send {
        let result = if self.fail_next.swap(false, Ordering::SeqCst) {
            Err(NudgeError::platform(std::io::Error::other(
                "injected delivery failure",
            )))
        } else {
            self.delivered
                .lock()
                .expect("sink lock poisoned")
                .push(records.to_vec());
            Ok(())
        };
        async { result }
    }

    fn beacon(&self, _website_id: WebsiteId, records: Vec<ExecutionRecord>) {
        self.beaconed
            .lock()
            .expect("sink lock poisoned")
            .push(records);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nudge_domain::execution::ExecutionStatus;
    use nudge_domain::id::{AutomationId, SessionId, VisitorId};
    use nudge_domain::time;

    fn record() -> ExecutionRecord {
        ExecutionRecord {
            automation_id: AutomationId::new(),
            website_id: WebsiteId::new(),
            visitor_id: VisitorId::new(),
            session_id: SessionId::new(),
            status: ExecutionStatus::Success,
            success_count: 1,
            failure_count: 0,
            execution_data: serde_json::json!({}),
            executed_at: time::now(),
        }
    }

    #[tokio::test]
    async fn should_serve_fixed_automations() {
        let source = StaticAutomationSource::empty();
        let fetched = source.fetch_active(WebsiteId::new()).await.unwrap();
        assert!(fetched.is_empty());
    }

    #[tokio::test]
    async fn should_fail_delivery_exactly_once_when_injected() {
        let sink = MemoryDeliverySink::new();
        sink.fail_next_delivery();

        let website = WebsiteId::new();
        assert!(sink.deliver(website, &[record()]).await.is_err());
        assert!(sink.deliver(website, &[record()]).await.is_ok());
        assert_eq!(sink.delivered().len(), 1);
    }

    #[tokio::test]
    async fn should_collect_beaconed_batches_separately() {
        let sink = MemoryDeliverySink::new();
        sink.beacon(WebsiteId::new(), vec![record()]);
        assert_eq!(sink.beaconed().len(), 1);
        assert!(sink.delivered().is_empty());
    }
}
