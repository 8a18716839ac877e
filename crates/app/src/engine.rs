//! Engine — the coordination hub tying every component together.
//!
//! One explicit context object owns the registry snapshot, frequency
//! state, condition evaluation, action execution, and the delivery
//! buffer; there are no module-level singletons. Behavior events flow in
//! through [`Engine::process_event`]; execution records flow out through
//! the buffer.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;

use nudge_domain::automation::{Automation, Trigger};
use nudge_domain::event::{BehaviorEvent, EventKind};
use nudge_domain::id::{AutomationId, VisitorId, WebsiteId};
use nudge_domain::page::PageContext;
use nudge_domain::session::SessionState;
use nudge_domain::signal::{EngineSignal, SignalKind};

use crate::buffer::ExecutionBuffer;
use crate::conditions::{ConditionEvaluator, EvaluationContext};
use crate::executor::ActionExecutor;
use crate::frequency::FrequencyGate;
use crate::ports::{
    AutomationSource, CookieStore, DeliveryTransport, KeyValueStore, PageSurface, SignalPublisher,
};
use crate::registry::AutomationRegistry;

/// Tunable engine behavior.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Preserve the observed "unknown operator passes" fallback.
    pub permissive_operators: bool,
    /// Period of the buffer's flush loop.
    pub flush_interval: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            permissive_operators: true,
            flush_interval: Duration::from_secs(10),
        }
    }
}

/// The adapter bundle the engine is wired with.
pub struct EngineParts<S, K, C, P, D, B> {
    pub source: S,
    pub store: K,
    pub cookies: C,
    pub surface: P,
    pub transport: D,
    pub publisher: B,
}

/// The automation engine for one page session.
pub struct Engine<S, K, C, P, D, B>
where
    D: DeliveryTransport,
{
    registry: AutomationRegistry<S, B>,
    gate: FrequencyGate<K>,
    evaluator: ConditionEvaluator<C>,
    executor: ActionExecutor<P, C, B>,
    buffer: Arc<ExecutionBuffer<D>>,
    publisher: B,
    page: RwLock<PageContext>,
    session: Mutex<SessionState>,
    /// Automations whose action chain is currently in flight; a second
    /// trigger of the same automation is skipped until the chain settles.
    in_flight: Mutex<HashSet<AutomationId>>,
}

impl<S, K, C, P, D, B> Engine<S, K, C, P, D, B>
where
    S: AutomationSource,
    K: KeyValueStore,
    C: CookieStore + Clone,
    P: PageSurface,
    D: DeliveryTransport,
    B: SignalPublisher + Clone,
{
    /// Wire an engine for one page session.
    pub fn new(
        website_id: WebsiteId,
        visitor_id: VisitorId,
        page: PageContext,
        config: &EngineConfig,
        parts: EngineParts<S, K, C, P, D, B>,
    ) -> Self {
        Self {
            registry: AutomationRegistry::new(
                website_id,
                parts.source,
                parts.publisher.clone(),
            ),
            gate: FrequencyGate::new(parts.store),
            evaluator: ConditionEvaluator::new(
                parts.cookies.clone(),
                config.permissive_operators,
            ),
            executor: ActionExecutor::new(
                website_id,
                parts.surface,
                parts.cookies,
                parts.publisher.clone(),
            ),
            buffer: Arc::new(ExecutionBuffer::new(website_id, parts.transport)),
            publisher: parts.publisher,
            page: RwLock::new(page),
            session: Mutex::new(SessionState::begin(visitor_id)),
            in_flight: Mutex::new(HashSet::new()),
        }
    }

    /// Load the automation registry. A failed load is non-fatal: it is
    /// logged, the engine keeps running with zero automations, and only a
    /// later [`reload`](Self::reload) retries.
    pub async fn start(&self) {
        if let Err(err) = self.registry.load().await {
            tracing::warn!(error = %err, "automation load failed; engine starts empty");
        }
    }

    /// Manually reload the automation registry.
    ///
    /// # Errors
    ///
    /// Propagates the fetch error; the previous snapshot stays in place.
    pub async fn reload(&self) -> Result<usize, nudge_domain::error::NudgeError> {
        self.registry.load().await
    }

    /// Dispatch one behavior event against the current snapshot.
    ///
    /// Returns the ids of the automations that executed.
    #[tracing::instrument(skip_all, fields(event = %event.kind))]
    pub async fn process_event(&self, event: &BehaviorEvent) -> Vec<AutomationId> {
        if event.kind == EventKind::PageView {
            self.note_page_view(event);
        }

        let snapshot = self.registry.snapshot();
        let page = self.page.read().expect("page lock poisoned").clone();
        let session = self.session.lock().expect("session lock poisoned").clone();

        let mut triggered = Vec::new();
        for automation in snapshot.iter() {
            if !automation.enabled || !automation.trigger.matches_event(event) {
                continue;
            }
            if !automation.matches_path(page.path()) {
                continue;
            }
            if !self.begin_flight(automation.id) {
                tracing::debug!(automation_id = %automation.id,
                    "action chain already in flight; skipping re-entrant trigger");
                continue;
            }
            let ran = self.dispatch(automation, event, &page, &session).await;
            self.end_flight(automation.id);
            if ran {
                triggered.push(automation.id);
            }
        }
        triggered
    }

    /// Gate and execute one matched automation.
    async fn dispatch(
        &self,
        automation: &Automation,
        event: &BehaviorEvent,
        page: &PageContext,
        session: &SessionState,
    ) -> bool {
        if !self.gate.is_eligible(automation).await {
            tracing::debug!(automation_id = %automation.id, frequency = %automation.frequency,
                "frequency gate blocked execution");
            return false;
        }

        let ctx = EvaluationContext { page, session };
        if !self.evaluator.evaluate_all(&automation.conditions, &ctx).await {
            return false;
        }

        let _ = self
            .publisher
            .publish(EngineSignal::new(
                SignalKind::TriggerFired,
                Some(automation.id),
                serde_json::json!({
                    "trigger": automation.trigger.to_string(),
                    "event": event.kind.to_string(),
                }),
            ))
            .await;

        let record = self.executor.run(automation, event, page, session).await;
        self.gate.mark_executed(automation).await;
        self.buffer.push(record);
        true
    }

    /// Record visitor interaction (click, keypress, scroll).
    pub fn record_activity(&self) {
        self.session
            .lock()
            .expect("session lock poisoned")
            .record_activity();
    }

    /// Page teardown: beacon whatever is still pending. Also the right
    /// call on visibility loss.
    pub fn unload(&self) {
        self.buffer.flush_unload();
    }

    /// The delivery buffer, for spawning the periodic flush loop.
    #[must_use]
    pub fn buffer(&self) -> Arc<ExecutionBuffer<D>> {
        Arc::clone(&self.buffer)
    }

    /// Snapshot of the current session facts.
    #[must_use]
    pub fn session_snapshot(&self) -> SessionState {
        self.session.lock().expect("session lock poisoned").clone()
    }

    /// Time-on-page thresholds of the loaded automations, for the shared
    /// countdown clock.
    #[must_use]
    pub fn time_thresholds(&self) -> Vec<u64> {
        self.registry
            .snapshot()
            .iter()
            .filter_map(|automation| match automation.trigger {
                Trigger::TimeOnPage { seconds } => Some(seconds),
                _ => None,
            })
            .collect()
    }

    /// Inactivity thresholds of the loaded automations, for the watchdog.
    #[must_use]
    pub fn inactivity_thresholds(&self) -> Vec<u64> {
        self.registry
            .snapshot()
            .iter()
            .filter_map(|automation| match automation.trigger {
                Trigger::Inactivity { seconds } => Some(seconds),
                _ => None,
            })
            .collect()
    }

    fn note_page_view(&self, event: &BehaviorEvent) {
        self.session
            .lock()
            .expect("session lock poisoned")
            .record_page_view();

        // Soft navigation: a page-view payload may carry the new location.
        let mut page = self.page.write().expect("page lock poisoned");
        if let Some(raw) = event.payload_str("url") {
            match url::Url::parse(raw) {
                Ok(parsed) => page.url = parsed,
                Err(err) => tracing::debug!(url = raw, error = %err,
                    "ignoring unparsable page-view url"),
            }
        }
        if let Some(title) = event.payload_str("title") {
            page.title = title.to_string();
        }
    }

    fn begin_flight(&self, id: AutomationId) -> bool {
        self.in_flight
            .lock()
            .expect("in-flight lock poisoned")
            .insert(id)
    }

    fn end_flight(&self, id: AutomationId) {
        self.in_flight
            .lock()
            .expect("in-flight lock poisoned")
            .remove(&id);
    }
}
