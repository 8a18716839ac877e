//! End-to-end smoke tests for the fully wired engine.
//!
//! Each test assembles the real engine with the headless platform
//! adapters (in-memory storage, cookie jar, recording surface, offline
//! network doubles) and drives behavior events through the whole
//! pipeline: trigger dispatch → gates → action execution → buffered
//! delivery.

use std::sync::Arc;

use nudge_adapter_headless::{
    MemoryCookieStore, MemoryDeliverySink, MemoryKeyValueStore, RecordingSurface,
    StaticAutomationSource, SurfaceEvent,
};
use nudge_app::engine::{Engine, EngineConfig, EngineParts};
use nudge_app::signal_bus::InProcessSignalBus;
use nudge_app::trackers::ScrollTracker;
use nudge_app::visitor;
use nudge_domain::automation::{
    Action, ActionKind, Automation, Condition, ConditionKind, FrequencyPolicy, Operator, Trigger,
};
use nudge_domain::event::BehaviorEvent;
use nudge_domain::execution::ExecutionStatus;
use nudge_domain::id::{VisitorId, WebsiteId};
use nudge_domain::page::PageContext;
use url::Url;

type TestEngine = Engine<
    StaticAutomationSource,
    Arc<MemoryKeyValueStore>,
    Arc<MemoryCookieStore>,
    Arc<RecordingSurface>,
    Arc<MemoryDeliverySink>,
    Arc<InProcessSignalBus>,
>;

struct Harness {
    engine: TestEngine,
    surface: Arc<RecordingSurface>,
    sink: Arc<MemoryDeliverySink>,
}

fn page() -> PageContext {
    PageContext {
        url: Url::parse("https://shop.example.com/pricing?plan=pro").unwrap(),
        title: "Pricing".to_string(),
        referrer: "https://www.google.com/search?q=shop".to_string(),
        locale: "en-US".to_string(),
        timezone: "UTC".to_string(),
        user_agent: "Mozilla/5.0 (X11; Linux x86_64)".to_string(),
        screen_width: 1920,
        screen_height: 1080,
    }
}

async fn harness(automations: Vec<Automation>) -> Harness {
    harness_on(automations, Arc::new(MemoryKeyValueStore::new()), VisitorId::new()).await
}

async fn harness_on(
    automations: Vec<Automation>,
    store: Arc<MemoryKeyValueStore>,
    visitor_id: VisitorId,
) -> Harness {
    let surface = Arc::new(RecordingSurface::new());
    let sink = Arc::new(MemoryDeliverySink::new());
    let engine = Engine::new(
        WebsiteId::new(),
        visitor_id,
        page(),
        &EngineConfig::default(),
        EngineParts {
            source: StaticAutomationSource::new(automations),
            store: Arc::clone(&store),
            cookies: Arc::new(MemoryCookieStore::new()),
            surface: Arc::clone(&surface),
            transport: Arc::clone(&sink),
            publisher: Arc::new(InProcessSignalBus::new(256)),
        },
    );
    engine.start().await;
    Harness {
        engine,
        surface,
        sink,
    }
}

fn track(name: &str) -> Action {
    Action::new(
        ActionKind::TrackEvent,
        serde_json::json!({ "event_name": name }),
    )
}

// ---------------------------------------------------------------------------
// Full pipeline
// ---------------------------------------------------------------------------

#[tokio::test]
async fn should_run_full_pipeline_from_event_to_delivery() {
    let automation = Automation::builder()
        .name("Organic pricing modal")
        .trigger(Trigger::PageView)
        .url_filter("/pricing")
        .condition(Condition::new(
            ConditionKind::TrafficSource,
            Operator::Equals,
            serde_json::json!("organic"),
        ))
        .condition(Condition::new(
            ConditionKind::UrlParam {
                name: "plan".to_string(),
            },
            Operator::Equals,
            serde_json::json!("pro"),
        ))
        .action(Action::new(
            ActionKind::ShowModal,
            serde_json::json!({
                "headline": "Welcome to {{page_title}}",
                "primary_label": "Start trial",
                "primary_action": "redirect",
                "primary_url": "https://shop.example.com/signup"
            }),
        ))
        .build()
        .unwrap();

    let harness = harness(vec![automation]).await;
    let triggered = harness
        .engine
        .process_event(&BehaviorEvent::page_view())
        .await;
    assert_eq!(triggered.len(), 1);

    // The overlay reached the page surface, fully interpolated.
    let events = harness.surface.events();
    let SurfaceEvent::OverlayMounted(overlay) = &events[0] else {
        panic!("expected an overlay mount, got {events:?}");
    };
    assert_eq!(overlay.headline.as_deref(), Some("Welcome to Pricing"));

    // The record reached the collection service on flush.
    harness.engine.buffer().flush().await.unwrap();
    let delivered = harness.sink.delivered();
    assert_eq!(delivered.len(), 1);
    assert_eq!(delivered[0][0].status, ExecutionStatus::Success);
    assert_eq!(delivered[0][0].success_count, 1);
}

// ---------------------------------------------------------------------------
// Frequency across page reloads
// ---------------------------------------------------------------------------

#[tokio::test]
async fn should_never_rerun_once_per_visitor_across_reloads() {
    let automation = Automation::builder()
        .name("One shot")
        .trigger(Trigger::PageView)
        .frequency(FrequencyPolicy::OncePerVisitor)
        .action(track("one_shot"))
        .build()
        .unwrap();

    let store = Arc::new(MemoryKeyValueStore::new());
    let visitor_id = visitor::load_or_create(&store).await;

    let first = harness_on(vec![automation.clone()], Arc::clone(&store), visitor_id).await;
    let ran = first
        .engine
        .process_event(&BehaviorEvent::page_view())
        .await;
    assert_eq!(ran.len(), 1);

    // Fresh engine over the same persisted store: a full page reload.
    let second = harness_on(vec![automation], store, visitor_id).await;
    for _ in 0..3 {
        let ran = second
            .engine
            .process_event(&BehaviorEvent::page_view())
            .await;
        assert!(ran.is_empty());
    }
    assert_eq!(second.engine.buffer().pending_len(), 0);
}

// ---------------------------------------------------------------------------
// Scroll gating through the tracker
// ---------------------------------------------------------------------------

#[tokio::test]
async fn should_fire_scroll_automation_once_at_fifty_percent() {
    let automation = Automation::builder()
        .name("Half-way banner")
        .trigger(Trigger::ScrollDepth { percentage: 50 })
        .action(track("half_way"))
        .build()
        .unwrap();

    let harness = harness(vec![automation]).await;
    let mut tracker = ScrollTracker::new();

    let mut fired = 0;
    for depth in [10, 30, 50, 48, 50, 49, 75] {
        if let Some(event) = tracker.observe(depth) {
            fired += harness.engine.process_event(&event).await.len();
        }
    }
    assert_eq!(fired, 1);
    assert_eq!(harness.engine.buffer().pending_len(), 1);
}

// ---------------------------------------------------------------------------
// Delivery failure and requeue
// ---------------------------------------------------------------------------

#[tokio::test]
async fn should_requeue_batch_on_failure_and_redeliver_in_order() {
    let automation = Automation::builder()
        .name("Tracker")
        .trigger(Trigger::PageView)
        .action(track("seen"))
        .build()
        .unwrap();

    let harness = harness(vec![automation]).await;
    harness
        .engine
        .process_event(&BehaviorEvent::page_view())
        .await;

    harness.sink.fail_next_delivery();
    assert!(harness.engine.buffer().flush().await.is_err());
    assert_eq!(harness.engine.buffer().pending_len(), 1);

    // Another execution lands behind the requeued record.
    harness
        .engine
        .process_event(&BehaviorEvent::page_view())
        .await;
    harness.engine.buffer().flush().await.unwrap();

    let delivered = harness.sink.delivered();
    assert_eq!(delivered.len(), 1);
    assert_eq!(delivered[0].len(), 2);
}

// ---------------------------------------------------------------------------
// Unload beacon
// ---------------------------------------------------------------------------

#[tokio::test]
async fn should_beacon_pending_records_on_unload() {
    let automation = Automation::builder()
        .name("Tracker")
        .trigger(Trigger::PageView)
        .action(track("seen"))
        .build()
        .unwrap();

    let harness = harness(vec![automation]).await;
    harness
        .engine
        .process_event(&BehaviorEvent::page_view())
        .await;

    harness.engine.unload();

    let beaconed = harness.sink.beaconed();
    assert_eq!(beaconed.len(), 1);
    assert_eq!(beaconed[0].len(), 1);
    // The beacon path reads no acknowledgment, so the record stays pending
    // for the next proper flush.
    assert_eq!(harness.engine.buffer().pending_len(), 1);
}

// ---------------------------------------------------------------------------
// Cookie effects feed later conditions
// ---------------------------------------------------------------------------

#[tokio::test]
async fn should_let_set_cookie_gate_a_second_automation() {
    let marker = Automation::builder()
        .name("Mark visitor")
        .trigger(Trigger::PageView)
        .action(Action::new(
            ActionKind::SetCookie,
            serde_json::json!({ "name": "promo_seen", "value": "1" }),
        ))
        .build()
        .unwrap();
    let gated = Automation::builder()
        .name("Only without marker")
        .trigger(Trigger::ScrollDepth { percentage: 25 })
        .condition(Condition::new(
            ConditionKind::Cookie {
                name: "promo_seen".to_string(),
            },
            Operator::NotExists,
            serde_json::Value::Null,
        ))
        .action(track("fresh_visitor"))
        .build()
        .unwrap();

    let harness = harness(vec![marker, gated]).await;

    // The page view sets the cookie; the later scroll automation is
    // blocked by its not-exists condition.
    harness
        .engine
        .process_event(&BehaviorEvent::page_view())
        .await;
    let ran = harness
        .engine
        .process_event(&BehaviorEvent::scroll_depth(0, 25))
        .await;
    assert!(ran.is_empty());
}

// ---------------------------------------------------------------------------
// Registry failure is non-fatal
// ---------------------------------------------------------------------------

#[tokio::test]
async fn should_match_nothing_when_registry_is_empty() {
    let harness = harness(Vec::new()).await;
    let ran = harness
        .engine
        .process_event(&BehaviorEvent::page_view())
        .await;
    assert!(ran.is_empty());
    assert_eq!(harness.engine.buffer().pending_len(), 0);
}
