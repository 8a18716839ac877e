//! # nudged — nudge session runner
//!
//! Composition root that wires the engine with its adapters and replays a
//! visitor session against the loaded automations.
//!
//! ## Responsibilities
//! - Parse configuration (TOML file, env vars)
//! - Construct the platform adapters (headless surface and storage, HTTP
//!   or offline network)
//! - Construct the engine, injecting adapters via port traits
//! - Load the automation registry and start the periodic buffer flush
//! - Read behavior events as JSON lines on stdin and dispatch them; print
//!   emitted engine signals as JSON lines on stdout
//! - Handle graceful shutdown (ctrl-c or stdin EOF → unload-safe flush,
//!   the page-teardown analogue)
//!
//! ## Replay protocol
//!
//! One JSON object per stdin line, e.g.:
//!
//! ```text
//! {"kind": "page_view", "url": "https://example.com/pricing"}
//! {"kind": "scroll", "depth": 55}
//! {"kind": "wait", "seconds": 30}
//! {"kind": "custom_event", "name": "signup_clicked"}
//! ```
//!
//! `wait` advances the time-on-page clock and the inactivity watchdog by
//! virtual seconds, so replays are deterministic.
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates.
//! It is the wiring layer — no domain logic belongs here.

mod config;

use std::sync::Arc;

use serde::Deserialize;
use tokio::io::AsyncBufReadExt;
use tracing_subscriber::EnvFilter;

use nudge_adapter_headless::{
    MemoryCookieStore, MemoryDeliverySink, MemoryKeyValueStore, RecordingSurface,
    StaticAutomationSource,
};
use nudge_adapter_http_reqwest::dto::AutomationsResponse;
use nudge_adapter_http_reqwest::{
    HttpAutomationSource, HttpDeliveryTransport, convert_payloads,
};
use nudge_app::engine::{Engine, EngineParts};
use nudge_app::ports::{AutomationSource, DeliveryTransport};
use nudge_app::signal_bus::InProcessSignalBus;
use nudge_app::trackers::{Countdown, InactivityWatchdog, ScrollTracker};
use nudge_app::visitor;
use nudge_domain::event::{BehaviorEvent, EventKind};

use config::Config;

type SessionEngine<S, D> = Engine<
    S,
    Arc<MemoryKeyValueStore>,
    Arc<MemoryCookieStore>,
    Arc<RecordingSurface>,
    D,
    Arc<InProcessSignalBus>,
>;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load()?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&config.logging.filter))
        .with_writer(std::io::stderr)
        .init();

    let website_id = config.website_id();
    let page = config.page_context()?;

    // Headless platform: storage, cookies, and a recording page surface.
    let store = Arc::new(MemoryKeyValueStore::new());
    let cookies = Arc::new(MemoryCookieStore::new());
    let surface = Arc::new(RecordingSurface::new());
    let bus = Arc::new(InProcessSignalBus::new(256));
    spawn_signal_printer(&bus);

    let visitor_id = visitor::load_or_create(&store).await;
    tracing::info!(%website_id, %visitor_id, offline = config.api.offline, "starting session");

    if config.api.offline {
        let source = StaticAutomationSource::new(load_offline_automations(&config)?);
        let transport = Arc::new(MemoryDeliverySink::new());
        let engine = Engine::new(
            website_id,
            visitor_id,
            page,
            &config.engine_config(),
            EngineParts {
                source,
                store,
                cookies,
                surface,
                transport,
                publisher: bus,
            },
        );
        run_session(&engine, &config).await
    } else {
        let http = config.http_config();
        let engine = Engine::new(
            website_id,
            visitor_id,
            page,
            &config.engine_config(),
            EngineParts {
                source: HttpAutomationSource::new(&http)?,
                store,
                cookies,
                surface,
                transport: HttpDeliveryTransport::new(&http)?,
                publisher: bus,
            },
        );
        run_session(&engine, &config).await
    }
}

/// One line of the stdin replay protocol.
#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum ReplayLine {
    PageView {
        url: Option<String>,
        title: Option<String>,
    },
    /// Raw scroll-depth sample in percent; band gating happens here.
    Scroll {
        depth: u32,
    },
    /// Generic visitor interaction (click, keypress).
    Activity,
    CustomEvent {
        name: String,
        #[serde(default)]
        properties: serde_json::Value,
    },
    FormSubmit,
    ExitIntent,
    FunnelDropoff {
        funnel_id: Option<String>,
    },
    FunnelComplete {
        funnel_id: Option<String>,
    },
    GoalCompleted {
        goal_id: Option<String>,
    },
    /// Advance the clocks by virtual seconds.
    Wait {
        seconds: u64,
    },
}

async fn run_session<S, D>(engine: &SessionEngine<S, D>, config: &Config) -> anyhow::Result<()>
where
    S: AutomationSource,
    D: DeliveryTransport + Send + Sync + 'static,
{
    engine.start().await;
    let flush_task = engine
        .buffer()
        .spawn_flush_loop(config.engine_config().flush_interval);

    // The shared page clock exists only when a time trigger needs it.
    let mut countdown = Countdown::for_thresholds(engine.time_thresholds());
    let mut watchdog = InactivityWatchdog::new(engine.inactivity_thresholds());
    let mut scroll = ScrollTracker::new();

    // The session opens with its first page view.
    engine.process_event(&BehaviorEvent::page_view()).await;

    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    let mut lines = stdin.lines();

    loop {
        tokio::select! {
            line = lines.next_line() => match line? {
                Some(line) if line.trim().is_empty() => {}
                Some(line) => {
                    match serde_json::from_str::<ReplayLine>(&line) {
                        Ok(replay) => {
                            replay_step(engine, replay, &mut scroll, &mut countdown, &mut watchdog)
                                .await;
                        }
                        Err(err) => tracing::warn!(error = %err, line, "skipping bad replay line"),
                    }
                }
                None => break,
            },
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    // Page teardown: beacon whatever is still pending, give the detached
    // send a moment to get on the wire.
    engine.unload();
    tokio::time::sleep(std::time::Duration::from_millis(200)).await;
    flush_task.abort();

    tracing::info!(pending = engine.buffer().pending_len(), "session ended");
    Ok(())
}

async fn replay_step<S, D>(
    engine: &SessionEngine<S, D>,
    replay: ReplayLine,
    scroll: &mut ScrollTracker,
    countdown: &mut Option<Countdown>,
    watchdog: &mut InactivityWatchdog,
) where
    S: AutomationSource,
    D: DeliveryTransport + Send + Sync + 'static,
{
    match replay {
        ReplayLine::PageView { url, title } => {
            let event = BehaviorEvent::new(
                EventKind::PageView,
                serde_json::json!({ "url": url, "title": title }),
            );
            engine.process_event(&event).await;
        }
        ReplayLine::Scroll { depth } => {
            engine.record_activity();
            watchdog.record_activity();
            if let Some(event) = scroll.observe(depth) {
                engine.process_event(&event).await;
            }
        }
        ReplayLine::Activity => {
            engine.record_activity();
            watchdog.record_activity();
        }
        ReplayLine::CustomEvent { name, properties } => {
            engine.record_activity();
            watchdog.record_activity();
            engine
                .process_event(&BehaviorEvent::custom(&name, properties))
                .await;
        }
        ReplayLine::FormSubmit => {
            engine.record_activity();
            watchdog.record_activity();
            engine
                .process_event(&BehaviorEvent::new(
                    EventKind::FormSubmit,
                    serde_json::json!({}),
                ))
                .await;
        }
        ReplayLine::ExitIntent => {
            engine
                .process_event(&BehaviorEvent::new(
                    EventKind::ExitIntent,
                    serde_json::json!({}),
                ))
                .await;
        }
        ReplayLine::FunnelDropoff { funnel_id } => {
            engine
                .process_event(&BehaviorEvent::new(
                    EventKind::FunnelDropoff,
                    serde_json::json!({ "funnel_id": funnel_id }),
                ))
                .await;
        }
        ReplayLine::FunnelComplete { funnel_id } => {
            engine
                .process_event(&BehaviorEvent::new(
                    EventKind::FunnelComplete,
                    serde_json::json!({ "funnel_id": funnel_id }),
                ))
                .await;
        }
        ReplayLine::GoalCompleted { goal_id } => {
            engine
                .process_event(&BehaviorEvent::new(
                    EventKind::GoalCompleted,
                    serde_json::json!({ "goal_id": goal_id }),
                ))
                .await;
        }
        ReplayLine::Wait { seconds } => {
            for _ in 0..seconds {
                if let Some(clock) = countdown.as_mut() {
                    if let Some(event) = clock.tick() {
                        engine.process_event(&event).await;
                    }
                }
                if let Some(event) = watchdog.tick() {
                    engine.process_event(&event).await;
                }
            }
            // Drop the clock once it has run out.
            if countdown.as_ref().is_some_and(Countdown::finished) {
                *countdown = None;
            }
        }
    }
}

/// Mirror every engine signal to stdout as a JSON line, the headless
/// stand-in for a diagnostics panel.
fn spawn_signal_printer(bus: &Arc<InProcessSignalBus>) {
    let mut rx = bus.subscribe();
    tokio::spawn(async move {
        while let Ok(signal) = rx.recv().await {
            match serde_json::to_string(&signal) {
                Ok(json) => println!("{json}"),
                Err(err) => tracing::warn!(error = %err, "failed to serialize signal"),
            }
        }
    });
}

/// Read the offline automations file through the same tolerant DTO layer
/// the HTTP path uses.
fn load_offline_automations(
    config: &Config,
) -> anyhow::Result<Vec<nudge_domain::automation::Automation>> {
    let Some(path) = &config.api.automations_file else {
        tracing::warn!("offline mode without automations_file; nothing will fire");
        return Ok(Vec::new());
    };
    let raw = std::fs::read_to_string(path)?;
    let response: AutomationsResponse = serde_json::from_str(&raw)?;
    Ok(convert_payloads(response.automations))
}
