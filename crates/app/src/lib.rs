//! # nudge-app
//!
//! Application layer — the automation engine and **port definitions**
//! (traits).
//!
//! ## Responsibilities
//! - Define **port traits** that adapters must implement (driven/outbound
//!   ports):
//!   - `KeyValueStore` — origin-scoped persistent key-value storage
//!   - `CookieStore` — cookie read/write
//!   - `PageSurface` — overlay mounting, script injection, navigation,
//!     element visibility
//!   - `AutomationSource` — fetch the active automation definitions
//!   - `DeliveryTransport` — acknowledged batch delivery plus the
//!     unload-safe beacon path
//!   - `SignalPublisher` — diagnostics broadcast
//! - Provide the **engine components**: automation registry, frequency
//!   gate, condition evaluator, variable interpolator, action executor,
//!   execution buffer, and the dispatching [`engine::Engine`] itself
//! - Provide the **behavior trackers** (scroll depth, time on page,
//!   inactivity) that turn raw page samples into semantic events
//! - Provide **in-process infrastructure** (signal bus) that doesn't need IO
//!
//! ## Dependency rule
//! Depends on `nudge-domain` only (plus `tokio::sync` for channels and
//! `tokio::time` for scheduled delays). Never imports adapter crates.
//! Adapters depend on *this* crate, not the reverse.

pub mod buffer;
pub mod conditions;
pub mod engine;
pub mod executor;
pub mod frequency;
pub mod interpolate;
pub mod ports;
pub mod registry;
pub mod signal_bus;
pub mod trackers;
pub mod visitor;
