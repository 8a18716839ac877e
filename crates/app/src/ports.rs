//! Port definitions — traits that adapters implement.
//!
//! Ports are the boundaries between the engine core and the outside world.
//! The browser-facing surface is deliberately split into small traits (the
//! "platform adapter" of the design notes) so the engine is testable
//! without a real page and portable across hosts.

pub mod delivery;
pub mod platform;
pub mod signal_bus;
pub mod source;

pub use delivery::DeliveryTransport;
pub use platform::{
    ButtonAction, CookieStore, KeyValueStore, OverlayButton, OverlayPresentation, OverlayStyle,
    PageSurface, ScriptPlacement,
};
pub use signal_bus::SignalPublisher;
pub use source::AutomationSource;
