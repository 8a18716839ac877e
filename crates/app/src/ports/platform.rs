//! Platform ports — storage, cookies, and the page surface.
//!
//! These traits abstract everything the engine needs from its host page:
//! origin-scoped persistent storage, cookie access, and DOM-level effects.
//! Hosts supply real implementations; tests use the headless adapter.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use nudge_domain::error::NudgeError;

/// Origin-scoped persistent key-value storage.
///
/// Backed by `localStorage` in a browser host. Treated as fallible IO:
/// it may be unavailable or throttled, and callers must degrade gracefully.
pub trait KeyValueStore {
    /// Read a value by key.
    fn get(&self, key: &str) -> impl Future<Output = Result<Option<String>, NudgeError>> + Send;

    /// Write a value under a key, replacing any previous value.
    fn set(&self, key: &str, value: &str)
    -> impl Future<Output = Result<(), NudgeError>> + Send;

    /// Remove a key; absent keys are not an error.
    fn remove(&self, key: &str) -> impl Future<Output = Result<(), NudgeError>> + Send;
}

impl<T: KeyValueStore + Send + Sync> KeyValueStore for Arc<T> {
    fn get(&self, key: &str) -> impl Future<Output = Result<Option<String>, NudgeError>> + Send {
        (**self).get(key)
    }

    fn set(
        &self,
        key: &str,
        value: &str,
    ) -> impl Future<Output = Result<(), NudgeError>> + Send {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> impl Future<Output = Result<(), NudgeError>> + Send {
        (**self).remove(key)
    }
}

/// Cookie read/write for the current document.
pub trait CookieStore {
    /// Read a named cookie's value.
    fn get(&self, name: &str) -> impl Future<Output = Result<Option<String>, NudgeError>> + Send;

    /// Set a cookie expiring after `max_age_days` days.
    fn set(
        &self,
        name: &str,
        value: &str,
        max_age_days: u32,
    ) -> impl Future<Output = Result<(), NudgeError>> + Send;
}

impl<T: CookieStore + Send + Sync> CookieStore for Arc<T> {
    fn get(&self, name: &str) -> impl Future<Output = Result<Option<String>, NudgeError>> + Send {
        (**self).get(name)
    }

    fn set(
        &self,
        name: &str,
        value: &str,
        max_age_days: u32,
    ) -> impl Future<Output = Result<(), NudgeError>> + Send {
        (**self).set(name, value, max_age_days)
    }
}

/// Visual style of a mounted overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlayStyle {
    /// Centered with a backdrop; stays until dismissed.
    Modal,
    /// Edge-pinned bar.
    Banner,
    /// Corner notification.
    Toast,
}

/// What an overlay button does when clicked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ButtonAction {
    /// Navigate to a URL, optionally in a new tab.
    Redirect { url: String, new_tab: bool },
    /// Dismiss the overlay.
    Close,
}

/// One button on an overlay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverlayButton {
    pub label: String,
    pub action: ButtonAction,
}

/// A fully resolved overlay, ready for the host to render.
///
/// Either built from the structured fields or, when `custom_markup` is
/// present, rendered verbatim from that override.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverlayPresentation {
    pub style: OverlayStyle,
    pub headline: Option<String>,
    pub body: Option<String>,
    /// Full markup override; wins over the structured fields.
    pub custom_markup: Option<String>,
    pub primary: Option<OverlayButton>,
    pub secondary: Option<OverlayButton>,
    /// Where to pin banners/toasts, e.g. `"top"` or `"bottom-right"`.
    pub position: Option<String>,
    /// Self-dismissal delay; the host owns the timer.
    pub auto_dismiss: Option<Duration>,
}

/// Where injected script code lands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptPlacement {
    Head,
    Body,
}

/// DOM-level effects on the host page.
pub trait PageSurface {
    /// Mount an overlay (modal, banner, or toast).
    fn mount_overlay(
        &self,
        overlay: OverlayPresentation,
    ) -> impl Future<Output = Result<(), NudgeError>> + Send;

    /// Inject a script tag with literal code.
    fn inject_script(
        &self,
        code: &str,
        placement: ScriptPlacement,
    ) -> impl Future<Output = Result<(), NudgeError>> + Send;

    /// Navigate to a URL, optionally opening a new tab.
    fn navigate(
        &self,
        url: &str,
        new_tab: bool,
    ) -> impl Future<Output = Result<(), NudgeError>> + Send;

    /// Show or hide the first element matching a selector.
    fn set_visible(
        &self,
        selector: &str,
        visible: bool,
    ) -> impl Future<Output = Result<(), NudgeError>> + Send;
}

impl<T: PageSurface + Send + Sync> PageSurface for Arc<T> {
    fn mount_overlay(
        &self,
        overlay: OverlayPresentation,
    ) -> impl Future<Output = Result<(), NudgeError>> + Send {
        (**self).mount_overlay(overlay)
    }

    fn inject_script(
        &self,
        code: &str,
        placement: ScriptPlacement,
    ) -> impl Future<Output = Result<(), NudgeError>> + Send {
        (**self).inject_script(code, placement)
    }

    fn navigate(
        &self,
        url: &str,
        new_tab: bool,
    ) -> impl Future<Output = Result<(), NudgeError>> + Send {
        (**self).navigate(url, new_tab)
    }

    fn set_visible(
        &self,
        selector: &str,
        visible: bool,
    ) -> impl Future<Output = Result<(), NudgeError>> + Send {
        (**self).set_visible(selector, visible)
    }
}
