//! Recording page surface — every effect is logged instead of rendered.

use std::future::Future;
use std::sync::Mutex;

use nudge_app::ports::{OverlayPresentation, PageSurface, ScriptPlacement};
use nudge_domain::error::NudgeError;

/// One effect the engine asked the page to perform.
#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceEvent {
    OverlayMounted(OverlayPresentation),
    ScriptInjected {
        code: String,
        placement: ScriptPlacement,
    },
    Navigated {
        url: String,
        new_tab: bool,
    },
    VisibilityChanged {
        selector: String,
        visible: bool,
    },
}

/// `PageSurface` that records effects for later inspection.
#[derive(Debug, Default)]
pub struct RecordingSurface {
    events: Mutex<Vec<SurfaceEvent>>,
}

impl RecordingSurface {
    /// Create an empty surface.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything the engine has done to the page so far.
    #[must_use]
    pub fn events(&self) -> Vec<SurfaceEvent> {
        self.events.lock().expect("surface lock poisoned").clone()
    }

    fn record(&self, event: SurfaceEvent) {
        tracing::debug!(?event, "page surface effect");
        self.events.lock().expect("surface lock poisoned").push(event);
    }
}

impl PageSurface for RecordingSurface {
    fn mount_overlay(
        &self,
        overlay: OverlayPresentation,
    ) -> impl Future<Output = Result<(), NudgeError>> + Send {
        self.record(SurfaceEvent::OverlayMounted(overlay));
        async { Ok(()) }
    }

    fn inject_script(
        &self,
        code: &str,
        placement: ScriptPlacement,
    ) -> impl Future<Output = Result<(), NudgeError>> + Send {
        self.record(SurfaceEvent::ScriptInjected {
            code: code.to_string(),
            placement,
        });
        async { Ok(()) }
    }

    fn navigate(
        &self,
        url: &str,
        new_tab: bool,
    ) -> impl Future<Output = Result<(), NudgeError>> + Send {
        self.record(SurfaceEvent::Navigated {
            url: url.to_string(),
            new_tab,
        });
        async { Ok(()) }
    }

    fn set_visible(
        &self,
        selector: &str,
        visible: bool,
    ) -> impl Future<Output = Result<(), NudgeError>> + Send {
        self.record(SurfaceEvent::VisibilityChanged {
            selector: selector.to_string(),
            visible,
        });
        async { Ok(()) }
    }
}
