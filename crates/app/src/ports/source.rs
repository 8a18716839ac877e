//! Automation source port — read-only access to the active definitions.
//!
//! The engine only consumes automations; there is no create/update/delete
//! surface here. The workflow builder that produces definitions lives
//! behind this port, out of scope.

use std::future::Future;
use std::sync::Arc;

use nudge_domain::automation::Automation;
use nudge_domain::error::NudgeError;
use nudge_domain::id::WebsiteId;

/// Fetches the active automation definitions for a website.
pub trait AutomationSource {
    /// Fetch all currently active automations.
    fn fetch_active(
        &self,
        website_id: WebsiteId,
    ) -> impl Future<Output = Result<Vec<Automation>, NudgeError>> + Send;
}

impl<T: AutomationSource + Send + Sync> AutomationSource for Arc<T> {
    fn fetch_active(
        &self,
        website_id: WebsiteId,
    ) -> impl Future<Output = Result<Vec<Automation>, NudgeError>> + Send {
        (**self).fetch_active(website_id)
    }
}
