//! # nudge-adapter-http-reqwest
//!
//! HTTP adapter for the engine's network ports: fetches the active
//! automation definitions and delivers execution batches to the collection
//! service.
//!
//! ## Endpoints
//!
//! | Port | Method & path |
//! |------|---------------|
//! | `AutomationSource` | `GET {base}/websites/{website_id}/automations/active` |
//! | `DeliveryTransport::deliver` | `POST {base}/executions/batch` |
//! | `DeliveryTransport::beacon` | same endpoint, fire-and-forget with a short timeout |
//!
//! ## Dependency rule
//!
//! Depends on `nudge-app` (port traits) and `nudge-domain` only.

pub mod config;
pub mod dto;
pub mod error;

pub use config::HttpConfig;
pub use error::HttpError;

use std::future::Future;
use std::time::Duration;

use serde::Serialize;

use nudge_app::ports::{AutomationSource, DeliveryTransport};
use nudge_domain::automation::Automation;
use nudge_domain::error::NudgeError;
use nudge_domain::execution::ExecutionRecord;
use nudge_domain::id::WebsiteId;

use dto::{AutomationPayload, AutomationsResponse};

/// Convert wire payloads into domain automations, skipping the ones that
/// fail with a warning so one bad definition never blocks the rest.
#[must_use]
pub fn convert_payloads(payloads: Vec<AutomationPayload>) -> Vec<Automation> {
    let mut automations = Vec::with_capacity(payloads.len());
    for payload in payloads {
        let id = payload.id;
        match payload.into_domain() {
            Ok(automation) => automations.push(automation),
            Err(err) => {
                tracing::warn!(automation_id = %id, error = %err,
                    "skipping automation with unusable definition");
            }
        }
    }
    automations
}

/// [`AutomationSource`] over HTTP.
pub struct HttpAutomationSource {
    client: reqwest::Client,
    base_url: String,
}

impl HttpAutomationSource {
    /// Build a source from the adapter configuration.
    ///
    /// # Errors
    ///
    /// Returns [`HttpError::Request`] if the client cannot be constructed.
    pub fn new(config: &HttpConfig) -> Result<Self, HttpError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(HttpError::Request)?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }
}

impl AutomationSource for HttpAutomationSource {
    fn fetch_active(
        &self,
        website_id: WebsiteId,
    ) -> impl Future<Output = Result<Vec<Automation>, NudgeError>> + Send {
        let request = self.client.get(format!(
            "{}/websites/{website_id}/automations/active",
            self.base_url
        ));
        async move {
            let response = request.send().await.map_err(HttpError::Request)?;
            let status = response.status();
            if !status.is_success() {
                return Err(HttpError::Status(status).into());
            }
            let body: AutomationsResponse =
                response.json().await.map_err(HttpError::Parse)?;
            Ok(convert_payloads(body.automations))
        }
    }
}

#[derive(Serialize)]
struct BatchRequest<'a> {
    website_id: WebsiteId,
    executions: &'a [ExecutionRecord],
}

/// [`DeliveryTransport`] over HTTP.
pub struct HttpDeliveryTransport {
    client: reqwest::Client,
    base_url: String,
    beacon_timeout: Duration,
}

impl HttpDeliveryTransport {
    /// Build a transport from the adapter configuration.
    ///
    /// # Errors
    ///
    /// Returns [`HttpError::Request`] if the client cannot be constructed.
    pub fn new(config: &HttpConfig) -> Result<Self, HttpError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(HttpError::Request)?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            beacon_timeout: Duration::from_secs(config.beacon_timeout_secs),
        })
    }

    fn batch_url(&self) -> String {
        format!("{}/executions/batch", self.base_url)
    }
}

impl DeliveryTransport for HttpDeliveryTransport {
    fn deliver(
        &self,
        website_id: WebsiteId,
        records: &[ExecutionRecord],
    ) -> impl Future<Output = Result<(), NudgeError>> + Send {
        let request = self.client.post(self.batch_url()).json(&BatchRequest {
            website_id,
            executions: records,
        });
        async move {
            let response = request.send().await.map_err(HttpError::Request)?;
            let status = response.status();
            if !status.is_success() {
                return Err(HttpError::Status(status).into());
            }
            Ok(())
        }
    }

    /// The unload-safe path: the request is handed to a detached task with
    /// its own short timeout, so the caller never blocks and no
    /// acknowledgment is read. Must be called from within a tokio runtime.
    fn beacon(&self, website_id: WebsiteId, records: Vec<ExecutionRecord>) {
        let request = self
            .client
            .post(self.batch_url())
            .timeout(self.beacon_timeout)
            .json(&BatchRequest {
                website_id,
                executions: &records,
            });
        tokio::spawn(async move {
            if let Err(err) = request.send().await {
                tracing::debug!(error = %err, "beacon send failed");
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nudge_domain::id::AutomationId;

    fn payload(json: serde_json::Value) -> AutomationPayload {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn should_skip_unusable_definitions_and_keep_the_rest() {
        let good = payload(serde_json::json!({
            "id": AutomationId::new(),
            "name": "Good",
            "trigger_type": "page_view",
            "actions": [ { "action_type": "track_event", "action_config": { "event_name": "x" } } ]
        }));
        let bad = payload(serde_json::json!({
            "id": AutomationId::new(),
            "name": "Bad",
            "trigger_type": "quantum_entanglement",
            "actions": [ { "action_type": "track_event", "action_config": { "event_name": "x" } } ]
        }));

        let automations = convert_payloads(vec![good, bad]);
        assert_eq!(automations.len(), 1);
        assert_eq!(automations[0].name, "Good");
    }

    #[test]
    fn should_trim_trailing_slash_from_base_url() {
        let source = HttpAutomationSource::new(&HttpConfig {
            base_url: "https://api.example.com/".to_string(),
            ..HttpConfig::default()
        })
        .unwrap();
        assert_eq!(source.base_url, "https://api.example.com");
    }

    #[test]
    fn should_serialize_batch_request_shape() {
        let request = BatchRequest {
            website_id: WebsiteId::new(),
            executions: &[],
        };
        let json = serde_json::to_value(&request).unwrap();
        assert!(json.get("website_id").is_some());
        assert!(json["executions"].as_array().unwrap().is_empty());
    }
}
