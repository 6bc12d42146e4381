//! Conversions API Client
//!
//! Thin reqwest wrapper for `POST /{pixel_id}/events`. No retries; a
//! provider failure surfaces once to the caller.

use serde::{Deserialize, Serialize};

use store_core::CapiConfig;

use crate::error::{Result, TrackingError};
use crate::event::CapiEvent;

/// Meta Conversions API client
pub struct CapiClient {
    http: reqwest::Client,
    config: CapiConfig,
}

/// Receipt returned by the Conversions API on success.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct CapiReceipt {
    #[serde(default)]
    pub events_received: u32,

    #[serde(default)]
    pub fbtrace_id: Option<String>,
}

#[derive(Serialize)]
struct EventsPayload<'a> {
    data: [&'a CapiEvent; 1],

    #[serde(skip_serializing_if = "Option::is_none")]
    test_event_code: Option<&'a str>,

    access_token: &'a str,
}

#[derive(Deserialize)]
struct CapiErrorResponse {
    error: CapiError,
}

#[derive(Deserialize)]
struct CapiError {
    message: String,

    #[serde(default)]
    error_user_msg: Option<String>,
}

impl CapiClient {
    /// Create a new client
    pub fn new(config: CapiConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()?;

        Ok(Self { http, config })
    }

    /// Create from environment variables
    pub fn from_env() -> Result<Self> {
        let config = CapiConfig::from_env().map_err(|e| TrackingError::Config(e.to_string()))?;
        Self::new(config)
    }

    /// Endpoint events are posted to.
    pub fn events_url(&self) -> String {
        format!("{}/{}/events", self.config.api_base, self.config.pixel_id)
    }

    /// Forward one event. Provider-reported errors surface as
    /// [`TrackingError::Capi`].
    pub async fn send(&self, event: &CapiEvent) -> Result<CapiReceipt> {
        let payload = EventsPayload {
            data: [event],
            test_event_code: self.config.test_event_code.as_deref(),
            access_token: &self.config.access_token,
        };

        let response = self.http.post(self.events_url()).json(&payload).send().await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<CapiErrorResponse>(&body)
                .map(|e| e.error.error_user_msg.unwrap_or(e.error.message))
                .unwrap_or_else(|_| format!("HTTP {status}: {body}"));
            tracing::warn!(event_name = %event.event_name, %status, "Conversions API rejected event");
            return Err(TrackingError::Capi(message));
        }

        let receipt: CapiReceipt = serde_json::from_str(&body)?;
        tracing::info!(
            event_name = %event.event_name,
            events_received = receipt.events_received,
            "Relayed conversion event"
        );

        Ok(receipt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> CapiConfig {
        CapiConfig {
            pixel_id: "123456".into(),
            access_token: "token".into(),
            test_event_code: None,
            api_base: "https://graph.facebook.com/v18.0".into(),
        }
    }

    #[test]
    fn test_events_url() {
        let client = CapiClient::new(test_config()).unwrap();
        assert_eq!(
            client.events_url(),
            "https://graph.facebook.com/v18.0/123456/events"
        );
    }

    #[test]
    fn test_payload_shape() {
        let event = CapiEvent::new("PageView", "https://example.com/", crate::UserData::default(), None);
        let payload = EventsPayload {
            data: [&event],
            test_event_code: Some("TEST123"),
            access_token: "token",
        };

        let serialized = serde_json::to_value(&payload).unwrap();
        assert_eq!(serialized["data"].as_array().unwrap().len(), 1);
        assert_eq!(serialized["test_event_code"], "TEST123");
        assert_eq!(serialized["data"][0]["event_name"], "PageView");
    }
}
