//! Event Relay
//!
//! The full server-side pipeline for one browser-reported event:
//! validate → fingerprint → dedup → normalize/hash → forward.

use std::sync::Arc;

use serde_json::Value;

use crate::capi::{CapiClient, CapiReceipt};
use crate::dedup::{DedupDecision, DedupStore};
use crate::error::{Result, TrackingError};
use crate::event::{is_non_repeatable, CapiEvent, CustomData};
use crate::fingerprint::Fingerprint;
use crate::user_data::{parse_click_ids, UserData};

/// One browser-reported event plus its request context.
#[derive(Clone, Debug)]
pub struct RelayRequest {
    pub event: String,
    pub data: Option<Value>,
    pub url: String,
    pub user_agent: String,
    pub client_ip: String,
    pub cookie_header: Option<String>,
}

/// What happened to the event.
#[derive(Clone, Debug)]
pub enum RelayOutcome {
    /// Forwarded to the Conversions API
    Forwarded(CapiReceipt),

    /// Duplicate non-repeatable event; nothing was hashed or sent
    Skipped { reason: &'static str },
}

/// Relays browser events to the Conversions API with per-visitor dedup.
pub struct EventRelay<D: DedupStore> {
    dedup: Arc<D>,
    capi: CapiClient,
}

impl<D: DedupStore> EventRelay<D> {
    pub fn new(dedup: Arc<D>, capi: CapiClient) -> Self {
        Self { dedup, capi }
    }

    pub async fn relay(&self, request: RelayRequest) -> Result<RelayOutcome> {
        if request.event.is_empty() {
            return Err(TrackingError::Validation("event is required".into()));
        }
        if request.url.is_empty() {
            return Err(TrackingError::Validation("url is required".into()));
        }
        if request.user_agent.is_empty() {
            return Err(TrackingError::Validation("userAgent is required".into()));
        }

        let fingerprint = Fingerprint::derive(&request.client_ip, &request.user_agent);

        let decision = self.dedup.check_and_record(
            &fingerprint,
            &request.event,
            is_non_repeatable(&request.event),
        );
        if decision == DedupDecision::Duplicate {
            tracing::debug!(event = %request.event, fingerprint = %fingerprint, "Skipping duplicate event");
            return Ok(RelayOutcome::Skipped {
                reason: "Duplicate event",
            });
        }

        // Dedup passed; only now touch PII.
        let click_ids = parse_click_ids(request.cookie_header.as_deref());
        let user_data = UserData::from_client_data(
            request.data.as_ref(),
            &request.client_ip,
            &request.user_agent,
            &click_ids,
        );
        let custom_data = CustomData::from_client_data(request.data.as_ref());

        let event = CapiEvent::new(&request.event, &request.url, user_data, custom_data);
        let receipt = self.capi.send(&event).await?;

        Ok(RelayOutcome::Forwarded(receipt))
    }

    /// Number of live visitor records in the dedup store.
    pub fn tracked_visitors(&self) -> usize {
        self.dedup.len()
    }
}
