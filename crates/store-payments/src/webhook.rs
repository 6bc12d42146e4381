//! Stripe Webhook Handling
//!
//! Server-to-server confirmation path. Completed checkouts and succeeded
//! payment intents are recorded in the verified store so a later
//! verification call for the same intent short-circuits.

use chrono::Utc;
use std::sync::Arc;
use stripe::{Event, EventObject, EventType, Expandable, Webhook};

use crate::error::{PaymentError, Result};
use crate::store::{VerifiedPayment, VerifiedStore};

/// Parsed webhook outcome
#[derive(Clone, Debug)]
pub enum WebhookOutcome {
    /// A payment was recorded into the verified store
    PaymentRecorded { payment_intent_id: String },

    /// Checkout completed but no contact was attached yet; verification
    /// will resolve it lazily
    CheckoutCompleted { session_id: String },

    /// Unhandled event type, acknowledged without action
    Ignored { event_type: String },
}

/// Webhook handler
pub struct WebhookHandler<S: VerifiedStore> {
    verified: Arc<S>,
}

impl<S: VerifiedStore> WebhookHandler<S> {
    pub fn new(verified: Arc<S>) -> Self {
        Self { verified }
    }

    /// Verify webhook signature and parse event
    pub fn parse_event(&self, payload: &str, signature: &str, secret: &str) -> Result<Event> {
        Webhook::construct_event(payload, signature, secret)
            .map_err(|e| PaymentError::WebhookSignature(e.to_string()))
    }

    /// Process a webhook event
    pub fn handle(&self, event: &Event) -> Result<WebhookOutcome> {
        tracing::info!(event_type = ?event.type_, "Processing Stripe webhook");

        match event.type_ {
            EventType::CheckoutSessionCompleted => {
                let EventObject::CheckoutSession(session) = &event.data.object else {
                    return Err(PaymentError::WebhookParse(
                        "Invalid checkout session data".into(),
                    ));
                };

                let Some(intent_id) = session.payment_intent.as_ref().map(|pi| match pi {
                    Expandable::Id(id) => id.to_string(),
                    Expandable::Object(intent) => intent.id.to_string(),
                }) else {
                    return Ok(WebhookOutcome::CheckoutCompleted {
                        session_id: session.id.to_string(),
                    });
                };

                let Some(email) = session
                    .customer_details
                    .as_ref()
                    .and_then(|d| d.email.clone())
                else {
                    tracing::debug!(
                        session_id = %session.id,
                        "Completed session carries no email, deferring to verification"
                    );
                    return Ok(WebhookOutcome::CheckoutCompleted {
                        session_id: session.id.to_string(),
                    });
                };

                let payment = VerifiedPayment {
                    payment_intent_id: intent_id.clone(),
                    email,
                    name: session.customer_details.as_ref().and_then(|d| d.name.clone()),
                    phone: session.customer_details.as_ref().and_then(|d| d.phone.clone()),
                    amount: session.amount_total.unwrap_or_default(),
                    currency: session
                        .currency
                        .map(|c| c.to_string())
                        .unwrap_or_default(),
                    product_name: session.metadata.as_ref().and_then(|m| m.get("product_name").cloned()),
                    verified_at: Utc::now(),
                };
                self.verified.record(&payment)?;

                tracing::info!(
                    payment_intent_id = %intent_id,
                    email = %payment.email,
                    "Recorded payment from completed checkout"
                );

                Ok(WebhookOutcome::PaymentRecorded {
                    payment_intent_id: intent_id,
                })
            }

            EventType::PaymentIntentSucceeded => {
                let EventObject::PaymentIntent(intent) = &event.data.object else {
                    return Err(PaymentError::WebhookParse(
                        "Invalid payment intent data".into(),
                    ));
                };

                let Some(email) = intent.receipt_email.clone() else {
                    tracing::debug!(
                        payment_intent_id = %intent.id,
                        "Succeeded intent carries no receipt email, deferring to verification"
                    );
                    return Ok(WebhookOutcome::Ignored {
                        event_type: "payment_intent.succeeded".into(),
                    });
                };

                let payment = VerifiedPayment {
                    payment_intent_id: intent.id.to_string(),
                    email,
                    name: None,
                    phone: None,
                    amount: intent.amount,
                    currency: intent.currency.to_string(),
                    product_name: intent.metadata.get("product_name").cloned(),
                    verified_at: Utc::now(),
                };
                self.verified.record(&payment)?;

                tracing::info!(
                    payment_intent_id = %payment.payment_intent_id,
                    "Recorded payment from succeeded intent"
                );

                Ok(WebhookOutcome::PaymentRecorded {
                    payment_intent_id: payment.payment_intent_id,
                })
            }

            _ => {
                tracing::debug!(event_type = ?event.type_, "Unhandled webhook event");
                Ok(WebhookOutcome::Ignored {
                    event_type: format!("{:?}", event.type_),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryVerifiedStore;

    #[test]
    fn test_webhook_handler_creation() {
        let store = Arc::new(MemoryVerifiedStore::new());
        let _handler = WebhookHandler::new(store);
    }
}
