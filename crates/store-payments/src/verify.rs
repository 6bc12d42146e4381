//! Payment Verification
//!
//! Re-validates a completed payment intent server-side. The buyer's
//! contact identity is resolved through an ordered fallback chain; a
//! successful charge with no recoverable email is a hard failure.

use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use stripe::{Charge, Client, Expandable, PaymentIntent, PaymentIntentId};

use store_core::AppEnv;

use crate::error::{PaymentError, Result};
use crate::store::{VerifiedPayment, VerifiedStore};

/// Outcome of a verification call.
#[derive(Clone, Debug, Serialize)]
pub struct VerificationOutcome {
    pub verified: bool,

    /// True when the intent was already in the verified store and the
    /// provider was not consulted again
    #[serde(rename = "alreadyVerified")]
    pub already_verified: bool,

    #[serde(flatten)]
    pub payment: VerifiedPayment,
}

/// Results of the post-hoc sanity checks, returned verbatim on failure.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct SanityReport {
    /// Charged amount is positive
    pub amount_positive: bool,

    /// Currency code is present
    pub currency_present: bool,

    /// Live-mode payment, or the deployment is dev
    pub live_mode: bool,

    /// Product metadata was attached at session creation
    pub metadata_present: bool,
}

impl SanityReport {
    pub const fn all_passed(self) -> bool {
        self.amount_positive && self.currency_present && self.live_mode && self.metadata_present
    }
}

/// Contact fields pulled from one fallback source.
#[derive(Clone, Debug, Default)]
struct ContactFields {
    email: Option<String>,
    name: Option<String>,
    phone: Option<String>,
}

/// All contact sources a payment intent can carry, in fallback order.
#[derive(Clone, Debug, Default)]
struct ContactSources {
    /// (a) attached customer object
    customer: Option<ContactFields>,

    /// (b) payment-method billing details
    billing: Option<ContactFields>,

    /// (c) receipt email field
    receipt_email: Option<String>,

    /// (d) latest charge billing details
    charge: Option<ContactFields>,
}

#[derive(Clone, Debug)]
struct ResolvedContact {
    email: String,
    name: Option<String>,
    phone: Option<String>,
}

/// Walk the fallback chain. Email decides success; name and phone are
/// taken best-effort from the first source that has them.
fn resolve_contact(sources: &ContactSources) -> Option<ResolvedContact> {
    let chain = [
        sources.customer.as_ref(),
        sources.billing.as_ref(),
        sources.charge.as_ref(),
    ];

    let email = sources
        .customer
        .as_ref()
        .and_then(|c| c.email.clone())
        .or_else(|| sources.billing.as_ref().and_then(|b| b.email.clone()))
        .or_else(|| sources.receipt_email.clone())
        .or_else(|| sources.charge.as_ref().and_then(|c| c.email.clone()))?;

    let name = chain.iter().flatten().find_map(|c| c.name.clone());
    let phone = chain.iter().flatten().find_map(|c| c.phone.clone());

    Some(ResolvedContact { email, name, phone })
}

/// Verifies payment intents against Stripe and the verified store.
pub struct PaymentVerifier<S: VerifiedStore> {
    client: Client,
    verified: Arc<S>,
    app_env: AppEnv,
}

impl<S: VerifiedStore> PaymentVerifier<S> {
    pub fn new(client: Client, verified: Arc<S>, app_env: AppEnv) -> Self {
        Self {
            client,
            verified,
            app_env,
        }
    }

    /// Verify a payment intent.
    ///
    /// Already-verified intents short-circuit to the recorded result.
    /// Otherwise the intent is retrieved expanded with customer, payment
    /// method, and latest charge; its status must be exactly `succeeded`;
    /// contact identity is resolved through the fallback chain; and the
    /// sanity checks must pass before the intent is recorded as verified.
    pub async fn verify(
        &self,
        payment_intent_id: &str,
        expected_status: Option<&str>,
    ) -> Result<VerificationOutcome> {
        if payment_intent_id.is_empty() {
            return Err(PaymentError::Validation("paymentIntentId is required".into()));
        }

        if let Some(payment) = self.verified.get(payment_intent_id)? {
            tracing::info!(
                payment_intent_id,
                "Replayed verification, returning recorded result"
            );
            return Ok(VerificationOutcome {
                verified: true,
                already_verified: true,
                payment,
            });
        }

        let id = payment_intent_id
            .parse::<PaymentIntentId>()
            .map_err(|e| PaymentError::InvalidRequest(format!("invalid payment intent id: {e}")))?;

        let intent = PaymentIntent::retrieve(
            &self.client,
            &id,
            &["customer", "payment_method", "latest_charge"],
        )
        .await?;

        let status = intent.status.to_string();
        if status != "succeeded" {
            return Err(PaymentError::NotSucceeded { status });
        }
        if let Some(expected) = expected_status {
            if expected != status {
                return Err(PaymentError::StatusMismatch {
                    expected: expected.into(),
                    actual: status,
                });
            }
        }

        let (mut sources, pending_charge) = Self::collect_sources(&intent);

        let mut contact = resolve_contact(&sources);
        if contact.is_none() {
            // Only hit the API for the charge when everything else failed.
            if let Some(charge_id) = pending_charge {
                let charge = Charge::retrieve(&self.client, &charge_id, &[]).await?;
                sources.charge = Some(billing_fields(&charge.billing_details));
                contact = resolve_contact(&sources);
            }
        }
        let contact = contact.ok_or(PaymentError::MissingContact)?;

        let report = SanityReport {
            amount_positive: intent.amount > 0,
            currency_present: !intent.currency.to_string().is_empty(),
            live_mode: intent.livemode || self.app_env.is_dev(),
            metadata_present: !intent.metadata.is_empty(),
        };
        if !report.all_passed() {
            tracing::warn!(payment_intent_id, ?report, "Payment failed sanity checks");
            return Err(PaymentError::ChecksFailed(report));
        }

        let payment = VerifiedPayment {
            payment_intent_id: payment_intent_id.to_string(),
            email: contact.email,
            name: contact.name,
            phone: contact.phone,
            amount: intent.amount,
            currency: intent.currency.to_string(),
            product_name: intent.metadata.get("product_name").cloned(),
            verified_at: Utc::now(),
        };

        // Best-effort marker; verification already succeeded at this point.
        if let Err(e) = self.verified.record(&payment) {
            tracing::warn!(payment_intent_id, error = %e, "Failed to record verified payment");
        }

        tracing::info!(payment_intent_id, email = %payment.email, "Payment verified");

        Ok(VerificationOutcome {
            verified: true,
            already_verified: false,
            payment,
        })
    }

    /// Pull every contact source off the expanded intent. Returns the
    /// charge id separately when the latest charge came back unexpanded.
    fn collect_sources(intent: &PaymentIntent) -> (ContactSources, Option<stripe::ChargeId>) {
        let customer = match &intent.customer {
            Some(Expandable::Object(customer)) => Some(ContactFields {
                email: customer.email.clone(),
                name: customer.name.clone(),
                phone: customer.phone.clone(),
            }),
            _ => None,
        };

        let billing = match &intent.payment_method {
            Some(Expandable::Object(method)) => Some(billing_fields(&method.billing_details)),
            _ => None,
        };

        let (charge, pending_charge) = match &intent.latest_charge {
            Some(Expandable::Object(charge)) => {
                (Some(billing_fields(&charge.billing_details)), None)
            }
            Some(Expandable::Id(id)) => (None, Some(id.clone())),
            None => (None, None),
        };

        (
            ContactSources {
                customer,
                billing,
                receipt_email: intent.receipt_email.clone(),
                charge,
            },
            pending_charge,
        )
    }
}

fn billing_fields(details: &stripe::BillingDetails) -> ContactFields {
    ContactFields {
        email: details.email.clone(),
        name: details.name.clone(),
        phone: details.phone.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(email: Option<&str>, name: Option<&str>) -> ContactFields {
        ContactFields {
            email: email.map(Into::into),
            name: name.map(Into::into),
            phone: None,
        }
    }

    #[test]
    fn test_customer_alone_resolves() {
        let sources = ContactSources {
            customer: Some(fields(Some("c@example.com"), Some("C Customer"))),
            ..Default::default()
        };

        let contact = resolve_contact(&sources).unwrap();
        assert_eq!(contact.email, "c@example.com");
        assert_eq!(contact.name.as_deref(), Some("C Customer"));
    }

    #[test]
    fn test_charge_is_last_resort() {
        let sources = ContactSources {
            charge: Some(fields(Some("charge@example.com"), Some("From Charge"))),
            ..Default::default()
        };

        let contact = resolve_contact(&sources).unwrap();
        assert_eq!(contact.email, "charge@example.com");
    }

    #[test]
    fn test_chain_order_prefers_customer() {
        let sources = ContactSources {
            customer: Some(fields(Some("customer@example.com"), None)),
            billing: Some(fields(Some("billing@example.com"), Some("B Name"))),
            receipt_email: Some("receipt@example.com".into()),
            charge: Some(fields(Some("charge@example.com"), None)),
        };

        let contact = resolve_contact(&sources).unwrap();
        assert_eq!(contact.email, "customer@example.com");
        // Name falls through to the first source that carries one.
        assert_eq!(contact.name.as_deref(), Some("B Name"));
    }

    #[test]
    fn test_receipt_email_beats_charge() {
        let sources = ContactSources {
            receipt_email: Some("receipt@example.com".into()),
            charge: Some(fields(Some("charge@example.com"), None)),
            ..Default::default()
        };

        assert_eq!(
            resolve_contact(&sources).unwrap().email,
            "receipt@example.com"
        );
    }

    #[test]
    fn test_no_sources_is_unresolved() {
        assert!(resolve_contact(&ContactSources::default()).is_none());
    }

    #[test]
    fn test_sanity_report() {
        let passing = SanityReport {
            amount_positive: true,
            currency_present: true,
            live_mode: true,
            metadata_present: true,
        };
        assert!(passing.all_passed());

        let failing = SanityReport {
            amount_positive: false,
            ..passing
        };
        assert!(!failing.all_passed());
    }
}
