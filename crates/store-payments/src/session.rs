//! Stripe Checkout Sessions & Prices
//!
//! Session creation (embedded and hosted redirect), payment-intent
//! creation for the alternate redirect flow, price lookup with a constant
//! fallback, and session status retrieval for the success page.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use stripe::{
    CheckoutSession, CheckoutSessionId, CheckoutSessionMode, CheckoutSessionUiMode, Client,
    CreateCheckoutSession, CreateCheckoutSessionAutomaticTax, CreateCheckoutSessionLineItems,
    CreatePaymentIntent, CreatePaymentIntentAutomaticPaymentMethods, Currency, Expandable,
    PaymentIntent, Price, PriceId,
};

use store_core::{format_amount, SiteConfig, StripeConfig, PRODUCT};

use crate::error::{PaymentError, Result};

/// Which Stripe Checkout surface to create a session for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CheckoutMode {
    /// Iframe mounted inside the landing page
    Embedded,
    /// Stripe-hosted page the browser navigates to
    Redirect,
}

/// Result of creating a checkout session.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CreatedSession {
    Embedded {
        #[serde(rename = "clientSecret")]
        client_secret: String,
    },
    Redirect {
        #[serde(rename = "sessionId")]
        session_id: String,
        url: String,
    },
}

/// Result of creating a payment intent.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CreatedIntent {
    #[serde(rename = "paymentIntentId")]
    pub payment_intent_id: String,

    #[serde(rename = "clientSecret")]
    pub client_secret: String,
}

/// Display payload for the configured price.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceDisplay {
    /// Amount in cents
    pub amount: i64,

    /// Human-readable amount, e.g. `"$49.00"`
    pub formatted: String,

    /// Lowercase ISO currency code
    pub currency: String,

    pub name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl PriceDisplay {
    /// Compiled-in fallback served (with HTTP 500) when the live lookup
    /// fails. Constant, so repeated failures yield identical payloads.
    pub fn fallback() -> Self {
        Self {
            amount: PRODUCT.fallback_amount_cents,
            formatted: format_amount(PRODUCT.fallback_amount_cents, PRODUCT.currency),
            currency: PRODUCT.currency.into(),
            name: PRODUCT.name.into(),
            description: Some(PRODUCT.description.into()),
        }
    }
}

/// Address fields surfaced to the success page.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SessionAddress {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zip: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
}

/// Normalized view of a checkout session for the success page.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SessionStatus {
    pub status: String,

    #[serde(rename = "paymentStatus")]
    pub payment_status: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<SessionAddress>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<i64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,

    #[serde(rename = "paymentIntentId", skip_serializing_if = "Option::is_none")]
    pub payment_intent_id: Option<String>,
}

/// Stripe client wrapper for the single-product storefront.
pub struct StripeGateway {
    client: Client,
    config: StripeConfig,
    site: SiteConfig,
}

impl StripeGateway {
    /// Create a new gateway
    pub fn new(config: StripeConfig, site: SiteConfig) -> Self {
        Self {
            client: Client::new(&config.secret_key),
            config,
            site,
        }
    }

    /// Create from environment variables
    pub fn from_env() -> Result<Self> {
        let config =
            StripeConfig::from_env().map_err(|e| PaymentError::Config(e.to_string()))?;
        Ok(Self::new(config, SiteConfig::from_env()))
    }

    /// Publishable key handed to the browser
    pub fn publishable_key(&self) -> &str {
        &self.config.publishable_key
    }

    /// Webhook signing secret, if configured
    pub fn webhook_secret(&self) -> Option<&str> {
        self.config.webhook_secret.as_deref()
    }

    /// Get the underlying Stripe client
    pub fn inner(&self) -> &Client {
        &self.client
    }

    /// Create a checkout session for the configured product.
    ///
    /// Embedded mode returns the session client secret for the iframe;
    /// redirect mode returns the session id and hosted URL.
    pub async fn create_checkout_session(&self, mode: CheckoutMode) -> Result<CreatedSession> {
        let return_url = format!(
            "{}/success?session_id={{CHECKOUT_SESSION_ID}}",
            self.site.site_url
        );
        let success_url = return_url.clone();
        let cancel_url = format!("{}/?canceled=true", self.site.site_url);

        let mut params = CreateCheckoutSession::new();
        params.mode = Some(CheckoutSessionMode::Payment);
        params.line_items = Some(vec![CreateCheckoutSessionLineItems {
            price: Some(self.config.price_id.clone()),
            quantity: Some(1),
            ..Default::default()
        }]);
        params.automatic_tax = Some(CreateCheckoutSessionAutomaticTax {
            enabled: true,
            ..Default::default()
        });
        params.metadata = Some(product_metadata(&self.config.price_id));

        match mode {
            CheckoutMode::Embedded => {
                params.ui_mode = Some(CheckoutSessionUiMode::Embedded);
                params.return_url = Some(&return_url);
            }
            CheckoutMode::Redirect => {
                params.success_url = Some(&success_url);
                params.cancel_url = Some(&cancel_url);
            }
        }

        let session = CheckoutSession::create(&self.client, params).await?;

        tracing::info!(session_id = %session.id, ?mode, "Created checkout session");

        match mode {
            CheckoutMode::Embedded => {
                let client_secret = session.client_secret.ok_or_else(|| {
                    PaymentError::Provider("No client secret returned for embedded session".into())
                })?;
                Ok(CreatedSession::Embedded { client_secret })
            }
            CheckoutMode::Redirect => {
                let url = session.url.ok_or_else(|| {
                    PaymentError::Provider("No checkout URL returned".into())
                })?;
                Ok(CreatedSession::Redirect {
                    session_id: session.id.to_string(),
                    url,
                })
            }
        }
    }

    /// Create a payment intent for the alternate (payment element) flow.
    ///
    /// Defaults to the live price amount, falling back to the compiled-in
    /// price when the lookup fails.
    pub async fn create_payment_intent(&self, amount: Option<i64>) -> Result<CreatedIntent> {
        let amount = match amount {
            Some(cents) if cents > 0 => cents,
            Some(cents) => {
                return Err(PaymentError::Validation(format!(
                    "amount must be positive, got {cents}"
                )));
            }
            None => match self.price().await {
                Ok(price) => price.amount,
                Err(e) => {
                    tracing::warn!(error = %e, "Price lookup failed, using fallback amount");
                    PRODUCT.fallback_amount_cents
                }
            },
        };

        let mut params = CreatePaymentIntent::new(amount, Currency::USD);
        params.description = Some(PRODUCT.name);
        params.metadata = Some(product_metadata(&self.config.price_id));
        params.automatic_payment_methods = Some(CreatePaymentIntentAutomaticPaymentMethods {
            enabled: true,
            ..Default::default()
        });

        let intent = PaymentIntent::create(&self.client, params).await?;

        let client_secret = intent.client_secret.ok_or_else(|| {
            PaymentError::Provider("No client secret returned for payment intent".into())
        })?;

        tracing::info!(payment_intent_id = %intent.id, amount, "Created payment intent");

        Ok(CreatedIntent {
            payment_intent_id: intent.id.to_string(),
            client_secret,
        })
    }

    /// Read the configured price and its parent product for display.
    pub async fn price(&self) -> Result<PriceDisplay> {
        let price_id = self
            .config
            .price_id
            .parse::<PriceId>()
            .map_err(|e| PaymentError::Config(format!("invalid STRIPE_PRICE_ID: {e}")))?;

        let price = Price::retrieve(&self.client, &price_id, &["product"]).await?;

        let amount = price
            .unit_amount
            .ok_or_else(|| PaymentError::Provider("Price has no unit amount".into()))?;
        let currency = price
            .currency
            .map_or_else(|| PRODUCT.currency.to_string(), |c| c.to_string());

        let (name, description) = match price.product {
            Some(Expandable::Object(product)) => (
                product.name.unwrap_or_else(|| PRODUCT.name.into()),
                product.description,
            ),
            _ => (PRODUCT.name.into(), None),
        };

        Ok(PriceDisplay {
            formatted: format_amount(amount, &currency),
            amount,
            currency,
            name,
            description,
        })
    }

    /// Retrieve a session with customer, payment intent, and line items
    /// expanded, normalized for the success page.
    pub async fn session_status(&self, session_id: &str) -> Result<SessionStatus> {
        if session_id.is_empty() {
            return Err(PaymentError::Validation("session_id is required".into()));
        }

        let id = session_id
            .parse::<CheckoutSessionId>()
            .map_err(|e| PaymentError::InvalidRequest(format!("invalid session id: {e}")))?;

        let session =
            CheckoutSession::retrieve(&self.client, &id, &["customer", "payment_intent", "line_items"])
                .await?;

        let details = session.customer_details.as_ref();
        let email = details.and_then(|d| d.email.clone()).or_else(|| {
            match &session.customer {
                Some(Expandable::Object(customer)) => customer.email.clone(),
                _ => None,
            }
        });
        let address = details.and_then(|d| d.address.as_ref()).map(|a| SessionAddress {
            city: a.city.clone(),
            state: a.state.clone(),
            zip: a.postal_code.clone(),
            country: a.country.clone(),
        });

        Ok(SessionStatus {
            status: session
                .status
                .map_or_else(|| "unknown".into(), |s| s.to_string()),
            payment_status: session.payment_status.to_string(),
            email,
            name: details.and_then(|d| d.name.clone()),
            phone: details.and_then(|d| d.phone.clone()),
            address,
            amount: session.amount_total,
            currency: session.currency.map(|c| c.to_string()),
            payment_intent_id: session.payment_intent.as_ref().map(|pi| match pi {
                Expandable::Id(id) => id.to_string(),
                Expandable::Object(intent) => intent.id.to_string(),
            }),
        })
    }
}

/// Metadata attached to every session and intent we create.
fn product_metadata(price_id: &str) -> HashMap<String, String> {
    HashMap::from([
        ("product_name".to_string(), PRODUCT.name.to_string()),
        ("product_id".to_string(), PRODUCT.id.to_string()),
        ("price_id".to_string(), price_id.to_string()),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_price_is_stable() {
        // The UI treats the fallback as a non-fatal default; two provider
        // outages in a row must produce identical payloads.
        assert_eq!(PriceDisplay::fallback(), PriceDisplay::fallback());
        assert_eq!(PriceDisplay::fallback().formatted, "$49.00");
    }

    #[test]
    fn test_product_metadata_fields() {
        let metadata = product_metadata("price_123");
        assert_eq!(metadata.get("price_id").map(String::as_str), Some("price_123"));
        assert_eq!(
            metadata.get("product_name").map(String::as_str),
            Some(PRODUCT.name)
        );
        assert!(metadata.contains_key("product_id"));
    }
}
