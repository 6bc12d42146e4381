//! Verified Payment Store
//!
//! Records payment intents that have already passed verification so that
//! replayed verification calls short-circuit without another provider
//! round-trip. Process-local; a multi-instance deployment needs an
//! external implementation of [`VerifiedStore`] behind the same trait.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::RwLock;

use crate::error::Result;

/// The recorded outcome of a successful verification.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct VerifiedPayment {
    /// Stripe payment intent id
    pub payment_intent_id: String,

    /// Resolved buyer email
    pub email: String,

    /// Resolved buyer name, when any source carried one
    pub name: Option<String>,

    /// Resolved buyer phone
    pub phone: Option<String>,

    /// Amount in cents
    pub amount: i64,

    /// Lowercase ISO currency code
    pub currency: String,

    /// Product name from the intent metadata
    pub product_name: Option<String>,

    /// When verification succeeded
    pub verified_at: DateTime<Utc>,
}

/// Storage trait for verified payments
pub trait VerifiedStore: Send + Sync {
    /// Record a verified payment
    fn record(&self, payment: &VerifiedPayment) -> Result<()>;

    /// Look up a previously verified payment intent
    fn get(&self, payment_intent_id: &str) -> Result<Option<VerifiedPayment>>;

    /// Number of recorded payments
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// In-memory verified-payment store
pub struct MemoryVerifiedStore {
    payments: RwLock<HashMap<String, VerifiedPayment>>,
}

impl Default for MemoryVerifiedStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryVerifiedStore {
    pub fn new() -> Self {
        Self {
            payments: RwLock::new(HashMap::new()),
        }
    }
}

impl VerifiedStore for MemoryVerifiedStore {
    fn record(&self, payment: &VerifiedPayment) -> Result<()> {
        let mut payments = self.payments.write().unwrap();
        payments.insert(payment.payment_intent_id.clone(), payment.clone());
        Ok(())
    }

    fn get(&self, payment_intent_id: &str) -> Result<Option<VerifiedPayment>> {
        let payments = self.payments.read().unwrap();
        Ok(payments.get(payment_intent_id).cloned())
    }

    fn len(&self) -> usize {
        self.payments.read().unwrap().len()
    }
}
