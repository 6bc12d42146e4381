//! Application State

use std::sync::Arc;

use store_payments::{MemoryVerifiedStore, PaymentVerifier, StripeGateway};
use store_tracking::{EventRelay, MemoryDedupStore};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Stripe gateway (None if not configured)
    pub gateway: Option<Arc<StripeGateway>>,

    /// Payment verifier, present whenever the gateway is
    pub verifier: Option<Arc<PaymentVerifier<MemoryVerifiedStore>>>,

    /// Verified-payment store, shared by verifier and webhook
    pub verified: Arc<MemoryVerifiedStore>,

    /// Conversion event relay (None if the CAPI is not configured)
    pub relay: Option<Arc<EventRelay<MemoryDedupStore>>>,

    /// Visitor dedup store, injected into the relay
    pub dedup: Arc<MemoryDedupStore>,
}
