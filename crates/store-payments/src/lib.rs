//! # store-payments
//!
//! Stripe integration for the solostore checkout flow.
//!
//! ## Checkout strategies
//!
//! The gateway supports both Stripe Checkout surfaces behind one entry
//! point, selected per request:
//!
//! ### 1. Embedded (default for the landing page modal)
//!
//! **Flow:** session created server-side → client secret handed to the
//! browser → Stripe's iframe mounts inside the page → Stripe redirects to
//! the success page with the session id.
//!
//! ```text
//! ┌────────────────────────────────────────┐
//! │            Landing Page                 │
//! │  ┌────────────────────────────────┐    │
//! │  │  Embedded Checkout (iframe)    │    │
//! │  │  Card Number: ████ ████ ████   │    │
//! │  └────────────────────────────────┘    │
//! └───────────────────┬────────────────────┘
//!                     ▼
//!            /success?session_id=cs_...
//! ```
//!
//! ### 2. Redirect (hosted)
//!
//! **Flow:** session created server-side → browser navigates to Stripe's
//! hosted page → Stripe redirects back to the success page.
//!
//! Either way the success page re-reads the session from the server; the
//! browser is never trusted with payment state.
//!
//! ## Verification
//!
//! [`PaymentVerifier`] re-validates a completed payment intent and resolves
//! the buyer's contact identity through a fallback chain (customer object →
//! payment-method billing details → receipt email → latest charge). A
//! successful charge with no recoverable email is a hard failure, not a
//! silent success. Verified intents are recorded in a [`VerifiedStore`] so
//! replays short-circuit without another provider round-trip.

mod error;
mod session;
mod store;
mod verify;
mod webhook;

pub use error::{PaymentError, Result};
pub use session::{
    CheckoutMode, CreatedIntent, CreatedSession, PriceDisplay, SessionAddress, SessionStatus,
    StripeGateway,
};
pub use store::{MemoryVerifiedStore, VerifiedPayment, VerifiedStore};
pub use verify::{PaymentVerifier, SanityReport, VerificationOutcome};
pub use webhook::{WebhookHandler, WebhookOutcome};
