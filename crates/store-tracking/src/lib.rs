//! # store-tracking
//!
//! Server-side conversion reporting for the storefront: browser-reported
//! events are deduplicated per visitor, PII fields are normalized and
//! one-way hashed, and the normalized payload is forwarded to the Meta
//! Conversions API.
//!
//! ```text
//! browser ──POST /api/track-event──▶ EventRelay
//!                                       │  fingerprint (ip + UA)
//!                                       │  dedup (30 min TTL, LRU-bounded)
//!                                       │  hash PII / collect _fbc,_fbp
//!                                       ▼
//!                          POST {graph}/{pixel_id}/events
//! ```
//!
//! Non-repeatable events (page view, scroll-depth milestones) are counted
//! at most once per visitor session; duplicates short-circuit before any
//! hashing or network work. The dedup store is process-local by design —
//! a multi-instance deployment needs a shared [`DedupStore`] impl.

mod capi;
mod dedup;
mod error;
mod event;
mod fingerprint;
mod relay;
mod user_data;

pub use capi::{CapiClient, CapiReceipt};
pub use dedup::{DedupDecision, DedupStore, MemoryDedupStore};
pub use error::{Result, TrackingError};
pub use event::{is_non_repeatable, CapiEvent, CustomData, NON_REPEATABLE_EVENTS};
pub use fingerprint::Fingerprint;
pub use relay::{EventRelay, RelayOutcome, RelayRequest};
pub use user_data::{parse_click_ids, ClickIds, UserData};
