//! HTTP Handlers

use axum::{
    extract::{ConnectInfo, FromRequestParts, Query, State},
    http::{request::Parts, HeaderMap, StatusCode},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::convert::Infallible;
use std::net::SocketAddr;

use store_payments::{
    CheckoutMode, CreatedIntent, CreatedSession, PaymentError, PriceDisplay, SanityReport,
    SessionStatus, VerificationOutcome, WebhookHandler,
};
use store_tracking::{RelayOutcome, RelayRequest, TrackingError};

use crate::state::AppState;

// ============================================================================
// Request / Response Types
// ============================================================================

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub stripe_configured: bool,
    pub tracking_configured: bool,
}

#[derive(Debug, Deserialize)]
pub struct CreateSessionRequest {
    #[serde(default)]
    pub embedded: bool,
}

#[derive(Debug, Deserialize)]
pub struct CreateIntentRequest {
    #[serde(default)]
    pub amount: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct SessionStatusQuery {
    #[serde(default)]
    pub session_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct VerifyRequest {
    #[serde(rename = "paymentIntentId")]
    pub payment_intent_id: String,

    #[serde(rename = "expectedStatus", default)]
    pub expected_status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TrackEventRequest {
    #[serde(default)]
    pub event: String,

    #[serde(default)]
    pub data: Option<Value>,

    #[serde(default)]
    pub url: String,

    #[serde(rename = "userAgent", default)]
    pub user_agent: String,
}

#[derive(Debug, Serialize)]
pub struct TrackResponse {
    pub success: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub skipped: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<&'static str>,

    #[serde(rename = "eventsReceived", skip_serializing_if = "Option::is_none")]
    pub events_received: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub checks: Option<SanityReport>,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn error_response(status: u16, error: String, code: &str) -> ApiError {
    (
        StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
        Json(ErrorResponse {
            error,
            code: code.to_string(),
            checks: None,
        }),
    )
}

fn payment_error(err: &PaymentError) -> ApiError {
    let checks = match err {
        PaymentError::ChecksFailed(report) => Some(*report),
        _ => None,
    };
    (
        StatusCode::from_u16(err.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
        Json(ErrorResponse {
            error: err.to_string(),
            code: err.code().to_string(),
            checks,
        }),
    )
}

fn tracking_error(err: &TrackingError) -> ApiError {
    error_response(err.http_status(), err.to_string(), err.code())
}

fn payments_disabled() -> ApiError {
    error_response(
        503,
        "Payments not configured".into(),
        "PAYMENTS_DISABLED",
    )
}

// ============================================================================
// Handlers
// ============================================================================

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        stripe_configured: state.gateway.is_some(),
        tracking_configured: state.relay.is_some(),
    })
}

#[derive(Serialize)]
pub struct CheckoutConfigResponse {
    #[serde(rename = "publishableKey")]
    pub publishable_key: String,
}

/// Publishable key for the browser-side Stripe.js client
pub async fn checkout_config(
    State(state): State<AppState>,
) -> Result<Json<CheckoutConfigResponse>, ApiError> {
    let gateway = state.gateway.as_ref().ok_or_else(payments_disabled)?;

    Ok(Json(CheckoutConfigResponse {
        publishable_key: gateway.publishable_key().to_string(),
    }))
}

/// Create a checkout session (embedded or redirect)
pub async fn create_checkout_session(
    State(state): State<AppState>,
    Json(payload): Json<CreateSessionRequest>,
) -> Result<Json<CreatedSession>, ApiError> {
    let gateway = state.gateway.as_ref().ok_or_else(payments_disabled)?;

    let mode = if payload.embedded {
        CheckoutMode::Embedded
    } else {
        CheckoutMode::Redirect
    };

    let session = gateway.create_checkout_session(mode).await.map_err(|e| {
        tracing::error!(error = %e, "Checkout session creation failed");
        payment_error(&e)
    })?;

    Ok(Json(session))
}

/// Create a payment intent for the alternate redirect flow
pub async fn create_payment_intent(
    State(state): State<AppState>,
    Json(payload): Json<CreateIntentRequest>,
) -> Result<Json<CreatedIntent>, ApiError> {
    let gateway = state.gateway.as_ref().ok_or_else(payments_disabled)?;

    let intent = gateway
        .create_payment_intent(payload.amount)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Payment intent creation failed");
            payment_error(&e)
        })?;

    Ok(Json(intent))
}

/// Read the configured price for display.
///
/// Any failure returns the compiled-in fallback payload with HTTP 500;
/// the UI treats that as a non-fatal default.
pub async fn get_price(State(state): State<AppState>) -> (StatusCode, Json<PriceDisplay>) {
    let Some(gateway) = state.gateway.as_ref() else {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(PriceDisplay::fallback()),
        );
    };

    match gateway.price().await {
        Ok(price) => (StatusCode::OK, Json(price)),
        Err(e) => {
            tracing::error!(error = %e, "Price lookup failed, serving fallback");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(PriceDisplay::fallback()),
            )
        }
    }
}

/// Retrieve a checkout session's status for the success page
pub async fn session_status(
    State(state): State<AppState>,
    Query(query): Query<SessionStatusQuery>,
) -> Result<Json<SessionStatus>, ApiError> {
    let session_id = query
        .session_id
        .filter(|id| !id.is_empty())
        .ok_or_else(|| error_response(400, "session_id is required".into(), "VALIDATION_ERROR"))?;

    let gateway = state.gateway.as_ref().ok_or_else(payments_disabled)?;

    let status = gateway.session_status(&session_id).await.map_err(|e| {
        tracing::error!(error = %e, session_id, "Session status lookup failed");
        payment_error(&e)
    })?;

    Ok(Json(status))
}

/// Verify a completed payment intent
pub async fn verify_payment(
    State(state): State<AppState>,
    Json(payload): Json<VerifyRequest>,
) -> Result<Json<VerificationOutcome>, ApiError> {
    let verifier = state.verifier.as_ref().ok_or_else(payments_disabled)?;

    let outcome = verifier
        .verify(
            &payload.payment_intent_id,
            payload.expected_status.as_deref(),
        )
        .await
        .map_err(|e| {
            tracing::warn!(
                error = %e,
                payment_intent_id = %payload.payment_intent_id,
                "Payment verification failed"
            );
            payment_error(&e)
        })?;

    Ok(Json(outcome))
}

/// Client IP for fingerprinting: first `x-forwarded-for` entry, else the
/// socket peer address recorded by `into_make_service_with_connect_info`.
pub struct ClientIp(pub String);

impl<S> FromRequestParts<S> for ClientIp
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let forwarded = parts
            .headers
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(|ip| ip.trim().to_string())
            .filter(|ip| !ip.is_empty());

        let ip = forwarded.unwrap_or_else(|| {
            parts
                .extensions
                .get::<ConnectInfo<SocketAddr>>()
                .map_or_else(|| "unknown".into(), |info| info.0.ip().to_string())
        });

        Ok(Self(ip))
    }
}

/// Relay a browser-reported conversion event
pub async fn track_event(
    State(state): State<AppState>,
    ClientIp(client_ip): ClientIp,
    headers: HeaderMap,
    Json(payload): Json<TrackEventRequest>,
) -> Result<Json<TrackResponse>, ApiError> {
    let relay = state.relay.as_ref().ok_or_else(|| {
        error_response(503, "Tracking not configured".into(), "TRACKING_DISABLED")
    })?;

    let cookie_header = headers
        .get("cookie")
        .and_then(|v| v.to_str().ok())
        .map(String::from);

    let outcome = relay
        .relay(RelayRequest {
            event: payload.event,
            data: payload.data,
            url: payload.url,
            user_agent: payload.user_agent,
            client_ip,
            cookie_header,
        })
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Event relay failed");
            tracking_error(&e)
        })?;

    let response = match outcome {
        RelayOutcome::Forwarded(receipt) => TrackResponse {
            success: true,
            skipped: None,
            reason: None,
            events_received: Some(receipt.events_received),
        },
        RelayOutcome::Skipped { reason } => TrackResponse {
            success: true,
            skipped: Some(true),
            reason: Some(reason),
            events_received: None,
        },
    };

    Ok(Json(response))
}

/// Stripe webhook handler
pub async fn stripe_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: String,
) -> Result<StatusCode, ApiError> {
    let gateway = state.gateway.as_ref().ok_or_else(payments_disabled)?;

    let secret = gateway.webhook_secret().ok_or_else(|| {
        error_response(
            503,
            "Webhook secret not configured".into(),
            "WEBHOOKS_DISABLED",
        )
    })?;

    let signature = headers
        .get("stripe-signature")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| {
            error_response(400, "Missing Stripe signature".into(), "MISSING_SIGNATURE")
        })?;

    let handler = WebhookHandler::new(state.verified.clone());

    let event = handler.parse_event(&body, signature, secret).map_err(|e| {
        tracing::warn!(error = %e, "Webhook signature failed");
        payment_error(&e)
    })?;

    handler.handle(&event).map_err(|e| {
        tracing::error!(error = %e, "Webhook processing error");
        payment_error(&e)
    })?;

    Ok(StatusCode::OK)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::router;
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use std::sync::Arc;
    use std::time::Duration;
    use store_core::CapiConfig;
    use store_tracking::{CapiClient, DedupStore, EventRelay, Fingerprint, MemoryDedupStore};
    use tower::ServiceExt;

    fn test_state() -> AppState {
        let dedup = Arc::new(MemoryDedupStore::new(Duration::from_secs(30 * 60), 1000));
        let capi = CapiClient::new(CapiConfig {
            pixel_id: "123456".into(),
            access_token: "token".into(),
            test_event_code: None,
            // Unroutable; validation and dedup paths return first.
            api_base: "http://127.0.0.1:9".into(),
        })
        .unwrap();

        AppState {
            gateway: None,
            verifier: None,
            verified: Arc::new(store_payments::MemoryVerifiedStore::new()),
            relay: Some(Arc::new(EventRelay::new(dedup.clone(), capi))),
            dedup,
        }
    }

    async fn send(state: AppState, request: Request<Body>) -> (StatusCode, Value) {
        let response = router(state).oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .header("x-forwarded-for", "1.2.3.4")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let request = Request::builder()
            .uri("/health")
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(test_state(), request).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["stripe_configured"], false);
        assert_eq!(body["tracking_configured"], true);
    }

    #[tokio::test]
    async fn test_track_event_requires_fields() {
        let (status, body) = send(
            test_state(),
            post_json(
                "/api/track-event",
                serde_json::json!({ "url": "https://x", "userAgent": "A" }),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "VALIDATION_ERROR");

        let (status, _) = send(
            test_state(),
            post_json(
                "/api/track-event",
                serde_json::json!({ "event": "PageView", "userAgent": "A" }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_duplicate_event_skipped() {
        let state = test_state();

        // Seed the fingerprint the handler will derive for this request.
        let fingerprint = Fingerprint::derive("1.2.3.4", "A");
        state.dedup.check_and_record(&fingerprint, "PageView", true);

        let (status, body) = send(
            state,
            post_json(
                "/api/track-event",
                serde_json::json!({ "event": "PageView", "url": "https://x", "userAgent": "A" }),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["skipped"], true);
        assert_eq!(body["reason"], "Duplicate event");
    }

    #[tokio::test]
    async fn test_session_status_requires_id() {
        let (status, body) = send(
            test_state(),
            Request::builder()
                .uri("/api/session-status")
                .body(Body::empty())
                .unwrap(),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_price_fallback_is_idempotent() {
        let state = test_state();

        let first = send(
            state.clone(),
            Request::builder()
                .uri("/api/get-price")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        let second = send(
            state,
            Request::builder()
                .uri("/api/get-price")
                .body(Body::empty())
                .unwrap(),
        )
        .await;

        assert_eq!(first.0, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(first, second);
        assert_eq!(first.1["formatted"], "$49.00");
    }

    #[tokio::test]
    async fn test_verify_requires_gateway() {
        let (status, body) = send(
            test_state(),
            post_json(
                "/api/verify-payment",
                serde_json::json!({ "paymentIntentId": "pi_123" }),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["code"], "PAYMENTS_DISABLED");
    }
}
