//! solostore HTTP Server
//!
//! Axum-based server for the single-product checkout site: Stripe session
//! and verification endpoints, the conversion event relay, and static
//! serving of the WASM frontend.

mod handlers;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use store_core::AppEnv;
use store_payments::{MemoryVerifiedStore, PaymentVerifier, StripeGateway};
use store_tracking::{CapiClient, EventRelay, MemoryDedupStore};

use crate::handlers::{
    checkout_config, create_checkout_session, create_payment_intent, get_price, health_check,
    session_status, stripe_webhook, track_event, verify_payment,
};
use crate::state::AppState;

fn router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health & info
        .route("/health", get(health_check))
        // Checkout API
        .route("/api/checkout-config", get(checkout_config))
        .route("/api/create-checkout-session", post(create_checkout_session))
        .route("/api/create-payment-intent", post(create_payment_intent))
        .route("/api/get-price", get(get_price))
        .route("/api/session-status", get(session_status))
        .route("/api/verify-payment", post(verify_payment))
        // Conversion tracking
        .route("/api/track-event", post(track_event))
        // Stripe webhook
        .route("/webhook/stripe", post(stripe_webhook))
        // Static files (WASM frontend)
        .fallback_service(tower_http::services::ServeDir::new("static"))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load environment
    dotenvy::dotenv().ok();

    let app_env = AppEnv::from_env();

    // Shared stores, constructed once and injected everywhere they are
    // consulted (verification, webhook, relay).
    let verified = Arc::new(MemoryVerifiedStore::new());
    let dedup = Arc::new(MemoryDedupStore::default());

    // Initialize payments
    let gateway = match StripeGateway::from_env() {
        Ok(gateway) => {
            tracing::info!("✓ Stripe configured");
            Some(Arc::new(gateway))
        }
        Err(e) => {
            tracing::warn!("⚠ Stripe not configured - payments disabled ({e})");
            tracing::warn!("  Set STRIPE_SECRET_KEY, STRIPE_PUBLISHABLE_KEY, STRIPE_PRICE_ID in .env");
            None
        }
    };

    let verifier = gateway.as_ref().map(|gateway| {
        Arc::new(PaymentVerifier::new(
            gateway.inner().clone(),
            verified.clone(),
            app_env,
        ))
    });

    // Initialize conversion tracking
    let relay = match CapiClient::from_env() {
        Ok(capi) => {
            tracing::info!("✓ Conversions API configured");
            Some(Arc::new(EventRelay::new(dedup.clone(), capi)))
        }
        Err(e) => {
            tracing::warn!("⚠ Conversions API not configured - tracking disabled ({e})");
            tracing::warn!("  Set META_PIXEL_ID and META_ACCESS_TOKEN in .env");
            None
        }
    };

    // Build application state
    let state = AppState {
        gateway,
        verifier,
        verified,
        relay,
        dedup,
    };

    let app = router(state);

    // Start server
    let addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("══════════════════════════════════════════════════");
    tracing::info!("🛒 solostore server running on http://{}", addr);
    tracing::info!("══════════════════════════════════════════════════");
    tracing::info!("");
    tracing::info!("Endpoints:");
    tracing::info!("  GET  /health                      - Health check");
    tracing::info!("  POST /api/create-checkout-session - Create Stripe checkout");
    tracing::info!("  POST /api/create-payment-intent   - Create payment intent");
    tracing::info!("  GET  /api/get-price               - Product price for display");
    tracing::info!("  GET  /api/session-status          - Checkout session status");
    tracing::info!("  POST /api/verify-payment          - Verify completed payment");
    tracing::info!("  POST /api/track-event             - Relay conversion event");
    tracing::info!("  POST /webhook/stripe              - Stripe webhook");
    tracing::info!("");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
