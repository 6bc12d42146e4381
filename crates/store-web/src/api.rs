//! API Client

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Price payload from `/api/get-price`. The server serves a fallback with
/// HTTP 500 when the provider is unreachable, so the body is usable either
/// way.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PriceInfo {
    pub amount: i64,
    pub formatted: String,
    pub currency: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// Normalized session status from `/api/session-status`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SessionInfo {
    pub status: String,

    #[serde(rename = "paymentStatus")]
    pub payment_status: String,

    #[serde(default)]
    pub email: Option<String>,

    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub phone: Option<String>,

    #[serde(default)]
    pub address: Option<AddressInfo>,

    #[serde(default)]
    pub amount: Option<i64>,

    #[serde(default)]
    pub currency: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AddressInfo {
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub zip: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
}

/// Create an embedded checkout session, returning its client secret.
pub async fn create_embedded_session() -> Result<String, String> {
    let client = reqwest::Client::new();

    let response = client
        .post("/api/create-checkout-session")
        .json(&serde_json::json!({ "embedded": true }))
        .send()
        .await
        .map_err(|e| e.to_string())?;

    if response.status().is_success() {
        let data: Value = response.json().await.map_err(|e| e.to_string())?;
        data["clientSecret"]
            .as_str()
            .map(String::from)
            .ok_or_else(|| "No client secret in response".into())
    } else {
        let data: Value = response.json().await.unwrap_or_default();
        Err(data["error"]
            .as_str()
            .unwrap_or("Failed to create checkout session")
            .to_string())
    }
}

/// Fetch the publishable key the embedded checkout needs.
pub async fn get_checkout_config() -> Result<String, String> {
    let client = reqwest::Client::new();

    let response = client
        .get("/api/checkout-config")
        .send()
        .await
        .map_err(|e| e.to_string())?;

    if response.status().is_success() {
        let data: Value = response.json().await.map_err(|e| e.to_string())?;
        data["publishableKey"]
            .as_str()
            .map(String::from)
            .ok_or_else(|| "No publishable key in response".into())
    } else {
        Err("Payments are not configured".into())
    }
}

/// Fetch the display price. Errors resolve to the body anyway when the
/// server sent its fallback payload.
pub async fn get_price() -> Result<PriceInfo, String> {
    let client = reqwest::Client::new();

    let response = client
        .get("/api/get-price")
        .send()
        .await
        .map_err(|e| e.to_string())?;

    // A 500 still carries the fallback price payload.
    response.json().await.map_err(|e| e.to_string())
}

/// Fetch a checkout session's status for the success page.
pub async fn get_session_status(session_id: &str) -> Result<SessionInfo, String> {
    let client = reqwest::Client::new();

    let response = client
        .get(&format!("/api/session-status?session_id={session_id}"))
        .send()
        .await
        .map_err(|e| e.to_string())?;

    if response.status().is_success() {
        response.json().await.map_err(|e| e.to_string())
    } else {
        let data: Value = response.json().await.unwrap_or_default();
        Err(data["error"]
            .as_str()
            .unwrap_or("Failed to fetch session status")
            .to_string())
    }
}

/// Report a conversion event to the relay. Fire-and-forget from the UI's
/// perspective; failures only log.
pub async fn track_event(event: &str, data: Option<Value>) -> Result<(), String> {
    let client = reqwest::Client::new();

    let window = web_sys::window().ok_or("no window")?;
    let url = window.location().href().map_err(|_| "no href")?;
    let user_agent = window.navigator().user_agent().unwrap_or_default();

    let mut body = serde_json::json!({
        "event": event,
        "url": url,
        "userAgent": user_agent,
    });
    if let Some(data) = data {
        body["data"] = data;
    }

    client
        .post("/api/track-event")
        .json(&body)
        .send()
        .await
        .map_err(|e| e.to_string())?;

    Ok(())
}
