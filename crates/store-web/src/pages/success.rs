//! Success Confirmation Page
//!
//! Confirms the purchase against the server and fires a single Purchase
//! event. The query string is rewritten away afterwards so a refresh
//! cannot re-trigger the conversion.

use leptos::prelude::*;
use leptos_router::hooks::use_query_map;
use serde_json::{json, Value};
use wasm_bindgen::JsValue;

use crate::api::{self, SessionInfo};

#[derive(Clone, Debug)]
enum ConfirmationState {
    Loading,
    /// Payment confirmed; session details when the session flow was used
    Confirmed(Option<SessionInfo>),
    Failed(String),
}

/// Split a full name into (first, last). Everything after the first word
/// is the last name.
fn split_name(full_name: &str) -> (String, String) {
    let mut words = full_name.split_whitespace();
    let first = words.next().unwrap_or_default().to_string();
    let last = words.collect::<Vec<_>>().join(" ");
    (first, last)
}

/// Purchase event payload from a paid session.
fn build_purchase_data(info: &SessionInfo) -> Value {
    let mut data = json!({});

    if let Some(email) = &info.email {
        data["email"] = json!(email);
    }
    if let Some(name) = &info.name {
        let (first, last) = split_name(name);
        if !first.is_empty() {
            data["firstName"] = json!(first);
        }
        if !last.is_empty() {
            data["lastName"] = json!(last);
        }
    }
    if let Some(phone) = &info.phone {
        data["phone"] = json!(phone);
    }
    if let Some(address) = &info.address {
        if let Some(city) = &address.city {
            data["city"] = json!(city);
        }
        if let Some(state) = &address.state {
            data["state"] = json!(state);
        }
        if let Some(zip) = &address.zip {
            data["zip"] = json!(zip);
        }
        if let Some(country) = &address.country {
            data["country"] = json!(country);
        }
    }
    if let Some(amount) = info.amount {
        #[allow(clippy::cast_precision_loss)]
        let value = amount as f64 / 100.0;
        data["value"] = json!(value);
        data["currency"] = json!(info
            .currency
            .clone()
            .unwrap_or_else(|| "usd".into())
            .to_uppercase());
    }
    data["contentName"] = json!("The Launch Playbook");

    data
}

/// Fire the Purchase event at most once per page load, whatever re-renders
/// or duplicate callbacks happen.
fn fire_purchase_once(fired: StoredValue<bool>, data: Option<Value>) {
    if fired.get_value() {
        return;
    }
    fired.set_value(true);

    leptos::task::spawn_local(async move {
        if let Err(e) = api::track_event("Purchase", data).await {
            leptos::logging::warn!("Purchase tracking failed: {e}");
        }
    });
}

/// Drop the query string from the visible URL so a refresh cannot replay
/// the confirmation flow.
fn clear_query_params() {
    let Some(window) = web_sys::window() else {
        return;
    };
    let Ok(path) = window.location().pathname() else {
        return;
    };
    if let Ok(history) = window.history() {
        let _ = history.replace_state_with_url(&JsValue::NULL, "", Some(&path));
    }
}

#[component]
pub fn SuccessPage() -> impl IntoView {
    let query = use_query_map();
    let session_id = query.with_untracked(|q| q.get("session_id"));
    let redirect_status = query.with_untracked(|q| q.get("redirect_status"));
    let payment_intent = query.with_untracked(|q| q.get("payment_intent"));

    let (state, set_state) = signal(ConfirmationState::Loading);
    let fired = StoredValue::new(false);

    leptos::task::spawn_local(async move {
        if let Some(id) = session_id {
            match api::get_session_status(&id).await {
                Ok(info) if info.payment_status == "paid" => {
                    fire_purchase_once(fired, Some(build_purchase_data(&info)));
                    set_state.set(ConfirmationState::Confirmed(Some(info)));
                }
                Ok(info) => {
                    set_state.set(ConfirmationState::Failed(format!(
                        "Payment not completed (status: {})",
                        info.payment_status
                    )));
                }
                Err(e) => set_state.set(ConfirmationState::Failed(e)),
            }
        } else if redirect_status.as_deref() == Some("succeeded") && payment_intent.is_some() {
            // Alternate redirect flow: no session to read, minimal event.
            fire_purchase_once(fired, None);
            set_state.set(ConfirmationState::Confirmed(None));
        } else {
            set_state.set(ConfirmationState::Failed(
                "No payment reference found".into(),
            ));
        }

        clear_query_params();
    });

    view! {
        <div class="success">
            {move || match state.get() {
                ConfirmationState::Loading => view! {
                    <div class="panel">
                        <p>"Confirming your payment…"</p>
                    </div>
                }
                .into_any(),
                ConfirmationState::Confirmed(info) => view! {
                    <div class="panel panel-success">
                        <h1>"You're in! 🎉"</h1>
                        <p>"Your payment is confirmed."</p>
                        {info
                            .map(|info| {
                                view! {
                                    <div class="receipt">
                                        {info
                                            .email
                                            .map(|email| {
                                                view! {
                                                    <p>"A receipt is on its way to " <strong>{email}</strong></p>
                                                }
                                            })}
                                    </div>
                                }
                            })}
                        <a href="/" class="btn">"Back to the site"</a>
                    </div>
                }
                .into_any(),
                ConfirmationState::Failed(message) => view! {
                    <div class="panel panel-error">
                        <h1>"Something's not right"</h1>
                        <p>{message}</p>
                        <p>
                            "If you completed a payment, please contact support and "
                            "we'll sort it out."
                        </p>
                        <a href="/" class="btn">"Back to the site"</a>
                    </div>
                }
                .into_any(),
            }}
        </div>
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::AddressInfo;

    fn paid_session() -> SessionInfo {
        SessionInfo {
            status: "complete".into(),
            payment_status: "paid".into(),
            email: Some("buyer@example.com".into()),
            name: Some("Ada Lovelace Byron".into()),
            phone: None,
            address: Some(AddressInfo {
                city: Some("London".into()),
                state: None,
                zip: Some("SW1".into()),
                country: Some("GB".into()),
            }),
            amount: Some(4900),
            currency: Some("usd".into()),
        }
    }

    #[test]
    fn test_split_name() {
        assert_eq!(split_name("Ada Lovelace"), ("Ada".into(), "Lovelace".into()));
        assert_eq!(
            split_name("Ada Lovelace Byron"),
            ("Ada".into(), "Lovelace Byron".into())
        );
        assert_eq!(split_name("Ada"), ("Ada".into(), String::new()));
        assert_eq!(split_name(""), (String::new(), String::new()));
    }

    #[test]
    fn test_purchase_data_from_session() {
        let data = build_purchase_data(&paid_session());

        assert_eq!(data["email"], "buyer@example.com");
        assert_eq!(data["firstName"], "Ada");
        assert_eq!(data["lastName"], "Lovelace Byron");
        assert_eq!(data["city"], "London");
        assert_eq!(data["country"], "GB");
        assert_eq!(data["value"], 49.0);
        assert_eq!(data["currency"], "USD");
        // Absent fields stay absent.
        assert!(data.get("state").is_none());
        assert!(data.get("phone").is_none());
    }

    #[test]
    fn test_purchase_data_minimal_session() {
        let info = SessionInfo {
            status: "complete".into(),
            payment_status: "paid".into(),
            email: None,
            name: None,
            phone: None,
            address: None,
            amount: None,
            currency: None,
        };
        let data = build_purchase_data(&info);

        assert!(data.get("email").is_none());
        assert!(data.get("value").is_none());
        assert_eq!(data["contentName"], "The Launch Playbook");
    }
}
