//! Conversion Event Payloads
//!
//! The normalized event shape sent to the Conversions API, plus the fixed
//! set of event names counted at most once per visitor session.

use chrono::Utc;
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use crate::user_data::UserData;

/// Events counted at most once per visitor session.
pub const NON_REPEATABLE_EVENTS: [&str; 5] = [
    "PageView",
    "ScrollDepth25",
    "ScrollDepth50",
    "ScrollDepth75",
    "ScrollDepth90",
];

pub fn is_non_repeatable(event: &str) -> bool {
    NON_REPEATABLE_EVENTS.contains(&event)
}

/// Recognized commerce fields forwarded in `custom_data`. Everything else
/// in the client payload is dropped.
#[derive(Clone, Debug, Default, Serialize)]
pub struct CustomData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<serde_json::Number>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_ids: Option<Vec<String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_items: Option<i64>,
}

impl CustomData {
    /// Extract the recognized fields from the client `data` object.
    /// Returns `None` when nothing usable is present.
    pub fn from_client_data(data: Option<&Value>) -> Option<Self> {
        let data = data?;

        let custom = Self {
            value: data.get("value").and_then(Value::as_number).cloned(),
            currency: string_field(data, &["currency"]),
            content_name: string_field(data, &["content_name", "contentName"]),
            content_ids: data
                .get("content_ids")
                .or_else(|| data.get("contentIds"))
                .and_then(Value::as_array)
                .map(|ids| {
                    ids.iter()
                        .filter_map(Value::as_str)
                        .map(String::from)
                        .collect()
                }),
            content_type: string_field(data, &["content_type", "contentType"]),
            num_items: data
                .get("num_items")
                .or_else(|| data.get("numItems"))
                .and_then(Value::as_i64),
        };

        let empty = custom.value.is_none()
            && custom.currency.is_none()
            && custom.content_name.is_none()
            && custom.content_ids.is_none()
            && custom.content_type.is_none()
            && custom.num_items.is_none();
        if empty {
            None
        } else {
            Some(custom)
        }
    }
}

fn string_field(data: &Value, aliases: &[&str]) -> Option<String> {
    aliases
        .iter()
        .find_map(|key| data.get(key).and_then(Value::as_str))
        .map(String::from)
}

/// One event in Conversions API wire shape.
#[derive(Clone, Debug, Serialize)]
pub struct CapiEvent {
    pub event_name: String,

    /// Server-side Unix timestamp
    pub event_time: i64,

    /// Random id for pixel/server dedup on Meta's side
    pub event_id: String,

    pub action_source: &'static str,

    pub event_source_url: String,

    pub user_data: UserData,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_data: Option<CustomData>,
}

impl CapiEvent {
    pub fn new(
        event_name: &str,
        source_url: &str,
        user_data: UserData,
        custom_data: Option<CustomData>,
    ) -> Self {
        Self {
            event_name: event_name.to_string(),
            event_time: Utc::now().timestamp(),
            event_id: Uuid::new_v4().to_string(),
            action_source: "website",
            event_source_url: source_url.to_string(),
            user_data,
            custom_data,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_non_repeatable_set() {
        assert!(is_non_repeatable("PageView"));
        assert!(is_non_repeatable("ScrollDepth90"));
        assert!(!is_non_repeatable("Purchase"));
        assert!(!is_non_repeatable("InitiateCheckout"));
    }

    #[test]
    fn test_custom_data_whitelist() {
        let data = json!({
            "value": 49.0,
            "currency": "USD",
            "contentName": "The Launch Playbook",
            "email": "should-not-appear@example.com"
        });

        let custom = CustomData::from_client_data(Some(&data)).unwrap();
        assert_eq!(custom.currency.as_deref(), Some("USD"));
        assert_eq!(custom.content_name.as_deref(), Some("The Launch Playbook"));

        let serialized = serde_json::to_value(&custom).unwrap();
        assert!(serialized.get("email").is_none());
    }

    #[test]
    fn test_custom_data_empty_is_none() {
        assert!(CustomData::from_client_data(Some(&json!({ "email": "x@y.z" }))).is_none());
        assert!(CustomData::from_client_data(None).is_none());
    }

    #[test]
    fn test_event_shape() {
        let event = CapiEvent::new(
            "PageView",
            "https://example.com/",
            UserData::default(),
            None,
        );

        assert_eq!(event.action_source, "website");
        assert!(event.event_time > 0);
        assert!(!event.event_id.is_empty());

        let serialized = serde_json::to_value(&event).unwrap();
        assert!(serialized.get("custom_data").is_none());
    }
}
