//! User Data Normalization & Hashing
//!
//! PII fields arrive from the browser under short or long key names, get
//! normalized the way the Conversions API expects (trim + lowercase,
//! digits-only phone, 2-letter country), and are SHA-256 hashed
//! individually. Absent fields are omitted entirely — an empty string is
//! never hashed.

use serde::Serialize;
use serde_json::Value;
use sha2::{Digest, Sha256};

/// Advertising click/browser identifiers from first-party cookies.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ClickIds {
    pub fbc: Option<String>,
    pub fbp: Option<String>,
}

/// Pull `_fbc` / `_fbp` out of a raw Cookie header.
pub fn parse_click_ids(cookie_header: Option<&str>) -> ClickIds {
    let mut ids = ClickIds::default();
    let Some(header) = cookie_header else {
        return ids;
    };

    for pair in header.split(';') {
        let Some((name, value)) = pair.split_once('=') else {
            continue;
        };
        match name.trim() {
            "_fbc" if !value.is_empty() => ids.fbc = Some(value.to_string()),
            "_fbp" if !value.is_empty() => ids.fbp = Some(value.to_string()),
            _ => {}
        }
    }

    ids
}

/// The `user_data` block of a Conversions API event. PII fields hold
/// SHA-256 hex digests; ip/user-agent/click ids are sent raw per the API.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct UserData {
    #[serde(rename = "em", skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    #[serde(rename = "ph", skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,

    #[serde(rename = "fn", skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,

    #[serde(rename = "ln", skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,

    #[serde(rename = "ct", skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,

    #[serde(rename = "st", skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,

    #[serde(rename = "zp", skip_serializing_if = "Option::is_none")]
    pub zip: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,

    pub client_ip_address: String,
    pub client_user_agent: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub fbc: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub fbp: Option<String>,
}

impl UserData {
    /// Build the block from the raw client-reported `data` object.
    pub fn from_client_data(
        data: Option<&Value>,
        client_ip: &str,
        user_agent: &str,
        click_ids: &ClickIds,
    ) -> Self {
        Self {
            email: hashed_field(data, &["email", "em"], normalize_basic),
            phone: hashed_field(data, &["phone", "ph"], normalize_phone),
            first_name: hashed_field(data, &["firstName", "fn"], normalize_basic),
            last_name: hashed_field(data, &["lastName", "ln"], normalize_basic),
            city: hashed_field(data, &["city", "ct"], normalize_basic),
            state: hashed_field(data, &["state", "st"], normalize_basic),
            zip: hashed_field(data, &["zip", "zp"], normalize_basic),
            country: hashed_field(data, &["country"], normalize_country),
            client_ip_address: client_ip.to_string(),
            client_user_agent: user_agent.to_string(),
            fbc: click_ids.fbc.clone(),
            fbp: click_ids.fbp.clone(),
        }
    }
}

/// Extract the first present alias, normalize, and hash. Fields that are
/// absent or empty after normalization stay `None`.
fn hashed_field(
    data: Option<&Value>,
    aliases: &[&str],
    normalize: fn(&str) -> String,
) -> Option<String> {
    let data = data?;
    let raw = aliases
        .iter()
        .find_map(|key| data.get(key).and_then(Value::as_str))?;

    let normalized = normalize(raw);
    if normalized.is_empty() {
        return None;
    }
    Some(sha256_hex(&normalized))
}

fn normalize_basic(raw: &str) -> String {
    raw.trim().to_lowercase()
}

fn normalize_phone(raw: &str) -> String {
    raw.chars().filter(char::is_ascii_digit).collect()
}

fn normalize_country(raw: &str) -> String {
    normalize_basic(raw).chars().take(2).collect()
}

fn sha256_hex(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const EMPTY_IDS: ClickIds = ClickIds {
        fbc: None,
        fbp: None,
    };

    #[test]
    fn test_absent_fields_omitted() {
        let data = json!({ "email": "buyer@example.com" });
        let user_data =
            UserData::from_client_data(Some(&data), "1.2.3.4", "Mozilla/5.0", &EMPTY_IDS);

        assert!(user_data.email.is_some());
        assert!(user_data.phone.is_none());
        assert!(user_data.first_name.is_none());

        let serialized = serde_json::to_value(&user_data).unwrap();
        assert!(serialized.get("em").is_some());
        assert!(serialized.get("ph").is_none());
        assert!(serialized.get("fn").is_none());
    }

    #[test]
    fn test_email_normalized_before_hash() {
        let padded = json!({ "email": "  Buyer@Example.COM " });
        let clean = json!({ "em": "buyer@example.com" });

        let a = UserData::from_client_data(Some(&padded), "1.2.3.4", "UA", &EMPTY_IDS);
        let b = UserData::from_client_data(Some(&clean), "1.2.3.4", "UA", &EMPTY_IDS);
        assert_eq!(a.email, b.email);

        // Hashed, not passed through.
        assert_eq!(a.email.as_ref().unwrap().len(), 64);
    }

    #[test]
    fn test_phone_digits_only() {
        let a = json!({ "phone": "+1 (555) 123-4567" });
        let b = json!({ "ph": "15551234567" });

        let ua = UserData::from_client_data(Some(&a), "1.2.3.4", "UA", &EMPTY_IDS);
        let ub = UserData::from_client_data(Some(&b), "1.2.3.4", "UA", &EMPTY_IDS);
        assert_eq!(ua.phone, ub.phone);
    }

    #[test]
    fn test_phone_without_digits_omitted() {
        let data = json!({ "phone": "n/a" });
        let user_data = UserData::from_client_data(Some(&data), "1.2.3.4", "UA", &EMPTY_IDS);
        assert!(user_data.phone.is_none());
    }

    #[test]
    fn test_country_truncated_to_two_chars() {
        let a = json!({ "country": "USA" });
        let b = json!({ "country": "us" });

        let ua = UserData::from_client_data(Some(&a), "1.2.3.4", "UA", &EMPTY_IDS);
        let ub = UserData::from_client_data(Some(&b), "1.2.3.4", "UA", &EMPTY_IDS);
        assert_eq!(ua.country, ub.country);
    }

    #[test]
    fn test_no_data_block() {
        let user_data = UserData::from_client_data(None, "1.2.3.4", "UA", &EMPTY_IDS);
        assert!(user_data.email.is_none());
        assert_eq!(user_data.client_ip_address, "1.2.3.4");
    }

    #[test]
    fn test_parse_click_ids() {
        let header = "_ga=GA1.2.3; _fbp=fb.1.1700000000.123; _fbc=fb.1.1700000000.AbCdEf";
        let ids = parse_click_ids(Some(header));
        assert_eq!(ids.fbp.as_deref(), Some("fb.1.1700000000.123"));
        assert_eq!(ids.fbc.as_deref(), Some("fb.1.1700000000.AbCdEf"));

        assert_eq!(parse_click_ids(None), ClickIds::default());
        assert_eq!(parse_click_ids(Some("_ga=1")), ClickIds::default());
    }
}
