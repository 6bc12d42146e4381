//! Environment Configuration
//!
//! All configuration is environment-provided; there is no config file.
//! Each section has a `from_env` constructor so missing credentials fail
//! at the seam that needs them rather than at startup.

use crate::error::ConfigError;

/// Stripe credentials and the configured product price.
#[derive(Clone, Debug)]
pub struct StripeConfig {
    /// Secret API key (`sk_...`)
    pub secret_key: String,

    /// Publishable key handed to the browser (`pk_...`)
    pub publishable_key: String,

    /// Price id of the single product (`price_...`)
    pub price_id: String,

    /// Webhook signing secret (`whsec_...`), optional — webhooks are
    /// rejected when absent
    pub webhook_secret: Option<String>,
}

impl StripeConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let secret_key = require("STRIPE_SECRET_KEY")?;
        let publishable_key = require("STRIPE_PUBLISHABLE_KEY")?;
        let price_id = require("STRIPE_PRICE_ID")?;
        let webhook_secret = std::env::var("STRIPE_WEBHOOK_SECRET").ok();

        Ok(Self {
            secret_key,
            publishable_key,
            price_id,
            webhook_secret,
        })
    }
}

/// Meta Conversions API credentials.
#[derive(Clone, Debug)]
pub struct CapiConfig {
    /// Pixel id the events are reported against
    pub pixel_id: String,

    /// Server access token
    pub access_token: String,

    /// Test-event code; attached to every payload when set
    pub test_event_code: Option<String>,

    /// Graph API base URL, overridable for tests
    pub api_base: String,
}

impl CapiConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let pixel_id = require("META_PIXEL_ID")?;
        let access_token = require("META_ACCESS_TOKEN")?;
        let test_event_code = std::env::var("META_TEST_EVENT_CODE").ok();
        let api_base = std::env::var("META_API_BASE")
            .unwrap_or_else(|_| "https://graph.facebook.com/v18.0".into());

        Ok(Self {
            pixel_id,
            access_token,
            test_event_code,
            api_base,
        })
    }
}

/// Deployment environment, gates the live-mode sanity check.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AppEnv {
    Dev,
    Live,
}

impl AppEnv {
    pub fn from_env() -> Self {
        match std::env::var("APP_ENV").as_deref() {
            Ok("live") | Ok("production") => Self::Live,
            _ => Self::Dev,
        }
    }

    pub const fn is_dev(self) -> bool {
        matches!(self, Self::Dev)
    }
}

/// Site-level settings.
#[derive(Clone, Debug)]
pub struct SiteConfig {
    /// Public origin of the site, used to build Stripe return URLs
    pub site_url: String,

    pub app_env: AppEnv,
}

impl SiteConfig {
    pub fn from_env() -> Self {
        let site_url = std::env::var("SITE_URL")
            .unwrap_or_else(|_| "http://localhost:3000".into());

        Self {
            site_url: normalize_origin(&site_url),
            app_env: AppEnv::from_env(),
        }
    }
}

/// Strip trailing slashes so return URLs concatenate cleanly.
fn normalize_origin(url: &str) -> String {
    url.trim_end_matches('/').to_string()
}

fn require(name: &'static str) -> Result<String, ConfigError> {
    std::env::var(name)
        .ok()
        .filter(|v| !v.is_empty())
        .ok_or(ConfigError::Missing(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_origin_trailing_slash_stripped() {
        assert_eq!(normalize_origin("https://example.com/"), "https://example.com");
        assert_eq!(normalize_origin("https://example.com"), "https://example.com");
    }

    #[test]
    fn test_app_env_modes() {
        assert!(AppEnv::Dev.is_dev());
        assert!(!AppEnv::Live.is_dev());
    }
}
