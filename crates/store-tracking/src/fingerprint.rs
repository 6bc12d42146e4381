//! Visitor Fingerprinting
//!
//! Derives the dedup key from the client IP and a truncated user-agent.
//! Used only for event deduplication, never authentication.

use std::fmt;

/// Truncation keeps the key short and stable across minor UA churn.
const UA_PREFIX_CHARS: usize = 50;

/// Derived visitor identifier
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Derive from client IP and user-agent.
    pub fn derive(client_ip: &str, user_agent: &str) -> Self {
        let ua_prefix: String = user_agent.chars().take(UA_PREFIX_CHARS).collect();
        Self(format!("{client_ip}_{ua_prefix}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_inputs_same_fingerprint() {
        let a = Fingerprint::derive("1.2.3.4", "Mozilla/5.0");
        let b = Fingerprint::derive("1.2.3.4", "Mozilla/5.0");
        assert_eq!(a, b);
    }

    #[test]
    fn test_different_ip_differs() {
        let a = Fingerprint::derive("1.2.3.4", "Mozilla/5.0");
        let b = Fingerprint::derive("5.6.7.8", "Mozilla/5.0");
        assert_ne!(a, b);
    }

    #[test]
    fn test_user_agent_truncated() {
        let long_ua = "X".repeat(200);
        let fp = Fingerprint::derive("1.2.3.4", &long_ua);
        // ip + separator + 50 chars of UA
        assert_eq!(fp.as_str().len(), "1.2.3.4_".len() + 50);

        // Agents differing only past the truncation point collide on purpose.
        let other = format!("{}{}", "X".repeat(50), "Y".repeat(150));
        assert_eq!(fp, Fingerprint::derive("1.2.3.4", &other));
    }

    #[test]
    fn test_multibyte_user_agent_does_not_panic() {
        let fp = Fingerprint::derive("1.2.3.4", &"é".repeat(80));
        assert!(fp.as_str().starts_with("1.2.3.4_"));
    }
}
