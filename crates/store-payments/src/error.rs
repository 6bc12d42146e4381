//! Payment Error Types

use thiserror::Error;

use crate::verify::SanityReport;

/// Result type alias
pub type Result<T> = std::result::Result<T, PaymentError>;

/// Payment-related errors
#[derive(Error, Debug)]
pub enum PaymentError {
    /// Configuration error (missing credential or price id)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Provider rejected our credentials
    #[error("Stripe authentication failed: {0}")]
    Auth(String),

    /// Provider invalid-request error (e.g. unknown id)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Any other provider failure
    #[error("Stripe error: {0}")]
    Provider(String),

    /// Caller-side validation failure (missing required field)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Payment intent exists but is not in the `succeeded` state
    #[error("Payment not completed (status: {status})")]
    NotSucceeded { status: String },

    /// Caller-supplied expected status does not match the actual status
    #[error("Payment status mismatch: expected {expected}, found {actual}")]
    StatusMismatch { expected: String, actual: String },

    /// Payment succeeded but no contact identity could be resolved
    #[error("Payment succeeded but no customer contact could be resolved")]
    MissingContact,

    /// Post-hoc sanity checks failed
    #[error("Payment failed verification checks")]
    ChecksFailed(SanityReport),

    /// Webhook signature verification failed
    #[error("Webhook signature invalid: {0}")]
    WebhookSignature(String),

    /// Webhook payload parsing failed
    #[error("Webhook parse error: {0}")]
    WebhookParse(String),

    /// Storage error
    #[error("Storage error: {0}")]
    Storage(String),
}

impl PaymentError {
    /// HTTP status this error maps to.
    pub const fn http_status(&self) -> u16 {
        match self {
            Self::Auth(_) => 401,
            Self::InvalidRequest(_)
            | Self::Validation(_)
            | Self::NotSucceeded { .. }
            | Self::StatusMismatch { .. }
            | Self::MissingContact
            | Self::ChecksFailed(_)
            | Self::WebhookSignature(_)
            | Self::WebhookParse(_) => 400,
            Self::Config(_) | Self::Provider(_) | Self::Storage(_) => 500,
        }
    }

    /// Short machine-readable code for API responses.
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Config(_) => "CONFIG_ERROR",
            Self::Auth(_) => "STRIPE_AUTH_ERROR",
            Self::InvalidRequest(_) => "INVALID_REQUEST",
            Self::Provider(_) => "STRIPE_ERROR",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::NotSucceeded { .. } => "PAYMENT_NOT_COMPLETED",
            Self::StatusMismatch { .. } => "STATUS_MISMATCH",
            Self::MissingContact => "CONTACT_UNRESOLVED",
            Self::ChecksFailed(_) => "CHECKS_FAILED",
            Self::WebhookSignature(_) => "INVALID_SIGNATURE",
            Self::WebhookParse(_) => "WEBHOOK_PARSE_ERROR",
            Self::Storage(_) => "STORAGE_ERROR",
        }
    }

    /// Get user-friendly message
    pub fn user_message(&self) -> String {
        match self {
            Self::Config(_) => "Payments are not configured.".into(),
            Self::MissingContact => {
                "Payment received but we could not find your contact details. \
                 Please contact support with your payment reference."
                    .into()
            }
            Self::NotSucceeded { status } => {
                format!("Payment has not completed (status: {status}).")
            }
            Self::ChecksFailed(_) => "Payment could not be verified.".into(),
            _ => "Payment processing failed. Please try again.".into(),
        }
    }
}

impl From<stripe::StripeError> for PaymentError {
    fn from(err: stripe::StripeError) -> Self {
        match &err {
            stripe::StripeError::Stripe(req) => {
                let message = req
                    .message
                    .clone()
                    .unwrap_or_else(|| "Stripe request failed".into());
                match req.http_status {
                    401 => Self::Auth(message),
                    400 | 404 => Self::InvalidRequest(message),
                    _ => Self::Provider(message),
                }
            }
            other => Self::Provider(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(PaymentError::Auth("bad key".into()).http_status(), 401);
        assert_eq!(
            PaymentError::InvalidRequest("no such intent".into()).http_status(),
            400
        );
        assert_eq!(PaymentError::MissingContact.http_status(), 400);
        assert_eq!(
            PaymentError::NotSucceeded {
                status: "processing".into()
            }
            .http_status(),
            400
        );
        assert_eq!(PaymentError::Provider("boom".into()).http_status(), 500);
        assert_eq!(PaymentError::Config("no key".into()).http_status(), 500);
    }

    #[test]
    fn test_missing_contact_points_at_support() {
        assert!(PaymentError::MissingContact
            .user_message()
            .contains("contact support"));
    }
}
