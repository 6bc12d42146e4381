//! Product Catalog
//!
//! The site sells exactly one product. The Stripe price id is
//! environment-provided; everything here is the compiled-in identity and
//! display fallback used when the provider cannot be reached.

use rust_decimal::Decimal;
use serde::Serialize;

/// Static identity of the single product.
#[derive(Clone, Copy, Debug, Serialize)]
pub struct ProductInfo {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,

    /// Display fallback when the live price lookup fails, in cents
    pub fallback_amount_cents: i64,

    /// Lowercase ISO currency code
    pub currency: &'static str,
}

/// The one product this storefront sells.
pub const PRODUCT: ProductInfo = ProductInfo {
    id: "launch-playbook",
    name: "The Launch Playbook",
    description: "Complete digital launch system with lifetime access",
    fallback_amount_cents: 4900,
    currency: "usd",
};

/// Format a cent amount for display, e.g. `4900` → `"$49.00"`.
///
/// Only USD gets a symbol; other currencies render as `"49.00 EUR"`.
pub fn format_amount(cents: i64, currency: &str) -> String {
    let major = Decimal::new(cents, 2);
    if currency.eq_ignore_ascii_case("usd") {
        format!("${major:.2}")
    } else {
        format!("{major:.2} {}", currency.to_uppercase())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_usd() {
        assert_eq!(format_amount(4900, "usd"), "$49.00");
        assert_eq!(format_amount(95, "usd"), "$0.95");
    }

    #[test]
    fn test_format_other_currency() {
        assert_eq!(format_amount(4900, "eur"), "49.00 EUR");
    }

    #[test]
    fn test_fallback_product_is_priced() {
        assert!(PRODUCT.fallback_amount_cents > 0);
        assert_eq!(PRODUCT.currency, "usd");
    }
}
