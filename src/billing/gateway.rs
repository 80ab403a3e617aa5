//! Country-aware payment gateway selection and country price lookup.

use serde::{Deserialize, Serialize};

/// Supported payment gateways.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentGateway {
    Razorpay,
    Paypal,
    Stripe,
}

impl PaymentGateway {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Razorpay => "razorpay",
            Self::Paypal => "paypal",
            Self::Stripe => "stripe",
        }
    }

    /// Parse from a stored string, defaulting to PayPal for unknown values.
    #[must_use]
    pub fn from_str_lossy(s: &str) -> Self {
        match s {
            "razorpay" => Self::Razorpay,
            "stripe" => Self::Stripe,
            _ => Self::Paypal,
        }
    }
}

impl std::fmt::Display for PaymentGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Country names and codes that route to Razorpay.
const INDIA_SYNONYMS: &[&str] = &["india", "in", "ind", "bharat", "republic of india"];

/// Select the payment gateway for a billing country.
///
/// Indian users settle through Razorpay; everyone else (including an
/// absent or empty country) goes through PayPal. Stripe is only selected
/// by explicit stored gateway metadata, never by country.
#[must_use]
pub fn select_payment_gateway(country: Option<&str>) -> PaymentGateway {
    let Some(country) = country else {
        return PaymentGateway::Paypal;
    };

    let normalized = country.trim().to_lowercase();
    if normalized.is_empty() {
        return PaymentGateway::Paypal;
    }

    if INDIA_SYNONYMS.contains(&normalized.as_str()) {
        PaymentGateway::Razorpay
    } else {
        PaymentGateway::Paypal
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn india_synonyms_route_to_razorpay() {
        for country in ["India", "IN", "ind", "bharat", " Republic of India "] {
            assert_eq!(
                select_payment_gateway(Some(country)),
                PaymentGateway::Razorpay,
                "country {country:?} should select razorpay"
            );
        }
    }

    #[test]
    fn other_countries_route_to_paypal() {
        assert_eq!(select_payment_gateway(Some("Germany")), PaymentGateway::Paypal);
        assert_eq!(select_payment_gateway(Some("Indonesia")), PaymentGateway::Paypal);
        assert_eq!(select_payment_gateway(Some("United States")), PaymentGateway::Paypal);
    }

    #[test]
    fn missing_or_empty_country_defaults_to_paypal() {
        assert_eq!(select_payment_gateway(None), PaymentGateway::Paypal);
        assert_eq!(select_payment_gateway(Some("")), PaymentGateway::Paypal);
        assert_eq!(select_payment_gateway(Some("   ")), PaymentGateway::Paypal);
    }

    #[test]
    fn gateway_string_round_trip() {
        assert_eq!(PaymentGateway::from_str_lossy("razorpay"), PaymentGateway::Razorpay);
        assert_eq!(PaymentGateway::from_str_lossy("stripe"), PaymentGateway::Stripe);
        assert_eq!(PaymentGateway::from_str_lossy("anything"), PaymentGateway::Paypal);
        assert_eq!(PaymentGateway::Razorpay.as_str(), "razorpay");
    }
}
