//! Razorpay order creation and payment signature verification.

use crate::error::{LaunchdeskError, Result};
use async_trait::async_trait;
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use super::error::PaymentError;

const RAZORPAY_API_BASE: &str = "https://api.razorpay.com/v1";

/// An order created with Razorpay.
///
/// Amounts are in the currency's minor unit (paise for INR), as Razorpay
/// requires.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RazorpayOrder {
    pub id: String,
    pub amount: i64,
    pub currency: String,
    #[serde(default)]
    pub receipt: Option<String>,
}

/// Client for the Razorpay orders API.
#[async_trait]
pub trait RazorpayClient: Send + Sync {
    /// Create an order for `amount_minor` in the currency's minor unit.
    async fn create_order(
        &self,
        amount_minor: i64,
        currency: &str,
        receipt: &str,
    ) -> Result<RazorpayOrder>;
}

/// Verify a Razorpay checkout signature.
///
/// Razorpay signs `"{order_id}|{payment_id}"` with HMAC-SHA256 under the
/// key secret and sends the hex digest back through the checkout handler.
/// The comparison is constant-time.
///
/// # Errors
///
/// Returns `Unauthorized` when the signature does not match.
pub fn verify_payment_signature(
    order_id: &str,
    payment_id: &str,
    signature: &str,
    key_secret: &SecretString,
) -> Result<()> {
    let payload = format!("{order_id}|{payment_id}");
    let expected = compute_signature(key_secret.expose_secret(), payload.as_bytes())?;

    let provided = hex::decode(signature).map_err(|_| PaymentError::SignatureMismatch)?;
    if expected.ct_eq(&provided).unwrap_u8() != 1 {
        return Err(PaymentError::SignatureMismatch.into());
    }
    Ok(())
}

fn compute_signature(secret: &str, payload: &[u8]) -> Result<Vec<u8>> {
    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes())
        .map_err(|_| LaunchdeskError::internal("invalid HMAC key length"))?;
    mac.update(payload);
    Ok(mac.finalize().into_bytes().to_vec())
}

/// Production Razorpay client over the REST API.
pub struct LiveRazorpayClient {
    http: reqwest::Client,
    key_id: String,
    key_secret: SecretString,
    base_url: String,
}

impl LiveRazorpayClient {
    /// Create a client with the given API credentials.
    #[must_use]
    pub fn new(key_id: impl Into<String>, key_secret: impl Into<SecretString>) -> Self {
        Self {
            http: reqwest::Client::new(),
            key_id: key_id.into(),
            key_secret: key_secret.into(),
            base_url: RAZORPAY_API_BASE.to_string(),
        }
    }

    /// Override the API base URL (for tests against a local stub).
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl RazorpayClient for LiveRazorpayClient {
    async fn create_order(
        &self,
        amount_minor: i64,
        currency: &str,
        receipt: &str,
    ) -> Result<RazorpayOrder> {
        let body = serde_json::json!({
            "amount": amount_minor,
            "currency": currency,
            "receipt": receipt,
        });

        let response = self
            .http
            .post(format!("{}/orders", self.base_url))
            .basic_auth(&self.key_id, Some(self.key_secret.expose_secret()))
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let detail = response.text().await.unwrap_or_default();
            tracing::error!(%status, detail, "Razorpay order creation failed");
            return Err(PaymentError::OrderCreation(format!("razorpay returned {status}")).into());
        }

        Ok(response.json::<RazorpayOrder>().await?)
    }
}

/// Mock Razorpay client for testing.
#[cfg(any(test, feature = "test-support"))]
pub mod test {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::{Arc, Mutex};

    /// Mock Razorpay client that fabricates order ids.
    #[derive(Default, Clone)]
    pub struct MockRazorpayClient {
        counter: Arc<AtomicU64>,
        orders: Arc<Mutex<Vec<RazorpayOrder>>>,
    }

    impl MockRazorpayClient {
        #[must_use]
        pub fn new() -> Self {
            Self::default()
        }

        /// Orders created so far, for assertions.
        pub fn created_orders(&self) -> Vec<RazorpayOrder> {
            self.orders.lock().unwrap().clone()
        }

        /// Produce the signature Razorpay's checkout would send for a
        /// payment against one of this mock's orders.
        #[must_use]
        pub fn sign(order_id: &str, payment_id: &str, key_secret: &str) -> String {
            let payload = format!("{order_id}|{payment_id}");
            hex::encode(compute_signature(key_secret, payload.as_bytes()).unwrap())
        }
    }

    #[async_trait]
    impl RazorpayClient for MockRazorpayClient {
        async fn create_order(
            &self,
            amount_minor: i64,
            currency: &str,
            receipt: &str,
        ) -> Result<RazorpayOrder> {
            let n = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
            let order = RazorpayOrder {
                id: format!("order_test_{n}"),
                amount: amount_minor,
                currency: currency.to_string(),
                receipt: Some(receipt.to_string()),
            };
            self.orders.lock().unwrap().push(order.clone());
            Ok(order)
        }
    }
}
