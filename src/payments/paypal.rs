//! PayPal order creation and capture verification.

use crate::error::Result;
use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use super::error::PaymentError;

const PAYPAL_LIVE_BASE: &str = "https://api-m.paypal.com";
const PAYPAL_SANDBOX_BASE: &str = "https://api-m.sandbox.paypal.com";

/// Capture status PayPal reports when funds actually moved.
const CAPTURE_COMPLETED: &str = "COMPLETED";

/// An order created with PayPal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayPalOrder {
    pub id: String,
    pub status: String,
}

/// Result of capturing a PayPal order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayPalCapture {
    pub id: String,
    pub status: String,
}

impl PayPalCapture {
    /// Whether the capture settled the payment.
    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.status == CAPTURE_COMPLETED
    }
}

/// Client for the PayPal orders API.
#[async_trait]
pub trait PayPalClient: Send + Sync {
    /// Create an order for `amount` in major units of `currency`.
    async fn create_order(&self, amount: f64, currency: &str) -> Result<PayPalOrder>;

    /// Capture an approved order. Verification succeeds only when the
    /// capture reports COMPLETED.
    async fn capture_order(&self, order_id: &str) -> Result<PayPalCapture>;
}

/// Production PayPal client over the REST API.
///
/// Fetches a client-credentials token per call; PayPal tokens are valid
/// for hours but the call volume here does not justify caching one.
pub struct LivePayPalClient {
    http: reqwest::Client,
    client_id: String,
    client_secret: SecretString,
    base_url: String,
}

impl LivePayPalClient {
    /// Create a client against the live PayPal environment.
    #[must_use]
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<SecretString>) -> Self {
        Self {
            http: reqwest::Client::new(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            base_url: PAYPAL_LIVE_BASE.to_string(),
        }
    }

    /// Switch to the PayPal sandbox environment.
    #[must_use]
    pub fn sandbox(mut self) -> Self {
        self.base_url = PAYPAL_SANDBOX_BASE.to_string();
        self
    }

    /// Override the API base URL (for tests against a local stub).
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    async fn access_token(&self) -> Result<String> {
        #[derive(Deserialize)]
        struct TokenResponse {
            access_token: String,
        }

        let response = self
            .http
            .post(format!("{}/v1/oauth2/token", self.base_url))
            .basic_auth(&self.client_id, Some(self.client_secret.expose_secret()))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await?
            .error_for_status()?;

        Ok(response.json::<TokenResponse>().await?.access_token)
    }
}

#[async_trait]
impl PayPalClient for LivePayPalClient {
    async fn create_order(&self, amount: f64, currency: &str) -> Result<PayPalOrder> {
        let token = self.access_token().await?;
        let body = serde_json::json!({
            "intent": "CAPTURE",
            "purchase_units": [{
                "amount": {
                    "currency_code": currency,
                    "value": format!("{amount:.2}"),
                }
            }],
        });

        let response = self
            .http
            .post(format!("{}/v2/checkout/orders", self.base_url))
            .bearer_auth(&token)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let detail = response.text().await.unwrap_or_default();
            tracing::error!(%status, detail, "PayPal order creation failed");
            return Err(PaymentError::OrderCreation(format!("paypal returned {status}")).into());
        }

        Ok(response.json::<PayPalOrder>().await?)
    }

    async fn capture_order(&self, order_id: &str) -> Result<PayPalCapture> {
        let token = self.access_token().await?;
        let response = self
            .http
            .post(format!("{}/v2/checkout/orders/{order_id}/capture", self.base_url))
            .bearer_auth(&token)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .send()
            .await?
            .error_for_status()?;

        Ok(response.json::<PayPalCapture>().await?)
    }
}

/// Mock PayPal client for testing.
#[cfg(any(test, feature = "test-support"))]
pub mod test {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::{Arc, Mutex};

    /// Mock PayPal client. Orders capture as COMPLETED unless failed
    /// explicitly.
    #[derive(Default, Clone)]
    pub struct MockPayPalClient {
        counter: Arc<AtomicU64>,
        capture_statuses: Arc<Mutex<HashMap<String, String>>>,
    }

    impl MockPayPalClient {
        #[must_use]
        pub fn new() -> Self {
            Self::default()
        }

        /// Make a future capture of `order_id` report `status` instead of
        /// COMPLETED.
        pub fn fail_capture(&self, order_id: &str, status: &str) {
            self.capture_statuses
                .lock()
                .unwrap()
                .insert(order_id.to_string(), status.to_string());
        }
    }

    #[async_trait]
    impl PayPalClient for MockPayPalClient {
        async fn create_order(&self, _amount: f64, _currency: &str) -> Result<PayPalOrder> {
            let n = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
            Ok(PayPalOrder {
                id: format!("PAYPAL-TEST-{n}"),
                status: "CREATED".to_string(),
            })
        }

        async fn capture_order(&self, order_id: &str) -> Result<PayPalCapture> {
            let status = self
                .capture_statuses
                .lock()
                .unwrap()
                .get(order_id)
                .cloned()
                .unwrap_or_else(|| CAPTURE_COMPLETED.to_string());
            Ok(PayPalCapture {
                id: order_id.to_string(),
                status,
            })
        }
    }
}
