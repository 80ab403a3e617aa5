//! Typed delivery of payment confirmations.
//!
//! Gateway SDKs confirm payments through a browser-side callback that
//! reaches us via the verify endpoints. Instead of a single-slot global
//! success callback, each initiated payment gets a oneshot channel keyed
//! by order id: the initiator holds the receiver, the verify path fires
//! the sender.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::oneshot;

use crate::billing::PaymentGateway;

/// A confirmed payment, delivered to whoever initiated it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentConfirmation {
    pub order_id: String,
    /// Gateway payment/capture id, when the gateway reports one.
    pub payment_id: Option<String>,
    pub gateway: PaymentGateway,
}

/// Registry of in-flight payments awaiting confirmation.
#[derive(Default, Clone)]
pub struct PaymentEvents {
    waiters: Arc<Mutex<HashMap<String, oneshot::Sender<PaymentConfirmation>>>>,
}

impl PaymentEvents {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register interest in an order's confirmation.
    ///
    /// A second subscription for the same order replaces the first; the
    /// replaced receiver resolves with an error.
    pub fn subscribe(&self, order_id: &str) -> oneshot::Receiver<PaymentConfirmation> {
        let (tx, rx) = oneshot::channel();
        self.waiters.lock().unwrap().insert(order_id.to_string(), tx);
        rx
    }

    /// Deliver a confirmation. Returns false when nobody is waiting
    /// (the initiator dropped its receiver, or verification arrived for
    /// an order initiated elsewhere).
    pub fn confirm(&self, confirmation: PaymentConfirmation) -> bool {
        let sender = self.waiters.lock().unwrap().remove(&confirmation.order_id);
        match sender {
            Some(tx) => tx.send(confirmation).is_ok(),
            None => {
                tracing::debug!(
                    order_id = %confirmation.order_id,
                    "Payment confirmed with no subscriber"
                );
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn confirmation_reaches_the_subscriber() {
        let events = PaymentEvents::new();
        let rx = events.subscribe("order_1");

        assert!(events.confirm(PaymentConfirmation {
            order_id: "order_1".to_string(),
            payment_id: Some("pay_1".to_string()),
            gateway: PaymentGateway::Razorpay,
        }));

        let confirmation = rx.await.unwrap();
        assert_eq!(confirmation.payment_id.as_deref(), Some("pay_1"));
    }

    #[tokio::test]
    async fn confirm_without_subscriber_reports_false() {
        let events = PaymentEvents::new();
        assert!(!events.confirm(PaymentConfirmation {
            order_id: "order_unknown".to_string(),
            payment_id: None,
            gateway: PaymentGateway::Paypal,
        }));
    }

    #[tokio::test]
    async fn resubscription_replaces_the_waiter() {
        let events = PaymentEvents::new();
        let first = events.subscribe("order_1");
        let second = events.subscribe("order_1");

        events.confirm(PaymentConfirmation {
            order_id: "order_1".to_string(),
            payment_id: None,
            gateway: PaymentGateway::Paypal,
        });

        assert!(first.await.is_err());
        assert!(second.await.is_ok());
    }
}
