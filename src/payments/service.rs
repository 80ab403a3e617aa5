//! Payment settlement glue.
//!
//! Selects the gateway for the payer's country, creates the order, and
//! verifies the gateway's confirmation before anything downstream treats
//! the payment as settled. Confirmations are delivered through
//! [`PaymentEvents`] to whoever initiated the payment.

use chrono::Utc;
use secrecy::SecretString;
use serde::Serialize;

use crate::billing::{PaymentGateway, select_payment_gateway};
use crate::error::Result;
use crate::mentorship::MentorAssignment;

use super::error::PaymentError;
use super::events::{PaymentConfirmation, PaymentEvents};
use super::paypal::PayPalClient;
use super::razorpay::{RazorpayClient, verify_payment_signature};
use super::storage::{MentorPayment, MentorPaymentStore, PaymentStatus};

/// An order handed back to the client-side gateway SDK.
#[derive(Debug, Clone, Serialize)]
pub struct InitiatedPayment {
    pub order_id: String,
    pub gateway: PaymentGateway,
    pub amount: f64,
    pub currency: String,
}

/// Payment settlement operations across gateways.
pub struct PaymentManager<PS, RZ, PP> {
    store: PS,
    razorpay: RZ,
    paypal: PP,
    razorpay_key_secret: SecretString,
    events: PaymentEvents,
}

impl<PS, RZ, PP> PaymentManager<PS, RZ, PP>
where
    PS: MentorPaymentStore,
    RZ: RazorpayClient,
    PP: PayPalClient,
{
    /// Create a new payment manager.
    #[must_use]
    pub fn new(
        store: PS,
        razorpay: RZ,
        paypal: PP,
        razorpay_key_secret: impl Into<SecretString>,
    ) -> Self {
        Self {
            store,
            razorpay,
            paypal,
            razorpay_key_secret: razorpay_key_secret.into(),
            events: PaymentEvents::new(),
        }
    }

    /// The confirmation event registry, for callers that want to await a
    /// confirmation they did not initiate in-process.
    #[must_use]
    pub fn events(&self) -> &PaymentEvents {
        &self.events
    }

    /// Raise a gateway order for an assignment's fee.
    ///
    /// The gateway is chosen from the payer's country. A payment record is
    /// stored against the assignment so the verify path can find it.
    ///
    /// # Errors
    ///
    /// `BadRequest` when the assignment has no positive fee.
    pub async fn initiate_assignment_payment(
        &self,
        assignment: &MentorAssignment,
        country: Option<&str>,
    ) -> Result<InitiatedPayment> {
        let amount = match assignment.fee_amount {
            Some(fee) if fee > 0.0 => fee,
            _ => return Err(PaymentError::NothingToSettle.into()),
        };

        let gateway = select_payment_gateway(country);
        let receipt = format!("assignment_{}", assignment.id);
        let initiated = self
            .create_order(gateway, amount, &assignment.fee_currency, &receipt)
            .await?;

        self.store
            .insert_payment(MentorPayment {
                id: 0,
                assignment_id: assignment.id,
                order_id: initiated.order_id.clone(),
                payment_id: None,
                gateway,
                amount,
                currency: assignment.fee_currency.clone(),
                status: PaymentStatus::Created,
                created_at: Utc::now(),
                verified_at: None,
            })
            .await?;

        tracing::info!(
            assignment_id = assignment.id,
            order_id = %initiated.order_id,
            gateway = %gateway,
            "Assignment payment initiated"
        );
        Ok(initiated)
    }

    /// Raise a gateway order for a subscription checkout.
    ///
    /// Subscription settlement state lives on the subscription row itself,
    /// so no payment record is stored here; the caller activates the plan
    /// when the confirmation arrives.
    pub async fn initiate_subscription_payment(
        &self,
        amount: f64,
        currency: &str,
        country: Option<&str>,
        receipt: &str,
    ) -> Result<InitiatedPayment> {
        let gateway = select_payment_gateway(country);
        let initiated = self.create_order(gateway, amount, currency, receipt).await?;

        tracing::info!(
            order_id = %initiated.order_id,
            gateway = %gateway,
            receipt,
            "Subscription payment initiated"
        );
        Ok(initiated)
    }

    async fn create_order(
        &self,
        gateway: PaymentGateway,
        amount: f64,
        currency: &str,
        receipt: &str,
    ) -> Result<InitiatedPayment> {
        match gateway {
            PaymentGateway::Razorpay => {
                // Razorpay takes amounts in the currency's minor unit.
                let amount_minor = (amount * 100.0).round() as i64;
                let order = self
                    .razorpay
                    .create_order(amount_minor, currency, receipt)
                    .await?;
                Ok(InitiatedPayment {
                    order_id: order.id,
                    gateway,
                    amount,
                    currency: currency.to_string(),
                })
            }
            PaymentGateway::Paypal | PaymentGateway::Stripe => {
                let order = self.paypal.create_order(amount, currency).await?;
                Ok(InitiatedPayment {
                    order_id: order.id,
                    gateway: PaymentGateway::Paypal,
                    amount,
                    currency: currency.to_string(),
                })
            }
        }
    }

    /// Verify a Razorpay checkout confirmation.
    ///
    /// Checks the HMAC signature, marks any stored payment record
    /// verified, and delivers the confirmation event.
    ///
    /// # Errors
    ///
    /// `Unauthorized` on signature mismatch; the stored record, if any, is
    /// marked failed.
    pub async fn verify_razorpay(
        &self,
        order_id: &str,
        payment_id: &str,
        signature: &str,
    ) -> Result<PaymentConfirmation> {
        if let Err(err) =
            verify_payment_signature(order_id, payment_id, signature, &self.razorpay_key_secret)
        {
            self.mark_failed(order_id).await;
            tracing::warn!(order_id, "Razorpay signature verification failed");
            return Err(err);
        }

        let confirmation = PaymentConfirmation {
            order_id: order_id.to_string(),
            payment_id: Some(payment_id.to_string()),
            gateway: PaymentGateway::Razorpay,
        };
        self.finish_verification(&confirmation).await?;
        Ok(confirmation)
    }

    /// Verify a PayPal payment by capturing the approved order.
    ///
    /// # Errors
    ///
    /// `BadRequest` when the capture does not report COMPLETED.
    pub async fn verify_paypal(&self, order_id: &str) -> Result<PaymentConfirmation> {
        let capture = self.paypal.capture_order(order_id).await?;
        if !capture.is_completed() {
            self.mark_failed(order_id).await;
            tracing::warn!(order_id, status = %capture.status, "PayPal capture not completed");
            return Err(PaymentError::CaptureIncomplete(capture.status).into());
        }

        let confirmation = PaymentConfirmation {
            order_id: order_id.to_string(),
            payment_id: Some(capture.id),
            gateway: PaymentGateway::Paypal,
        };
        self.finish_verification(&confirmation).await?;
        Ok(confirmation)
    }

    /// The assignment settled by an order, for advancing its lifecycle
    /// after verification. None for subscription checkouts.
    pub async fn settled_assignment_for(&self, order_id: &str) -> Result<Option<i64>> {
        Ok(self
            .store
            .payment_by_order(order_id)
            .await?
            .map(|p| p.assignment_id))
    }

    async fn finish_verification(&self, confirmation: &PaymentConfirmation) -> Result<()> {
        if let Some(mut payment) = self.store.payment_by_order(&confirmation.order_id).await? {
            payment.status = PaymentStatus::Verified;
            payment.payment_id = confirmation.payment_id.clone();
            payment.verified_at = Some(Utc::now());
            self.store.update_payment(&payment).await?;
        }

        self.events.confirm(confirmation.clone());
        tracing::info!(order_id = %confirmation.order_id, "Payment verified");
        Ok(())
    }

    async fn mark_failed(&self, order_id: &str) {
        match self.store.payment_by_order(order_id).await {
            Ok(Some(mut payment)) => {
                payment.status = PaymentStatus::Failed;
                if let Err(err) = self.store.update_payment(&payment).await {
                    tracing::error!(order_id, error = %err, "Failed to mark payment failed");
                }
            }
            Ok(None) => {}
            Err(err) => {
                tracing::error!(order_id, error = %err, "Payment lookup failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LaunchdeskError;
    use crate::identity::{AuthUserId, ProfileId};
    use crate::mentorship::AssignmentStatus;
    use crate::payments::paypal::test::MockPayPalClient;
    use crate::payments::razorpay::test::MockRazorpayClient;
    use crate::payments::storage::test::InMemoryPaymentStore;
    use uuid::Uuid;

    const KEY_SECRET: &str = "rzp_test_secret";

    fn assignment(fee: Option<f64>, currency: &str) -> MentorAssignment {
        MentorAssignment {
            id: 7,
            mentor_id: AuthUserId(Uuid::new_v4()),
            startup_id: ProfileId(Uuid::new_v4()),
            fee_amount: fee,
            fee_currency: currency.to_string(),
            esop_percentage: None,
            esop_value: None,
            status: AssignmentStatus::PendingPaymentAndAgreement,
            agreement_url: None,
            agreement_status: None,
            mentor_signed_agreement_url: None,
            assigned_at: Utc::now(),
            completed_at: None,
        }
    }

    fn manager(
        store: InMemoryPaymentStore,
    ) -> PaymentManager<InMemoryPaymentStore, MockRazorpayClient, MockPayPalClient> {
        PaymentManager::new(
            store,
            MockRazorpayClient::new(),
            MockPayPalClient::new(),
            KEY_SECRET.to_string(),
        )
    }

    #[tokio::test]
    async fn indian_payer_settles_through_razorpay_in_minor_units() {
        let store = InMemoryPaymentStore::new();
        let manager = manager(store.clone());

        let initiated = manager
            .initiate_assignment_payment(&assignment(Some(1500.0), "INR"), Some("India"))
            .await
            .unwrap();
        assert_eq!(initiated.gateway, PaymentGateway::Razorpay);

        let rows = store.all_payments();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].status, PaymentStatus::Created);
        assert_eq!(rows[0].amount, 1500.0);
    }

    #[tokio::test]
    async fn non_indian_payer_settles_through_paypal() {
        let store = InMemoryPaymentStore::new();
        let manager = manager(store);

        let initiated = manager
            .initiate_assignment_payment(&assignment(Some(49.0), "USD"), Some("Germany"))
            .await
            .unwrap();
        assert_eq!(initiated.gateway, PaymentGateway::Paypal);
    }

    #[tokio::test]
    async fn free_assignment_has_nothing_to_settle() {
        let store = InMemoryPaymentStore::new();
        let manager = manager(store);

        let err = manager
            .initiate_assignment_payment(&assignment(None, "USD"), None)
            .await
            .unwrap_err();
        assert!(matches!(err, LaunchdeskError::BadRequest(_)));
    }

    #[tokio::test]
    async fn razorpay_verification_round_trip() {
        let store = InMemoryPaymentStore::new();
        let manager = manager(store.clone());

        let initiated = manager
            .initiate_assignment_payment(&assignment(Some(1500.0), "INR"), Some("IN"))
            .await
            .unwrap();
        let rx = manager.events().subscribe(&initiated.order_id);

        let signature = MockRazorpayClient::sign(&initiated.order_id, "pay_42", KEY_SECRET);
        let confirmation = manager
            .verify_razorpay(&initiated.order_id, "pay_42", &signature)
            .await
            .unwrap();
        assert_eq!(confirmation.payment_id.as_deref(), Some("pay_42"));

        // The waiter got the confirmation and the row is verified.
        assert_eq!(rx.await.unwrap(), confirmation);
        let rows = store.all_payments();
        assert_eq!(rows[0].status, PaymentStatus::Verified);
        assert!(rows[0].verified_at.is_some());
        assert_eq!(
            manager
                .settled_assignment_for(&initiated.order_id)
                .await
                .unwrap(),
            Some(7)
        );
    }

    #[tokio::test]
    async fn bad_signature_marks_payment_failed() {
        let store = InMemoryPaymentStore::new();
        let manager = manager(store.clone());

        let initiated = manager
            .initiate_assignment_payment(&assignment(Some(1500.0), "INR"), Some("IN"))
            .await
            .unwrap();

        let signature = MockRazorpayClient::sign(&initiated.order_id, "pay_42", "wrong_secret");
        let err = manager
            .verify_razorpay(&initiated.order_id, "pay_42", &signature)
            .await
            .unwrap_err();
        assert!(matches!(err, LaunchdeskError::Unauthorized(_)));
        assert_eq!(store.all_payments()[0].status, PaymentStatus::Failed);
    }

    #[tokio::test]
    async fn incomplete_paypal_capture_fails_verification() {
        let store = InMemoryPaymentStore::new();
        let paypal = MockPayPalClient::new();
        let manager = PaymentManager::new(
            store.clone(),
            MockRazorpayClient::new(),
            paypal.clone(),
            KEY_SECRET.to_string(),
        );

        let initiated = manager
            .initiate_assignment_payment(&assignment(Some(49.0), "USD"), None)
            .await
            .unwrap();
        paypal.fail_capture(&initiated.order_id, "DECLINED");

        let err = manager.verify_paypal(&initiated.order_id).await.unwrap_err();
        assert!(matches!(err, LaunchdeskError::BadRequest(_)));
        assert_eq!(store.all_payments()[0].status, PaymentStatus::Failed);
    }

    #[tokio::test]
    async fn subscription_checkout_stores_no_assignment_record() {
        let store = InMemoryPaymentStore::new();
        let manager = manager(store.clone());

        let initiated = manager
            .initiate_subscription_payment(49.0, "USD", Some("France"), "sub_user_1")
            .await
            .unwrap();
        assert_eq!(initiated.gateway, PaymentGateway::Paypal);
        assert!(store.all_payments().is_empty());
        assert_eq!(
            manager
                .settled_assignment_for(&initiated.order_id)
                .await
                .unwrap(),
            None
        );
    }
}
