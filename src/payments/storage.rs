//! Storage trait for payment records.

use crate::billing::PaymentGateway;
use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Settlement state of a payment record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Created,
    Verified,
    Failed,
}

/// One gateway order raised to settle a mentor assignment fee.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MentorPayment {
    pub id: i64,
    pub assignment_id: i64,
    /// Gateway order id, the correlation key for verification.
    pub order_id: String,
    /// Gateway payment/capture id, set once verified.
    pub payment_id: Option<String>,
    pub gateway: PaymentGateway,
    pub amount: f64,
    pub currency: String,
    pub status: PaymentStatus,
    pub created_at: DateTime<Utc>,
    pub verified_at: Option<DateTime<Utc>>,
}

/// Trait for storing mentor payment records.
#[async_trait]
pub trait MentorPaymentStore: Send + Sync {
    /// Insert a payment record. The input row's id is ignored; the
    /// returned row carries the assigned id.
    async fn insert_payment(&self, payment: MentorPayment) -> Result<MentorPayment>;

    /// Look up a payment by its gateway order id.
    async fn payment_by_order(&self, order_id: &str) -> Result<Option<MentorPayment>>;

    async fn update_payment(&self, payment: &MentorPayment) -> Result<()>;

    async fn payments_for_assignment(&self, assignment_id: i64) -> Result<Vec<MentorPayment>>;
}

/// In-memory payment store for testing.
#[cfg(any(test, feature = "test-support"))]
pub mod test {
    use super::*;
    use std::sync::{Arc, Mutex};

    /// In-memory payment store for testing.
    #[derive(Default, Clone)]
    pub struct InMemoryPaymentStore {
        inner: Arc<Mutex<Table>>,
    }

    #[derive(Default)]
    struct Table {
        next_id: i64,
        payments: Vec<MentorPayment>,
    }

    impl InMemoryPaymentStore {
        #[must_use]
        pub fn new() -> Self {
            Self::default()
        }

        /// All rows, for test assertions.
        pub fn all_payments(&self) -> Vec<MentorPayment> {
            self.inner.lock().unwrap().payments.clone()
        }
    }

    #[async_trait]
    impl MentorPaymentStore for InMemoryPaymentStore {
        async fn insert_payment(&self, mut payment: MentorPayment) -> Result<MentorPayment> {
            let mut table = self.inner.lock().unwrap();
            table.next_id += 1;
            payment.id = table.next_id;
            table.payments.push(payment.clone());
            Ok(payment)
        }

        async fn payment_by_order(&self, order_id: &str) -> Result<Option<MentorPayment>> {
            let table = self.inner.lock().unwrap();
            Ok(table
                .payments
                .iter()
                .find(|p| p.order_id == order_id)
                .cloned())
        }

        async fn update_payment(&self, payment: &MentorPayment) -> Result<()> {
            let mut table = self.inner.lock().unwrap();
            if let Some(row) = table.payments.iter_mut().find(|p| p.id == payment.id) {
                *row = payment.clone();
            }
            Ok(())
        }

        async fn payments_for_assignment(
            &self,
            assignment_id: i64,
        ) -> Result<Vec<MentorPayment>> {
            let table = self.inner.lock().unwrap();
            Ok(table
                .payments
                .iter()
                .filter(|p| p.assignment_id == assignment_id)
                .cloned()
                .collect())
        }
    }
}
