//! Subscription record management.
//!
//! Owns the single-active-subscription rule: activating a plan retires any
//! prior active row and inserts the new period, keeping the old rows as an
//! audit trail.

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::error::{LaunchdeskError, Result};
use crate::identity::ProfileId;

use super::gateway::PaymentGateway;
use super::storage::{
    PlanInterval, PlanTier, StoredSubscription, SubscriptionStatus, SubscriptionStore,
};

/// Inputs for activating a new subscription period.
#[derive(Debug, Clone)]
pub struct NewSubscription {
    pub plan_id: Option<String>,
    pub plan_tier: PlanTier,
    pub interval: PlanInterval,
    pub amount: f64,
    pub currency: String,
    pub payment_gateway: PaymentGateway,
    pub autopay_enabled: bool,
    pub mandate_id: Option<String>,
}

/// Subscription record manager.
pub struct SubscriptionManager<S: SubscriptionStore> {
    store: S,
}

impl<S: SubscriptionStore> SubscriptionManager<S> {
    /// Create a new subscription manager.
    #[must_use]
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// The user's current active subscription, if any.
    pub async fn current_subscription(
        &self,
        user: &ProfileId,
    ) -> Result<Option<StoredSubscription>> {
        self.store.active_subscription(user).await
    }

    /// Activate a new subscription period for the user.
    ///
    /// Any previously active row is marked inactive in the same storage
    /// operation, so at most one active row exists afterwards.
    pub async fn activate(
        &self,
        user: &ProfileId,
        new: NewSubscription,
    ) -> Result<StoredSubscription> {
        let now = Utc::now();
        let row = StoredSubscription {
            id: Uuid::new_v4(),
            user_id: *user,
            plan_id: new.plan_id,
            plan_tier: new.plan_tier,
            status: SubscriptionStatus::Active,
            interval: new.interval,
            current_period_start: now,
            current_period_end: now + Duration::days(new.interval.period_days()),
            grace_period_ends_at: None,
            amount: new.amount,
            currency: new.currency,
            payment_gateway: new.payment_gateway,
            autopay_enabled: new.autopay_enabled,
            mandate_id: new.mandate_id,
            created_at: now,
        };

        self.store.replace_active_subscription(user, &row).await?;

        tracing::info!(
            user_id = %user,
            plan_tier = %row.plan_tier,
            gateway = %row.payment_gateway,
            "Subscription activated"
        );

        Ok(row)
    }

    /// Cancel the user's active subscription.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when the user has no active subscription.
    pub async fn cancel(&self, user: &ProfileId) -> Result<()> {
        let sub = self
            .store
            .active_subscription(user)
            .await?
            .ok_or_else(|| LaunchdeskError::not_found("no active subscription"))?;

        self.store
            .set_subscription_status(sub.id, SubscriptionStatus::Cancelled)
            .await?;

        tracing::info!(user_id = %user, subscription_id = %sub.id, "Subscription cancelled");
        Ok(())
    }

    /// Move the user's active subscription to past_due and stamp the grace
    /// window end, `grace_days` after the period end.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when the user has no active subscription.
    pub async fn mark_past_due(&self, user: &ProfileId, grace_days: i64) -> Result<DateTime<Utc>> {
        let sub = self
            .store
            .active_subscription(user)
            .await?
            .ok_or_else(|| LaunchdeskError::not_found("no active subscription"))?;

        let grace_end = sub.current_period_end + Duration::days(grace_days);
        self.store
            .set_subscription_status(sub.id, SubscriptionStatus::PastDue)
            .await?;
        self.store.set_grace_period(sub.id, grace_end).await?;

        tracing::warn!(
            user_id = %user,
            subscription_id = %sub.id,
            grace_ends_at = %grace_end,
            "Subscription past due"
        );
        Ok(grace_end)
    }

    /// All subscription rows for the user, newest first.
    pub async fn history(&self, user: &ProfileId) -> Result<Vec<StoredSubscription>> {
        self.store.subscription_history(user).await
    }
}
