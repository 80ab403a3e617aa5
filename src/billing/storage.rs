//! Storage traits for billing data.
//!
//! Implement these traits against your database. In-memory implementations
//! are provided for testing.

use crate::error::Result;
use crate::identity::ProfileId;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::gateway::PaymentGateway;

/// Subscription plan tier, the unit of feature entitlement.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanTier {
    #[default]
    Free,
    Basic,
    Premium,
}

impl PlanTier {
    /// Parse from a stored string, defaulting to Free for unknown values.
    #[must_use]
    pub fn from_str_lossy(s: &str) -> Self {
        match s {
            "basic" => Self::Basic,
            "premium" => Self::Premium,
            _ => Self::Free,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Free => "free",
            Self::Basic => "basic",
            Self::Premium => "premium",
        }
    }
}

impl std::fmt::Display for PlanTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Subscription status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    Active,
    Inactive,
    Cancelled,
    PastDue,
}

impl SubscriptionStatus {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Inactive => "inactive",
            Self::Cancelled => "cancelled",
            Self::PastDue => "past_due",
        }
    }
}

impl std::fmt::Display for SubscriptionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Billing interval for a subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanInterval {
    Monthly,
    Yearly,
}

impl PlanInterval {
    /// Length of one billing period in days.
    #[must_use]
    pub fn period_days(&self) -> i64 {
        match self {
            Self::Monthly => 30,
            Self::Yearly => 365,
        }
    }
}

/// One billing-period row for a user.
///
/// Prior periods are never deleted; replacing the active subscription marks
/// the old row inactive so the table doubles as an audit trail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredSubscription {
    pub id: Uuid,
    /// Profile identity of the subscriber (not the auth identity).
    pub user_id: ProfileId,
    /// Plan row reference, when the subscription came from a catalog plan.
    pub plan_id: Option<String>,
    pub plan_tier: PlanTier,
    pub status: SubscriptionStatus,
    pub interval: PlanInterval,
    pub current_period_start: DateTime<Utc>,
    pub current_period_end: DateTime<Utc>,
    /// For past_due subscriptions, access is retained until this instant.
    pub grace_period_ends_at: Option<DateTime<Utc>>,
    pub amount: f64,
    pub currency: String,
    pub payment_gateway: PaymentGateway,
    pub autopay_enabled: bool,
    /// Gateway mandate/agreement identifier when autopay is enabled.
    pub mandate_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl StoredSubscription {
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.status == SubscriptionStatus::Active
    }

    #[must_use]
    pub fn is_past_due(&self) -> bool {
        self.status == SubscriptionStatus::PastDue
    }

    /// Whether a past_due subscription is still inside its grace window.
    #[must_use]
    pub fn in_grace_period(&self, now: DateTime<Utc>) -> bool {
        self.is_past_due()
            && self
                .grace_period_ends_at
                .map(|end| now <= end)
                .unwrap_or(false)
    }

    /// Whether this row currently grants plan access.
    #[must_use]
    pub fn grants_access(&self, now: DateTime<Utc>) -> bool {
        if self.is_active() {
            now <= self.current_period_end
        } else {
            self.in_grace_period(now)
        }
    }
}

/// Country-specific price row for a plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountryPlanPrice {
    pub plan_id: String,
    pub country: String,
    pub amount: f64,
    pub currency: String,
}

/// Trait for storing subscription rows.
///
/// The conditional operations own the "at most one active row per user"
/// invariant; callers must not reimplement it as separate reads and writes.
#[async_trait]
pub trait SubscriptionStore: Send + Sync {
    /// The single active subscription for a user, if any.
    async fn active_subscription(&self, user: &ProfileId) -> Result<Option<StoredSubscription>>;

    /// Most recent subscription across the given profiles whose status is
    /// in `statuses`, by period start.
    async fn latest_subscription_in(
        &self,
        users: &[ProfileId],
        statuses: &[SubscriptionStatus],
    ) -> Result<Option<StoredSubscription>>;

    /// Insert a subscription row as-is.
    async fn insert_subscription(&self, subscription: &StoredSubscription) -> Result<()>;

    /// Mark every active row for the user inactive, then insert the new
    /// row, as one storage-level operation.
    ///
    /// Implementations must make this atomic (a transaction, or a partial
    /// unique index plus upsert-on-conflict). A crash between the two
    /// halves must not leave two active rows.
    async fn replace_active_subscription(
        &self,
        user: &ProfileId,
        new: &StoredSubscription,
    ) -> Result<()>;

    /// Update the status of a subscription row.
    async fn set_subscription_status(&self, id: Uuid, status: SubscriptionStatus) -> Result<()>;

    /// Stamp the grace window end on a subscription row.
    async fn set_grace_period(&self, id: Uuid, ends_at: DateTime<Utc>) -> Result<()>;

    /// All subscription rows for a user, newest first.
    async fn subscription_history(&self, user: &ProfileId) -> Result<Vec<StoredSubscription>>;
}

/// Trait for the static (plan_tier, feature) entitlement table and the
/// plan catalog's tier mapping.
#[async_trait]
pub trait PlanFeatureStore: Send + Sync {
    /// Whether `feature` is enabled for `tier`. Absent rows mean disabled.
    async fn is_feature_enabled(&self, tier: PlanTier, feature: &str) -> Result<bool>;

    /// Resolve a catalog plan id to its tier.
    async fn tier_for_plan(&self, plan_id: &str) -> Result<Option<PlanTier>>;
}

/// Trait for country-specific plan pricing.
#[async_trait]
pub trait CountryPriceStore: Send + Sync {
    /// The price row for a plan in a country, if one exists.
    async fn price_for(&self, plan_id: &str, country: &str) -> Result<Option<CountryPlanPrice>>;
}

/// The checkout price for a plan in a country, falling back to the plan's
/// base price when no country-specific row exists.
pub async fn localized_plan_price<S: CountryPriceStore>(
    store: &S,
    plan_id: &str,
    country: Option<&str>,
    base_amount: f64,
    base_currency: &str,
) -> Result<(f64, String)> {
    if let Some(country) = country {
        if let Some(price) = store.price_for(plan_id, country).await? {
            return Ok((price.amount, price.currency));
        }
    }
    Ok((base_amount, base_currency.to_string()))
}

/// In-memory billing store for testing.
#[cfg(any(test, feature = "test-support"))]
pub mod test {
    use super::*;
    use std::collections::{HashMap, HashSet};
    use std::sync::{Arc, RwLock};

    /// In-memory billing store for testing.
    ///
    /// Wraps data in Arc for cheap cloning. The conditional operations run
    /// under a single lock, so the invariants they own hold here.
    #[derive(Default, Clone)]
    pub struct InMemoryBillingStore {
        inner: Arc<InMemoryBillingStoreInner>,
    }

    #[derive(Default)]
    struct InMemoryBillingStoreInner {
        subscriptions: RwLock<Vec<StoredSubscription>>,
        features: RwLock<HashSet<(PlanTier, String)>>,
        plan_tiers: RwLock<HashMap<String, PlanTier>>,
        country_prices: RwLock<Vec<CountryPlanPrice>>,
    }

    impl InMemoryBillingStore {
        #[must_use]
        pub fn new() -> Self {
            Self::default()
        }

        /// Enable a feature for a tier.
        pub fn seed_feature(&self, tier: PlanTier, feature: &str) {
            self.inner
                .features
                .write()
                .unwrap()
                .insert((tier, feature.to_string()));
        }

        /// Register a catalog plan's tier.
        pub fn seed_plan_tier(&self, plan_id: &str, tier: PlanTier) {
            self.inner
                .plan_tiers
                .write()
                .unwrap()
                .insert(plan_id.to_string(), tier);
        }

        /// Add a country price row.
        pub fn seed_country_price(&self, price: CountryPlanPrice) {
            self.inner.country_prices.write().unwrap().push(price);
        }

        /// All rows, for test assertions.
        pub fn all_subscriptions(&self) -> Vec<StoredSubscription> {
            self.inner.subscriptions.read().unwrap().clone()
        }
    }

    #[async_trait]
    impl SubscriptionStore for InMemoryBillingStore {
        async fn active_subscription(
            &self,
            user: &ProfileId,
        ) -> Result<Option<StoredSubscription>> {
            Ok(self
                .inner
                .subscriptions
                .read()
                .unwrap()
                .iter()
                .find(|s| s.user_id == *user && s.is_active())
                .cloned())
        }

        async fn latest_subscription_in(
            &self,
            users: &[ProfileId],
            statuses: &[SubscriptionStatus],
        ) -> Result<Option<StoredSubscription>> {
            Ok(self
                .inner
                .subscriptions
                .read()
                .unwrap()
                .iter()
                .filter(|s| users.contains(&s.user_id) && statuses.contains(&s.status))
                .max_by_key(|s| s.current_period_start)
                .cloned())
        }

        async fn insert_subscription(&self, subscription: &StoredSubscription) -> Result<()> {
            self.inner
                .subscriptions
                .write()
                .unwrap()
                .push(subscription.clone());
            Ok(())
        }

        async fn replace_active_subscription(
            &self,
            user: &ProfileId,
            new: &StoredSubscription,
        ) -> Result<()> {
            let mut subs = self.inner.subscriptions.write().unwrap();
            for sub in subs.iter_mut() {
                if sub.user_id == *user && sub.is_active() {
                    sub.status = SubscriptionStatus::Inactive;
                }
            }
            subs.push(new.clone());
            Ok(())
        }

        async fn set_subscription_status(
            &self,
            id: Uuid,
            status: SubscriptionStatus,
        ) -> Result<()> {
            let mut subs = self.inner.subscriptions.write().unwrap();
            if let Some(sub) = subs.iter_mut().find(|s| s.id == id) {
                sub.status = status;
            }
            Ok(())
        }

        async fn set_grace_period(&self, id: Uuid, ends_at: DateTime<Utc>) -> Result<()> {
            let mut subs = self.inner.subscriptions.write().unwrap();
            if let Some(sub) = subs.iter_mut().find(|s| s.id == id) {
                sub.grace_period_ends_at = Some(ends_at);
            }
            Ok(())
        }

        async fn subscription_history(
            &self,
            user: &ProfileId,
        ) -> Result<Vec<StoredSubscription>> {
            let mut rows: Vec<StoredSubscription> = self
                .inner
                .subscriptions
                .read()
                .unwrap()
                .iter()
                .filter(|s| s.user_id == *user)
                .cloned()
                .collect();
            rows.sort_by_key(|s| std::cmp::Reverse(s.created_at));
            Ok(rows)
        }
    }

    #[async_trait]
    impl PlanFeatureStore for InMemoryBillingStore {
        async fn is_feature_enabled(&self, tier: PlanTier, feature: &str) -> Result<bool> {
            Ok(self
                .inner
                .features
                .read()
                .unwrap()
                .contains(&(tier, feature.to_string())))
        }

        async fn tier_for_plan(&self, plan_id: &str) -> Result<Option<PlanTier>> {
            Ok(self.inner.plan_tiers.read().unwrap().get(plan_id).copied())
        }
    }

    #[async_trait]
    impl CountryPriceStore for InMemoryBillingStore {
        async fn price_for(
            &self,
            plan_id: &str,
            country: &str,
        ) -> Result<Option<CountryPlanPrice>> {
            let normalized = country.trim().to_lowercase();
            Ok(self
                .inner
                .country_prices
                .read()
                .unwrap()
                .iter()
                .find(|p| p.plan_id == plan_id && p.country.to_lowercase() == normalized)
                .cloned())
        }
    }
}
