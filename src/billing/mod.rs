//! Subscription billing: plan tiers, the single-active-subscription rule,
//! tier-based feature gating, and country-aware gateway selection.
//!
//! # Example
//!
//! ```rust,ignore
//! use launchdesk::billing::{
//!     EntitlementsManager, NoFeatureCheckBackend, SubscriptionManager,
//!     select_payment_gateway,
//! };
//!
//! let subscriptions = SubscriptionManager::new(store.clone());
//! let entitlements = EntitlementsManager::new(store, resolver, NoFeatureCheckBackend);
//!
//! if !entitlements.can_access_feature(&user_id, "fundraising_active").await {
//!     return Err(LaunchdeskError::forbidden("upgrade required"));
//! }
//!
//! let gateway = select_payment_gateway(profile.country.as_deref());
//! ```

pub mod entitlements;
pub mod gateway;
pub mod storage;
pub mod subscription;

pub use entitlements::{
    EffectiveSubscription, EntitlementsManager, FeatureCheckBackend, NoFeatureCheckBackend,
    resolve_effective_subscription,
};
pub use gateway::{PaymentGateway, select_payment_gateway};
pub use storage::{
    CountryPlanPrice, CountryPriceStore, PlanFeatureStore, PlanInterval, PlanTier,
    StoredSubscription, SubscriptionStatus, SubscriptionStore, localized_plan_price,
};
pub use subscription::{NewSubscription, SubscriptionManager};

#[cfg(any(test, feature = "test-support"))]
pub use storage::test::InMemoryBillingStore;
