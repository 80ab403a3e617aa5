//! Feature gating by subscription tier.
//!
//! The primary path asks a server-side convenience function whether a user
//! can use a feature. Backends that have not been fully migrated may not
//! have that function, so any backend error falls back to recomputing the
//! answer locally from raw subscription and plan-feature rows. Both the
//! feature check and the plan-tier lookup share one resolution function so
//! the fallback rule cannot drift between them.
//!
//! Every failure degrades to "no access": a broken gate denies premium
//! features rather than granting them.

use chrono::{DateTime, Utc};

use crate::error::{LaunchdeskError, Result};
use crate::identity::IdentityResolver;

use super::storage::{
    PlanFeatureStore, PlanTier, StoredSubscription, SubscriptionStatus, SubscriptionStore,
};

/// The subscription state that currently governs a user's entitlements.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EffectiveSubscription {
    pub tier: PlanTier,
    /// Status of the governing row, None when no row grants access.
    pub status: Option<SubscriptionStatus>,
}

impl EffectiveSubscription {
    /// The free-tier default used when nothing grants access.
    #[must_use]
    pub fn free() -> Self {
        Self {
            tier: PlanTier::Free,
            status: None,
        }
    }
}

/// Resolve the effective subscription from the best candidate row.
///
/// The candidate is the most recent subscription with status active or
/// past_due. Active rows count while the billing period has not ended;
/// past_due rows count while inside their grace window. Anything else
/// resolves to the free tier.
#[must_use]
pub fn resolve_effective_subscription(
    candidate: Option<&StoredSubscription>,
    now: DateTime<Utc>,
) -> EffectiveSubscription {
    match candidate {
        Some(sub) if sub.grants_access(now) => EffectiveSubscription {
            tier: sub.plan_tier,
            status: Some(sub.status),
        },
        _ => EffectiveSubscription::free(),
    }
}

/// The server-side convenience function for feature checks.
///
/// Errors from this backend (including "function does not exist" on a
/// partially migrated database) trigger the local fallback; they are never
/// surfaced to the caller.
#[async_trait::async_trait]
pub trait FeatureCheckBackend: Send + Sync {
    async fn check_feature(&self, user_id: &str, feature: &str) -> Result<bool>;
}

/// Backend stub for deployments without the server-side function.
///
/// Always errors, so every check takes the fallback path.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoFeatureCheckBackend;

#[async_trait::async_trait]
impl FeatureCheckBackend for NoFeatureCheckBackend {
    async fn check_feature(&self, _user_id: &str, _feature: &str) -> Result<bool> {
        Err(LaunchdeskError::service_unavailable(
            "feature check function not available",
        ))
    }
}

/// Feature access gate.
pub struct EntitlementsManager<S, R, B> {
    store: S,
    resolver: R,
    backend: B,
}

impl<S, R, B> EntitlementsManager<S, R, B>
where
    S: SubscriptionStore + PlanFeatureStore,
    R: IdentityResolver,
    B: FeatureCheckBackend,
{
    /// Create a new entitlements manager.
    #[must_use]
    pub fn new(store: S, resolver: R, backend: B) -> Self {
        Self {
            store,
            resolver,
            backend,
        }
    }

    /// Whether the user's plan enables a feature. Fails closed.
    pub async fn can_access_feature(&self, user_id: &str, feature: &str) -> bool {
        match self.backend.check_feature(user_id, feature).await {
            Ok(allowed) => return allowed,
            Err(err) => {
                tracing::warn!(
                    user_id,
                    feature,
                    error = %err,
                    "Feature check backend unavailable, recomputing locally"
                );
            }
        }

        match self.check_feature_fallback(user_id, feature).await {
            Ok(allowed) => allowed,
            Err(err) => {
                tracing::error!(
                    user_id,
                    feature,
                    error = %err,
                    "Feature check fallback failed, denying access"
                );
                false
            }
        }
    }

    /// The user's current plan tier. Fails closed to Free.
    pub async fn user_plan_tier(&self, user_id: &str) -> PlanTier {
        match self.effective_subscription(user_id).await {
            Ok(effective) => effective.tier,
            Err(err) => {
                tracing::error!(
                    user_id,
                    error = %err,
                    "Plan tier resolution failed, defaulting to free"
                );
                PlanTier::Free
            }
        }
    }

    /// The subscription state governing the user's entitlements right now.
    pub async fn effective_subscription(&self, user_id: &str) -> Result<EffectiveSubscription> {
        let auth_id = self.resolver.resolve_auth_id(user_id).await?;
        let profiles = self.resolver.profile_ids_for(&auth_id).await?;
        if profiles.is_empty() {
            return Ok(EffectiveSubscription::free());
        }

        let candidate = self
            .store
            .latest_subscription_in(
                &profiles,
                &[SubscriptionStatus::Active, SubscriptionStatus::PastDue],
            )
            .await?;

        let mut effective = resolve_effective_subscription(candidate.as_ref(), Utc::now());

        // The plan catalog is authoritative for the tier when the row
        // carries a plan reference.
        if effective.status.is_some() {
            if let Some(plan_id) = candidate.as_ref().and_then(|s| s.plan_id.as_deref()) {
                if let Some(tier) = self.store.tier_for_plan(plan_id).await? {
                    effective.tier = tier;
                }
            }
        }

        Ok(effective)
    }

    async fn check_feature_fallback(&self, user_id: &str, feature: &str) -> Result<bool> {
        let effective = self.effective_subscription(user_id).await?;
        self.store.is_feature_enabled(effective.tier, feature).await
    }
}
