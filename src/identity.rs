//! Typed identifiers for the two user-id namespaces.
//!
//! The platform has two distinct identifier spaces that historically got
//! conflated in a single "user id" field: the authentication provider's
//! identity and the profile record's identity. Every lookup goes through
//! [`IdentityResolver`] so the mapping lives in exactly one place.

use crate::error::{LaunchdeskError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identity assigned by the authentication provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AuthUserId(pub Uuid);

/// Identity of a profile record in the application database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProfileId(pub Uuid);

impl AuthUserId {
    /// Parse an auth user id from its string form.
    ///
    /// # Errors
    ///
    /// Returns `BadRequest` when the string is not a well-formed UUID.
    pub fn parse(s: &str) -> Result<Self> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|_| LaunchdeskError::bad_request(format!("malformed user id: {s}")))
    }
}

impl ProfileId {
    /// Parse a profile id from its string form.
    ///
    /// # Errors
    ///
    /// Returns `BadRequest` when the string is not a well-formed UUID.
    pub fn parse(s: &str) -> Result<Self> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|_| LaunchdeskError::bad_request(format!("malformed profile id: {s}")))
    }
}

impl std::fmt::Display for AuthUserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::fmt::Display for ProfileId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Resolves identifiers between the auth and profile namespaces.
///
/// Implement this against your identity backend. The contract:
/// `resolve_auth_id` accepts a string that may be *either* an auth user id
/// or a profile id, tries the direct auth match first, then falls back to
/// the profile-to-auth mapping. `profile_ids_for` is the reverse fan-out
/// used by the entitlements fallback.
#[async_trait]
pub trait IdentityResolver: Send + Sync {
    /// Resolve a candidate identifier to an auth user id.
    ///
    /// # Errors
    ///
    /// - `BadRequest` for a malformed UUID.
    /// - `NotFound` when the id matches neither namespace.
    async fn resolve_auth_id(&self, candidate: &str) -> Result<AuthUserId>;

    /// All profile ids owned by an auth identity.
    async fn profile_ids_for(&self, auth_id: &AuthUserId) -> Result<Vec<ProfileId>>;
}

/// In-memory identity resolver for testing.
#[cfg(any(test, feature = "test-support"))]
pub mod test {
    use super::*;
    use std::collections::HashMap;
    use std::sync::{Arc, RwLock};

    /// In-memory identity resolver backed by a profile-to-auth map.
    #[derive(Default, Clone)]
    pub struct InMemoryIdentityResolver {
        inner: Arc<RwLock<Mappings>>,
    }

    #[derive(Default)]
    struct Mappings {
        auth_ids: Vec<AuthUserId>,
        profile_to_auth: HashMap<ProfileId, AuthUserId>,
    }

    impl InMemoryIdentityResolver {
        #[must_use]
        pub fn new() -> Self {
            Self::default()
        }

        /// Register an auth identity with no profile.
        pub fn add_auth_user(&self, auth_id: AuthUserId) {
            self.inner.write().unwrap().auth_ids.push(auth_id);
        }

        /// Register a profile belonging to an auth identity.
        pub fn add_profile(&self, profile_id: ProfileId, auth_id: AuthUserId) {
            let mut inner = self.inner.write().unwrap();
            if !inner.auth_ids.contains(&auth_id) {
                inner.auth_ids.push(auth_id);
            }
            inner.profile_to_auth.insert(profile_id, auth_id);
        }
    }

    #[async_trait]
    impl IdentityResolver for InMemoryIdentityResolver {
        async fn resolve_auth_id(&self, candidate: &str) -> Result<AuthUserId> {
            let uuid = Uuid::parse_str(candidate)
                .map_err(|_| LaunchdeskError::bad_request(format!("malformed user id: {candidate}")))?;

            let inner = self.inner.read().unwrap();

            let as_auth = AuthUserId(uuid);
            if inner.auth_ids.contains(&as_auth) {
                return Ok(as_auth);
            }

            if let Some(auth_id) = inner.profile_to_auth.get(&ProfileId(uuid)) {
                return Ok(*auth_id);
            }

            Err(LaunchdeskError::not_found(format!("unknown user id: {candidate}")))
        }

        async fn profile_ids_for(&self, auth_id: &AuthUserId) -> Result<Vec<ProfileId>> {
            let inner = self.inner.read().unwrap();
            Ok(inner
                .profile_to_auth
                .iter()
                .filter(|(_, a)| *a == auth_id)
                .map(|(p, _)| *p)
                .collect())
        }
    }
}
