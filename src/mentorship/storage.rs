//! Storage trait for mentorship data.
//!
//! The conditional operations (`insert_request_if_no_open`,
//! `upsert_assignment`) own the uniqueness invariants. They must be atomic
//! in real implementations (unique partial index plus on-conflict, or a
//! transaction); pre-checking existence in application code and then
//! writing is exactly the race this trait exists to remove.

use crate::error::Result;
use crate::identity::{AuthUserId, ProfileId};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::assignment::MentorAssignment;
use super::request::{EngagementTerms, MentorRequest};

/// Mentor profile data the lifecycle needs: default currency and the
/// stored equity record used when a request carries no terms at all.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MentorProfile {
    pub mentor_id: AuthUserId,
    pub fee_currency: Option<String>,
    /// Standing terms configured on the profile, used as the last-resort
    /// fallback when an accepted request has neither negotiated nor
    /// proposed terms.
    pub equity_record: Option<EngagementTerms>,
}

/// Trait for storing mentorship data.
#[async_trait]
pub trait MentorshipStore: Send + Sync {
    /// The open (pending/negotiating/accepted) request for a triple, if any.
    async fn find_open_request(
        &self,
        mentor: &AuthUserId,
        requester: &AuthUserId,
        startup: Option<&ProfileId>,
    ) -> Result<Option<MentorRequest>>;

    /// Insert a request unless an open one already exists for the same
    /// (mentor, requester, startup) triple. The input row's id is ignored;
    /// the returned row carries the assigned id.
    ///
    /// # Errors
    ///
    /// `Conflict` when an open request already exists.
    async fn insert_request_if_no_open(&self, request: MentorRequest) -> Result<MentorRequest>;

    async fn get_request(&self, id: i64) -> Result<Option<MentorRequest>>;

    async fn update_request(&self, request: &MentorRequest) -> Result<()>;

    async fn requests_for_mentor(&self, mentor: &AuthUserId) -> Result<Vec<MentorRequest>>;

    async fn requests_by_requester(&self, requester: &AuthUserId) -> Result<Vec<MentorRequest>>;

    /// Insert or update the assignment for (mentor, startup).
    ///
    /// When a row for the pair already exists, only the settled terms are
    /// refreshed; the existing id, status, and agreement artifacts are
    /// kept, which makes a repeated accept idempotent. The input row's id
    /// is ignored on insert.
    async fn upsert_assignment(&self, assignment: MentorAssignment) -> Result<MentorAssignment>;

    async fn get_assignment(&self, id: i64) -> Result<Option<MentorAssignment>>;

    async fn assignment_for_pair(
        &self,
        mentor: &AuthUserId,
        startup: &ProfileId,
    ) -> Result<Option<MentorAssignment>>;

    async fn update_assignment(&self, assignment: &MentorAssignment) -> Result<()>;

    async fn assignments_for_mentor(&self, mentor: &AuthUserId) -> Result<Vec<MentorAssignment>>;

    async fn assignments_for_startup(&self, startup: &ProfileId) -> Result<Vec<MentorAssignment>>;

    async fn get_mentor_profile(&self, mentor: &AuthUserId) -> Result<Option<MentorProfile>>;
}

/// In-memory mentorship store for testing.
#[cfg(any(test, feature = "test-support"))]
pub mod test {
    use super::*;
    use crate::error::LaunchdeskError;
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    /// In-memory mentorship store for testing.
    ///
    /// All conditional operations run under one mutex, so the uniqueness
    /// invariants hold under concurrent use.
    #[derive(Default, Clone)]
    pub struct InMemoryMentorshipStore {
        inner: Arc<Mutex<Tables>>,
    }

    #[derive(Default)]
    struct Tables {
        next_request_id: i64,
        next_assignment_id: i64,
        requests: Vec<MentorRequest>,
        assignments: Vec<MentorAssignment>,
        mentor_profiles: HashMap<AuthUserId, MentorProfile>,
    }

    impl InMemoryMentorshipStore {
        #[must_use]
        pub fn new() -> Self {
            Self::default()
        }

        /// Register a mentor profile.
        pub fn seed_mentor_profile(&self, profile: MentorProfile) {
            let mut tables = self.inner.lock().unwrap();
            tables.mentor_profiles.insert(profile.mentor_id, profile);
        }

        /// All assignment rows, for test assertions.
        pub fn all_assignments(&self) -> Vec<MentorAssignment> {
            self.inner.lock().unwrap().assignments.clone()
        }

        /// All request rows, for test assertions.
        pub fn all_requests(&self) -> Vec<MentorRequest> {
            self.inner.lock().unwrap().requests.clone()
        }
    }

    fn is_open_match(
        r: &MentorRequest,
        mentor: &AuthUserId,
        requester: &AuthUserId,
        startup: Option<&ProfileId>,
    ) -> bool {
        r.status.is_open()
            && r.mentor_id == *mentor
            && r.requester_id == *requester
            && r.startup_id.as_ref() == startup
    }

    #[async_trait]
    impl MentorshipStore for InMemoryMentorshipStore {
        async fn find_open_request(
            &self,
            mentor: &AuthUserId,
            requester: &AuthUserId,
            startup: Option<&ProfileId>,
        ) -> Result<Option<MentorRequest>> {
            let tables = self.inner.lock().unwrap();
            Ok(tables
                .requests
                .iter()
                .find(|r| is_open_match(r, mentor, requester, startup))
                .cloned())
        }

        async fn insert_request_if_no_open(
            &self,
            mut request: MentorRequest,
        ) -> Result<MentorRequest> {
            let mut tables = self.inner.lock().unwrap();

            let duplicate = tables.requests.iter().any(|r| {
                is_open_match(
                    r,
                    &request.mentor_id,
                    &request.requester_id,
                    request.startup_id.as_ref(),
                )
            });
            if duplicate {
                return Err(LaunchdeskError::conflict(
                    "an open request to this mentor already exists",
                ));
            }

            tables.next_request_id += 1;
            request.id = tables.next_request_id;
            tables.requests.push(request.clone());
            Ok(request)
        }

        async fn get_request(&self, id: i64) -> Result<Option<MentorRequest>> {
            let tables = self.inner.lock().unwrap();
            Ok(tables.requests.iter().find(|r| r.id == id).cloned())
        }

        async fn update_request(&self, request: &MentorRequest) -> Result<()> {
            let mut tables = self.inner.lock().unwrap();
            if let Some(row) = tables.requests.iter_mut().find(|r| r.id == request.id) {
                *row = request.clone();
            }
            Ok(())
        }

        async fn requests_for_mentor(&self, mentor: &AuthUserId) -> Result<Vec<MentorRequest>> {
            let tables = self.inner.lock().unwrap();
            Ok(tables
                .requests
                .iter()
                .filter(|r| r.mentor_id == *mentor)
                .cloned()
                .collect())
        }

        async fn requests_by_requester(
            &self,
            requester: &AuthUserId,
        ) -> Result<Vec<MentorRequest>> {
            let tables = self.inner.lock().unwrap();
            Ok(tables
                .requests
                .iter()
                .filter(|r| r.requester_id == *requester)
                .cloned()
                .collect())
        }

        async fn upsert_assignment(
            &self,
            mut assignment: MentorAssignment,
        ) -> Result<MentorAssignment> {
            let mut tables = self.inner.lock().unwrap();

            if let Some(existing) = tables.assignments.iter_mut().find(|a| {
                a.mentor_id == assignment.mentor_id && a.startup_id == assignment.startup_id
            }) {
                existing.fee_amount = assignment.fee_amount;
                existing.fee_currency = assignment.fee_currency.clone();
                existing.esop_percentage = assignment.esop_percentage;
                existing.esop_value = assignment.esop_value;
                return Ok(existing.clone());
            }

            tables.next_assignment_id += 1;
            assignment.id = tables.next_assignment_id;
            tables.assignments.push(assignment.clone());
            Ok(assignment)
        }

        async fn get_assignment(&self, id: i64) -> Result<Option<MentorAssignment>> {
            let tables = self.inner.lock().unwrap();
            Ok(tables.assignments.iter().find(|a| a.id == id).cloned())
        }

        async fn assignment_for_pair(
            &self,
            mentor: &AuthUserId,
            startup: &ProfileId,
        ) -> Result<Option<MentorAssignment>> {
            let tables = self.inner.lock().unwrap();
            Ok(tables
                .assignments
                .iter()
                .find(|a| a.mentor_id == *mentor && a.startup_id == *startup)
                .cloned())
        }

        async fn update_assignment(&self, assignment: &MentorAssignment) -> Result<()> {
            let mut tables = self.inner.lock().unwrap();
            if let Some(row) = tables
                .assignments
                .iter_mut()
                .find(|a| a.id == assignment.id)
            {
                *row = assignment.clone();
            }
            Ok(())
        }

        async fn assignments_for_mentor(
            &self,
            mentor: &AuthUserId,
        ) -> Result<Vec<MentorAssignment>> {
            let tables = self.inner.lock().unwrap();
            Ok(tables
                .assignments
                .iter()
                .filter(|a| a.mentor_id == *mentor)
                .cloned()
                .collect())
        }

        async fn assignments_for_startup(
            &self,
            startup: &ProfileId,
        ) -> Result<Vec<MentorAssignment>> {
            let tables = self.inner.lock().unwrap();
            Ok(tables
                .assignments
                .iter()
                .filter(|a| a.startup_id == *startup)
                .cloned()
                .collect())
        }

        async fn get_mentor_profile(&self, mentor: &AuthUserId) -> Result<Option<MentorProfile>> {
            let tables = self.inner.lock().unwrap();
            Ok(tables.mentor_profiles.get(mentor).cloned())
        }
    }
}
