//! The mentor engagement lifecycle.
//!
//! Drives the request state machine (pending -> negotiating -> terminal)
//! and the dependent assignment record with its payment/agreement gating.
//! All identifier handling goes through [`IdentityResolver`]; all
//! uniqueness invariants live in the storage trait's conditional writes.

use chrono::Utc;

use crate::error::Result;
use crate::identity::{AuthUserId, IdentityResolver, ProfileId};

use super::assignment::{AgreementStatus, AssignmentStatus, MentorAssignment};
use super::error::MentorshipError;
use super::request::{EngagementTerms, MentorRequest, RequestStatus, RequesterType};
use super::storage::MentorshipStore;

/// Maximum length of the optional message on a connect request.
const MAX_MESSAGE_LEN: usize = 500;

/// Currency used when neither the request nor the mentor profile names one.
const DEFAULT_CURRENCY: &str = "USD";

/// Inputs for [`MentorshipManager::send_connect_request`].
#[derive(Debug, Clone, Default)]
pub struct ConnectRequestInput {
    /// The authenticated caller's identifier, in either id namespace.
    /// None means the caller is not logged in.
    pub caller: Option<String>,
    /// The mentor's identifier, in either id namespace.
    pub mentor_id: String,
    pub requester_type: Option<RequesterType>,
    pub startup_id: Option<String>,
    pub message: Option<String>,
    pub proposed: EngagementTerms,
    pub currency: Option<String>,
}

/// Mentor request/assignment lifecycle operations.
pub struct MentorshipManager<S: MentorshipStore, R: IdentityResolver> {
    store: S,
    resolver: R,
}

impl<S: MentorshipStore, R: IdentityResolver> MentorshipManager<S, R> {
    /// Create a new mentorship manager.
    #[must_use]
    pub fn new(store: S, resolver: R) -> Self {
        Self { store, resolver }
    }

    /// Send a connect request from a startup or investor to a mentor.
    ///
    /// The currency defaults to the mentor profile's configured fee
    /// currency, else USD.
    ///
    /// # Errors
    ///
    /// - `Unauthorized` when no caller is present.
    /// - `BadRequest` for a malformed identifier or an over-long message.
    /// - `NotFound` when the mentor or requester cannot be resolved.
    /// - `Conflict` when an open request for the triple already exists.
    pub async fn send_connect_request(&self, input: ConnectRequestInput) -> Result<MentorRequest> {
        let caller = input
            .caller
            .as_deref()
            .ok_or(MentorshipError::NotAuthenticated)?;

        if let Some(message) = &input.message {
            if message.chars().count() > MAX_MESSAGE_LEN {
                return Err(MentorshipError::MessageTooLong {
                    len: message.chars().count(),
                    max: MAX_MESSAGE_LEN,
                }
                .into());
            }
        }

        let requester_id = self.resolver.resolve_auth_id(caller).await?;
        let mentor_id = self.resolver.resolve_auth_id(&input.mentor_id).await?;

        let startup_id = match &input.startup_id {
            Some(raw) => Some(ProfileId::parse(raw)?),
            None => None,
        };

        let fee_currency = match input.currency {
            Some(currency) => currency,
            None => self
                .store
                .get_mentor_profile(&mentor_id)
                .await?
                .and_then(|p| p.fee_currency)
                .unwrap_or_else(|| DEFAULT_CURRENCY.to_string()),
        };

        let request = MentorRequest {
            id: 0,
            mentor_id,
            requester_id,
            requester_type: input.requester_type.unwrap_or_default(),
            startup_id,
            message: input.message,
            proposed: input.proposed,
            negotiated: None,
            fee_currency,
            status: RequestStatus::Pending,
            requested_at: Utc::now(),
            responded_at: None,
        };

        let created = self.store.insert_request_if_no_open(request).await?;
        tracing::info!(
            request_id = created.id,
            mentor_id = %created.mentor_id,
            requester_id = %created.requester_id,
            "Connect request created"
        );
        Ok(created)
    }

    /// Record the mentor's counter-offer and move the request to
    /// negotiating.
    pub async fn send_negotiation(
        &self,
        request_id: i64,
        counter: EngagementTerms,
    ) -> Result<MentorRequest> {
        let mut request = self.get_request_or_err(request_id).await?;

        if !request.status.can_transition_to(RequestStatus::Negotiating) {
            return Err(MentorshipError::InvalidTransition {
                from: request.status,
                to: RequestStatus::Negotiating,
            }
            .into());
        }

        request.negotiated = Some(counter);
        request.status = RequestStatus::Negotiating;
        request.responded_at = Some(Utc::now());
        self.store.update_request(&request).await?;

        tracing::info!(request_id, "Request moved to negotiating");
        Ok(request)
    }

    /// Accept a request.
    ///
    /// Returns false without mutating anything when the request does not
    /// exist or is already terminal, and when the assignment upsert fails.
    /// When the request carries a startup, the assignment is created (or
    /// its terms refreshed) before the request flips to accepted, so a
    /// failed upsert never strands an accepted request without its
    /// assignment. Repeating the call cannot create a second assignment
    /// row; the storage upsert is keyed on the (mentor, startup) pair.
    pub async fn accept_request(&self, request_id: i64) -> bool {
        match self.try_accept(request_id).await {
            Ok(accepted) => accepted,
            Err(err) => {
                tracing::error!(request_id, error = %err, "Accept failed");
                false
            }
        }
    }

    async fn try_accept(&self, request_id: i64) -> Result<bool> {
        let Some(mut request) = self.store.get_request(request_id).await? else {
            tracing::warn!(request_id, "Accept on unknown request");
            return Ok(false);
        };

        if !request.status.can_transition_to(RequestStatus::Accepted) {
            tracing::warn!(
                request_id,
                status = %request.status,
                "Accept on request not in an acceptable status"
            );
            return Ok(false);
        }

        if let Some(startup_id) = request.startup_id {
            let terms = self.settled_terms(&request).await?;
            let assignment = MentorAssignment {
                id: 0,
                mentor_id: request.mentor_id,
                startup_id,
                fee_amount: terms.fee_amount,
                fee_currency: request.fee_currency.clone(),
                esop_percentage: terms.esop_percentage,
                esop_value: terms.equity_amount,
                status: MentorAssignment::initial_status(terms.fee_amount),
                agreement_url: None,
                agreement_status: None,
                mentor_signed_agreement_url: None,
                assigned_at: Utc::now(),
                completed_at: None,
            };
            let stored = self.store.upsert_assignment(assignment).await?;
            tracing::info!(
                request_id,
                assignment_id = stored.id,
                status = %stored.status,
                "Assignment upserted for accepted request"
            );
        }

        request.status = RequestStatus::Accepted;
        request.responded_at = Some(Utc::now());
        self.store.update_request(&request).await?;

        tracing::info!(request_id, "Request accepted");
        Ok(true)
    }

    /// The terms an acceptance settles on: negotiated over proposed over
    /// the mentor profile's stored equity record.
    async fn settled_terms(&self, request: &MentorRequest) -> Result<EngagementTerms> {
        let terms = request.effective_terms();
        if !terms.is_empty() {
            return Ok(terms.clone());
        }

        Ok(self
            .store
            .get_mentor_profile(&request.mentor_id)
            .await?
            .and_then(|p| p.equity_record)
            .unwrap_or_default())
    }

    /// Reject a request. Allowed from any non-terminal status.
    pub async fn reject_request(&self, request_id: i64) -> Result<MentorRequest> {
        let mut request = self.get_request_or_err(request_id).await?;

        if !request.status.can_transition_to(RequestStatus::Rejected) {
            return Err(MentorshipError::InvalidTransition {
                from: request.status,
                to: RequestStatus::Rejected,
            }
            .into());
        }

        request.status = RequestStatus::Rejected;
        request.responded_at = Some(Utc::now());
        self.store.update_request(&request).await?;

        tracing::info!(request_id, "Request rejected");
        Ok(request)
    }

    /// Cancel a request. Only the requester may cancel, and only while the
    /// request is pending or negotiating. Enforced here, not in the UI.
    pub async fn cancel_request(&self, request_id: i64, caller: &str) -> Result<MentorRequest> {
        let caller_id = self.resolver.resolve_auth_id(caller).await?;
        let mut request = self.get_request_or_err(request_id).await?;

        if request.requester_id != caller_id {
            return Err(MentorshipError::NotRequester.into());
        }

        if !request.status.can_transition_to(RequestStatus::Cancelled) {
            return Err(MentorshipError::InvalidTransition {
                from: request.status,
                to: RequestStatus::Cancelled,
            }
            .into());
        }

        request.status = RequestStatus::Cancelled;
        request.responded_at = Some(Utc::now());
        self.store.update_request(&request).await?;

        tracing::info!(request_id, "Request cancelled by requester");
        Ok(request)
    }

    /// All requests addressed to a mentor.
    pub async fn requests_for_mentor(&self, mentor: &AuthUserId) -> Result<Vec<MentorRequest>> {
        self.store.requests_for_mentor(mentor).await
    }

    /// All requests sent by a requester.
    pub async fn requests_by_requester(
        &self,
        requester: &AuthUserId,
    ) -> Result<Vec<MentorRequest>> {
        self.store.requests_by_requester(requester).await
    }

    // ------------------------------------------------------------------
    // Assignment sub-lifecycle
    // ------------------------------------------------------------------

    /// Record that the engagement fee has been settled.
    ///
    /// Idempotent: a duplicate settlement notification for a state with no
    /// outstanding payment leaves the assignment untouched.
    pub async fn record_assignment_payment(&self, assignment_id: i64) -> Result<MentorAssignment> {
        let mut assignment = self.get_assignment_or_err(assignment_id).await?;

        if !assignment.status.payment_outstanding() {
            tracing::warn!(
                assignment_id,
                status = %assignment.status,
                "Payment recorded with none outstanding, ignoring"
            );
            return Ok(assignment);
        }

        assignment.status = assignment.status.after_payment();
        self.store.update_assignment(&assignment).await?;

        tracing::info!(assignment_id, status = %assignment.status, "Assignment payment settled");
        Ok(assignment)
    }

    /// Attach an uploaded agreement document awaiting mentor approval.
    pub async fn submit_agreement(
        &self,
        assignment_id: i64,
        agreement_url: &str,
    ) -> Result<MentorAssignment> {
        let mut assignment = self.get_assignment_or_err(assignment_id).await?;

        if !assignment.status.agreement_outstanding() {
            return Err(MentorshipError::InvalidAssignmentAction {
                from: assignment.status,
                action: "agreement submission",
            }
            .into());
        }

        assignment.agreement_url = Some(agreement_url.to_string());
        assignment.agreement_status = Some(AgreementStatus::PendingMentorApproval);
        self.store.update_assignment(&assignment).await?;

        tracing::info!(assignment_id, "Agreement submitted for mentor approval");
        Ok(assignment)
    }

    /// Mentor approves the agreement, supplying the counter-signed copy.
    pub async fn approve_agreement(
        &self,
        assignment_id: i64,
        mentor_signed_url: &str,
    ) -> Result<MentorAssignment> {
        let mut assignment = self.get_assignment_or_err(assignment_id).await?;

        if assignment.agreement_status != Some(AgreementStatus::PendingMentorApproval) {
            return Err(MentorshipError::NoAgreementPending.into());
        }

        assignment.agreement_status = Some(AgreementStatus::Approved);
        assignment.mentor_signed_agreement_url = Some(mentor_signed_url.to_string());
        assignment.status = assignment.status.after_agreement_approval();
        self.store.update_assignment(&assignment).await?;

        tracing::info!(assignment_id, status = %assignment.status, "Agreement approved");
        Ok(assignment)
    }

    /// The explicit "send to mentor" action that takes a fully gated
    /// assignment live.
    pub async fn activate_assignment(&self, assignment_id: i64) -> Result<MentorAssignment> {
        let mut assignment = self.get_assignment_or_err(assignment_id).await?;

        if assignment.status != AssignmentStatus::ReadyForActivation {
            return Err(MentorshipError::InvalidAssignmentAction {
                from: assignment.status,
                action: "activation",
            }
            .into());
        }

        assignment.status = AssignmentStatus::Active;
        self.store.update_assignment(&assignment).await?;

        tracing::info!(assignment_id, "Assignment active");
        Ok(assignment)
    }

    /// Mark an active engagement completed. There is no way back out of
    /// completed.
    pub async fn complete_assignment(&self, assignment_id: i64) -> Result<MentorAssignment> {
        let mut assignment = self.get_assignment_or_err(assignment_id).await?;

        if assignment.status != AssignmentStatus::Active {
            return Err(MentorshipError::InvalidAssignmentAction {
                from: assignment.status,
                action: "completion",
            }
            .into());
        }

        assignment.status = AssignmentStatus::Completed;
        assignment.completed_at = Some(Utc::now());
        self.store.update_assignment(&assignment).await?;

        tracing::info!(assignment_id, "Assignment completed");
        Ok(assignment)
    }

    /// Cancel an assignment that has not completed.
    pub async fn cancel_assignment(&self, assignment_id: i64) -> Result<MentorAssignment> {
        let mut assignment = self.get_assignment_or_err(assignment_id).await?;

        if matches!(
            assignment.status,
            AssignmentStatus::Completed | AssignmentStatus::Cancelled
        ) {
            return Err(MentorshipError::InvalidAssignmentAction {
                from: assignment.status,
                action: "cancellation",
            }
            .into());
        }

        assignment.status = AssignmentStatus::Cancelled;
        self.store.update_assignment(&assignment).await?;

        tracing::info!(assignment_id, "Assignment cancelled");
        Ok(assignment)
    }

    /// All assignments for a startup.
    pub async fn assignments_for_startup(
        &self,
        startup: &ProfileId,
    ) -> Result<Vec<MentorAssignment>> {
        self.store.assignments_for_startup(startup).await
    }

    /// Fetch a single assignment.
    ///
    /// # Errors
    ///
    /// `NotFound` when no assignment has that id.
    pub async fn assignment(&self, assignment_id: i64) -> Result<MentorAssignment> {
        self.get_assignment_or_err(assignment_id).await
    }

    /// All assignments for a mentor.
    pub async fn assignments_for_mentor(
        &self,
        mentor: &AuthUserId,
    ) -> Result<Vec<MentorAssignment>> {
        self.store.assignments_for_mentor(mentor).await
    }

    async fn get_request_or_err(&self, request_id: i64) -> Result<MentorRequest> {
        self.store
            .get_request(request_id)
            .await?
            .ok_or_else(|| MentorshipError::RequestNotFound(request_id).into())
    }

    async fn get_assignment_or_err(&self, assignment_id: i64) -> Result<MentorAssignment> {
        self.store
            .get_assignment(assignment_id)
            .await?
            .ok_or_else(|| MentorshipError::AssignmentNotFound(assignment_id).into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LaunchdeskError;
    use crate::identity::test::InMemoryIdentityResolver;
    use crate::mentorship::storage::test::InMemoryMentorshipStore;
    use crate::mentorship::storage::MentorProfile;
    use uuid::Uuid;

    struct Fixture {
        manager: MentorshipManager<InMemoryMentorshipStore, InMemoryIdentityResolver>,
        store: InMemoryMentorshipStore,
        mentor: AuthUserId,
        requester: AuthUserId,
        startup: ProfileId,
    }

    fn fixture() -> Fixture {
        let store = InMemoryMentorshipStore::new();
        let resolver = InMemoryIdentityResolver::new();

        let mentor = AuthUserId(Uuid::new_v4());
        let requester = AuthUserId(Uuid::new_v4());
        let startup = ProfileId(Uuid::new_v4());
        resolver.add_auth_user(mentor);
        resolver.add_profile(startup, requester);

        Fixture {
            manager: MentorshipManager::new(store.clone(), resolver),
            store,
            mentor,
            requester,
            startup,
        }
    }

    fn connect_input(f: &Fixture) -> ConnectRequestInput {
        ConnectRequestInput {
            caller: Some(f.requester.to_string()),
            mentor_id: f.mentor.to_string(),
            requester_type: Some(RequesterType::Startup),
            startup_id: Some(f.startup.to_string()),
            message: None,
            proposed: EngagementTerms {
                fee_amount: Some(1000.0),
                ..Default::default()
            },
            currency: Some("USD".to_string()),
        }
    }

    #[tokio::test]
    async fn connect_request_requires_authentication() {
        let f = fixture();
        let err = f
            .manager
            .send_connect_request(ConnectRequestInput {
                caller: None,
                ..connect_input(&f)
            })
            .await
            .unwrap_err();
        assert!(matches!(err, LaunchdeskError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn connect_request_rejects_malformed_mentor_id() {
        let f = fixture();
        let err = f
            .manager
            .send_connect_request(ConnectRequestInput {
                mentor_id: "not-a-uuid".to_string(),
                ..connect_input(&f)
            })
            .await
            .unwrap_err();
        assert!(matches!(err, LaunchdeskError::BadRequest(_)));
    }

    #[tokio::test]
    async fn connect_request_rejects_unknown_mentor() {
        let f = fixture();
        let err = f
            .manager
            .send_connect_request(ConnectRequestInput {
                mentor_id: Uuid::new_v4().to_string(),
                ..connect_input(&f)
            })
            .await
            .unwrap_err();
        assert!(matches!(err, LaunchdeskError::NotFound(_)));
    }

    #[tokio::test]
    async fn connect_request_rejects_long_message() {
        let f = fixture();
        let err = f
            .manager
            .send_connect_request(ConnectRequestInput {
                message: Some("x".repeat(501)),
                ..connect_input(&f)
            })
            .await
            .unwrap_err();
        assert!(matches!(err, LaunchdeskError::BadRequest(_)));

        // 500 characters is still fine.
        f.manager
            .send_connect_request(ConnectRequestInput {
                message: Some("x".repeat(500)),
                ..connect_input(&f)
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn currency_defaults_to_mentor_profile_then_usd() {
        let f = fixture();
        f.store.seed_mentor_profile(MentorProfile {
            mentor_id: f.mentor,
            fee_currency: Some("INR".to_string()),
            equity_record: None,
        });

        let request = f
            .manager
            .send_connect_request(ConnectRequestInput {
                currency: None,
                ..connect_input(&f)
            })
            .await
            .unwrap();
        assert_eq!(request.fee_currency, "INR");

        // No profile currency for a different mentor: falls back to USD.
        let other_mentor = AuthUserId(Uuid::new_v4());
        f.manager.resolver.add_auth_user(other_mentor);
        let request = f
            .manager
            .send_connect_request(ConnectRequestInput {
                mentor_id: other_mentor.to_string(),
                currency: None,
                ..connect_input(&f)
            })
            .await
            .unwrap();
        assert_eq!(request.fee_currency, "USD");
    }

    #[tokio::test]
    async fn duplicate_open_request_conflicts() {
        let f = fixture();
        f.manager.send_connect_request(connect_input(&f)).await.unwrap();
        let err = f
            .manager
            .send_connect_request(connect_input(&f))
            .await
            .unwrap_err();
        assert!(matches!(err, LaunchdeskError::Conflict(_)));
    }

    #[tokio::test]
    async fn accept_uses_proposed_terms_when_not_negotiated() {
        let f = fixture();
        let request = f.manager.send_connect_request(connect_input(&f)).await.unwrap();

        assert!(f.manager.accept_request(request.id).await);

        let assignments = f.store.all_assignments();
        assert_eq!(assignments.len(), 1);
        assert_eq!(assignments[0].fee_amount, Some(1000.0));
        assert_eq!(assignments[0].fee_currency, "USD");
        assert_eq!(
            assignments[0].status,
            AssignmentStatus::PendingPaymentAndAgreement
        );

        let stored = f.store.get_request(request.id).await.unwrap().unwrap();
        assert_eq!(stored.status, RequestStatus::Accepted);
        assert!(stored.responded_at.is_some());
    }

    #[tokio::test]
    async fn accept_prefers_negotiated_terms() {
        let f = fixture();
        let request = f
            .manager
            .send_connect_request(ConnectRequestInput {
                proposed: EngagementTerms::default(),
                ..connect_input(&f)
            })
            .await
            .unwrap();

        f.manager
            .send_negotiation(
                request.id,
                EngagementTerms {
                    fee_amount: Some(500.0),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert!(f.manager.accept_request(request.id).await);
        let assignments = f.store.all_assignments();
        assert_eq!(assignments[0].fee_amount, Some(500.0));
    }

    #[tokio::test]
    async fn accept_falls_back_to_mentor_equity_record() {
        let f = fixture();
        f.store.seed_mentor_profile(MentorProfile {
            mentor_id: f.mentor,
            fee_currency: None,
            equity_record: Some(EngagementTerms {
                esop_percentage: Some(1.5),
                ..Default::default()
            }),
        });

        let request = f
            .manager
            .send_connect_request(ConnectRequestInput {
                proposed: EngagementTerms::default(),
                ..connect_input(&f)
            })
            .await
            .unwrap();

        assert!(f.manager.accept_request(request.id).await);
        let assignments = f.store.all_assignments();
        assert_eq!(assignments[0].esop_percentage, Some(1.5));
        // No fee means no payment gate.
        assert_eq!(assignments[0].status, AssignmentStatus::PendingAgreement);
    }

    #[tokio::test]
    async fn accept_on_terminal_request_is_a_no_op() {
        let f = fixture();
        let request = f.manager.send_connect_request(connect_input(&f)).await.unwrap();
        f.manager.reject_request(request.id).await.unwrap();

        assert!(!f.manager.accept_request(request.id).await);
        assert!(f.store.all_assignments().is_empty());

        let stored = f.store.get_request(request.id).await.unwrap().unwrap();
        assert_eq!(stored.status, RequestStatus::Rejected);
    }

    #[tokio::test]
    async fn accept_on_unknown_request_returns_false() {
        let f = fixture();
        assert!(!f.manager.accept_request(9999).await);
    }

    #[tokio::test]
    async fn double_accept_creates_one_assignment() {
        let f = fixture();
        let request = f.manager.send_connect_request(connect_input(&f)).await.unwrap();

        assert!(f.manager.accept_request(request.id).await);
        assert!(!f.manager.accept_request(request.id).await);
        assert_eq!(f.store.all_assignments().len(), 1);
    }

    #[tokio::test]
    async fn negotiation_only_from_pending() {
        let f = fixture();
        let request = f.manager.send_connect_request(connect_input(&f)).await.unwrap();

        f.manager
            .send_negotiation(request.id, EngagementTerms::default())
            .await
            .unwrap();

        let err = f
            .manager
            .send_negotiation(request.id, EngagementTerms::default())
            .await
            .unwrap_err();
        assert!(matches!(err, LaunchdeskError::BadRequest(_)));
    }

    #[tokio::test]
    async fn cancel_is_requester_only_and_pre_terminal() {
        let f = fixture();
        let request = f.manager.send_connect_request(connect_input(&f)).await.unwrap();

        // The mentor cannot cancel.
        let err = f
            .manager
            .cancel_request(request.id, &f.mentor.to_string())
            .await
            .unwrap_err();
        assert!(matches!(err, LaunchdeskError::Forbidden(_)));

        f.manager
            .cancel_request(request.id, &f.requester.to_string())
            .await
            .unwrap();

        // Terminal now; a second cancel fails.
        let err = f
            .manager
            .cancel_request(request.id, &f.requester.to_string())
            .await
            .unwrap_err();
        assert!(matches!(err, LaunchdeskError::BadRequest(_)));
    }

    #[tokio::test]
    async fn full_assignment_lifecycle_payment_first() {
        let f = fixture();
        let request = f.manager.send_connect_request(connect_input(&f)).await.unwrap();
        assert!(f.manager.accept_request(request.id).await);
        let assignment_id = f.store.all_assignments()[0].id;

        let a = f.manager.record_assignment_payment(assignment_id).await.unwrap();
        assert_eq!(a.status, AssignmentStatus::PendingAgreement);

        let a = f
            .manager
            .submit_agreement(assignment_id, "https://files.test/agreement.pdf")
            .await
            .unwrap();
        assert_eq!(a.agreement_status, Some(AgreementStatus::PendingMentorApproval));
        assert_eq!(a.status, AssignmentStatus::PendingAgreement);

        let a = f
            .manager
            .approve_agreement(assignment_id, "https://files.test/agreement-signed.pdf")
            .await
            .unwrap();
        assert_eq!(a.status, AssignmentStatus::ReadyForActivation);
        assert_eq!(a.agreement_status, Some(AgreementStatus::Approved));

        let a = f.manager.activate_assignment(assignment_id).await.unwrap();
        assert_eq!(a.status, AssignmentStatus::Active);

        let a = f.manager.complete_assignment(assignment_id).await.unwrap();
        assert_eq!(a.status, AssignmentStatus::Completed);
        assert!(a.completed_at.is_some());

        // Completed is terminal.
        let err = f.manager.cancel_assignment(assignment_id).await.unwrap_err();
        assert!(matches!(err, LaunchdeskError::BadRequest(_)));
    }

    #[tokio::test]
    async fn duplicate_payment_is_ignored() {
        let f = fixture();
        let request = f.manager.send_connect_request(connect_input(&f)).await.unwrap();
        assert!(f.manager.accept_request(request.id).await);
        let assignment_id = f.store.all_assignments()[0].id;

        f.manager.record_assignment_payment(assignment_id).await.unwrap();
        let a = f.manager.record_assignment_payment(assignment_id).await.unwrap();
        assert_eq!(a.status, AssignmentStatus::PendingAgreement);
    }

    #[tokio::test]
    async fn activation_requires_ready_state() {
        let f = fixture();
        let request = f.manager.send_connect_request(connect_input(&f)).await.unwrap();
        assert!(f.manager.accept_request(request.id).await);
        let assignment_id = f.store.all_assignments()[0].id;

        let err = f.manager.activate_assignment(assignment_id).await.unwrap_err();
        assert!(matches!(err, LaunchdeskError::BadRequest(_)));
    }

    #[tokio::test]
    async fn approval_requires_a_pending_agreement() {
        let f = fixture();
        let request = f.manager.send_connect_request(connect_input(&f)).await.unwrap();
        assert!(f.manager.accept_request(request.id).await);
        let assignment_id = f.store.all_assignments()[0].id;

        let err = f
            .manager
            .approve_agreement(assignment_id, "https://files.test/signed.pdf")
            .await
            .unwrap_err();
        assert!(matches!(err, LaunchdeskError::BadRequest(_)));
    }
}
