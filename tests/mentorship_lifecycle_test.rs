//! End-to-end tests for the mentor engagement lifecycle: connect request,
//! negotiation, acceptance, and the assignment's payment/agreement gates.

use launchdesk::identity::test::InMemoryIdentityResolver;
use launchdesk::identity::{AuthUserId, ProfileId};
use launchdesk::mentorship::{
    AgreementStatus, AssignmentStatus, ConnectRequestInput, EngagementTerms,
    InMemoryMentorshipStore, MentorshipManager, RequestStatus,
};
use launchdesk::LaunchdeskError;
use uuid::Uuid;

struct World {
    mentorship: MentorshipManager<InMemoryMentorshipStore, InMemoryIdentityResolver>,
    store: InMemoryMentorshipStore,
    founder: AuthUserId,
    mentor: AuthUserId,
    startup: ProfileId,
}

fn world() -> World {
    let resolver = InMemoryIdentityResolver::new();
    let founder = AuthUserId(Uuid::new_v4());
    let mentor = AuthUserId(Uuid::new_v4());
    let startup = ProfileId(Uuid::new_v4());
    resolver.add_profile(startup, founder);
    resolver.add_auth_user(mentor);

    let store = InMemoryMentorshipStore::new();
    World {
        mentorship: MentorshipManager::new(store.clone(), resolver),
        store,
        founder,
        mentor,
        startup,
    }
}

fn connect_input(world: &World, fee: f64) -> ConnectRequestInput {
    ConnectRequestInput {
        caller: Some(world.founder.to_string()),
        mentor_id: world.mentor.to_string(),
        startup_id: Some(world.startup.to_string()),
        message: Some("Looking for go-to-market guidance".to_string()),
        proposed: EngagementTerms {
            fee_amount: Some(fee),
            ..Default::default()
        },
        currency: Some("USD".to_string()),
        ..Default::default()
    }
}

#[tokio::test]
async fn full_engagement_lifecycle() {
    let world = world();

    let request = world
        .mentorship
        .send_connect_request(connect_input(&world, 1000.0))
        .await
        .unwrap();
    assert_eq!(request.status, RequestStatus::Pending);

    assert!(world.mentorship.accept_request(request.id).await);

    let assignments = world.store.all_assignments();
    assert_eq!(assignments.len(), 1);
    let assignment = &assignments[0];
    assert_eq!(assignment.fee_amount, Some(1000.0));
    assert_eq!(assignment.fee_currency, "USD");
    assert_eq!(assignment.status, AssignmentStatus::PendingPaymentAndAgreement);

    // Payment clears first, then the agreement round-trip.
    let paid = world
        .mentorship
        .record_assignment_payment(assignment.id)
        .await
        .unwrap();
    assert_eq!(paid.status, AssignmentStatus::PendingAgreement);

    let submitted = world
        .mentorship
        .submit_agreement(assignment.id, "https://files.example/agreement.pdf")
        .await
        .unwrap();
    assert_eq!(
        submitted.agreement_status,
        Some(AgreementStatus::PendingMentorApproval)
    );

    let approved = world
        .mentorship
        .approve_agreement(assignment.id, "https://files.example/agreement-signed.pdf")
        .await
        .unwrap();
    assert_eq!(approved.status, AssignmentStatus::ReadyForActivation);

    let active = world
        .mentorship
        .activate_assignment(assignment.id)
        .await
        .unwrap();
    assert_eq!(active.status, AssignmentStatus::Active);

    let done = world
        .mentorship
        .complete_assignment(assignment.id)
        .await
        .unwrap();
    assert_eq!(done.status, AssignmentStatus::Completed);
    assert!(done.completed_at.is_some());
}

#[tokio::test]
async fn negotiated_terms_override_proposed() {
    let world = world();

    let request = world
        .mentorship
        .send_connect_request(connect_input(&world, 1000.0))
        .await
        .unwrap();

    let negotiating = world
        .mentorship
        .send_negotiation(
            request.id,
            EngagementTerms {
                fee_amount: Some(500.0),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(negotiating.status, RequestStatus::Negotiating);

    assert!(world.mentorship.accept_request(request.id).await);
    let assignments = world.store.all_assignments();
    assert_eq!(assignments[0].fee_amount, Some(500.0));
}

#[tokio::test]
async fn accept_on_rejected_request_mutates_nothing() {
    let world = world();

    let request = world
        .mentorship
        .send_connect_request(connect_input(&world, 1000.0))
        .await
        .unwrap();
    world.mentorship.reject_request(request.id).await.unwrap();

    assert!(!world.mentorship.accept_request(request.id).await);
    assert!(world.store.all_assignments().is_empty());

    let requests = world
        .mentorship
        .requests_for_mentor(&world.mentor)
        .await
        .unwrap();
    assert_eq!(requests[0].status, RequestStatus::Rejected);
}

#[tokio::test]
async fn double_accept_keeps_a_single_assignment() {
    let world = world();

    let request = world
        .mentorship
        .send_connect_request(connect_input(&world, 1000.0))
        .await
        .unwrap();

    assert!(world.mentorship.accept_request(request.id).await);
    // Terminal statuses are absorbing, so the second accept is a no-op.
    assert!(!world.mentorship.accept_request(request.id).await);
    assert_eq!(world.store.all_assignments().len(), 1);
}

#[tokio::test]
async fn duplicate_open_request_is_a_conflict() {
    let world = world();

    world
        .mentorship
        .send_connect_request(connect_input(&world, 1000.0))
        .await
        .unwrap();
    let err = world
        .mentorship
        .send_connect_request(connect_input(&world, 2000.0))
        .await
        .unwrap_err();
    assert!(matches!(err, LaunchdeskError::Conflict(_)));
}

#[tokio::test]
async fn only_the_requester_may_cancel() {
    let world = world();

    let request = world
        .mentorship
        .send_connect_request(connect_input(&world, 1000.0))
        .await
        .unwrap();

    let err = world
        .mentorship
        .cancel_request(request.id, &world.mentor.to_string())
        .await
        .unwrap_err();
    assert!(matches!(err, LaunchdeskError::Forbidden(_)));

    let cancelled = world
        .mentorship
        .cancel_request(request.id, &world.founder.to_string())
        .await
        .unwrap();
    assert_eq!(cancelled.status, RequestStatus::Cancelled);
}

#[tokio::test]
async fn free_engagement_skips_the_payment_gate() {
    let world = world();

    let mut input = connect_input(&world, 0.0);
    input.proposed = EngagementTerms::default();
    let request = world.mentorship.send_connect_request(input).await.unwrap();

    assert!(world.mentorship.accept_request(request.id).await);
    let assignment = &world.store.all_assignments()[0];
    assert_eq!(assignment.status, AssignmentStatus::PendingAgreement);

    world
        .mentorship
        .submit_agreement(assignment.id, "https://files.example/agreement.pdf")
        .await
        .unwrap();
    let approved = world
        .mentorship
        .approve_agreement(assignment.id, "https://files.example/agreement-signed.pdf")
        .await
        .unwrap();
    assert_eq!(approved.status, AssignmentStatus::ReadyForActivation);
}

#[tokio::test]
async fn unauthenticated_connect_request_is_rejected() {
    let world = world();

    let mut input = connect_input(&world, 1000.0);
    input.caller = None;
    let err = world.mentorship.send_connect_request(input).await.unwrap_err();
    assert!(matches!(err, LaunchdeskError::Unauthorized(_)));
}
