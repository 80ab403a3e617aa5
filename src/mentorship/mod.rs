//! The mentor marketplace lifecycle.
//!
//! A startup (or investor) sends a connect request to a mentor with
//! optional fee/equity terms. The mentor can counter (negotiate), accept,
//! or reject; the requester can cancel while the request is open. An
//! acceptance with a startup attached creates a [`MentorAssignment`] that
//! must clear its payment and agreement gates before going active.
//!
//! # Example
//!
//! ```rust,ignore
//! use launchdesk::mentorship::{ConnectRequestInput, EngagementTerms, MentorshipManager};
//!
//! let mentorship = MentorshipManager::new(store, resolver);
//!
//! let request = mentorship
//!     .send_connect_request(ConnectRequestInput {
//!         caller: Some(session.user_id.clone()),
//!         mentor_id: mentor_id.to_string(),
//!         startup_id: Some(startup_id.to_string()),
//!         proposed: EngagementTerms { fee_amount: Some(1000.0), ..Default::default() },
//!         ..Default::default()
//!     })
//!     .await?;
//!
//! // Later, from the mentor's side:
//! if mentorship.accept_request(request.id).await {
//!     // the assignment now exists and awaits payment + agreement
//! }
//! ```

pub mod assignment;
pub mod error;
pub mod request;
pub mod service;
pub mod storage;

pub use assignment::{AgreementStatus, AssignmentStatus, MentorAssignment};
pub use error::MentorshipError;
pub use request::{EngagementTerms, MentorRequest, RequestStatus, RequesterType};
pub use service::{ConnectRequestInput, MentorshipManager};
pub use storage::{MentorProfile, MentorshipStore};

#[cfg(any(test, feature = "test-support"))]
pub use storage::test::InMemoryMentorshipStore;
