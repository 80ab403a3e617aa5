//! Mentorship-specific error types.

use crate::error::LaunchdeskError;

use super::assignment::AssignmentStatus;
use super::request::RequestStatus;

/// Errors from mentorship operations.
#[derive(Debug, thiserror::Error)]
pub enum MentorshipError {
    #[error("not logged in")]
    NotAuthenticated,

    #[error("mentor request {0} not found")]
    RequestNotFound(i64),

    #[error("assignment {0} not found")]
    AssignmentNotFound(i64),

    #[error("an open request to this mentor already exists")]
    DuplicateOpenRequest,

    #[error("request status {from} does not allow transition to {to}")]
    InvalidTransition {
        from: RequestStatus,
        to: RequestStatus,
    },

    #[error("assignment status {from} does not allow {action}")]
    InvalidAssignmentAction {
        from: AssignmentStatus,
        action: &'static str,
    },

    #[error("only the requester may cancel a request")]
    NotRequester,

    #[error("message exceeds {max} characters (got {len})")]
    MessageTooLong { len: usize, max: usize },

    #[error("no agreement awaiting approval")]
    NoAgreementPending,
}

impl From<MentorshipError> for LaunchdeskError {
    fn from(err: MentorshipError) -> Self {
        match err {
            MentorshipError::NotAuthenticated => LaunchdeskError::Unauthorized(err.to_string()),
            MentorshipError::RequestNotFound(_) | MentorshipError::AssignmentNotFound(_) => {
                LaunchdeskError::NotFound(err.to_string())
            }
            MentorshipError::DuplicateOpenRequest => LaunchdeskError::Conflict(err.to_string()),
            MentorshipError::InvalidTransition { .. }
            | MentorshipError::InvalidAssignmentAction { .. }
            | MentorshipError::MessageTooLong { .. }
            | MentorshipError::NoAgreementPending => LaunchdeskError::BadRequest(err.to_string()),
            MentorshipError::NotRequester => LaunchdeskError::Forbidden(err.to_string()),
        }
    }
}
