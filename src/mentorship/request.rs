//! Mentor connection requests and their negotiation state machine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::identity::{AuthUserId, ProfileId};

/// Who initiated the connection request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequesterType {
    #[default]
    Startup,
    Investor,
}

/// Status of a mentor request.
///
/// Legal transitions:
/// pending -> negotiating | accepted | rejected | cancelled
/// negotiating -> accepted | rejected | cancelled
///
/// Accepted, rejected, and cancelled are terminal. Terminal rows are kept
/// as history and never deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    Pending,
    Negotiating,
    Accepted,
    Rejected,
    Cancelled,
}

impl RequestStatus {
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Accepted | Self::Rejected | Self::Cancelled)
    }

    /// A request that still blocks new requests for the same triple.
    #[must_use]
    pub fn is_open(&self) -> bool {
        matches!(self, Self::Pending | Self::Negotiating | Self::Accepted)
    }

    /// Whether the state machine allows moving to `next`.
    #[must_use]
    pub fn can_transition_to(&self, next: RequestStatus) -> bool {
        match self {
            Self::Pending => matches!(
                next,
                Self::Negotiating | Self::Accepted | Self::Rejected | Self::Cancelled
            ),
            Self::Negotiating => {
                matches!(next, Self::Accepted | Self::Rejected | Self::Cancelled)
            }
            Self::Accepted | Self::Rejected | Self::Cancelled => false,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Negotiating => "negotiating",
            Self::Accepted => "accepted",
            Self::Rejected => "rejected",
            Self::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Compensation terms attached to a request, as offered by either side.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngagementTerms {
    pub fee_amount: Option<f64>,
    pub equity_amount: Option<f64>,
    pub esop_percentage: Option<f64>,
}

impl EngagementTerms {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fee_amount.is_none() && self.equity_amount.is_none() && self.esop_percentage.is_none()
    }
}

/// One connection attempt from a startup or investor to a mentor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MentorRequest {
    pub id: i64,
    pub mentor_id: AuthUserId,
    pub requester_id: AuthUserId,
    pub requester_type: RequesterType,
    /// The startup the engagement is for, when the requester acts for one.
    pub startup_id: Option<ProfileId>,
    pub message: Option<String>,
    /// The requester's offer.
    pub proposed: EngagementTerms,
    /// The mentor's counter-offer, present once negotiation started.
    pub negotiated: Option<EngagementTerms>,
    pub fee_currency: String,
    pub status: RequestStatus,
    pub requested_at: DateTime<Utc>,
    pub responded_at: Option<DateTime<Utc>>,
}

impl MentorRequest {
    /// The terms an acceptance settles on: the mentor's counter-offer when
    /// one exists, else the requester's original offer.
    #[must_use]
    pub fn effective_terms(&self) -> &EngagementTerms {
        self.negotiated.as_ref().unwrap_or(&self.proposed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pending_can_move_to_every_next_state() {
        let s = RequestStatus::Pending;
        assert!(s.can_transition_to(RequestStatus::Negotiating));
        assert!(s.can_transition_to(RequestStatus::Accepted));
        assert!(s.can_transition_to(RequestStatus::Rejected));
        assert!(s.can_transition_to(RequestStatus::Cancelled));
    }

    #[test]
    fn negotiating_cannot_return_to_pending_or_renegotiate() {
        let s = RequestStatus::Negotiating;
        assert!(!s.can_transition_to(RequestStatus::Pending));
        assert!(!s.can_transition_to(RequestStatus::Negotiating));
        assert!(s.can_transition_to(RequestStatus::Accepted));
        assert!(s.can_transition_to(RequestStatus::Rejected));
        assert!(s.can_transition_to(RequestStatus::Cancelled));
    }

    #[test]
    fn terminal_states_are_absorbing() {
        for terminal in [
            RequestStatus::Accepted,
            RequestStatus::Rejected,
            RequestStatus::Cancelled,
        ] {
            assert!(terminal.is_terminal());
            for next in [
                RequestStatus::Pending,
                RequestStatus::Negotiating,
                RequestStatus::Accepted,
                RequestStatus::Rejected,
                RequestStatus::Cancelled,
            ] {
                assert!(
                    !terminal.can_transition_to(next),
                    "{terminal} must not move to {next}"
                );
            }
        }
    }

    #[test]
    fn accepted_counts_as_open_for_uniqueness() {
        assert!(RequestStatus::Pending.is_open());
        assert!(RequestStatus::Negotiating.is_open());
        assert!(RequestStatus::Accepted.is_open());
        assert!(!RequestStatus::Rejected.is_open());
        assert!(!RequestStatus::Cancelled.is_open());
    }

    #[test]
    fn effective_terms_prefer_the_counter_offer() {
        let mut request = MentorRequest {
            id: 1,
            mentor_id: AuthUserId(uuid::Uuid::new_v4()),
            requester_id: AuthUserId(uuid::Uuid::new_v4()),
            requester_type: RequesterType::Startup,
            startup_id: None,
            message: None,
            proposed: EngagementTerms {
                fee_amount: Some(1000.0),
                ..Default::default()
            },
            negotiated: None,
            fee_currency: "USD".to_string(),
            status: RequestStatus::Pending,
            requested_at: Utc::now(),
            responded_at: None,
        };

        assert_eq!(request.effective_terms().fee_amount, Some(1000.0));

        request.negotiated = Some(EngagementTerms {
            fee_amount: Some(500.0),
            ..Default::default()
        });
        assert_eq!(request.effective_terms().fee_amount, Some(500.0));
    }
}
