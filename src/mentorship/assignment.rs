//! Mentor-startup assignments: the operational record of an accepted
//! engagement, gated on payment and a signed agreement.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::identity::{AuthUserId, ProfileId};

/// Status of an assignment.
///
/// The pending_* states track which artifacts are still outstanding before
/// the engagement can go live:
///
/// pending_payment_and_agreement --payment--> pending_agreement
/// pending_payment_and_agreement --agreement--> pending_payment
/// pending_payment --payment--> ready_for_activation
/// pending_agreement --agreement--> ready_for_activation
/// ready_for_activation --send to mentor--> active
/// active --completion--> completed
///
/// Completed has no outgoing transitions. Cancelled can be entered from any
/// non-completed state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssignmentStatus {
    PendingPayment,
    PendingAgreement,
    PendingPaymentAndAgreement,
    ReadyForActivation,
    Active,
    Completed,
    Cancelled,
}

impl AssignmentStatus {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PendingPayment => "pending_payment",
            Self::PendingAgreement => "pending_agreement",
            Self::PendingPaymentAndAgreement => "pending_payment_and_agreement",
            Self::ReadyForActivation => "ready_for_activation",
            Self::Active => "active",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    /// Whether a payment is still outstanding in this state.
    #[must_use]
    pub fn payment_outstanding(&self) -> bool {
        matches!(self, Self::PendingPayment | Self::PendingPaymentAndAgreement)
    }

    /// Whether an approved agreement is still outstanding in this state.
    #[must_use]
    pub fn agreement_outstanding(&self) -> bool {
        matches!(self, Self::PendingAgreement | Self::PendingPaymentAndAgreement)
    }

    /// The state after the payment settles.
    #[must_use]
    pub fn after_payment(&self) -> Self {
        match self {
            Self::PendingPaymentAndAgreement => Self::PendingAgreement,
            Self::PendingPayment => Self::ReadyForActivation,
            other => *other,
        }
    }

    /// The state after the agreement is approved by the mentor.
    #[must_use]
    pub fn after_agreement_approval(&self) -> Self {
        match self {
            Self::PendingPaymentAndAgreement => Self::PendingPayment,
            Self::PendingAgreement => Self::ReadyForActivation,
            other => *other,
        }
    }
}

impl std::fmt::Display for AssignmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Review state of the uploaded engagement agreement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgreementStatus {
    PendingMentorApproval,
    Approved,
}

/// One mentor-startup engagement, created when a request is accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MentorAssignment {
    pub id: i64,
    pub mentor_id: AuthUserId,
    pub startup_id: ProfileId,
    /// Settled terms, copied from the accepted request.
    pub fee_amount: Option<f64>,
    pub fee_currency: String,
    pub esop_percentage: Option<f64>,
    pub esop_value: Option<f64>,
    pub status: AssignmentStatus,
    pub agreement_url: Option<String>,
    pub agreement_status: Option<AgreementStatus>,
    pub mentor_signed_agreement_url: Option<String>,
    pub assigned_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl MentorAssignment {
    /// The status a fresh assignment starts in.
    ///
    /// An agreement is always required. Payment is only required when the
    /// settled fee is positive, so free engagements skip the payment gate.
    #[must_use]
    pub fn initial_status(fee_amount: Option<f64>) -> AssignmentStatus {
        match fee_amount {
            Some(fee) if fee > 0.0 => AssignmentStatus::PendingPaymentAndAgreement,
            _ => AssignmentStatus::PendingAgreement,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initial_status_requires_payment_only_for_positive_fees() {
        assert_eq!(
            MentorAssignment::initial_status(Some(1000.0)),
            AssignmentStatus::PendingPaymentAndAgreement
        );
        assert_eq!(
            MentorAssignment::initial_status(Some(0.0)),
            AssignmentStatus::PendingAgreement
        );
        assert_eq!(
            MentorAssignment::initial_status(None),
            AssignmentStatus::PendingAgreement
        );
    }

    #[test]
    fn payment_then_agreement_reaches_ready() {
        let s = AssignmentStatus::PendingPaymentAndAgreement;
        let after_payment = s.after_payment();
        assert_eq!(after_payment, AssignmentStatus::PendingAgreement);
        assert_eq!(
            after_payment.after_agreement_approval(),
            AssignmentStatus::ReadyForActivation
        );
    }

    #[test]
    fn agreement_then_payment_reaches_ready() {
        let s = AssignmentStatus::PendingPaymentAndAgreement;
        let after_agreement = s.after_agreement_approval();
        assert_eq!(after_agreement, AssignmentStatus::PendingPayment);
        assert_eq!(after_agreement.after_payment(), AssignmentStatus::ReadyForActivation);
    }

    #[test]
    fn settled_artifacts_do_not_regress_the_status() {
        assert_eq!(AssignmentStatus::Active.after_payment(), AssignmentStatus::Active);
        assert_eq!(
            AssignmentStatus::ReadyForActivation.after_agreement_approval(),
            AssignmentStatus::ReadyForActivation
        );
    }

    #[test]
    fn outstanding_flags_match_states() {
        assert!(AssignmentStatus::PendingPaymentAndAgreement.payment_outstanding());
        assert!(AssignmentStatus::PendingPaymentAndAgreement.agreement_outstanding());
        assert!(AssignmentStatus::PendingPayment.payment_outstanding());
        assert!(!AssignmentStatus::PendingPayment.agreement_outstanding());
        assert!(!AssignmentStatus::Active.payment_outstanding());
        assert!(!AssignmentStatus::Active.agreement_outstanding());
    }
}
