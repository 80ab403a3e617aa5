//! Payment-specific error types.

use crate::error::LaunchdeskError;

/// Errors from payment gateway operations.
#[derive(Debug, thiserror::Error)]
pub enum PaymentError {
    #[error("order creation failed: {0}")]
    OrderCreation(String),

    #[error("payment signature verification failed")]
    SignatureMismatch,

    #[error("unknown payment order: {0}")]
    UnknownOrder(String),

    #[error("capture not completed, gateway status: {0}")]
    CaptureIncomplete(String),

    #[error("assignment has no fee to settle")]
    NothingToSettle,
}

impl From<PaymentError> for LaunchdeskError {
    fn from(err: PaymentError) -> Self {
        match err {
            PaymentError::OrderCreation(_) => LaunchdeskError::ServiceUnavailable(err.to_string()),
            PaymentError::SignatureMismatch => LaunchdeskError::Unauthorized(err.to_string()),
            PaymentError::UnknownOrder(_) => LaunchdeskError::NotFound(err.to_string()),
            PaymentError::CaptureIncomplete(_) | PaymentError::NothingToSettle => {
                LaunchdeskError::BadRequest(err.to_string())
            }
        }
    }
}
