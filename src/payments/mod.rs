//! Payment gateway glue for Razorpay and PayPal.
//!
//! Bridges the client-side gateway SDKs to server-side settlement: order
//! creation, signature/capture verification, and typed confirmation
//! delivery back to the initiating flow.

pub mod error;
pub mod events;
pub mod paypal;
pub mod razorpay;
pub mod service;
pub mod storage;

pub use error::PaymentError;
pub use events::{PaymentConfirmation, PaymentEvents};
pub use paypal::{LivePayPalClient, PayPalCapture, PayPalClient, PayPalOrder};
pub use razorpay::{LiveRazorpayClient, RazorpayClient, RazorpayOrder, verify_payment_signature};
pub use service::{InitiatedPayment, PaymentManager};
pub use storage::{MentorPayment, MentorPaymentStore, PaymentStatus};

#[cfg(any(test, feature = "test-support"))]
pub use paypal::test::MockPayPalClient;

#[cfg(any(test, feature = "test-support"))]
pub use razorpay::test::MockRazorpayClient;

#[cfg(any(test, feature = "test-support"))]
pub use storage::test::InMemoryPaymentStore;
