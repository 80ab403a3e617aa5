//! HTTP surface for meet-link generation and payment checkout.
//!
//! Thin axum handlers over the managers; all domain rules live below
//! this layer. Errors surface through [`LaunchdeskError`]'s
//! `IntoResponse`, except the meet-link endpoint which keeps the
//! `{ "meetLink": … } / { "error": … }` shape its clients expect.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::{LaunchdeskError, Result};
use crate::identity::IdentityResolver;
use crate::meet::{CalendarClient, MeetLinkGenerator};
use crate::mentorship::{MentorshipManager, MentorshipStore};
use crate::payments::{
    InitiatedPayment, MentorPaymentStore, PayPalClient, PaymentManager, RazorpayClient,
};

/// Shared handler state.
pub struct AppState<C, PS, RZ, PP, MS, R>
where
    C: CalendarClient,
    MS: MentorshipStore,
    R: IdentityResolver,
{
    pub meet: Arc<MeetLinkGenerator<C>>,
    pub payments: Arc<PaymentManager<PS, RZ, PP>>,
    pub mentorship: Arc<MentorshipManager<MS, R>>,
}

impl<C, PS, RZ, PP, MS, R> Clone for AppState<C, PS, RZ, PP, MS, R>
where
    C: CalendarClient,
    MS: MentorshipStore,
    R: IdentityResolver,
{
    fn clone(&self) -> Self {
        Self {
            meet: Arc::clone(&self.meet),
            payments: Arc::clone(&self.payments),
            mentorship: Arc::clone(&self.mentorship),
        }
    }
}

/// Build the API router. Non-POST methods on these paths get 405 from
/// axum's method routing.
pub fn api_router<C, PS, RZ, PP, MS, R>(state: AppState<C, PS, RZ, PP, MS, R>) -> Router
where
    C: CalendarClient + 'static,
    PS: MentorPaymentStore + 'static,
    RZ: RazorpayClient + 'static,
    PP: PayPalClient + 'static,
    MS: MentorshipStore + 'static,
    R: IdentityResolver + 'static,
{
    Router::new()
        .route("/api/generate-google-meet-link", post(generate_meet_link))
        .route("/api/razorpay/create-order", post(create_razorpay_order))
        .route("/api/payment/verify", post(verify_razorpay_payment))
        .route("/api/paypal/create-order", post(create_paypal_order))
        .route("/api/paypal/verify", post(verify_paypal_payment))
        .with_state(state)
}

async fn generate_meet_link<C, PS, RZ, PP, MS, R>(
    State(state): State<AppState<C, PS, RZ, PP, MS, R>>,
) -> Response
where
    C: CalendarClient + 'static,
    MS: MentorshipStore + 'static,
    R: IdentityResolver + 'static,
{
    match state.meet.generate().await {
        Ok(link) => Json(json!({ "meetLink": link })).into_response(),
        Err(err) => {
            tracing::error!(error = %err, "Meet link generation failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Failed to generate meet link" })),
            )
                .into_response()
        }
    }
}

/// Checkout order request. Either an `assignmentId` (the fee and
/// currency come off the assignment) or an explicit amount.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    pub assignment_id: Option<i64>,
    pub amount: Option<f64>,
    #[serde(default)]
    pub currency: Option<String>,
    pub country: Option<String>,
    pub receipt: Option<String>,
}

async fn create_razorpay_order<C, PS, RZ, PP, MS, R>(
    State(state): State<AppState<C, PS, RZ, PP, MS, R>>,
    Json(request): Json<CreateOrderRequest>,
) -> Result<Json<InitiatedPayment>>
where
    C: CalendarClient + 'static,
    PS: MentorPaymentStore + 'static,
    RZ: RazorpayClient + 'static,
    PP: PayPalClient + 'static,
    MS: MentorshipStore + 'static,
    R: IdentityResolver + 'static,
{
    // Callers hitting the Razorpay endpoint are Indian payers unless
    // they say otherwise.
    create_order(&state, request, Some("IN")).await
}

async fn create_paypal_order<C, PS, RZ, PP, MS, R>(
    State(state): State<AppState<C, PS, RZ, PP, MS, R>>,
    Json(request): Json<CreateOrderRequest>,
) -> Result<Json<InitiatedPayment>>
where
    C: CalendarClient + 'static,
    PS: MentorPaymentStore + 'static,
    RZ: RazorpayClient + 'static,
    PP: PayPalClient + 'static,
    MS: MentorshipStore + 'static,
    R: IdentityResolver + 'static,
{
    create_order(&state, request, None).await
}

async fn create_order<C, PS, RZ, PP, MS, R>(
    state: &AppState<C, PS, RZ, PP, MS, R>,
    request: CreateOrderRequest,
    default_country: Option<&str>,
) -> Result<Json<InitiatedPayment>>
where
    C: CalendarClient + 'static,
    PS: MentorPaymentStore + 'static,
    RZ: RazorpayClient + 'static,
    PP: PayPalClient + 'static,
    MS: MentorshipStore + 'static,
    R: IdentityResolver + 'static,
{
    let country = request.country.as_deref().or(default_country);

    if let Some(assignment_id) = request.assignment_id {
        let assignment = state.mentorship.assignment(assignment_id).await?;
        let initiated = state
            .payments
            .initiate_assignment_payment(&assignment, country)
            .await?;
        return Ok(Json(initiated));
    }

    let amount = request
        .amount
        .ok_or_else(|| LaunchdeskError::bad_request("amount or assignmentId is required"))?;
    let currency = request.currency.unwrap_or_else(|| "USD".to_string());
    let receipt = request
        .receipt
        .unwrap_or_else(|| format!("order_{}", uuid::Uuid::new_v4()));

    let initiated = state
        .payments
        .initiate_subscription_payment(amount, &currency, country, &receipt)
        .await?;
    Ok(Json(initiated))
}

/// Razorpay checkout callback payload, field names per the checkout SDK.
#[derive(Debug, Deserialize)]
pub struct VerifyRazorpayRequest {
    pub razorpay_order_id: String,
    pub razorpay_payment_id: String,
    pub razorpay_signature: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyPayPalRequest {
    pub order_id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifiedResponse {
    pub status: &'static str,
    pub order_id: String,
    pub payment_id: Option<String>,
    /// Set when the order settled a mentor assignment fee.
    pub assignment_id: Option<i64>,
}

async fn verify_razorpay_payment<C, PS, RZ, PP, MS, R>(
    State(state): State<AppState<C, PS, RZ, PP, MS, R>>,
    Json(request): Json<VerifyRazorpayRequest>,
) -> Result<Json<VerifiedResponse>>
where
    C: CalendarClient + 'static,
    PS: MentorPaymentStore + 'static,
    RZ: RazorpayClient + 'static,
    PP: PayPalClient + 'static,
    MS: MentorshipStore + 'static,
    R: IdentityResolver + 'static,
{
    let confirmation = state
        .payments
        .verify_razorpay(
            &request.razorpay_order_id,
            &request.razorpay_payment_id,
            &request.razorpay_signature,
        )
        .await?;

    let assignment_id = settle_assignment(&state, &confirmation.order_id).await?;
    Ok(Json(VerifiedResponse {
        status: "verified",
        order_id: confirmation.order_id,
        payment_id: confirmation.payment_id,
        assignment_id,
    }))
}

async fn verify_paypal_payment<C, PS, RZ, PP, MS, R>(
    State(state): State<AppState<C, PS, RZ, PP, MS, R>>,
    Json(request): Json<VerifyPayPalRequest>,
) -> Result<Json<VerifiedResponse>>
where
    C: CalendarClient + 'static,
    PS: MentorPaymentStore + 'static,
    RZ: RazorpayClient + 'static,
    PP: PayPalClient + 'static,
    MS: MentorshipStore + 'static,
    R: IdentityResolver + 'static,
{
    let confirmation = state.payments.verify_paypal(&request.order_id).await?;

    let assignment_id = settle_assignment(&state, &confirmation.order_id).await?;
    Ok(Json(VerifiedResponse {
        status: "verified",
        order_id: confirmation.order_id,
        payment_id: confirmation.payment_id,
        assignment_id,
    }))
}

/// Advance the assignment lifecycle when a verified order settled one.
async fn settle_assignment<C, PS, RZ, PP, MS, R>(
    state: &AppState<C, PS, RZ, PP, MS, R>,
    order_id: &str,
) -> Result<Option<i64>>
where
    C: CalendarClient + 'static,
    PS: MentorPaymentStore + 'static,
    RZ: RazorpayClient + 'static,
    PP: PayPalClient + 'static,
    MS: MentorshipStore + 'static,
    R: IdentityResolver + 'static,
{
    match state.payments.settled_assignment_for(order_id).await? {
        Some(assignment_id) => {
            state
                .mentorship
                .record_assignment_payment(assignment_id)
                .await?;
            Ok(Some(assignment_id))
        }
        None => Ok(None),
    }
}
