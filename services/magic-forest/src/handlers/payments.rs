//! Payment provider handlers: intents, hosted checkout, reconciliation

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;

use super::error_response;
use crate::checkout::{IntentResponse, SessionResponse};
use crate::types::{DonationType, Plan};
use crate::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct PaymentRequest {
    #[serde(with = "rust_decimal::serde::float")]
    #[validate(custom = "crate::amount::validate_positive")]
    pub amount: Decimal,
    #[serde(default, deserialize_with = "crate::types::empty_as_none")]
    #[validate(email)]
    pub email: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct SubscriptionRequest {
    pub plan: String,
    #[serde(default, deserialize_with = "crate::types::empty_as_none")]
    #[validate(email)]
    pub email: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ReconciledResponse {
    pub status: Option<String>,
    pub payment_status: Option<String>,
    pub donation_id: String,
    pub customer_email: Option<String>,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    pub donation_type: DonationType,
    pub plan: Option<Plan>,
}

fn validation_error(errors: validator::ValidationErrors) -> (StatusCode, String) {
    (StatusCode::BAD_REQUEST, errors.to_string())
}

/// POST /api/create-payment-intent
pub async fn create_payment_intent(
    State(state): State<Arc<AppState>>,
    Json(req): Json<PaymentRequest>,
) -> Result<Json<IntentResponse>, (StatusCode, String)> {
    req.validate().map_err(validation_error)?;

    state
        .checkout
        .create_payment_intent(req.amount, req.email)
        .await
        .map(Json)
        .map_err(error_response)
}

/// POST /api/create-checkout-session - One-time hosted checkout
pub async fn create_checkout_session(
    State(state): State<Arc<AppState>>,
    Json(req): Json<PaymentRequest>,
) -> Result<Json<SessionResponse>, (StatusCode, String)> {
    req.validate().map_err(validation_error)?;

    state
        .checkout
        .create_checkout_session(req.amount, req.email)
        .await
        .map(Json)
        .map_err(error_response)
}

/// POST /api/create-subscription - Monthly plan checkout
pub async fn create_subscription(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SubscriptionRequest>,
) -> Result<Json<SessionResponse>, (StatusCode, String)> {
    req.validate().map_err(validation_error)?;

    state
        .checkout
        .create_subscription(&req.plan, req.email)
        .await
        .map(Json)
        .map_err(error_response)
}

/// GET /api/checkout-session/{session_id} - Record the donation behind a
/// completed checkout
pub async fn get_checkout_session(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> Result<Json<ReconciledResponse>, (StatusCode, String)> {
    let reconciled = state
        .reconciler
        .reconcile(&session_id)
        .await
        .map_err(error_response)?;

    let donation = reconciled.donation;
    Ok(Json(ReconciledResponse {
        status: reconciled.status,
        payment_status: reconciled.payment_status,
        donation_id: donation.id,
        customer_email: donation.email,
        amount: donation.amount,
        donation_type: donation.donation_type,
        plan: donation.plan,
    }))
}
