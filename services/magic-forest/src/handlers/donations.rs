//! Donation ledger handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use rust_decimal::Decimal;
use serde::Serialize;
use std::sync::Arc;
use validator::Validate;

use super::error_response;
use crate::types::{Donation, ForestError, NewDonation};
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct TotalResponse {
    #[serde(with = "rust_decimal::serde::float")]
    pub total: Decimal,
}

/// POST /api/donations - Record a donation as given
pub async fn create_donation(
    State(state): State<Arc<AppState>>,
    Json(req): Json<NewDonation>,
) -> Result<Json<Donation>, (StatusCode, String)> {
    req.validate()
        .map_err(|e| error_response(ForestError::InvalidInput(e.to_string())))?;

    state
        .ledger
        .create(req)
        .await
        .map(Json)
        .map_err(error_response)
}

/// GET /api/donations/{id}
pub async fn get_donation(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Donation>, (StatusCode, String)> {
    state.ledger.get(&id).await.map(Json).map_err(error_response)
}

/// GET /api/total-donations
pub async fn total_donations(
    State(state): State<Arc<AppState>>,
) -> Result<Json<TotalResponse>, (StatusCode, String)> {
    let total = state.ledger.total_amount().await.map_err(error_response)?;
    Ok(Json(TotalResponse { total }))
}
