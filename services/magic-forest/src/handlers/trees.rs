//! Forest map handlers

use axum::{extract::State, http::StatusCode, Json};
use std::sync::Arc;

use super::error_response;
use crate::types::{NewTree, Tree};
use crate::AppState;

/// GET /api/trees - Newest trees first
pub async fn list_trees(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Tree>>, (StatusCode, String)> {
    state.trees.list_trees().await.map(Json).map_err(error_response)
}

/// POST /api/trees - Plant a tree backed by an eligible donation
pub async fn create_tree(
    State(state): State<Arc<AppState>>,
    Json(req): Json<NewTree>,
) -> Result<Json<Tree>, (StatusCode, String)> {
    state.trees.create_tree(req).await.map(Json).map_err(error_response)
}
