pub mod donations;
pub mod payments;
pub mod trees;

use axum::http::StatusCode;
use tracing::error;

use crate::types::ForestError;

/// Map a domain error to the status code and message returned to clients
pub fn error_response(err: ForestError) -> (StatusCode, String) {
    let status = match &err {
        ForestError::NotFound(_) => StatusCode::NOT_FOUND,
        ForestError::Ineligible(_) | ForestError::InvalidInput(_) | ForestError::Provider(_) => {
            StatusCode::BAD_REQUEST
        }
        ForestError::Store(_) => {
            error!("Store failure: {}", err);
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    (status, err.to_string())
}
