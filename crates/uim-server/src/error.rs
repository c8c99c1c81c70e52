//! Discovery API errors.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;
use uim_catalog::CatalogError;

#[derive(Debug, Error)]
pub enum ApiError {
    /// No match for a lookup or the first page of a search.
    #[error("{0}")]
    NotFound(String),

    /// Query parameters failed validation.
    #[error("invalid query: {0}")]
    BadRequest(String),

    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) | ApiError::Catalog(CatalogError::InvalidQuery(_)) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::Catalog(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "discovery request failed");
        }
        (status, Json(json!({ "detail": self.to_string() }))).into_response()
    }
}
