use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::db::RepositoryError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Not authenticated")]
    NotAuthenticated,

    #[error("Invalid handle: {0}")]
    InvalidHandle(String),

    #[error("Handle is already taken")]
    HandleTaken,

    #[error("Display name is already taken")]
    DisplayNameTaken,

    #[error("Cannot follow yourself")]
    SelfFollow,

    #[error("Profile does not belong to this member")]
    OwnerMismatch,

    #[error("Forbidden")]
    Forbidden,

    #[error("Not found")]
    NotFound,

    #[error("Comment body cannot be empty")]
    EmptyBody,

    #[error("Invalid cursor")]
    InvalidCursor,

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Stable error code sent to clients
    pub fn code(&self) -> &'static str {
        match self {
            AppError::NotAuthenticated => "NOT_AUTHENTICATED",
            AppError::InvalidHandle(_) => "INVALID_HANDLE",
            AppError::HandleTaken => "HANDLE_TAKEN",
            AppError::DisplayNameTaken => "DISPLAY_NAME_TAKEN",
            AppError::SelfFollow => "SELF_FOLLOW",
            AppError::OwnerMismatch => "OWNER_MISMATCH",
            AppError::Forbidden => "FORBIDDEN",
            AppError::NotFound => "NOT_FOUND",
            AppError::EmptyBody => "EMPTY_BODY",
            AppError::InvalidCursor => "INVALID_CURSOR",
            AppError::BadRequest(_) => "BAD_REQUEST",
            AppError::Conflict(_) => "CONFLICT",
            AppError::StoreUnavailable(_) => "STORE_UNAVAILABLE",
            AppError::Internal(_) => "INTERNAL",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::InvalidHandle(_)
            | AppError::EmptyBody
            | AppError::InvalidCursor
            | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotAuthenticated => StatusCode::UNAUTHORIZED,
            AppError::OwnerMismatch | AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::HandleTaken
            | AppError::DisplayNameTaken
            | AppError::SelfFollow
            | AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<RepositoryError> for AppError {
    fn from(e: RepositoryError) -> Self {
        if e.is_unavailable() {
            return AppError::StoreUnavailable(e.to_string());
        }
        match e {
            RepositoryError::Conflict(msg) => AppError::Conflict(msg),
            other => AppError::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            AppError::StoreUnavailable(msg) => {
                tracing::warn!("Store unavailable: {}", msg);
                "Store unavailable, try again".to_string()
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };

        let body = json!({ "error": self.code(), "message": message });
        (status, Json(body)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
