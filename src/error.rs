use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;

/// Why a share-link verification was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DenialReason {
    Invalid,
    Expired,
    Exhausted,
    PasscodeRequired,
    InvalidPasscode,
}

impl DenialReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            DenialReason::Invalid => "invalid",
            DenialReason::Expired => "expired",
            DenialReason::Exhausted => "exhausted",
            DenialReason::PasscodeRequired => "passcode_required",
            DenialReason::InvalidPasscode => "invalid_passcode",
        }
    }

    fn message(&self) -> &'static str {
        match self {
            DenialReason::Invalid => "Invalid share link",
            DenialReason::Expired => "Share link has expired",
            DenialReason::Exhausted => "Share link has reached maximum views",
            DenialReason::PasscodeRequired => "Passcode required",
            DenialReason::InvalidPasscode => "Invalid passcode",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            DenialReason::Invalid => StatusCode::NOT_FOUND,
            DenialReason::Expired | DenialReason::Exhausted => StatusCode::GONE,
            DenialReason::PasscodeRequired => StatusCode::UNAUTHORIZED,
            DenialReason::InvalidPasscode => StatusCode::FORBIDDEN,
        }
    }
}

impl std::fmt::Display for DenialReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] redb::Error),

    #[error("Transaction error: {0}")]
    Transaction(#[from] redb::TransactionError),

    #[error("Table error: {0}")]
    Table(#[from] redb::TableError),

    #[error("Storage error: {0}")]
    Storage(#[from] redb::StorageError),

    #[error("Commit error: {0}")]
    Commit(#[from] redb::CommitError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::error::EncodeError),

    #[error("Deserialization error: {0}")]
    Deserialization(#[from] bincode::error::DecodeError),

    #[error("Task join error: {0}")]
    TaskJoin(#[from] tokio::task::JoinError),

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Missing or invalid identity")]
    Unauthorized,

    #[error("Insufficient permissions")]
    Forbidden,

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("Access denied: {0}")]
    Denied(DenialReason),

    #[error("Conflict: {0}")]
    Conflict(String),
}

/// Implement IntoResponse to convert AppError into HTTP responses
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, json!({ "error": msg })),
            AppError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                json!({ "error": "Missing or invalid identity" }),
            ),
            AppError::Forbidden => (
                StatusCode::FORBIDDEN,
                json!({ "error": "Insufficient permissions" }),
            ),
            AppError::NotFound(what) => (
                StatusCode::NOT_FOUND,
                json!({ "error": format!("{} not found", what) }),
            ),
            AppError::Denied(reason) => (
                reason.status(),
                json!({ "error": reason.message(), "reason": reason }),
            ),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, json!({ "error": msg })),
            ref e => {
                tracing::error!("Internal error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": "Internal server error" }),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for application results
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_denial_reason_status_codes() {
        assert_eq!(DenialReason::Invalid.status(), StatusCode::NOT_FOUND);
        assert_eq!(DenialReason::Expired.status(), StatusCode::GONE);
        assert_eq!(DenialReason::Exhausted.status(), StatusCode::GONE);
        assert_eq!(
            DenialReason::PasscodeRequired.status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(DenialReason::InvalidPasscode.status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn test_denial_reason_serializes_snake_case() {
        let value = serde_json::to_value(DenialReason::PasscodeRequired).unwrap();
        assert_eq!(value, "passcode_required");
        assert_eq!(DenialReason::InvalidPasscode.to_string(), "invalid_passcode");
    }

    #[test]
    fn test_denied_response_status() {
        let response = AppError::Denied(DenialReason::Exhausted).into_response();
        assert_eq!(response.status(), StatusCode::GONE);

        let response = AppError::NotFound("Invitation").into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = AppError::Conflict("x".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn test_storage_errors_are_opaque() {
        let err = AppError::Database(redb::Error::Io(std::io::Error::other("disk on fire")));
        let response = err.into_response();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
