use crate::application::{LibraryError, SessionError};
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use super::types::ErrorResponse;

/// API層のエラー型
///
/// アプリケーション層のエラーをラップし、HTTPレスポンスへのマッピングを提供する。
#[derive(Debug)]
pub enum ApiError {
    Library(LibraryError),
    Session(SessionError),
    NotFound(String),
    BadRequest(String),
}

impl From<LibraryError> for ApiError {
    fn from(err: LibraryError) -> Self {
        ApiError::Library(err)
    }
}

impl From<SessionError> for ApiError {
    fn from(err: SessionError) -> Self {
        ApiError::Session(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg),

            // 422 Unprocessable Entity - ビジネスルール違反
            ApiError::Library(LibraryError::NotAvailable) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "NOT_AVAILABLE",
                "Book is not available for loan".to_string(),
            ),
            ApiError::Library(err @ LibraryError::InvalidCopyCounts(_)) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "INVALID_COPY_COUNTS",
                err.to_string(),
            ),
            ApiError::Library(err @ LibraryError::CopyCountsOutOfSync { .. }) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "COPY_COUNTS_OUT_OF_SYNC",
                err.to_string(),
            ),
            ApiError::Library(err @ LibraryError::BookHasActiveLoans(_)) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "BOOK_HAS_ACTIVE_LOANS",
                err.to_string(),
            ),
            ApiError::Library(LibraryError::DomainError(msg)) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "DOMAIN_ERROR", msg)
            }

            // 401 / 403 - セッション
            ApiError::Session(SessionError::InvalidCredentials) => (
                StatusCode::UNAUTHORIZED,
                "INVALID_CREDENTIALS",
                "Invalid email or password".to_string(),
            ),
            ApiError::Session(SessionError::NotSignedIn) => (
                StatusCode::UNAUTHORIZED,
                "NOT_SIGNED_IN",
                "Sign in required".to_string(),
            ),
            ApiError::Session(SessionError::Forbidden(msg)) => {
                (StatusCode::FORBIDDEN, "FORBIDDEN", msg)
            }

            // 500 Internal Server Error - システム障害
            // 内部エラーの詳細はログに記録し、クライアントには一般的なメッセージのみを返す
            ApiError::Library(err @ LibraryError::CorruptSnapshot { .. })
            | ApiError::Library(err @ LibraryError::StorageError(_)) => {
                tracing::error!(error = ?err, "Library storage error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "STORAGE_ERROR",
                    "Failed to access library storage".to_string(),
                )
            }
            ApiError::Session(err @ SessionError::CorruptSnapshot(_))
            | ApiError::Session(err @ SessionError::StorageError(_)) => {
                tracing::error!(error = ?err, "Session storage error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "STORAGE_ERROR",
                    "Failed to access session storage".to_string(),
                )
            }
            ApiError::Session(SessionError::DirectoryError(e)) => {
                tracing::error!("User directory error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "DIRECTORY_ERROR",
                    "User directory error".to_string(),
                )
            }
        };

        let body = Json(ErrorResponse::new(error_type, message));
        (status, body).into_response()
    }
}
