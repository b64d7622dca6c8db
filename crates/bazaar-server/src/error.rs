//! HTTP error mapping.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use bazaar_auth::AuthError;
use serde::Serialize;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("bad request: {0}")]
    BadRequest(String),
}

/// Error response JSON.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: String,
}

fn auth_status(err: &AuthError) -> (StatusCode, &'static str) {
    match err {
        AuthError::HeaderMissing => (StatusCode::UNAUTHORIZED, "HEADER_MISSING"),
        AuthError::MalformedHeader => (StatusCode::BAD_REQUEST, "MALFORMED_HEADER"),
        AuthError::SignatureInvalid => (StatusCode::BAD_REQUEST, "SIGNATURE_INVALID"),
        AuthError::Malformed(_) => (StatusCode::BAD_REQUEST, "MALFORMED_TOKEN"),
        AuthError::Expired => (StatusCode::UNAUTHORIZED, "TOKEN_EXPIRED"),
        AuthError::InvalidCredentials => (StatusCode::UNAUTHORIZED, "INVALID_CREDENTIALS"),
        AuthError::MissingCredentials => (StatusCode::BAD_REQUEST, "MISSING_CREDENTIALS"),
        AuthError::InvalidInput(_) => (StatusCode::BAD_REQUEST, "INVALID_INPUT"),
        AuthError::DuplicateLogin => (StatusCode::BAD_REQUEST, "LOGIN_TAKEN"),
        AuthError::InvalidDurationFormat(_) => {
            (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR")
        }
        AuthError::StoreUnavailable(_) => (StatusCode::INTERNAL_SERVER_ERROR, "STORE_UNAVAILABLE"),
        AuthError::Crypto(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            ApiError::BadRequest(message) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", message.clone()),
            ApiError::Auth(err) => {
                let (status, code) = auth_status(err);
                let message = if status.is_server_error() {
                    tracing::error!(error = %err, "request failed");
                    "Internal Server Error".to_string()
                } else {
                    err.to_string()
                };
                (status, code, message)
            }
        };

        let body = ErrorResponse {
            error: ErrorBody { code, message },
        };

        (status, Json(body)).into_response()
    }
}
