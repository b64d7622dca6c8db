//! HTTP routes and handlers.
//!
//! Handlers are thin: they pull the `Authorization` header and JSON body
//! out of the request, call [`AuthService`](bazaar_auth::AuthService)
//! and translate the result. All status-code decisions live in
//! [`crate::error`].

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, HeaderValue, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use bazaar_auth::service::{LoginCredentials, LoginInput, LoginPath};
use bazaar_auth::{AuthError, Identity};
use bazaar_core::repository::CredentialRepository;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Serialize)]
struct LoginResponse {
    message: &'static str,
}

#[derive(Debug, Serialize)]
struct RegisterResponse {
    id: i64,
    login: String,
}

pub fn router<C: CredentialRepository + 'static>(state: Arc<AppState<C>>) -> Router {
    Router::new()
        .route("/login", get(login::<C>).post(login::<C>))
        .route("/register", post(register::<C>))
        .route("/me", get(me::<C>))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// The raw `Authorization` header. A value that is not visible ASCII
/// counts as malformed, not missing.
fn authorization(headers: &HeaderMap) -> Result<Option<&str>, AuthError> {
    headers
        .get(header::AUTHORIZATION)
        .map(|value| value.to_str().map_err(|_| AuthError::MalformedHeader))
        .transpose()
}

/// An empty body is `None`; anything else must be valid JSON.
fn parse_body<T: DeserializeOwned>(body: &[u8]) -> Result<Option<T>, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }
    serde_json::from_slice(body)
        .map(Some)
        .map_err(|e| ApiError::BadRequest(format!("invalid JSON body: {e}")))
}

async fn login<C: CredentialRepository + 'static>(
    State(state): State<Arc<AppState<C>>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, ApiError> {
    // A broken body only matters if the token path does not succeed.
    let (credentials, body_error) = match parse_body::<LoginCredentials>(&body) {
        Ok(credentials) => (credentials, None),
        Err(e) => (None, Some(e)),
    };

    let input = LoginInput {
        authorization: authorization(&headers).ok().flatten().map(str::to_owned),
        credentials,
    };

    let out = match state.auth.login(input).await {
        Ok(out) => out,
        Err(AuthError::MissingCredentials) => {
            return Err(body_error.unwrap_or(AuthError::MissingCredentials.into()));
        }
        Err(e) => return Err(e.into()),
    };

    let message = match out.path {
        LoginPath::Token => "Login by token successful",
        LoginPath::Credentials => "Login successful",
    };
    let bearer = HeaderValue::from_str(&out.authorization_header())
        .map_err(|e| AuthError::Crypto(format!("token is not a valid header value: {e}")))?;

    Ok((
        [(header::AUTHORIZATION, bearer)],
        Json(LoginResponse { message }),
    )
        .into_response())
}

async fn register<C: CredentialRepository + 'static>(
    State(state): State<Arc<AppState<C>>>,
    body: Bytes,
) -> Result<Json<RegisterResponse>, ApiError> {
    let credentials: LoginCredentials =
        parse_body(&body)?.ok_or(AuthError::MissingCredentials)?;

    let registered = state.auth.register(credentials).await?;

    Ok(Json(RegisterResponse {
        id: registered.user_id,
        login: registered.login,
    }))
}

async fn me<C: CredentialRepository + 'static>(
    State(state): State<Arc<AppState<C>>>,
    headers: HeaderMap,
) -> Result<Json<Identity>, ApiError> {
    let identity = state
        .auth
        .authorize(authorization(&headers)?)
        .into_result()?;
    Ok(Json(identity))
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}
