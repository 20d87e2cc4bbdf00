//! services/api/src/web/auth.rs
//!
//! Authentication endpoints for login, registration and logout. Credential
//! checks and session issuance are entirely the auth collaborator's job.

use axum::{
    extract::State,
    http::{header, HeaderMap},
    response::IntoResponse,
    Json,
};
use flipwise_core::domain::AuthSession;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, warn};
use utoipa::ToSchema;

use crate::error::HttpError;
use crate::web::rest::ErrorBody;
use crate::web::state::AppState;
use crate::web::SuccessResponse;

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize, ToSchema)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub username: Option<String>,
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct AuthUserResponse {
    pub id: String,
    pub email: Option<String>,
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct SessionTokens {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub token_type: Option<String>,
    pub expires_in: Option<i64>,
}

/// The session payload returned by login and register. `session` is null when
/// the backend requires email confirmation before issuing tokens.
#[derive(Serialize, Deserialize, ToSchema)]
pub struct SessionPayload {
    pub user: AuthUserResponse,
    pub session: Option<SessionTokens>,
}

impl From<AuthSession> for SessionPayload {
    fn from(auth: AuthSession) -> Self {
        let session = auth.access_token.map(|access_token| SessionTokens {
            access_token,
            refresh_token: auth.refresh_token,
            token_type: auth.token_type,
            expires_in: auth.expires_in,
        });
        Self {
            user: AuthUserResponse {
                id: auth.user.id,
                email: auth.user.email,
            },
            session,
        }
    }
}

/// The username a profile gets when registration does not supply one: the
/// part of the email before the first `@`.
pub fn default_username(email: &str) -> &str {
    email.split('@').next().unwrap_or(email)
}

/// The username stored at registration: the supplied one, exactly as sent,
/// unless it is absent or empty.
pub fn profile_username<'a>(email: &'a str, supplied: Option<&'a str>) -> &'a str {
    match supplied {
        Some(name) if !name.is_empty() => name,
        _ => default_username(email),
    }
}

//=========================================================================================
// Handlers
//=========================================================================================

/// POST /api/auth/login - Sign in with email and password
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = SessionPayload),
        (status = 401, description = "Invalid credentials", body = ErrorBody)
    )
)]
pub async fn login_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<SessionPayload>, HttpError> {
    let session = state
        .auth
        .sign_in(&req.email, &req.password)
        .await
        .map_err(|e| {
            warn!("Login rejected: {}", e);
            HttpError::Unauthorized(e.message().to_string())
        })?;

    info!("User {} logged in", session.user.id);
    Ok(Json(session.into()))
}

/// POST /api/auth/register - Create an account and its profile
///
/// A profile failure after the auth user was created is reported as a 500;
/// the auth user is left in place.
#[utoipa::path(
    post,
    path = "/api/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 200, description = "User registered", body = SessionPayload),
        (status = 400, description = "Registration rejected", body = ErrorBody),
        (status = 500, description = "Profile could not be created", body = ErrorBody)
    )
)]
pub async fn register_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RegisterRequest>,
) -> Result<Json<SessionPayload>, HttpError> {
    // 1. Create the auth user
    let session = state
        .auth
        .sign_up(&req.email, &req.password)
        .await
        .map_err(|e| {
            warn!("Registration rejected: {}", e);
            HttpError::BadRequest(e.message().to_string())
        })?;

    // 2. Create the profile keyed by the new user id
    let username = profile_username(&req.email, req.username.as_deref());
    state
        .db
        .create_profile(&session.user.id, username)
        .await
        .map_err(|e| {
            error!("Failed to create profile for {}: {}", session.user.id, e);
            HttpError::Internal(format!("Failed to create user profile: {}", e.message()))
        })?;

    info!("Registered user {} as '{}'", session.user.id, username);
    Ok(Json(session.into()))
}

/// POST /api/auth/logout - Revoke the caller's session
///
/// The bearer token, if any, is forwarded to the auth collaborator.
#[utoipa::path(
    post,
    path = "/api/auth/logout",
    responses(
        (status = 200, description = "Logout successful", body = SuccessResponse),
        (status = 500, description = "Logout failed", body = ErrorBody)
    )
)]
pub async fn logout_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, HttpError> {
    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty());

    state.auth.sign_out(token).await.map_err(|e| {
        error!("Failed to sign out: {}", e);
        HttpError::internal(e)
    })?;

    Ok(Json(SuccessResponse::ok()))
}
