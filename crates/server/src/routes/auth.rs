use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::Response,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use service::auth::{
    domain::{History, LogInInput, LogInOutput, Profile, SignUpInput, SignUpOutput},
    errors::AuthError,
    repository::AccountStore,
    AuthConfig, AuthService,
};

use crate::errors::JsonApiError;
use crate::extract::CurrentUser;

pub const READ_BODY_FAILED: &str = "Failed to read request body";
pub const HASH_FAILED: &str = "Failed to hash password";
pub const SIGNUP_FAILED: &str = "Failed to create User and Customer";
pub const USER_NOT_FOUND: &str = "User not found";
pub const INCORRECT_PASSWORD: &str = "Incorrect password";
pub const LOGIN_FAILED: &str = "Failed to create token and update user";
pub const LOGOUT_FAILED: &str = "Failed to log out User";
pub const LOGOUT_OK: &str = "User successfully logged out";

#[derive(Clone)]
pub struct ServerState {
    pub auth: Arc<AuthService<dyn AccountStore>>,
}

impl ServerState {
    pub fn new(store: Arc<dyn AccountStore>, cfg: AuthConfig) -> Result<Self, AuthError> {
        Ok(Self { auth: Arc::new(AuthService::new(store, cfg)?) })
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageOutput {
    pub message: String,
}

fn read_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, JsonApiError> {
    payload.map(|Json(v)| v).map_err(|e| {
        debug!(error = %e, "rejected request body");
        JsonApiError::bad_request(READ_BODY_FAILED)
    })
}

fn signup_error(e: AuthError) -> JsonApiError {
    match e {
        AuthError::Validation(_) => JsonApiError::bad_request(READ_BODY_FAILED),
        AuthError::HashError(_) => JsonApiError::bad_request(HASH_FAILED),
        _ => JsonApiError::bad_request(SIGNUP_FAILED),
    }
}

fn login_error(e: AuthError) -> JsonApiError {
    match e {
        AuthError::NotFound => JsonApiError::unauthorized(USER_NOT_FOUND),
        AuthError::Unauthorized | AuthError::HashError(_) => JsonApiError::bad_request(INCORRECT_PASSWORD),
        _ => JsonApiError::bad_request(LOGIN_FAILED),
    }
}

fn lookup_error(e: AuthError) -> JsonApiError {
    match e {
        AuthError::NotFound | AuthError::Unauthorized => JsonApiError::unauthorized(USER_NOT_FOUND),
        _ => JsonApiError::internal(),
    }
}

#[utoipa::path(post, path = "/auth/signup", tag = "auth", request_body = crate::openapi::SignUpRequest, responses((status = 200, description = "Registered", body = crate::openapi::SignUpResponse), (status = 400, description = "Bad Request", body = crate::openapi::ErrorResponse)))]
pub async fn signup(
    State(state): State<ServerState>,
    payload: Result<Json<SignUpInput>, JsonRejection>,
) -> Result<Json<SignUpOutput>, JsonApiError> {
    let input = read_body(payload)?;
    state.auth.sign_up(input).await.map(Json).map_err(signup_error)
}

#[utoipa::path(post, path = "/auth/login", tag = "auth", request_body = crate::openapi::LoginRequest, responses((status = 200, description = "Logged in", body = crate::openapi::LoginResponse), (status = 400, description = "Bad Request", body = crate::openapi::ErrorResponse), (status = 401, description = "User not found", body = crate::openapi::ErrorResponse)))]
pub async fn login(
    State(state): State<ServerState>,
    payload: Result<Json<LogInInput>, JsonRejection>,
) -> Result<Json<LogInOutput>, JsonApiError> {
    let input = read_body(payload)?;
    state.auth.log_in(input).await.map(Json).map_err(login_error)
}

#[utoipa::path(post, path = "/auth/logout", tag = "auth", security(("bearer_auth" = [])), responses((status = 200, description = "Logged out", body = crate::openapi::MessageResponse), (status = 400, description = "Bad Request", body = crate::openapi::ErrorResponse), (status = 401, description = "Unauthorized", body = crate::openapi::ErrorResponse)))]
pub async fn logout(
    State(state): State<ServerState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<MessageOutput>, JsonApiError> {
    state.auth.log_out(&user).await.map_err(|e| match e {
        AuthError::NotFound => JsonApiError::unauthorized(USER_NOT_FOUND),
        _ => JsonApiError::bad_request(LOGOUT_FAILED),
    })?;
    Ok(Json(MessageOutput { message: LOGOUT_OK.to_string() }))
}

#[utoipa::path(get, path = "/auth/me", tag = "auth", security(("bearer_auth" = [])), responses((status = 200, description = "Current user", body = crate::openapi::ProfileResponse), (status = 401, description = "Unauthorized", body = crate::openapi::ErrorResponse)))]
pub async fn me(
    State(state): State<ServerState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Profile>, JsonApiError> {
    state.auth.profile(&user).await.map(Json).map_err(lookup_error)
}

#[utoipa::path(get, path = "/auth/history", tag = "auth", security(("bearer_auth" = [])), responses((status = 200, description = "Audit entries, newest first", body = [crate::openapi::HistoryResponse]), (status = 401, description = "Unauthorized", body = crate::openapi::ErrorResponse)))]
pub async fn history(
    State(state): State<ServerState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<History>>, JsonApiError> {
    state.auth.history(&user).await.map(Json).map_err(lookup_error)
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then(|| token.to_string())
}

/// Resolve `Authorization: Bearer <token>` to a [`CurrentUser`] extension.
pub async fn require_bearer_token(
    State(state): State<ServerState>,
    mut req: Request,
    next: Next,
) -> Result<Response, JsonApiError> {
    let Some(token) = bearer_token(req.headers()) else {
        debug!("missing or malformed bearer token");
        return Err(JsonApiError::unauthorized("Unauthorized"));
    };
    let user = state.auth.authenticate(&token).await.map_err(|e| match e {
        AuthError::Unauthorized => JsonApiError::unauthorized("Unauthorized"),
        other => {
            warn!(error = %other, code = other.code(), "bearer resolution failed");
            JsonApiError::internal()
        }
    })?;
    req.extensions_mut().insert(CurrentUser(user));
    Ok(next.run(req).await)
}
