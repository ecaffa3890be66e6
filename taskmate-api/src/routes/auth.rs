/// Authentication endpoints
///
/// # Endpoints
///
/// - `POST /v1/auth/register` - Create a user and their trial tenant
/// - `POST /v1/auth/login` - Check credentials, run the overdue sweep, issue a session token
///
/// There is no logout endpoint; a client drops its token and the token
/// expires on its own.

use crate::{app::AppState, error::ApiResult};
use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use taskmate_shared::{account, auth::jwt};
use validator::Validate;

/// Register request
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 1, message = "Username is required."))]
    pub username: String,

    #[validate(length(min = 1, message = "Password is required."))]
    pub password: String,

    /// One of the names listed by `GET /v1/timezones`
    pub timezone: String,
}

/// Register response
#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub user_id: i64,
    pub tenant_id: i64,
    pub username: String,
}

/// Login request
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, message = "Username is required."))]
    pub username: String,

    #[validate(length(min = 1, message = "Password is required."))]
    pub password: String,
}

/// Login response
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    /// Bearer token for all `/v1/tasks` and `/v1/settings` calls
    pub access_token: String,

    pub token_type: &'static str,

    /// Seconds until the token expires
    pub expires_in: i64,

    pub user_id: i64,
    pub tenant_id: i64,
    pub timezone: String,

    /// Tasks in the caller's tenant moved to OVERDUE by the login sweep.
    /// Absent if the sweep was skipped.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overdue_transitioned: Option<usize>,
}

/// Register a new user
///
/// # Endpoint
///
/// ```text
/// POST /v1/auth/register
/// Content-Type: application/json
///
/// {
///   "username": "alice",
///   "password": "s3cret!",
///   "timezone": "Europe/Paris"
/// }
/// ```
///
/// # Errors
///
/// - `422 Unprocessable Entity`: blank field or unsupported timezone
/// - `409 Conflict`: username already registered
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<RegisterResponse>)> {
    req.validate()?;

    let user =
        account::register_account(&state.db, &req.username, &req.password, &req.timezone).await?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            user_id: user.id,
            tenant_id: user.tenant_id,
            username: user.username,
        }),
    ))
}

/// Log in
///
/// # Errors
///
/// - `401 Unauthorized`: unknown username or wrong password (same message for both)
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    req.validate()?;

    let outcome =
        account::login(&state.db, state.clock.as_ref(), &req.username, &req.password).await?;
    let overdue_transitioned = outcome.overdue_in_tenant();
    let ctx = outcome.context;

    let ttl = state.config.session_ttl();
    let claims = jwt::Claims::new(ctx.user_id, ctx.tenant_id, ttl);
    let access_token = jwt::create_token(&claims, state.session_secret())?;

    Ok(Json(LoginResponse {
        access_token,
        token_type: "Bearer",
        expires_in: ttl.num_seconds(),
        user_id: ctx.user_id,
        tenant_id: ctx.tenant_id,
        timezone: ctx.timezone,
        overdue_transitioned,
    }))
}
