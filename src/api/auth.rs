//! Authentication endpoints

use axum::{extract::State, http::StatusCode};
use chrono::{DateTime, TimeZone, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    error::{AppResult, ErrorResponse},
    models::user::{CreateUser, CurrentUser, LoginRequest},
    AppState,
};

use super::{extract::Json, AuthenticatedUser};

/// Signup response
#[derive(Serialize, ToSchema)]
pub struct SignupResponse {
    pub message: String,
    /// New user ID
    pub id: i32,
}

/// Login response
#[derive(Serialize, ToSchema)]
pub struct LoginResponse {
    pub message: String,
    /// Signed access token
    pub token: String,
    /// Always `Bearer`
    pub token_type: String,
    /// Token expiry
    pub expires_at: DateTime<Utc>,
    pub user: CurrentUser,
}

/// Create an account
#[utoipa::path(
    post,
    path = "/signup",
    tag = "auth",
    request_body = CreateUser,
    responses(
        (status = 201, description = "Account created", body = SignupResponse),
        (status = 400, description = "Missing fields, invalid role or email already registered", body = ErrorResponse)
    )
)]
pub async fn signup(
    State(state): State<AppState>,
    Json(request): Json<CreateUser>,
) -> AppResult<(StatusCode, Json<SignupResponse>)> {
    let user = state.services.auth.register(request).await?;

    Ok((
        StatusCode::CREATED,
        Json(SignupResponse {
            message: "Signup successful. Please login to get a token".to_string(),
            id: user.id,
        }),
    ))
}

/// Exchange credentials for an access token
#[utoipa::path(
    post,
    path = "/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 400, description = "Missing fields", body = ErrorResponse),
        (status = 401, description = "Invalid credentials", body = ErrorResponse)
    )
)]
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> AppResult<Json<LoginResponse>> {
    let (issued, user) = state.services.auth.login(request).await?;

    let expires_at = Utc
        .timestamp_opt(issued.claims.exp, 0)
        .single()
        .unwrap_or_else(Utc::now);

    Ok(Json(LoginResponse {
        message: "Login successful".to_string(),
        token: issued.token,
        token_type: "Bearer".to_string(),
        expires_at,
        user: user.into(),
    }))
}

/// Identity attached to the current request
#[utoipa::path(
    get,
    path = "/me",
    tag = "auth",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Current user", body = CurrentUser),
        (status = 401, description = "Missing, invalid or expired token", body = ErrorResponse)
    )
)]
pub async fn me(AuthenticatedUser(user): AuthenticatedUser) -> Json<CurrentUser> {
    Json(user)
}
