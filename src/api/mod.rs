//! API handlers for the library REST endpoints

pub mod auth;
pub mod authors;
pub mod books;
pub mod extract;
pub mod health;
pub mod issuances;
pub mod openapi;
pub mod users;

use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{error::AppError, models::user::CurrentUser, AppState};

/// Plain message response
#[derive(Serialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

/// Extract the token from an `Authorization: Bearer <token>` header
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AppError> {
    let header = headers
        .get(AUTHORIZATION)
        .ok_or_else(|| AppError::Authentication("Token is missing".to_string()))?;

    header
        .to_str()
        .ok()
        .and_then(|value| value.strip_prefix("Bearer "))
        .filter(|token| !token.is_empty() && !token.contains(char::is_whitespace))
        .ok_or_else(|| {
            AppError::Authentication("Authorization header must be 'Bearer <token>'".to_string())
        })
}

/// Middleware guarding protected routes.
///
/// Validates the bearer token, re-reads the user it names and attaches that
/// identity to this request only. Short-circuits with 401 on any failure.
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = bearer_token(request.headers())?;
    let user = state.services.auth.authenticate(token).await?;

    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

/// Identity of the authenticated caller, set by [`require_auth`]
pub struct AuthenticatedUser(pub CurrentUser);

#[async_trait]
impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentUser>()
            .cloned()
            .map(AuthenticatedUser)
            .ok_or_else(|| AppError::Authentication("Token is missing".to_string()))
    }
}
