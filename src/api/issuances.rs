//! Book issuance endpoints

use axum::{extract::State, http::StatusCode};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    error::{AppResult, ErrorResponse},
    models::issuance::{CreateIssuance, IssuanceDetails, IssuanceQuery},
    AppState,
};

use super::extract::{Json, Path, Query};

/// Issue response
#[derive(Serialize, ToSchema)]
pub struct IssueResponse {
    pub message: String,
    /// New issuance ID
    pub issued_id: i32,
}

/// List issuances
#[utoipa::path(
    get,
    path = "/issued_books",
    tag = "issuances",
    security(("bearer_auth" = [])),
    params(IssuanceQuery),
    responses(
        (status = 200, description = "Issuance records", body = Vec<IssuanceDetails>),
        (status = 401, description = "Not authenticated", body = ErrorResponse)
    )
)]
pub async fn list_issuances(
    State(state): State<AppState>,
    Query(query): Query<IssuanceQuery>,
) -> AppResult<Json<Vec<IssuanceDetails>>> {
    let issuances = state.services.issuances.list(&query).await?;
    Ok(Json(issuances))
}

/// Get an issuance record by ID
#[utoipa::path(
    get,
    path = "/issued_books/{id}",
    tag = "issuances",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Issuance ID")
    ),
    responses(
        (status = 200, description = "Issuance record", body = IssuanceDetails),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 404, description = "Issued record not found", body = ErrorResponse)
    )
)]
pub async fn get_issuance(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<IssuanceDetails>> {
    let issuance = state.services.issuances.get(id).await?;
    Ok(Json(issuance))
}

/// Issue an available book to a user
#[utoipa::path(
    post,
    path = "/issued_books",
    tag = "issuances",
    security(("bearer_auth" = [])),
    request_body = CreateIssuance,
    responses(
        (status = 201, description = "Book issued", body = IssueResponse),
        (status = 400, description = "Missing IDs or book not available", body = ErrorResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 404, description = "Book or user not found", body = ErrorResponse)
    )
)]
pub async fn issue_book(
    State(state): State<AppState>,
    Json(request): Json<CreateIssuance>,
) -> AppResult<(StatusCode, Json<IssueResponse>)> {
    let issued_id = state.services.issuances.issue(request).await?;

    Ok((
        StatusCode::CREATED,
        Json(IssueResponse {
            message: "Book issued successfully".to_string(),
            issued_id,
        }),
    ))
}

/// Close an active issuance; the book becomes available again
#[utoipa::path(
    delete,
    path = "/issued_books/{id}",
    tag = "issuances",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Issuance ID")
    ),
    responses(
        (status = 200, description = "Issuance closed", body = IssuanceDetails),
        (status = 400, description = "Issuance already returned", body = ErrorResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 404, description = "Issued record not found", body = ErrorResponse)
    )
)]
pub async fn close_issuance(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<IssuanceDetails>> {
    let closed = state.services.issuances.close(id).await?;
    Ok(Json(closed))
}
