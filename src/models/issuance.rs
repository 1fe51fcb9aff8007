//! Issuance (book lending) model and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};

/// Issuance record status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum IssuanceStatus {
    /// Active: the book is out
    Issued,
    /// Closed, kept for history
    Returned,
}

impl IssuanceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            IssuanceStatus::Issued => "issued",
            IssuanceStatus::Returned => "returned",
        }
    }
}

impl std::fmt::Display for IssuanceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for IssuanceStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "issued" => Ok(IssuanceStatus::Issued),
            "returned" => Ok(IssuanceStatus::Returned),
            _ => Err(format!("Invalid issuance status: {}", s)),
        }
    }
}

text_enum_sqlx!(IssuanceStatus);

/// Issuance with book title and borrower name
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct IssuanceDetails {
    pub id: i32,
    pub book_id: i32,
    pub book_title: Option<String>,
    pub user_id: i32,
    pub user_name: Option<String>,
    pub status: IssuanceStatus,
    pub issued_at: DateTime<Utc>,
    pub returned_at: Option<DateTime<Utc>>,
}

/// Issuance list filters
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct IssuanceQuery {
    pub user_id: Option<i32>,
    pub book_id: Option<i32>,
    pub status: Option<IssuanceStatus>,
}

/// Issue a book request
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateIssuance {
    pub book_id: Option<i32>,
    pub user_id: Option<i32>,
}
