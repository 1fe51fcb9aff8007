//! Book model and related types

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};

/// Lending status of a book.
///
/// Only the issuance workflow moves a book between these states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum BookStatus {
    #[default]
    Available,
    Issued,
}

impl BookStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookStatus::Available => "available",
            BookStatus::Issued => "issued",
        }
    }
}

impl std::fmt::Display for BookStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for BookStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "available" => Ok(BookStatus::Available),
            "issued" => Ok(BookStatus::Issued),
            _ => Err(format!("Invalid book status: {}", s)),
        }
    }
}

text_enum_sqlx!(BookStatus);

/// Book with its author's name
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct Book {
    pub id: i32,
    pub title: String,
    pub category: String,
    pub isbn: Option<String>,
    pub status: BookStatus,
    pub description: Option<String>,
    pub author_id: i32,
    pub author_name: Option<String>,
}

/// Book list filters
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct BookQuery {
    /// Substring of the title (case-insensitive)
    pub title: Option<String>,
    /// Substring of the category (case-insensitive)
    pub category: Option<String>,
    /// Exact lending status
    pub status: Option<BookStatus>,
    /// Substring of the author's name (case-insensitive)
    pub author: Option<String>,
}

/// Create book request
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateBook {
    pub title: Option<String>,
    pub category: Option<String>,
    pub author_id: Option<i32>,
    pub isbn: Option<String>,
    pub description: Option<String>,
}

/// Update book request. Status is not writable here.
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateBook {
    pub title: Option<String>,
    pub category: Option<String>,
    pub author_id: Option<i32>,
    pub isbn: Option<String>,
    pub description: Option<String>,
}
