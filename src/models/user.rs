//! User model and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use super::issuance::IssuanceStatus;

/// User role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "user" => Ok(Role::User),
            "admin" => Ok(Role::Admin),
            _ => Err("Invalid role. Must be 'user' or 'admin'".to_string()),
        }
    }
}

text_enum_sqlx!(Role);

/// Full user model from database
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct User {
    pub id: i32,
    pub name: String,
    pub email: String,
    /// Salted password hash (`salt$digest`)
    #[serde(skip_serializing)]
    pub password: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

/// Identity of the caller, attached to each authenticated request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CurrentUser {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub role: Role,
}

impl From<User> for CurrentUser {
    fn from(user: User) -> Self {
        CurrentUser {
            id: user.id,
            name: user.name,
            email: user.email,
            role: user.role,
        }
    }
}

/// Issuance reference listed under a user
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct UserIssuance {
    pub id: i32,
    pub book_id: i32,
    pub book_title: Option<String>,
    pub status: IssuanceStatus,
}

/// User with the books it currently holds
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct UserDetails {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub issued_books: Vec<UserIssuance>,
}

impl UserDetails {
    pub fn new(user: User, issued_books: Vec<UserIssuance>) -> Self {
        UserDetails {
            id: user.id,
            name: user.name,
            email: user.email,
            role: user.role,
            issued_books,
        }
    }
}

/// User query parameters
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct UserQuery {
    /// Substring of the name (case-insensitive)
    pub name: Option<String>,
    /// Substring of the email (case-insensitive)
    pub email: Option<String>,
    /// Exact role
    pub role: Option<Role>,
}

/// Signup / create user request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateUser {
    pub name: Option<String>,
    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,
    pub password: Option<String>,
    /// `user` (default) or `admin`
    pub role: Option<String>,
}

/// Validated user ready for insertion
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
}

/// Login request
#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}
