//! Repository layer for database operations

pub mod authors;
pub mod books;
pub mod issuances;
pub mod users;

use sqlx::{Pool, Postgres};

use crate::error::AppError;

/// Main repository struct holding database connection pool
#[derive(Clone)]
pub struct Repository {
    pub pool: Pool<Postgres>,
    pub authors: authors::AuthorsRepository,
    pub books: books::BooksRepository,
    pub users: users::UsersRepository,
    pub issuances: issuances::IssuancesRepository,
}

impl Repository {
    /// Create a new repository with the given database pool
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self {
            authors: authors::AuthorsRepository::new(pool.clone()),
            books: books::BooksRepository::new(pool.clone()),
            users: users::UsersRepository::new(pool.clone()),
            issuances: issuances::IssuancesRepository::new(pool.clone()),
            pool,
        }
    }

    /// Round-trip to the database
    pub async fn ping(&self) -> bool {
        sqlx::query("SELECT 1").execute(&self.pool).await.is_ok()
    }
}

/// Report a unique-constraint violation as a conflict instead of a raw
/// storage error
pub(crate) fn unique_violation(err: sqlx::Error, message: &str) -> AppError {
    match err.as_database_error() {
        Some(db) if db.is_unique_violation() => AppError::Conflict(message.to_string()),
        _ => AppError::Database(err),
    }
}

/// Append `%value%` as an `ILIKE` condition on `column`
pub(crate) fn push_ilike(
    conditions: &mut Vec<String>,
    params: &mut Vec<String>,
    column: &str,
    value: &Option<String>,
) {
    if let Some(value) = value.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
        params.push(format!("%{}%", value));
        conditions.push(format!("{} ILIKE ${}", column, params.len()));
    }
}

pub(crate) fn where_clause(conditions: &[String]) -> String {
    if conditions.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", conditions.join(" AND "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_building() {
        let mut conditions = Vec::new();
        let mut params = Vec::new();
        push_ilike(&mut conditions, &mut params, "b.title", &Some("dune".into()));
        push_ilike(&mut conditions, &mut params, "b.category", &None);
        push_ilike(&mut conditions, &mut params, "a.name", &Some("  ".into()));
        push_ilike(&mut conditions, &mut params, "a.name", &Some("Herbert".into()));

        assert_eq!(params, vec!["%dune%".to_string(), "%Herbert%".to_string()]);
        assert_eq!(
            where_clause(&conditions),
            "WHERE b.title ILIKE $1 AND a.name ILIKE $2"
        );
        assert_eq!(where_clause(&[]), "");
    }

    #[test]
    fn test_non_database_errors_pass_through() {
        let err = unique_violation(sqlx::Error::RowNotFound, "Email already exists");
        assert!(matches!(err, AppError::Database(sqlx::Error::RowNotFound)));
    }
}
