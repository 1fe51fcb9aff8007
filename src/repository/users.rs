//! Users repository for database operations

use std::collections::HashMap;

use sqlx::{Pool, Postgres, Row};

use crate::{
    error::{AppError, AppResult},
    models::{
        book::BookStatus,
        issuance::IssuanceStatus,
        user::{NewUser, User, UserIssuance, UserQuery},
    },
};

use super::{push_ilike, unique_violation, where_clause};

#[derive(Clone)]
pub struct UsersRepository {
    pool: Pool<Postgres>,
}

impl UsersRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get user by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<User> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))
    }

    pub async fn find_by_id(&self, id: i32) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    /// Get user by email (exact, case-sensitive match)
    pub async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    /// Insert a user; a taken email is reported as a conflict
    pub async fn create(&self, user: &NewUser) -> AppResult<User> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (name, email, password, role)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.role)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| unique_violation(e, "Email already exists"))
    }

    /// Search users by name, email and role
    pub async fn search(&self, query: &UserQuery) -> AppResult<Vec<User>> {
        let mut conditions = Vec::new();
        let mut params: Vec<String> = Vec::new();

        push_ilike(&mut conditions, &mut params, "name", &query.name);
        push_ilike(&mut conditions, &mut params, "email", &query.email);

        if let Some(role) = query.role {
            params.push(role.as_str().to_string());
            conditions.push(format!("role = ${}", params.len()));
        }

        let sql = format!(
            "SELECT * FROM users {} ORDER BY name, id",
            where_clause(&conditions)
        );

        let mut builder = sqlx::query_as::<_, User>(&sql);
        for param in &params {
            builder = builder.bind(param);
        }

        Ok(builder.fetch_all(&self.pool).await?)
    }

    /// Active issuances of the given users, keyed by user id
    pub async fn issuances_by_user(
        &self,
        user_ids: &[i32],
    ) -> AppResult<HashMap<i32, Vec<UserIssuance>>> {
        let rows = sqlx::query(
            r#"
            SELECT ib.id, ib.user_id, ib.book_id, b.title AS book_title, ib.status
            FROM issued_books ib
            LEFT JOIN books b ON b.id = ib.book_id
            WHERE ib.user_id = ANY($1) AND ib.status = $2
            ORDER BY ib.issued_at, ib.id
            "#,
        )
        .bind(user_ids)
        .bind(IssuanceStatus::Issued)
        .fetch_all(&self.pool)
        .await?;

        let mut result: HashMap<i32, Vec<UserIssuance>> = HashMap::new();
        for row in rows {
            result
                .entry(row.get("user_id"))
                .or_default()
                .push(UserIssuance {
                    id: row.get("id"),
                    book_id: row.get("book_id"),
                    book_title: row.get("book_title"),
                    status: row.get("status"),
                });
        }

        Ok(result)
    }

    /// Delete a user and its issuance records.
    ///
    /// Books the user still holds are made available again in the same
    /// transaction.
    pub async fn delete(&self, id: i32) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;

        // Blocks concurrent issues to this user until we commit
        let locked: Option<i32> = sqlx::query_scalar("SELECT id FROM users WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;
        if locked.is_none() {
            return Err(AppError::NotFound("User not found".to_string()));
        }

        let released = sqlx::query(
            r#"
            UPDATE books SET status = $2
            WHERE id IN (
                SELECT book_id FROM issued_books WHERE user_id = $1 AND status = $3
            )
            "#,
        )
        .bind(id)
        .bind(BookStatus::Available)
        .bind(IssuanceStatus::Issued)
        .execute(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        if released.rows_affected() > 0 {
            tracing::info!(
                "Released {} book(s) held by deleted user {}",
                released.rows_affected(),
                id
            );
        }

        Ok(())
    }
}
