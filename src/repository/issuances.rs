//! Issuances repository: the book lending state machine.
//!
//! A book is `available` or `issued`; an issuance record is `issued` (active)
//! or `returned` (closed). Both transitions run in a single transaction, and
//! the book row is claimed with a conditional update so two concurrent issue
//! attempts on the same book cannot both succeed.

use sqlx::{Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::{
        book::BookStatus,
        issuance::{IssuanceDetails, IssuanceQuery, IssuanceStatus},
    },
};

use super::{unique_violation, where_clause};

const SELECT_DETAILS: &str = r#"
    SELECT ib.id, ib.book_id, b.title AS book_title, ib.user_id, u.name AS user_name,
           ib.status, ib.issued_at, ib.returned_at
    FROM issued_books ib
    LEFT JOIN books b ON b.id = ib.book_id
    LEFT JOIN users u ON u.id = ib.user_id
"#;

#[derive(Clone)]
pub struct IssuancesRepository {
    pool: Pool<Postgres>,
}

impl IssuancesRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// List issuances, optionally filtered by user, book and status
    pub async fn list(&self, query: &IssuanceQuery) -> AppResult<Vec<IssuanceDetails>> {
        let mut conditions = Vec::new();
        let mut next_param = 0;

        if query.user_id.is_some() {
            next_param += 1;
            conditions.push(format!("ib.user_id = ${}", next_param));
        }
        if query.book_id.is_some() {
            next_param += 1;
            conditions.push(format!("ib.book_id = ${}", next_param));
        }
        if query.status.is_some() {
            next_param += 1;
            conditions.push(format!("ib.status = ${}", next_param));
        }

        let sql = format!(
            "{} {} ORDER BY ib.issued_at DESC, ib.id DESC",
            SELECT_DETAILS,
            where_clause(&conditions)
        );

        let mut builder = sqlx::query_as::<_, IssuanceDetails>(&sql);
        if let Some(user_id) = query.user_id {
            builder = builder.bind(user_id);
        }
        if let Some(book_id) = query.book_id {
            builder = builder.bind(book_id);
        }
        if let Some(status) = query.status {
            builder = builder.bind(status);
        }

        Ok(builder.fetch_all(&self.pool).await?)
    }

    pub async fn get_by_id(&self, id: i32) -> AppResult<IssuanceDetails> {
        let sql = format!("{} WHERE ib.id = $1", SELECT_DETAILS);
        sqlx::query_as::<_, IssuanceDetails>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Issued record not found".to_string()))
    }

    /// Issue a book to a user. Returns the new issuance id.
    ///
    /// Fails with `NotFound` if the book or user is missing and with
    /// `Conflict` if the book is not available.
    pub async fn issue(&self, book_id: i32, user_id: i32) -> AppResult<i32> {
        let mut tx = self.pool.begin().await?;

        let book_exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM books WHERE id = $1)")
            .bind(book_id)
            .fetch_one(&mut *tx)
            .await?;
        if !book_exists {
            return Err(AppError::NotFound("Book not found".to_string()));
        }

        // Shared lock: a concurrent user deletion waits for this transaction
        let user: Option<i32> = sqlx::query_scalar("SELECT id FROM users WHERE id = $1 FOR SHARE")
            .bind(user_id)
            .fetch_optional(&mut *tx)
            .await?;
        if user.is_none() {
            return Err(AppError::NotFound("User not found".to_string()));
        }

        // Check-and-set on the book row; concurrent claimers serialize here
        let claimed = sqlx::query("UPDATE books SET status = $2 WHERE id = $1 AND status = $3")
            .bind(book_id)
            .bind(BookStatus::Issued)
            .bind(BookStatus::Available)
            .execute(&mut *tx)
            .await?;
        if claimed.rows_affected() == 0 {
            return Err(AppError::Conflict("Book not available".to_string()));
        }

        let issuance_id: i32 = sqlx::query_scalar(
            r#"
            INSERT INTO issued_books (book_id, user_id, status)
            VALUES ($1, $2, $3)
            RETURNING id
            "#,
        )
        .bind(book_id)
        .bind(user_id)
        .bind(IssuanceStatus::Issued)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| unique_violation(e, "Book not available"))?;

        tx.commit().await?;

        Ok(issuance_id)
    }

    /// Close an active issuance and make its book available again.
    ///
    /// The record is kept with status `returned`.
    pub async fn close(&self, id: i32) -> AppResult<IssuanceDetails> {
        let mut tx = self.pool.begin().await?;

        // Book before issuance, the same order user deletion locks them in
        sqlx::query(
            r#"
            SELECT b.id FROM books b
            JOIN issued_books ib ON ib.book_id = b.id
            WHERE ib.id = $1
            FOR UPDATE OF b
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;

        let book_id: Option<i32> = sqlx::query_scalar(
            r#"
            UPDATE issued_books
            SET status = $2, returned_at = NOW()
            WHERE id = $1 AND status = $3
            RETURNING book_id
            "#,
        )
        .bind(id)
        .bind(IssuanceStatus::Returned)
        .bind(IssuanceStatus::Issued)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(book_id) = book_id else {
            let exists: bool =
                sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM issued_books WHERE id = $1)")
                    .bind(id)
                    .fetch_one(&mut *tx)
                    .await?;
            return Err(if exists {
                AppError::Conflict("Issuance already returned".to_string())
            } else {
                AppError::NotFound("Issued record not found".to_string())
            });
        };

        sqlx::query("UPDATE books SET status = $2 WHERE id = $1")
            .bind(book_id)
            .bind(BookStatus::Available)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        self.get_by_id(id).await
    }
}
