//! Books repository for database operations

use sqlx::{Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::book::{Book, BookQuery, UpdateBook},
};

use super::{push_ilike, where_clause};

const SELECT_BOOK: &str = r#"
    SELECT b.id, b.title, b.category, b.isbn, b.status, b.description,
           b.author_id, a.name AS author_name
    FROM books b
    LEFT JOIN authors a ON a.id = b.author_id
"#;

/// Fields of a validated new book
pub struct NewBook<'a> {
    pub title: &'a str,
    pub category: &'a str,
    pub author_id: i32,
    pub isbn: Option<&'a str>,
    pub description: Option<&'a str>,
}

/// Map ISBN uniqueness and author references to domain errors
fn write_error(err: sqlx::Error) -> AppError {
    match err.as_database_error() {
        Some(db) if db.is_unique_violation() => {
            AppError::Conflict("A book with this ISBN already exists".to_string())
        }
        Some(db) if db.is_foreign_key_violation() => {
            AppError::NotFound("Author not found".to_string())
        }
        _ => AppError::Database(err),
    }
}

#[derive(Clone)]
pub struct BooksRepository {
    pool: Pool<Postgres>,
}

impl BooksRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// List books matching the given filters
    pub async fn list(&self, query: &BookQuery) -> AppResult<Vec<Book>> {
        let mut conditions = Vec::new();
        let mut params: Vec<String> = Vec::new();

        push_ilike(&mut conditions, &mut params, "b.title", &query.title);
        push_ilike(&mut conditions, &mut params, "b.category", &query.category);
        push_ilike(&mut conditions, &mut params, "a.name", &query.author);

        if let Some(status) = query.status {
            params.push(status.as_str().to_string());
            conditions.push(format!("b.status = ${}", params.len()));
        }

        let sql = format!("{} {} ORDER BY b.title, b.id", SELECT_BOOK, where_clause(&conditions));

        let mut builder = sqlx::query_as::<_, Book>(&sql);
        for param in &params {
            builder = builder.bind(param);
        }

        Ok(builder.fetch_all(&self.pool).await?)
    }

    pub async fn get_by_id(&self, id: i32) -> AppResult<Book> {
        let sql = format!("{} WHERE b.id = $1", SELECT_BOOK);
        sqlx::query_as::<_, Book>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Book not found".to_string()))
    }

    /// Insert a book. New books are always available.
    pub async fn create(&self, book: &NewBook<'_>) -> AppResult<Book> {
        let id: i32 = sqlx::query_scalar(
            r#"
            INSERT INTO books (title, category, author_id, isbn, description)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
            "#,
        )
        .bind(book.title)
        .bind(book.category)
        .bind(book.author_id)
        .bind(book.isbn)
        .bind(book.description)
        .fetch_one(&self.pool)
        .await
        .map_err(write_error)?;

        self.get_by_id(id).await
    }

    /// Update descriptive fields. Lending status is left untouched.
    ///
    /// An empty ISBN is stored as NULL.
    pub async fn update(&self, id: i32, data: &UpdateBook) -> AppResult<Book> {
        let updated: Option<i32> = sqlx::query_scalar(
            r#"
            UPDATE books
            SET title = COALESCE($2, title),
                category = COALESCE($3, category),
                author_id = COALESCE($4, author_id),
                isbn = CASE WHEN $5::text IS NULL THEN isbn ELSE NULLIF($5, '') END,
                description = COALESCE($6, description)
            WHERE id = $1
            RETURNING id
            "#,
        )
        .bind(id)
        .bind(&data.title)
        .bind(&data.category)
        .bind(data.author_id)
        .bind(&data.isbn)
        .bind(&data.description)
        .fetch_optional(&self.pool)
        .await
        .map_err(write_error)?;

        match updated {
            Some(id) => self.get_by_id(id).await,
            None => Err(AppError::NotFound("Book not found".to_string())),
        }
    }

    /// Delete a book together with its issuance records
    pub async fn delete(&self, id: i32) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM books WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Book not found".to_string()));
        }
        Ok(())
    }
}
