//! Catalog management service: authors and books

use crate::{
    error::{AppError, AppResult},
    models::{
        author::{Author, CreateAuthor, UpdateAuthor},
        book::{Book, BookQuery, CreateBook, UpdateBook},
        required,
    },
    repository::{books::NewBook, Repository},
};

#[derive(Clone)]
pub struct CatalogService {
    repository: Repository,
}

impl CatalogService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    pub async fn list_authors(&self) -> AppResult<Vec<Author>> {
        self.repository.authors.list().await
    }

    pub async fn get_author(&self, id: i32) -> AppResult<Author> {
        self.repository.authors.get_by_id(id).await
    }

    pub async fn create_author(&self, author: CreateAuthor) -> AppResult<Author> {
        let name = required(author.name, "name")?;
        let created = self
            .repository
            .authors
            .create(&name, author.bio.as_deref())
            .await?;

        tracing::info!("Created author {}", created.id);
        Ok(created)
    }

    pub async fn update_author(&self, id: i32, author: UpdateAuthor) -> AppResult<Author> {
        let name = match author.name {
            Some(name) => Some(required(Some(name), "name")?),
            None => None,
        };
        self.repository
            .authors
            .update(id, name.as_deref(), author.bio.as_deref())
            .await
    }

    /// Delete an author and, by cascade, all of its books
    pub async fn delete_author(&self, id: i32) -> AppResult<()> {
        self.repository.authors.delete(id).await?;
        tracing::info!("Deleted author {} and its books", id);
        Ok(())
    }

    pub async fn search_books(&self, query: &BookQuery) -> AppResult<Vec<Book>> {
        self.repository.books.list(query).await
    }

    pub async fn get_book(&self, id: i32) -> AppResult<Book> {
        self.repository.books.get_by_id(id).await
    }

    pub async fn create_book(&self, book: CreateBook) -> AppResult<Book> {
        let title = required(book.title, "title")?;
        let category = required(book.category, "category")?;
        let author_id = book
            .author_id
            .ok_or_else(|| AppError::Validation("author_id is required".to_string()))?;
        let isbn = trim_isbn(book.isbn).filter(|isbn| !isbn.is_empty());

        let created = self
            .repository
            .books
            .create(&NewBook {
                title: &title,
                category: &category,
                author_id,
                isbn: isbn.as_deref(),
                description: book.description.as_deref(),
            })
            .await?;

        tracing::info!("Created book {} for author {}", created.id, author_id);
        Ok(created)
    }

    /// Update a book. A blank ISBN clears it.
    pub async fn update_book(&self, id: i32, mut book: UpdateBook) -> AppResult<Book> {
        for (value, field) in [(&book.title, "title"), (&book.category, "category")] {
            if value.as_deref().is_some_and(|v| v.trim().is_empty()) {
                return Err(AppError::Validation(format!("{} is required", field)));
            }
        }
        book.isbn = trim_isbn(book.isbn);
        self.repository.books.update(id, &book).await
    }

    pub async fn delete_book(&self, id: i32) -> AppResult<()> {
        self.repository.books.delete(id).await?;
        tracing::info!("Deleted book {}", id);
        Ok(())
    }
}

/// Trim an ISBN, keeping an explicit blank so updates can clear it
fn trim_isbn(isbn: Option<String>) -> Option<String> {
    isbn.map(|isbn| isbn.trim().to_string())
}
