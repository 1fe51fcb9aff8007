//! Book issuance service

use crate::{
    error::{AppError, AppResult},
    models::issuance::{CreateIssuance, IssuanceDetails, IssuanceQuery},
    repository::Repository,
};

#[derive(Clone)]
pub struct IssuancesService {
    repository: Repository,
}

impl IssuancesService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    pub async fn list(&self, query: &IssuanceQuery) -> AppResult<Vec<IssuanceDetails>> {
        self.repository.issuances.list(query).await
    }

    pub async fn get(&self, id: i32) -> AppResult<IssuanceDetails> {
        self.repository.issuances.get_by_id(id).await
    }

    /// Issue an available book to a user. Returns the issuance id.
    pub async fn issue(&self, request: CreateIssuance) -> AppResult<i32> {
        let (book_id, user_id) = match (request.book_id, request.user_id) {
            (Some(book_id), Some(user_id)) => (book_id, user_id),
            _ => {
                return Err(AppError::Validation(
                    "book_id and user_id are required".to_string(),
                ))
            }
        };

        let issuance_id = self.repository.issuances.issue(book_id, user_id).await?;
        tracing::info!(
            "Issued book {} to user {} (issuance {})",
            book_id,
            user_id,
            issuance_id
        );
        Ok(issuance_id)
    }

    /// Close an active issuance, making its book available again
    pub async fn close(&self, id: i32) -> AppResult<IssuanceDetails> {
        let closed = self.repository.issuances.close(id).await?;
        tracing::info!("Closed issuance {}; book {} is available", id, closed.book_id);
        Ok(closed)
    }
}
