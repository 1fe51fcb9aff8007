//! User directory service

use crate::{
    error::AppResult,
    models::user::{UserDetails, UserQuery},
    repository::Repository,
};

#[derive(Clone)]
pub struct UsersService {
    repository: Repository,
}

impl UsersService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Search users, each with the books it currently holds
    pub async fn search_users(&self, query: &UserQuery) -> AppResult<Vec<UserDetails>> {
        let users = self.repository.users.search(query).await?;
        let ids: Vec<i32> = users.iter().map(|u| u.id).collect();
        let mut issuances = self.repository.users.issuances_by_user(&ids).await?;

        Ok(users
            .into_iter()
            .map(|user| {
                let issued = issuances.remove(&user.id).unwrap_or_default();
                UserDetails::new(user, issued)
            })
            .collect())
    }

    pub async fn get_user(&self, id: i32) -> AppResult<UserDetails> {
        let user = self.repository.users.get_by_id(id).await?;
        let issued = self
            .repository
            .users
            .issuances_by_user(&[id])
            .await?
            .remove(&id)
            .unwrap_or_default();
        Ok(UserDetails::new(user, issued))
    }

    /// Delete a user, releasing any book it still holds
    pub async fn delete_user(&self, id: i32) -> AppResult<()> {
        self.repository.users.delete(id).await?;
        tracing::info!("Deleted user {}", id);
        Ok(())
    }
}
