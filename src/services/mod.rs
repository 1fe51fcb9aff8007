//! Business logic services

pub mod auth;
pub mod catalog;
pub mod credentials;
pub mod issuances;
pub mod tokens;
pub mod users;

use chrono::Duration;

use crate::{config::AuthConfig, repository::Repository};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub auth: auth::AuthService,
    pub catalog: catalog::CatalogService,
    pub users: users::UsersService,
    pub issuances: issuances::IssuancesService,
    repository: Repository,
}

impl Services {
    /// Create all services with the given repository
    pub fn new(repository: Repository, auth_config: &AuthConfig) -> Self {
        let tokens = tokens::TokenService::new(
            auth_config.jwt_secret.clone(),
            Duration::hours(auth_config.token_lifetime_hours),
        );

        Self {
            auth: auth::AuthService::new(repository.clone(), tokens),
            catalog: catalog::CatalogService::new(repository.clone()),
            users: users::UsersService::new(repository.clone()),
            issuances: issuances::IssuancesService::new(repository.clone()),
            repository,
        }
    }

    /// Whether the database answers
    pub async fn database_ready(&self) -> bool {
        self.repository.ping().await
    }
}
