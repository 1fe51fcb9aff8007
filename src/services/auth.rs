//! Authentication service: signup, login and token-based identity

use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::{
        required,
        user::{CreateUser, CurrentUser, LoginRequest, NewUser, Role, User},
    },
    repository::Repository,
};

use super::{
    credentials::{hash_password, verify_password},
    tokens::{IssuedToken, TokenService},
};

#[derive(Clone)]
pub struct AuthService {
    repository: Repository,
    tokens: TokenService,
}

impl AuthService {
    pub fn new(repository: Repository, tokens: TokenService) -> Self {
        Self { repository, tokens }
    }

    /// Register a new account (signup or admin-side creation)
    pub async fn register(&self, request: CreateUser) -> AppResult<User> {
        let new_user = validate_new_user(request)?;
        let user = self.repository.users.create(&new_user).await?;

        tracing::info!("Registered user {} with role {}", user.id, user.role);
        Ok(user)
    }

    /// Check credentials and sign an access token
    pub async fn login(&self, request: LoginRequest) -> AppResult<(IssuedToken, User)> {
        let (email, password) = match (request.email, request.password) {
            (Some(email), Some(password)) if !email.trim().is_empty() && !password.is_empty() => {
                (email, password)
            }
            _ => {
                return Err(AppError::Validation(
                    "Email and password are required".to_string(),
                ))
            }
        };

        let invalid = || AppError::Authentication("Invalid credentials".to_string());

        let user = self
            .repository
            .users
            .find_by_email(email.trim())
            .await?
            .ok_or_else(invalid)?;

        if !verify_password(&user.password, &password) {
            tracing::debug!("Rejected login for user {}: wrong password", user.id);
            return Err(invalid());
        }

        let token = self.tokens.issue(user.id, &user.email)?;
        Ok((token, user))
    }

    /// Resolve a bearer token to the identity of a user that still exists
    pub async fn authenticate(&self, token: &str) -> AppResult<CurrentUser> {
        let claims = self.tokens.validate(token).map_err(|e| {
            tracing::debug!("Rejected token: {}", e);
            AppError::from(e)
        })?;

        let user = self
            .repository
            .users
            .find_by_id(claims.user_id)
            .await?
            .ok_or_else(|| {
                tracing::debug!("Rejected token for missing user {}", claims.user_id);
                AppError::Authentication("Invalid token user".to_string())
            })?;

        Ok(CurrentUser::from(user))
    }
}

/// Check presence, email format and role, then hash the password
fn validate_new_user(request: CreateUser) -> AppResult<NewUser> {
    let missing = || AppError::Validation("Name, email and password are required".to_string());

    request
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let CreateUser {
        name,
        email,
        password,
        role,
    } = request;

    let name = required(name, "name").map_err(|_| missing())?;
    let email = required(email, "email").map_err(|_| missing())?;
    let password = password.filter(|p| !p.is_empty()).ok_or_else(missing)?;

    let role = match role {
        Some(role) => role.parse::<Role>().map_err(AppError::Validation)?,
        None => Role::default(),
    };

    Ok(NewUser {
        name,
        email,
        password_hash: hash_password(&password),
        role,
    })
}
