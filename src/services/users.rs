//! User administration service

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHasher, SaltString},
    Argon2,
};
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::user::{CreateUser, UpdateUser, UserDetails, UserQuery},
    repository::Repository,
};

/// Hash a password using Argon2
pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))?;
    Ok(hash.to_string())
}

#[derive(Clone)]
pub struct UsersService {
    repository: Repository,
}

impl UsersService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// List users, optionally filtered by username or email
    pub async fn list_users(&self, query: &UserQuery) -> AppResult<Vec<UserDetails>> {
        let search = query
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty());
        self.repository.users.search(search).await
    }

    /// Get user by ID
    pub async fn get_user(&self, id: i32) -> AppResult<UserDetails> {
        self.repository.users.get_details(id).await
    }

    /// Create a new user
    pub async fn create_user(&self, user: CreateUser) -> AppResult<UserDetails> {
        user.validate()?;

        if self.repository.users.email_exists(&user.email, None).await? {
            return Err(AppError::Validation("Email already registered".to_string()));
        }

        let password_hash = hash_password(&user.password)?;
        let created = self
            .repository
            .users
            .create(
                &user.username,
                &user.email,
                &password_hash,
                user.role.unwrap_or_default(),
            )
            .await?;

        tracing::info!("User created: id={} role={}", created.id, created.role);
        self.repository.users.get_details(created.id).await
    }

    /// Update an existing user
    pub async fn update_user(&self, id: i32, user: UpdateUser) -> AppResult<UserDetails> {
        user.validate()?;

        if let Some(ref email) = user.email {
            if self.repository.users.email_exists(email, Some(id)).await? {
                return Err(AppError::Validation(
                    "Email already in use by another user".to_string(),
                ));
            }
        }

        let password_hash = match user.password {
            Some(ref password) => Some(hash_password(password)?),
            None => None,
        };

        self.repository.users.update(id, &user, password_hash).await?;
        tracing::info!("User updated: id={}", id);
        self.repository.users.get_details(id).await
    }

    /// Delete a user; callers cannot delete their own account
    pub async fn delete_user(&self, caller_id: i32, id: i32) -> AppResult<()> {
        if caller_id == id {
            return Err(AppError::Validation(
                "You cannot delete your own account".to_string(),
            ));
        }

        self.repository.users.delete(id).await?;
        tracing::info!("User deleted: id={} by={}", id, caller_id);
        Ok(())
    }
}
