//! Identity service: resolves credential tokens to callers.
//!
//! Tokens are only verified here. Issuing them for a login flow is left to the
//! deployment; [`IdentityService::issue_token`] exists for operators and tests.

use chrono::Duration;

use crate::{
    config::AuthConfig,
    error::{AppError, AppResult},
    models::user::{Caller, User, UserClaims},
    repository::Repository,
};

#[derive(Clone)]
pub struct IdentityService {
    repository: Repository,
    config: AuthConfig,
}

impl IdentityService {
    pub fn new(repository: Repository, config: AuthConfig) -> Self {
        Self { repository, config }
    }

    /// Name of the cookie carrying the access token
    pub fn cookie_name(&self) -> &str {
        &self.config.cookie_name
    }

    /// Decode and verify a token without touching the database
    pub fn verify_token(&self, token: &str) -> AppResult<UserClaims> {
        UserClaims::from_token(token, &self.config.jwt_secret)
            .map_err(|e| AppError::Authentication(format!("Invalid token: {}", e)))
    }

    /// Resolve a token to the current caller.
    ///
    /// The role comes from the users table, so role changes and deactivation
    /// apply to tokens that were issued before them.
    pub async fn authenticate(&self, token: &str) -> AppResult<Caller> {
        let claims = self.verify_token(token)?;

        let user = match self.repository.users.get_by_id(claims.user_id).await {
            Ok(user) => user,
            Err(AppError::NotFound(_)) => {
                return Err(AppError::Authentication("User no longer exists".to_string()))
            }
            Err(e) => return Err(e),
        };

        if !user.is_active {
            tracing::warn!("Rejected token for inactive user {}", user.id);
            return Err(AppError::Authentication(
                "Account is inactive. Please contact an administrator".to_string(),
            ));
        }

        Ok(Caller::from(user))
    }

    /// Sign an access token for `user`
    pub fn issue_token(&self, user: &User) -> AppResult<String> {
        let lifetime = Duration::minutes(self.config.jwt_expiration_minutes);
        let claims = UserClaims::for_user(user, lifetime);
        claims
            .create_token(&self.config.jwt_secret)
            .map_err(|e| AppError::Internal(format!("Failed to create token: {}", e)))
    }
}
