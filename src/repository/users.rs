//! Users repository for database operations

use sqlx::{Pool, Postgres};

use super::contains_pattern;
use crate::{
    error::{unique_violation, AppError, AppResult},
    models::user::{Role, UpdateUser, User, UserDetails},
};

const EMAIL_TAKEN: &str = "Email already registered";

const SELECT_DETAILS: &str = r#"
    SELECT u.id, u.username, u.email, u.role, u.is_active, u.date_joined,
           (SELECT COUNT(*) FROM borrowings b
            WHERE b.user_id = u.id AND b.status = 'active') AS borrowing_count
    FROM users u
"#;

fn map_write_error(err: sqlx::Error) -> AppError {
    match unique_violation(&err) {
        Some(_) => AppError::Validation(EMAIL_TAKEN.to_string()),
        None => AppError::Database(err),
    }
}

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
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User with id {} not found", id)))
    }

    /// Get user with borrowing summary
    pub async fn get_details(&self, id: i32) -> AppResult<UserDetails> {
        let sql = format!("{} WHERE u.id = $1", SELECT_DETAILS);
        sqlx::query_as::<_, UserDetails>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User with id {} not found", id)))
    }

    /// Check if email already exists
    pub async fn email_exists(&self, email: &str, exclude_id: Option<i32>) -> AppResult<bool> {
        let exists: bool = if let Some(id) = exclude_id {
            sqlx::query_scalar(
                "SELECT EXISTS(SELECT 1 FROM users WHERE LOWER(email) = LOWER($1) AND id != $2)",
            )
                .bind(email)
                .bind(id)
                .fetch_one(&self.pool)
                .await?
        } else {
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE LOWER(email) = LOWER($1))")
                .bind(email)
                .fetch_one(&self.pool)
                .await?
        };
        Ok(exists)
    }

    /// List users, optionally filtered by a username/email substring
    pub async fn search(&self, search: Option<&str>) -> AppResult<Vec<UserDetails>> {
        let users = match search {
            Some(text) => {
                let sql = format!(
                    "{} WHERE u.username ILIKE $1 OR u.email ILIKE $1 ORDER BY u.id",
                    SELECT_DETAILS
                );
                sqlx::query_as::<_, UserDetails>(&sql)
                    .bind(contains_pattern(text))
                    .fetch_all(&self.pool)
                    .await?
            }
            None => {
                let sql = format!("{} ORDER BY u.id", SELECT_DETAILS);
                sqlx::query_as::<_, UserDetails>(&sql)
                    .fetch_all(&self.pool)
                    .await?
            }
        };
        Ok(users)
    }

    /// Create a new user with an already-hashed password
    pub async fn create(
        &self,
        username: &str,
        email: &str,
        password_hash: &str,
        role: Role,
    ) -> AppResult<User> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (username, email, password_hash, role)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(username)
        .bind(email)
        .bind(password_hash)
        .bind(role)
        .fetch_one(&self.pool)
        .await
        .map_err(map_write_error)
    }

    /// Update the provided fields of a user
    pub async fn update(
        &self,
        id: i32,
        user: &UpdateUser,
        password_hash: Option<String>,
    ) -> AppResult<User> {
        let mut sets = Vec::new();
        let mut param_idx = 2;

        macro_rules! add_field {
            ($field:expr, $name:expr) => {
                if $field.is_some() {
                    sets.push(format!("{} = ${}", $name, param_idx));
                    param_idx += 1;
                }
            };
        }

        add_field!(user.username, "username");
        add_field!(user.email, "email");
        add_field!(user.role, "role");
        add_field!(user.is_active, "is_active");
        add_field!(password_hash, "password_hash");

        if sets.is_empty() {
            return self.get_by_id(id).await;
        }

        let query = format!(
            "UPDATE users SET {} WHERE id = $1 RETURNING *",
            sets.join(", ")
        );

        let mut builder = sqlx::query_as::<_, User>(&query).bind(id);

        macro_rules! bind_field {
            ($field:expr) => {
                if let Some(val) = $field {
                    builder = builder.bind(val);
                }
            };
        }

        bind_field!(user.username.as_ref());
        bind_field!(user.email.as_ref());
        bind_field!(user.role);
        bind_field!(user.is_active);
        bind_field!(password_hash);

        builder
            .fetch_optional(&self.pool)
            .await
            .map_err(map_write_error)?
            .ok_or_else(|| AppError::NotFound(format!("User with id {} not found", id)))
    }

    /// Delete a user; their borrowings and wishlist entries cascade
    pub async fn delete(&self, id: i32) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("User with id {} not found", id)));
        }
        Ok(())
    }
}
