//! User model, JWT claims and role-based permissions

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use super::impl_text_column;
use crate::error::AppError;

/// User role
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    #[default]
    Reader,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Reader => "reader",
        }
    }

    /// Capability check: whether this role grants `permission`
    pub fn allows(&self, permission: Permission) -> bool {
        match permission {
            Permission::ReadCatalog
            | Permission::ReturnBooks
            | Permission::ViewOwnBorrowings
            | Permission::ManageWishlist => true,
            Permission::Borrow => *self == Role::Reader,
            Permission::ManageCatalog | Permission::ManageUsers => *self == Role::Admin,
        }
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "reader" => Ok(Role::Reader),
            _ => Err(format!("Invalid role: {}", s)),
        }
    }
}

impl_text_column!(Role);

/// Operations gated by role
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    ReadCatalog,
    ManageCatalog,
    Borrow,
    ReturnBooks,
    ViewOwnBorrowings,
    ManageWishlist,
    ManageUsers,
}

impl Permission {
    fn denial_message(&self) -> &'static str {
        match self {
            Permission::Borrow => "You do not have reader privileges to access this resource",
            Permission::ManageCatalog | Permission::ManageUsers => {
                "You do not have admin privileges to access this resource"
            }
            _ => "You do not have permission to access this resource",
        }
    }
}

/// Allow/deny decision for `role` on `permission`
pub fn authorize(role: Role, permission: Permission) -> Result<(), AppError> {
    if role.allows(permission) {
        Ok(())
    } else {
        Err(AppError::Authorization(permission.denial_message().to_string()))
    }
}

/// User row from database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: i32,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: Role,
    pub is_active: bool,
    pub date_joined: DateTime<Utc>,
}

/// User with borrowing summary for administration screens
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct UserDetails {
    pub id: i32,
    pub username: String,
    pub email: String,
    pub role: Role,
    pub is_active: bool,
    pub date_joined: DateTime<Utc>,
    /// Number of active borrowings
    pub borrowing_count: i64,
}

/// Create user request (admin)
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateUser {
    #[validate(length(min = 3, max = 150, message = "Username must be 3-150 characters"))]
    pub username: String,
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
    /// Defaults to reader
    pub role: Option<Role>,
}

/// Update user request (admin)
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateUser {
    #[validate(length(min = 3, max = 150, message = "Username must be 3-150 characters"))]
    pub username: Option<String>,
    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: Option<String>,
    pub role: Option<Role>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct UserQuery {
    /// Substring matched against username and email
    pub search: Option<String>,
}

/// JWT Claims for authenticated users
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserClaims {
    /// Subject: the user's email
    pub sub: String,
    pub user_id: i32,
    pub username: String,
    pub role: Role,
    pub exp: i64,
    pub iat: i64,
}

impl UserClaims {
    pub fn for_user(user: &User, lifetime: Duration) -> Self {
        let now = Utc::now();
        Self {
            sub: user.email.clone(),
            user_id: user.id,
            username: user.username.clone(),
            role: user.role,
            exp: (now + lifetime).timestamp(),
            iat: now.timestamp(),
        }
    }

    /// Create a new JWT token
    pub fn create_token(&self, secret: &str) -> Result<String, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{encode, EncodingKey, Header};
        encode(
            &Header::default(),
            self,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
    }

    /// Parse JWT token
    pub fn from_token(token: &str, secret: &str) -> Result<Self, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{decode, DecodingKey, Validation};
        let token_data = decode::<Self>(
            token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &Validation::default(),
        )?;
        Ok(token_data.claims)
    }
}

/// The authenticated caller, resolved from a token against the users table
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Caller {
    pub id: i32,
    pub username: String,
    pub email: String,
    pub role: Role,
    pub is_active: bool,
}

impl Caller {
    pub fn require(&self, permission: Permission) -> Result<(), AppError> {
        authorize(self.role, permission)
    }
}

impl From<User> for Caller {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            role: user.role,
            is_active: user.is_active,
        }
    }
}
