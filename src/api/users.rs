//! User management endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use crate::{
    error::{AppResult, ErrorResponse},
    models::user::{CreateUser, Permission, UpdateUser, UserDetails, UserQuery},
};

use super::{AppJson, AuthenticatedUser, MessageResponse};

/// List users, optionally filtered by username or email
#[utoipa::path(
    get,
    path = "/users",
    tag = "users",
    security(("cookie_auth" = []), ("bearer_auth" = [])),
    params(UserQuery),
    responses(
        (status = 200, description = "List of users", body = Vec<UserDetails>),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 403, description = "Admin only", body = ErrorResponse)
    )
)]
pub async fn list_users(
    State(state): State<crate::AppState>,
    AuthenticatedUser(caller): AuthenticatedUser,
    Query(query): Query<UserQuery>,
) -> AppResult<Json<Vec<UserDetails>>> {
    caller.require(Permission::ManageUsers)?;

    let users = state.services.users.list_users(&query).await?;
    Ok(Json(users))
}

/// Get user details by ID
#[utoipa::path(
    get,
    path = "/users/{id}",
    tag = "users",
    security(("cookie_auth" = []), ("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "User details", body = UserDetails),
        (status = 404, description = "User not found", body = ErrorResponse)
    )
)]
pub async fn get_user(
    State(state): State<crate::AppState>,
    AuthenticatedUser(caller): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<UserDetails>> {
    caller.require(Permission::ManageUsers)?;

    let user = state.services.users.get_user(id).await?;
    Ok(Json(user))
}

/// Create a new user
#[utoipa::path(
    post,
    path = "/users",
    tag = "users",
    security(("cookie_auth" = []), ("bearer_auth" = [])),
    request_body = CreateUser,
    responses(
        (status = 201, description = "User created", body = UserDetails),
        (status = 400, description = "Invalid input or email taken", body = ErrorResponse)
    )
)]
pub async fn create_user(
    State(state): State<crate::AppState>,
    AuthenticatedUser(caller): AuthenticatedUser,
    AppJson(user): AppJson<CreateUser>,
) -> AppResult<(StatusCode, Json<UserDetails>)> {
    caller.require(Permission::ManageUsers)?;

    let created = state.services.users.create_user(user).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// Update a user
#[utoipa::path(
    put,
    path = "/users/{id}",
    tag = "users",
    security(("cookie_auth" = []), ("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "User ID")
    ),
    request_body = UpdateUser,
    responses(
        (status = 200, description = "User updated", body = UserDetails),
        (status = 400, description = "Invalid input or email taken", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse)
    )
)]
pub async fn update_user(
    State(state): State<crate::AppState>,
    AuthenticatedUser(caller): AuthenticatedUser,
    Path(id): Path<i32>,
    AppJson(user): AppJson<UpdateUser>,
) -> AppResult<Json<UserDetails>> {
    caller.require(Permission::ManageUsers)?;

    let updated = state.services.users.update_user(id, user).await?;
    Ok(Json(updated))
}

/// Delete a user with their borrowings and wishlist
#[utoipa::path(
    delete,
    path = "/users/{id}",
    tag = "users",
    security(("cookie_auth" = []), ("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "User deleted", body = MessageResponse),
        (status = 400, description = "Cannot delete own account", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse)
    )
)]
pub async fn delete_user(
    State(state): State<crate::AppState>,
    AuthenticatedUser(caller): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<MessageResponse>> {
    caller.require(Permission::ManageUsers)?;

    state.services.users.delete_user(caller.id, id).await?;
    Ok(Json(MessageResponse::ok("User deleted successfully")))
}
