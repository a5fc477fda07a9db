//! Catalog endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use crate::{
    error::{AppResult, ErrorResponse},
    models::{
        book::{BookDetails, BookQuery, CreateBook, UpdateBook},
        user::Permission,
    },
};

use super::{AppJson, AuthenticatedUser, MessageResponse};

/// List books, optionally filtered by category and a search term
#[utoipa::path(
    get,
    path = "/books",
    tag = "books",
    security(("cookie_auth" = []), ("bearer_auth" = [])),
    params(BookQuery),
    responses(
        (status = 200, description = "Books ordered by id", body = Vec<BookDetails>),
        (status = 400, description = "Unknown category", body = ErrorResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse)
    )
)]
pub async fn list_books(
    State(state): State<crate::AppState>,
    AuthenticatedUser(caller): AuthenticatedUser,
    Query(query): Query<BookQuery>,
) -> AppResult<Json<Vec<BookDetails>>> {
    caller.require(Permission::ReadCatalog)?;

    let books = state.services.catalog.list_books(&query).await?;
    Ok(Json(books.into_iter().map(BookDetails::from).collect()))
}

/// Get book details by ID
#[utoipa::path(
    get,
    path = "/books/{id}",
    tag = "books",
    security(("cookie_auth" = []), ("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Book ID")
    ),
    responses(
        (status = 200, description = "Book details", body = BookDetails),
        (status = 404, description = "Book not found", body = ErrorResponse)
    )
)]
pub async fn get_book(
    State(state): State<crate::AppState>,
    AuthenticatedUser(caller): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<BookDetails>> {
    caller.require(Permission::ReadCatalog)?;

    let book = state.services.catalog.get_book(id).await?;
    Ok(Json(book.into()))
}

/// Create a new book
#[utoipa::path(
    post,
    path = "/books",
    tag = "books",
    security(("cookie_auth" = []), ("bearer_auth" = [])),
    request_body = CreateBook,
    responses(
        (status = 201, description = "Book created", body = BookDetails),
        (status = 400, description = "Invalid input or duplicate ISBN", body = ErrorResponse),
        (status = 403, description = "Admin only", body = ErrorResponse)
    )
)]
pub async fn create_book(
    State(state): State<crate::AppState>,
    AuthenticatedUser(caller): AuthenticatedUser,
    AppJson(book): AppJson<CreateBook>,
) -> AppResult<(StatusCode, Json<BookDetails>)> {
    caller.require(Permission::ManageCatalog)?;

    let created = state.services.catalog.create_book(book).await?;
    Ok((StatusCode::CREATED, Json(created.into())))
}

/// Update a book; omitted fields keep their value
#[utoipa::path(
    put,
    path = "/books/{id}",
    tag = "books",
    security(("cookie_auth" = []), ("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Book ID")
    ),
    request_body = UpdateBook,
    responses(
        (status = 200, description = "Book updated", body = BookDetails),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 403, description = "Admin only", body = ErrorResponse),
        (status = 404, description = "Book not found", body = ErrorResponse)
    )
)]
pub async fn update_book(
    State(state): State<crate::AppState>,
    AuthenticatedUser(caller): AuthenticatedUser,
    Path(id): Path<i32>,
    AppJson(patch): AppJson<UpdateBook>,
) -> AppResult<Json<BookDetails>> {
    caller.require(Permission::ManageCatalog)?;

    let updated = state.services.catalog.update_book(id, patch).await?;
    Ok(Json(updated.into()))
}

/// Delete a book along with its borrowings and wishlist entries
#[utoipa::path(
    delete,
    path = "/books/{id}",
    tag = "books",
    security(("cookie_auth" = []), ("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Book ID")
    ),
    responses(
        (status = 200, description = "Book deleted", body = MessageResponse),
        (status = 403, description = "Admin only", body = ErrorResponse),
        (status = 404, description = "Book not found", body = ErrorResponse)
    )
)]
pub async fn delete_book(
    State(state): State<crate::AppState>,
    AuthenticatedUser(caller): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<MessageResponse>> {
    caller.require(Permission::ManageCatalog)?;

    state.services.catalog.delete_book(id).await?;
    Ok(Json(MessageResponse::ok("Book deleted successfully")))
}
