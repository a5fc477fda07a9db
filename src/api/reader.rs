//! Reader endpoints: borrowing, returning and the wishlist

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use crate::{
    error::{AppResult, ErrorResponse},
    models::{
        borrowing::{BorrowRequest, BorrowingDetails, BorrowingQuery, ReturnRequest},
        user::Permission,
        wishlist::{AddWishlistItem, WishlistItemDetails},
    },
};

use super::{AppJson, AuthenticatedUser, MessageResponse};

/// Borrow a book
#[utoipa::path(
    post,
    path = "/reader/borrow",
    tag = "reader",
    security(("cookie_auth" = []), ("bearer_auth" = [])),
    request_body = BorrowRequest,
    responses(
        (status = 201, description = "Book borrowed", body = BorrowingDetails),
        (status = 400, description = "Unavailable or bad due date", body = ErrorResponse),
        (status = 403, description = "Readers only", body = ErrorResponse),
        (status = 404, description = "Book not found", body = ErrorResponse)
    )
)]
pub async fn borrow_book(
    State(state): State<crate::AppState>,
    AuthenticatedUser(caller): AuthenticatedUser,
    AppJson(request): AppJson<BorrowRequest>,
) -> AppResult<(StatusCode, Json<BorrowingDetails>)> {
    caller.require(Permission::Borrow)?;

    let borrowing = state.services.borrowing.borrow(caller.id, request).await?;
    Ok((StatusCode::CREATED, Json(borrowing)))
}

/// Return a borrowed book
#[utoipa::path(
    post,
    path = "/reader/return",
    tag = "reader",
    security(("cookie_auth" = []), ("bearer_auth" = [])),
    request_body = ReturnRequest,
    responses(
        (status = 200, description = "Book returned", body = MessageResponse),
        (status = 404, description = "No such active borrowing", body = ErrorResponse)
    )
)]
pub async fn return_book(
    State(state): State<crate::AppState>,
    AuthenticatedUser(caller): AuthenticatedUser,
    AppJson(request): AppJson<ReturnRequest>,
) -> AppResult<Json<MessageResponse>> {
    caller.require(Permission::ReturnBooks)?;

    state
        .services
        .borrowing
        .return_book(caller.id, request.borrowing_id)
        .await?;
    Ok(Json(MessageResponse::ok("Book returned successfully")))
}

/// List the caller's borrowings, newest first
#[utoipa::path(
    get,
    path = "/reader/my-books",
    tag = "reader",
    security(("cookie_auth" = []), ("bearer_auth" = [])),
    params(BorrowingQuery),
    responses(
        (status = 200, description = "Borrowings", body = Vec<BorrowingDetails>),
        (status = 400, description = "Unknown status filter", body = ErrorResponse)
    )
)]
pub async fn my_books(
    State(state): State<crate::AppState>,
    AuthenticatedUser(caller): AuthenticatedUser,
    Query(query): Query<BorrowingQuery>,
) -> AppResult<Json<Vec<BorrowingDetails>>> {
    caller.require(Permission::ViewOwnBorrowings)?;

    let borrowings = state.services.borrowing.list_mine(caller.id, &query).await?;
    Ok(Json(borrowings))
}

/// List the caller's wishlist, newest first
#[utoipa::path(
    get,
    path = "/reader/wishlist",
    tag = "wishlist",
    security(("cookie_auth" = []), ("bearer_auth" = [])),
    responses(
        (status = 200, description = "Wishlist entries", body = Vec<WishlistItemDetails>)
    )
)]
pub async fn get_wishlist(
    State(state): State<crate::AppState>,
    AuthenticatedUser(caller): AuthenticatedUser,
) -> AppResult<Json<Vec<WishlistItemDetails>>> {
    caller.require(Permission::ManageWishlist)?;

    let items = state.services.wishlist.list(caller.id).await?;
    Ok(Json(items))
}

/// Add a book to the caller's wishlist
#[utoipa::path(
    post,
    path = "/reader/wishlist/add",
    tag = "wishlist",
    security(("cookie_auth" = []), ("bearer_auth" = [])),
    request_body = AddWishlistItem,
    responses(
        (status = 201, description = "Added", body = WishlistItemDetails),
        (status = 400, description = "Already in the wishlist", body = ErrorResponse),
        (status = 404, description = "Book not found", body = ErrorResponse)
    )
)]
pub async fn add_to_wishlist(
    State(state): State<crate::AppState>,
    AuthenticatedUser(caller): AuthenticatedUser,
    AppJson(request): AppJson<AddWishlistItem>,
) -> AppResult<(StatusCode, Json<WishlistItemDetails>)> {
    caller.require(Permission::ManageWishlist)?;

    let item = state.services.wishlist.add(caller.id, request.book_id).await?;
    Ok((StatusCode::CREATED, Json(item)))
}

/// Remove an entry from the caller's wishlist
#[utoipa::path(
    delete,
    path = "/reader/wishlist/{id}",
    tag = "wishlist",
    security(("cookie_auth" = []), ("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Wishlist entry ID")
    ),
    responses(
        (status = 200, description = "Removed", body = MessageResponse),
        (status = 404, description = "No such entry for the caller", body = ErrorResponse)
    )
)]
pub async fn remove_from_wishlist(
    State(state): State<crate::AppState>,
    AuthenticatedUser(caller): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<MessageResponse>> {
    caller.require(Permission::ManageWishlist)?;

    state.services.wishlist.remove(caller.id, id).await?;
    Ok(Json(MessageResponse::ok("Book removed from wishlist")))
}
