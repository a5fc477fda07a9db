//! Wishlist model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

use super::book::{BookCategory, BookStatus};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct WishlistItem {
    pub id: i32,
    pub book_id: i32,
    pub user_id: i32,
    pub added_date: DateTime<Utc>,
}

/// Wishlist entry joined with its book
#[derive(Debug, Clone, FromRow)]
pub struct WishlistItemRow {
    pub id: i32,
    pub book_id: i32,
    pub book_title: String,
    pub book_author: String,
    pub book_category: BookCategory,
    pub total_copies: i32,
    pub available_copies: i32,
    pub added_date: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct WishlistItemDetails {
    pub id: i32,
    pub book_id: i32,
    pub book_title: String,
    pub book_author: String,
    pub book_status: BookStatus,
    pub book_category: BookCategory,
    pub added_date: DateTime<Utc>,
}

impl From<WishlistItemRow> for WishlistItemDetails {
    fn from(row: WishlistItemRow) -> Self {
        Self {
            id: row.id,
            book_id: row.book_id,
            book_title: row.book_title,
            book_author: row.book_author,
            book_status: BookStatus::from_copies(row.available_copies, row.total_copies),
            book_category: row.book_category,
            added_date: row.added_date,
        }
    }
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct AddWishlistItem {
    pub book_id: i32,
}
