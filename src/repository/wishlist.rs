//! Wishlist repository

use sqlx::{Pool, Postgres};

use crate::{
    error::{unique_violation, AppError, AppResult},
    models::wishlist::{WishlistItem, WishlistItemDetails, WishlistItemRow},
};

const ALREADY_WISHLISTED: &str = "Book is already in your wishlist";

const SELECT_DETAILS: &str = r#"
    SELECT w.id, w.book_id, b.title AS book_title, b.author AS book_author,
           b.category AS book_category, b.total_copies, b.available_copies, w.added_date
    FROM wishlist_items w
    JOIN books b ON b.id = w.book_id
"#;

#[derive(Clone)]
pub struct WishlistRepository {
    pool: Pool<Postgres>,
}

impl WishlistRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    pub async fn exists(&self, user_id: i32, book_id: i32) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM wishlist_items WHERE user_id = $1 AND book_id = $2)",
        )
        .bind(user_id)
        .bind(book_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    /// Add a book to a user's wishlist
    pub async fn add(&self, user_id: i32, book_id: i32) -> AppResult<WishlistItem> {
        sqlx::query_as::<_, WishlistItem>(
            r#"
            INSERT INTO wishlist_items (book_id, user_id)
            VALUES ($1, $2)
            RETURNING *
            "#,
        )
        .bind(book_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match unique_violation(&e) {
            Some(_) => AppError::Conflict(ALREADY_WISHLISTED.to_string()),
            None => AppError::Database(e),
        })
    }

    /// Get one wishlist entry with its book, scoped to the owner
    pub async fn get_details(&self, user_id: i32, item_id: i32) -> AppResult<WishlistItemDetails> {
        let sql = format!("{} WHERE w.id = $1 AND w.user_id = $2", SELECT_DETAILS);
        sqlx::query_as::<_, WishlistItemRow>(&sql)
            .bind(item_id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?
            .map(WishlistItemDetails::from)
            .ok_or_else(|| AppError::NotFound(format!("Wishlist item {} not found", item_id)))
    }

    /// Remove an entry owned by `user_id`
    pub async fn remove(&self, user_id: i32, item_id: i32) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM wishlist_items WHERE id = $1 AND user_id = $2")
            .bind(item_id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Wishlist item {} not found", item_id)));
        }
        Ok(())
    }

    /// A user's wishlist, most recently added first
    pub async fn list(&self, user_id: i32) -> AppResult<Vec<WishlistItemDetails>> {
        let sql = format!(
            "{} WHERE w.user_id = $1 ORDER BY w.added_date DESC, w.id DESC",
            SELECT_DETAILS
        );
        let rows = sqlx::query_as::<_, WishlistItemRow>(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(WishlistItemDetails::from).collect())
    }
}
