//! Wishlist service

use crate::{
    error::{AppError, AppResult},
    models::wishlist::WishlistItemDetails,
    repository::Repository,
};

#[derive(Clone)]
pub struct WishlistService {
    repository: Repository,
}

impl WishlistService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Add a book to the user's wishlist
    pub async fn add(&self, user_id: i32, book_id: i32) -> AppResult<WishlistItemDetails> {
        // Verify book exists
        self.repository.books.get_by_id(book_id).await?;

        if self.repository.wishlist.exists(user_id, book_id).await? {
            return Err(AppError::Conflict(
                "Book is already in your wishlist".to_string(),
            ));
        }

        let item = self.repository.wishlist.add(user_id, book_id).await?;
        tracing::debug!("Book {} added to wishlist of user {}", book_id, user_id);

        self.repository.wishlist.get_details(user_id, item.id).await
    }

    /// Remove an entry from the user's wishlist
    pub async fn remove(&self, user_id: i32, item_id: i32) -> AppResult<()> {
        self.repository.wishlist.remove(user_id, item_id).await
    }

    /// The user's wishlist
    pub async fn list(&self, user_id: i32) -> AppResult<Vec<WishlistItemDetails>> {
        self.repository.wishlist.list(user_id).await
    }
}
