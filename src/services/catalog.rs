//! Catalog management service

use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::book::{Book, BookQuery, CreateBook, UpdateBook},
    repository::Repository,
};

#[derive(Clone)]
pub struct CatalogService {
    repository: Repository,
}

impl CatalogService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// List books matching the query filters
    pub async fn list_books(&self, query: &BookQuery) -> AppResult<Vec<Book>> {
        let category = query.category_filter()?;
        self.repository
            .books
            .list(category, query.search_text())
            .await
    }

    /// Get book by ID
    pub async fn get_book(&self, id: i32) -> AppResult<Book> {
        self.repository.books.get_by_id(id).await
    }

    /// Create a new book; ISBN must be unique
    pub async fn create_book(&self, book: CreateBook) -> AppResult<Book> {
        book.validate()?;
        let (total_copies, available_copies) = book.copies()?;

        if self.repository.books.isbn_exists(&book.isbn, None).await? {
            return Err(AppError::Validation(
                "A book with this ISBN already exists".to_string(),
            ));
        }

        let created = self
            .repository
            .books
            .create(&book, total_copies, available_copies)
            .await?;

        tracing::info!(
            "Book created: id={} isbn={} copies={}/{}",
            created.id,
            created.isbn,
            created.available_copies,
            created.total_copies
        );
        Ok(created)
    }

    /// Update an existing book with the provided fields
    pub async fn update_book(&self, id: i32, patch: UpdateBook) -> AppResult<Book> {
        patch.validate()?;

        if let Some(ref isbn) = patch.isbn {
            if self.repository.books.isbn_exists(isbn, Some(id)).await? {
                return Err(AppError::Validation(
                    "A book with this ISBN already exists".to_string(),
                ));
            }
        }

        let updated = self.repository.books.update(id, &patch).await?;
        tracing::info!("Book updated: id={}", id);
        Ok(updated)
    }

    /// Delete a book along with its borrowings and wishlist entries
    pub async fn delete_book(&self, id: i32) -> AppResult<()> {
        self.repository.books.delete(id).await?;
        tracing::info!("Book deleted: id={}", id);
        Ok(())
    }
}
