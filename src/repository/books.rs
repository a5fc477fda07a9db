//! Books repository for database operations

use sqlx::{Pool, Postgres};

use super::contains_pattern;
use crate::{
    error::{unique_violation, AppError, AppResult},
    models::book::{Book, BookCategory, CreateBook, UpdateBook},
};

const DUPLICATE_ISBN: &str = "A book with this ISBN already exists";

/// Translates a write error, turning the ISBN unique violation into a validation error
fn map_write_error(err: sqlx::Error) -> AppError {
    match unique_violation(&err) {
        Some(_) => AppError::Validation(DUPLICATE_ISBN.to_string()),
        None => AppError::Database(err),
    }
}

#[derive(Clone)]
pub struct BooksRepository {
    pool: Pool<Postgres>,
}

impl BooksRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// List books, optionally filtered by category and a title/author/ISBN substring
    pub async fn list(
        &self,
        category: Option<BookCategory>,
        search: Option<&str>,
    ) -> AppResult<Vec<Book>> {
        let mut conditions = Vec::new();
        let mut idx = 1;

        if category.is_some() {
            conditions.push(format!("category = ${}", idx));
            idx += 1;
        }
        if search.is_some() {
            conditions.push(format!(
                "(title ILIKE ${0} OR author ILIKE ${0} OR isbn ILIKE ${0})",
                idx
            ));
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        let sql = format!("SELECT * FROM books {} ORDER BY id", where_clause);
        let mut query = sqlx::query_as::<_, Book>(&sql);
        if let Some(category) = category {
            query = query.bind(category);
        }
        if let Some(search) = search {
            query = query.bind(contains_pattern(search));
        }

        Ok(query.fetch_all(&self.pool).await?)
    }

    /// Get book by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<Book> {
        sqlx::query_as::<_, Book>("SELECT * FROM books WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", id)))
    }

    /// Check whether an ISBN is taken, optionally ignoring one book
    pub async fn isbn_exists(&self, isbn: &str, exclude_id: Option<i32>) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM books WHERE isbn = $1 AND ($2::INT IS NULL OR id <> $2))",
        )
        .bind(isbn)
        .bind(exclude_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    /// Insert a new book with resolved copy counters
    pub async fn create(
        &self,
        book: &CreateBook,
        total_copies: i32,
        available_copies: i32,
    ) -> AppResult<Book> {
        sqlx::query_as::<_, Book>(
            r#"
            INSERT INTO books (title, author, description, isbn, total_copies,
                               available_copies, category, cover_image)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(&book.title)
        .bind(&book.author)
        .bind(&book.description)
        .bind(&book.isbn)
        .bind(total_copies)
        .bind(available_copies)
        .bind(book.category.unwrap_or_default())
        .bind(&book.cover_image)
        .fetch_one(&self.pool)
        .await
        .map_err(map_write_error)
    }

    /// Apply a partial update under a row lock so it cannot interleave with a borrow or return
    pub async fn update(&self, id: i32, patch: &UpdateBook) -> AppResult<Book> {
        let mut tx = self.pool.begin().await?;

        let mut book = sqlx::query_as::<_, Book>("SELECT * FROM books WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", id)))?;

        patch.apply_to(&mut book)?;

        let updated = sqlx::query_as::<_, Book>(
            r#"
            UPDATE books
            SET title = $1, author = $2, description = $3, isbn = $4,
                total_copies = $5, available_copies = $6, category = $7,
                cover_image = $8, updated_at = NOW()
            WHERE id = $9
            RETURNING *
            "#,
        )
        .bind(&book.title)
        .bind(&book.author)
        .bind(&book.description)
        .bind(&book.isbn)
        .bind(book.total_copies)
        .bind(book.available_copies)
        .bind(book.category)
        .bind(&book.cover_image)
        .bind(id)
        .fetch_one(&mut *tx)
        .await
        .map_err(map_write_error)?;

        tx.commit().await?;
        Ok(updated)
    }

    /// Delete a book; borrowings and wishlist entries go with it (ON DELETE CASCADE)
    pub async fn delete(&self, id: i32) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM books WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Book with id {} not found", id)));
        }
        Ok(())
    }
}
