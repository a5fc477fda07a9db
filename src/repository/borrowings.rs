//! Borrowing ledger repository.
//!
//! This is the only code that moves `books.available_copies` at runtime. Borrow
//! and return each run in a single transaction; borrow holds the book row lock
//! from the availability check until the decrement commits.

use chrono::{DateTime, Utc};
use sqlx::{Pool, Postgres};

use crate::{
    error::{unique_violation, AppError, AppResult},
    models::{
        book::Book,
        borrowing::{Borrowing, BorrowingDetails, BorrowingStatus, BorrowingWithBookRow},
    },
};

const ALREADY_BORROWED: &str = "You have already borrowed this book";
const NOT_AVAILABLE: &str = "Book is not available for borrowing";

#[derive(Clone)]
pub struct BorrowingsRepository {
    pool: Pool<Postgres>,
}

impl BorrowingsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Borrow a copy of a book for a user
    pub async fn borrow(
        &self,
        book_id: i32,
        user_id: i32,
        due_date: DateTime<Utc>,
    ) -> AppResult<BorrowingDetails> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        // Serializes concurrent borrows of the same book
        let book = sqlx::query_as::<_, Book>("SELECT * FROM books WHERE id = $1 FOR UPDATE")
            .bind(book_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", book_id)))?;

        if book.available_copies <= 0 {
            return Err(AppError::Conflict(NOT_AVAILABLE.to_string()));
        }

        let already_borrowed: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM borrowings
                WHERE book_id = $1 AND user_id = $2 AND status = $3
            )
            "#,
        )
        .bind(book_id)
        .bind(user_id)
        .bind(BorrowingStatus::Active)
        .fetch_one(&mut *tx)
        .await?;

        if already_borrowed {
            return Err(AppError::Conflict(ALREADY_BORROWED.to_string()));
        }

        let borrowing = sqlx::query_as::<_, Borrowing>(
            r#"
            INSERT INTO borrowings (book_id, user_id, borrowed_date, due_date, status)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(book_id)
        .bind(user_id)
        .bind(now)
        .bind(due_date)
        .bind(BorrowingStatus::Active)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| match unique_violation(&e) {
            Some(_) => AppError::Conflict(ALREADY_BORROWED.to_string()),
            None => AppError::Database(e),
        })?;

        let decremented = sqlx::query(
            r#"
            UPDATE books
            SET available_copies = available_copies - 1, updated_at = NOW()
            WHERE id = $1 AND available_copies > 0
            "#,
        )
        .bind(book_id)
        .execute(&mut *tx)
        .await?;

        if decremented.rows_affected() == 0 {
            return Err(AppError::Conflict(NOT_AVAILABLE.to_string()));
        }

        tx.commit().await?;

        Ok(BorrowingDetails::from_row(
            BorrowingWithBookRow {
                id: borrowing.id,
                book_id: book.id,
                book_title: book.title,
                book_author: book.author,
                cover_image: book.cover_image,
                borrowed_date: borrowing.borrowed_date,
                due_date: borrowing.due_date,
                returned_date: borrowing.returned_date,
                status: borrowing.status,
            },
            now,
        ))
    }

    /// Close an active borrowing owned by `user_id` and put the copy back
    pub async fn return_borrowing(&self, borrowing_id: i32, user_id: i32) -> AppResult<Borrowing> {
        let mut tx = self.pool.begin().await?;

        let borrowing = sqlx::query_as::<_, Borrowing>(
            r#"
            UPDATE borrowings
            SET status = $1, returned_date = NOW()
            WHERE id = $2 AND user_id = $3 AND status = $4
            RETURNING *
            "#,
        )
        .bind(BorrowingStatus::Returned)
        .bind(borrowing_id)
        .bind(user_id)
        .bind(BorrowingStatus::Active)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| {
            AppError::NotFound(format!("No active borrowing with id {} found", borrowing_id))
        })?;

        let incremented = sqlx::query(
            r#"
            UPDATE books
            SET available_copies = available_copies + 1, updated_at = NOW()
            WHERE id = $1 AND available_copies < total_copies
            "#,
        )
        .bind(borrowing.book_id)
        .execute(&mut *tx)
        .await?;

        if incremented.rows_affected() == 0 {
            // total_copies was lowered while the copy was out
            tracing::warn!(
                "Book {} already at total_copies, return of borrowing {} not counted",
                borrowing.book_id,
                borrowing.id
            );
        }

        tx.commit().await?;
        Ok(borrowing)
    }

    /// A user's borrowings with book summary, newest first
    pub async fn list_for_user(
        &self,
        user_id: i32,
        status: Option<BorrowingStatus>,
    ) -> AppResult<Vec<BorrowingDetails>> {
        let filter = match status {
            None => "",
            Some(BorrowingStatus::Overdue) => {
                "AND (b.status = $2 OR (b.status = $3 AND b.due_date < NOW()))"
            }
            Some(_) => "AND b.status = $2",
        };

        let sql = format!(
            r#"
            SELECT b.id, b.book_id, bk.title AS book_title, bk.author AS book_author,
                   bk.cover_image, b.borrowed_date, b.due_date, b.returned_date, b.status
            FROM borrowings b
            JOIN books bk ON bk.id = b.book_id
            WHERE b.user_id = $1 {}
            ORDER BY b.borrowed_date DESC, b.id DESC
            "#,
            filter
        );

        let mut query = sqlx::query_as::<_, BorrowingWithBookRow>(&sql).bind(user_id);
        if let Some(status) = status {
            query = query.bind(status);
            if status == BorrowingStatus::Overdue {
                query = query.bind(BorrowingStatus::Active);
            }
        }

        let rows = query.fetch_all(&self.pool).await?;
        let now = Utc::now();

        Ok(rows
            .into_iter()
            .map(|row| BorrowingDetails::from_row(row, now))
            .collect())
    }
}
