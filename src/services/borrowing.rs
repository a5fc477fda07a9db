//! Borrowing ledger service

use chrono::{DateTime, Duration, Utc};

use crate::{
    config::BorrowingConfig,
    error::{AppError, AppResult},
    models::borrowing::{Borrowing, BorrowingDetails, BorrowingQuery, BorrowRequest},
    repository::Repository,
};

/// Due date for a borrow starting at `now`; requested dates must lie in the future
pub fn resolve_due_date(
    requested: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
    default_loan_days: i64,
) -> AppResult<DateTime<Utc>> {
    match requested {
        Some(due) if due <= now => Err(AppError::Validation(
            "Due date must be in the future".to_string(),
        )),
        Some(due) => Ok(due),
        None => Ok(now + Duration::days(default_loan_days)),
    }
}

#[derive(Clone)]
pub struct BorrowingService {
    repository: Repository,
    config: BorrowingConfig,
}

impl BorrowingService {
    pub fn new(repository: Repository, config: BorrowingConfig) -> Self {
        Self { repository, config }
    }

    /// Borrow a book for `user_id`
    pub async fn borrow(
        &self,
        user_id: i32,
        request: BorrowRequest,
    ) -> AppResult<BorrowingDetails> {
        let due_date =
            resolve_due_date(request.due_date, Utc::now(), self.config.default_loan_days)?;

        match self
            .repository
            .borrowings
            .borrow(request.book_id, user_id, due_date)
            .await
        {
            Ok(borrowing) => {
                tracing::info!(
                    "Book {} borrowed by user {} (borrowing {}, due {})",
                    request.book_id,
                    user_id,
                    borrowing.id,
                    borrowing.due_date
                );
                Ok(borrowing)
            }
            Err(e) => {
                tracing::debug!(
                    "Borrow of book {} by user {} rejected: {}",
                    request.book_id,
                    user_id,
                    e
                );
                Err(e)
            }
        }
    }

    /// Return a borrowing owned by `user_id`
    pub async fn return_book(&self, user_id: i32, borrowing_id: i32) -> AppResult<Borrowing> {
        let borrowing = self
            .repository
            .borrowings
            .return_borrowing(borrowing_id, user_id)
            .await?;

        tracing::info!(
            "Book {} returned by user {} (borrowing {})",
            borrowing.book_id,
            user_id,
            borrowing.id
        );
        Ok(borrowing)
    }

    /// The caller's own borrowings
    pub async fn list_mine(
        &self,
        user_id: i32,
        query: &BorrowingQuery,
    ) -> AppResult<Vec<BorrowingDetails>> {
        let status = query.status_filter()?;
        self.repository.borrowings.list_for_user(user_id, status).await
    }
}
