//! Borrowing (loan ledger) model and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};

use super::impl_text_column;
use crate::error::{AppError, AppResult};

/// Stored borrowing status.
///
/// `Overdue` is accepted by the schema but no write path stores it; lateness
/// is derived at read time through [`is_overdue`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum BorrowingStatus {
    Active,
    Returned,
    Overdue,
}

impl BorrowingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BorrowingStatus::Active => "active",
            BorrowingStatus::Returned => "returned",
            BorrowingStatus::Overdue => "overdue",
        }
    }
}

impl std::str::FromStr for BorrowingStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "active" => Ok(BorrowingStatus::Active),
            "returned" => Ok(BorrowingStatus::Returned),
            "overdue" => Ok(BorrowingStatus::Overdue),
            _ => Err(format!("Invalid borrowing status: {}", s)),
        }
    }
}

impl_text_column!(BorrowingStatus);

/// A borrowing is overdue when stored as such or still active past its due date
pub fn is_overdue(due_date: DateTime<Utc>, status: BorrowingStatus, now: DateTime<Utc>) -> bool {
    match status {
        BorrowingStatus::Overdue => true,
        BorrowingStatus::Active => due_date < now,
        BorrowingStatus::Returned => false,
    }
}

/// Borrowing row from database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Borrowing {
    pub id: i32,
    pub book_id: i32,
    pub user_id: i32,
    pub borrowed_date: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
    pub returned_date: Option<DateTime<Utc>>,
    pub status: BorrowingStatus,
}

/// Borrowing joined with the book it refers to
#[derive(Debug, Clone, FromRow)]
pub struct BorrowingWithBookRow {
    pub id: i32,
    pub book_id: i32,
    pub book_title: String,
    pub book_author: String,
    pub cover_image: Option<String>,
    pub borrowed_date: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
    pub returned_date: Option<DateTime<Utc>>,
    pub status: BorrowingStatus,
}

/// Borrowing as returned by the API
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BorrowingDetails {
    pub id: i32,
    pub book_id: i32,
    pub book_title: String,
    pub book_author: Option<String>,
    pub cover_image: Option<String>,
    pub borrowed_date: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
    pub returned_date: Option<DateTime<Utc>>,
    pub status: BorrowingStatus,
    /// Still active past the due date
    pub is_overdue: bool,
}

impl BorrowingDetails {
    pub fn from_row(row: BorrowingWithBookRow, now: DateTime<Utc>) -> Self {
        Self {
            id: row.id,
            book_id: row.book_id,
            book_title: row.book_title,
            book_author: Some(row.book_author),
            cover_image: row.cover_image,
            borrowed_date: row.borrowed_date,
            due_date: row.due_date,
            returned_date: row.returned_date,
            is_overdue: is_overdue(row.due_date, row.status, now),
            status: row.status,
        }
    }
}

/// Borrow request
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct BorrowRequest {
    pub book_id: i32,
    /// Defaults to the configured loan length from now
    pub due_date: Option<DateTime<Utc>>,
}

/// Return request
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ReturnRequest {
    pub borrowing_id: i32,
}

/// Filter for a reader's own borrowings
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct BorrowingQuery {
    /// active, returned or overdue
    pub status: Option<String>,
}

impl BorrowingQuery {
    pub fn status_filter(&self) -> AppResult<Option<BorrowingStatus>> {
        match self.status.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(s) => s.parse().map(Some).map_err(AppError::Validation),
        }
    }
}
