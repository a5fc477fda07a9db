//! Book (catalog) model and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::{Validate, ValidateUrl};

use super::impl_text_column;
use crate::error::{AppError, AppResult};

/// Book category
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum BookCategory {
    Fiction,
    NonFiction,
    Science,
    History,
    Biography,
    Fantasy,
    Mystery,
    Romance,
    Thriller,
    Poetry,
    #[default]
    Other,
}

impl BookCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookCategory::Fiction => "fiction",
            BookCategory::NonFiction => "non-fiction",
            BookCategory::Science => "science",
            BookCategory::History => "history",
            BookCategory::Biography => "biography",
            BookCategory::Fantasy => "fantasy",
            BookCategory::Mystery => "mystery",
            BookCategory::Romance => "romance",
            BookCategory::Thriller => "thriller",
            BookCategory::Poetry => "poetry",
            BookCategory::Other => "other",
        }
    }
}

impl std::str::FromStr for BookCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "fiction" => Ok(BookCategory::Fiction),
            "non-fiction" => Ok(BookCategory::NonFiction),
            "science" => Ok(BookCategory::Science),
            "history" => Ok(BookCategory::History),
            "biography" => Ok(BookCategory::Biography),
            "fantasy" => Ok(BookCategory::Fantasy),
            "mystery" => Ok(BookCategory::Mystery),
            "romance" => Ok(BookCategory::Romance),
            "thriller" => Ok(BookCategory::Thriller),
            "poetry" => Ok(BookCategory::Poetry),
            "other" => Ok(BookCategory::Other),
            _ => Err(format!("Invalid book category: {}", s)),
        }
    }
}

impl_text_column!(BookCategory);

/// Availability tier derived from the copy counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum BookStatus {
    Available,
    #[serde(rename = "Low Stock")]
    LowStock,
    Unavailable,
}

impl BookStatus {
    /// `LowStock` covers 0 < available <= 20% of total
    pub fn from_copies(available_copies: i32, total_copies: i32) -> Self {
        if available_copies <= 0 {
            BookStatus::Unavailable
        } else if i64::from(available_copies) * 5 <= i64::from(total_copies) {
            BookStatus::LowStock
        } else {
            BookStatus::Available
        }
    }
}

/// Book row from database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Book {
    pub id: i32,
    pub title: String,
    pub author: String,
    pub description: Option<String>,
    pub isbn: String,
    pub total_copies: i32,
    pub available_copies: i32,
    pub category: BookCategory,
    pub cover_image: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Book {
    pub fn status(&self) -> BookStatus {
        BookStatus::from_copies(self.available_copies, self.total_copies)
    }

    pub fn borrowed(&self) -> i32 {
        self.total_copies - self.available_copies
    }
}

/// Book as returned by the API, with derived fields
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BookDetails {
    pub id: i32,
    pub title: String,
    pub author: String,
    pub description: Option<String>,
    pub isbn: String,
    pub total_copies: i32,
    pub available_copies: i32,
    pub category: BookCategory,
    pub cover_image: Option<String>,
    /// Availability tier computed from the copy counters
    pub status: BookStatus,
    /// Copies currently out on loan
    pub borrowed: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Book> for BookDetails {
    fn from(book: Book) -> Self {
        let status = book.status();
        let borrowed = book.borrowed();
        Self {
            id: book.id,
            title: book.title,
            author: book.author,
            description: book.description,
            isbn: book.isbn,
            total_copies: book.total_copies,
            available_copies: book.available_copies,
            category: book.category,
            cover_image: book.cover_image,
            status,
            borrowed,
            created_at: book.created_at,
            updated_at: book.updated_at,
        }
    }
}

/// Checks 0 <= available <= total
pub fn check_copies(total_copies: i32, available_copies: i32) -> AppResult<()> {
    if total_copies < 0 {
        return Err(AppError::Validation(
            "total_copies must not be negative".to_string(),
        ));
    }
    if available_copies < 0 {
        return Err(AppError::Validation(
            "available_copies must not be negative".to_string(),
        ));
    }
    if available_copies > total_copies {
        return Err(AppError::Validation(format!(
            "available_copies ({}) cannot exceed total_copies ({})",
            available_copies, total_copies
        )));
    }
    Ok(())
}

/// Create book request
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateBook {
    #[validate(length(min = 1, max = 255, message = "Title is required"))]
    pub title: String,
    #[validate(length(min = 1, max = 255, message = "Author is required"))]
    pub author: String,
    #[validate(length(min = 1, max = 20, message = "ISBN must be 1-20 characters"))]
    pub isbn: String,
    pub description: Option<String>,
    /// Defaults to 1
    pub total_copies: Option<i32>,
    /// Defaults to total_copies
    pub available_copies: Option<i32>,
    /// Defaults to "other"
    pub category: Option<BookCategory>,
    #[validate(url(message = "Cover image must be a valid URL"))]
    pub cover_image: Option<String>,
}

impl CreateBook {
    /// Resolves the copy counters, applying defaults
    pub fn copies(&self) -> AppResult<(i32, i32)> {
        let total = self.total_copies.unwrap_or(1);
        let available = self.available_copies.unwrap_or(total);
        check_copies(total, available)?;
        Ok((total, available))
    }
}

/// Partial book update.
///
/// Absent or null fields are left unchanged, except `description` and
/// `cover_image` where an explicit null clears the stored value.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateBook {
    #[validate(length(min = 1, max = 255))]
    pub title: Option<String>,
    #[validate(length(min = 1, max = 255))]
    pub author: Option<String>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    #[schema(value_type = Option<String>)]
    pub description: Option<Option<String>>,
    #[validate(length(min = 1, max = 20))]
    pub isbn: Option<String>,
    pub total_copies: Option<i32>,
    pub available_copies: Option<i32>,
    pub category: Option<BookCategory>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    #[schema(value_type = Option<String>)]
    pub cover_image: Option<Option<String>>,
}

impl UpdateBook {
    /// Merges the provided fields into `book` and re-checks the copy invariant
    pub fn apply_to(&self, book: &mut Book) -> AppResult<()> {
        if let Some(Some(url)) = &self.cover_image {
            if !url.validate_url() {
                return Err(AppError::Validation(
                    "Cover image must be a valid URL".to_string(),
                ));
            }
        }

        if let Some(title) = &self.title {
            book.title = title.clone();
        }
        if let Some(author) = &self.author {
            book.author = author.clone();
        }
        if let Some(description) = &self.description {
            book.description = description.clone();
        }
        if let Some(isbn) = &self.isbn {
            book.isbn = isbn.clone();
        }
        if let Some(total) = self.total_copies {
            book.total_copies = total;
        }
        if let Some(available) = self.available_copies {
            book.available_copies = available;
        }
        if let Some(category) = self.category {
            book.category = category;
        }
        if let Some(cover_image) = &self.cover_image {
            book.cover_image = cover_image.clone();
        }

        check_copies(book.total_copies, book.available_copies)
    }
}

/// Catalog listing filters
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct BookQuery {
    /// Category slug, case-insensitive; "all" disables the filter
    pub category: Option<String>,
    /// Substring matched against title, author and ISBN
    pub search: Option<String>,
}

impl BookQuery {
    pub fn category_filter(&self) -> AppResult<Option<BookCategory>> {
        match self.category.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(c) if c.eq_ignore_ascii_case("all") => Ok(None),
            Some(c) => c.parse().map(Some).map_err(AppError::Validation),
        }
    }

    pub fn search_text(&self) -> Option<&str> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}
