//! Data models for the library server

/// Stores a string-backed enum in a TEXT/VARCHAR column.
///
/// The type must provide `as_str()` and `FromStr<Err = String>`.
macro_rules! impl_text_column {
    ($ty:ty) => {
        impl sqlx::Type<sqlx::Postgres> for $ty {
            fn type_info() -> sqlx::postgres::PgTypeInfo {
                <String as sqlx::Type<sqlx::Postgres>>::type_info()
            }

            fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
                <String as sqlx::Type<sqlx::Postgres>>::compatible(ty)
            }
        }

        impl<'r> sqlx::Decode<'r, sqlx::Postgres> for $ty {
            fn decode(
                value: sqlx::postgres::PgValueRef<'r>,
            ) -> Result<Self, sqlx::error::BoxDynError> {
                let s: String = sqlx::Decode::<sqlx::Postgres>::decode(value)?;
                s.parse().map_err(|e: String| e.into())
            }
        }

        impl sqlx::Encode<'_, sqlx::Postgres> for $ty {
            fn encode_by_ref(
                &self,
                buf: &mut sqlx::postgres::PgArgumentBuffer,
            ) -> sqlx::encode::IsNull {
                <&str as sqlx::Encode<sqlx::Postgres>>::encode(self.as_str(), buf)
            }
        }

        impl std::fmt::Display for $ty {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

pub(crate) use impl_text_column;

pub mod book;
pub mod borrowing;
pub mod user;
pub mod wishlist;

// Re-export commonly used types
pub use book::{Book, BookCategory, BookDetails, BookStatus};
pub use borrowing::{Borrowing, BorrowingDetails, BorrowingStatus};
pub use user::{Caller, Permission, Role, User, UserClaims, UserDetails};
pub use wishlist::{WishlistItem, WishlistItemDetails};
