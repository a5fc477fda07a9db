//! OpenAPI documentation

use axum::Router;
use utoipa::{
    openapi::security::{ApiKey, ApiKeyValue, HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{auth, books, health, reader, users, MessageResponse};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Library Management API",
        version = "1.0.0",
        description = "Catalog, borrowing and wishlist REST API"
    ),
    servers(
        (url = "/api/v1", description = "API v1")
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Auth
        auth::me,
        // Books
        books::list_books,
        books::get_book,
        books::create_book,
        books::update_book,
        books::delete_book,
        // Reader
        reader::borrow_book,
        reader::return_book,
        reader::my_books,
        reader::get_wishlist,
        reader::add_to_wishlist,
        reader::remove_from_wishlist,
        // Users
        users::list_users,
        users::get_user,
        users::create_user,
        users::update_user,
        users::delete_user,
    ),
    components(
        schemas(
            // Books
            crate::models::book::BookCategory,
            crate::models::book::BookStatus,
            crate::models::book::BookDetails,
            crate::models::book::CreateBook,
            crate::models::book::UpdateBook,
            // Borrowings
            crate::models::borrowing::BorrowingStatus,
            crate::models::borrowing::BorrowingDetails,
            crate::models::borrowing::BorrowRequest,
            crate::models::borrowing::ReturnRequest,
            // Wishlist
            crate::models::wishlist::WishlistItemDetails,
            crate::models::wishlist::AddWishlistItem,
            // Users
            crate::models::user::Role,
            crate::models::user::Caller,
            crate::models::user::UserDetails,
            crate::models::user::CreateUser,
            crate::models::user::UpdateUser,
            // Common
            MessageResponse,
            health::HealthResponse,
            crate::error::ErrorResponse,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "auth", description = "Caller identity"),
        (name = "books", description = "Catalog management"),
        (name = "reader", description = "Borrowing and returning"),
        (name = "wishlist", description = "Reader wishlist"),
        (name = "users", description = "User management")
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "cookie_auth",
                SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::new("access_token"))),
            );
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
