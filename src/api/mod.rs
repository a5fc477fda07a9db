//! API handlers for the library REST endpoints

pub mod auth;
pub mod books;
pub mod health;
pub mod openapi;
pub mod reader;
pub mod users;

use axum::{
    async_trait,
    extract::{FromRequest, FromRequestParts},
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        request::Parts,
        HeaderMap, HeaderValue, Method,
    },
    routing::{delete, get, post},
    Router,
};
use axum_extra::extract::cookie::CookieJar;
use serde::Serialize;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use utoipa::ToSchema;

use crate::{error::AppError, models::user::Caller, AppState};

/// Extractor for the authenticated caller.
///
/// The token is read from the access-token cookie, falling back to an
/// `Authorization: Bearer` header.
pub struct AuthenticatedUser(pub Caller);

#[async_trait]
impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let identity = &state.services.identity;

        let token = extract_token(&parts.headers, identity.cookie_name())
            .ok_or_else(|| AppError::Authentication("Authentication required".to_string()))?;

        let caller = identity.authenticate(&token).await?;
        Ok(AuthenticatedUser(caller))
    }
}

/// JSON request body whose rejections render as `BadValue` errors
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct AppJson<T>(pub T);

/// Acknowledgement body for operations without a resource to return
#[derive(Serialize, ToSchema)]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
}

impl MessageResponse {
    pub fn ok(message: &str) -> Self {
        Self {
            success: true,
            message: message.to_string(),
        }
    }
}

/// Pull the raw token out of the request headers
pub fn extract_token(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    let jar = CookieJar::from_headers(headers);
    if let Some(cookie) = jar.get(cookie_name) {
        let value = cookie.value().trim();
        if !value.is_empty() {
            return Some(value.to_string());
        }
    }

    headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    if allowed_origins.is_empty() {
        return CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
    }

    // Cookie auth from a browser needs credentials, which rule out wildcards
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| HeaderValue::from_str(origin).ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .allow_credentials(true)
}

/// Create the application router with all routes
pub fn router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.server.cors_allowed_origins);

    let api_v1 = Router::new()
        // Health check
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        // Identity
        .route("/auth/me", get(auth::me))
        // Catalog
        .route("/books", get(books::list_books).post(books::create_book))
        .route(
            "/books/:id",
            get(books::get_book)
                .put(books::update_book)
                .delete(books::delete_book),
        )
        // Borrowing ledger
        .route("/reader/borrow", post(reader::borrow_book))
        .route("/reader/return", post(reader::return_book))
        .route("/reader/my-books", get(reader::my_books))
        // Wishlist
        .route("/reader/wishlist", get(reader::get_wishlist))
        .route("/reader/wishlist/add", post(reader::add_to_wishlist))
        .route("/reader/wishlist/:id", delete(reader::remove_from_wishlist))
        // Users
        .route("/users", get(users::list_users).post(users::create_user))
        .route(
            "/users/:id",
            get(users::get_user)
                .put(users::update_user)
                .delete(users::delete_user),
        )
        .with_state(state);

    Router::new()
        .nest("/api/v1", api_v1)
        .merge(openapi::create_openapi_router())
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(cors)
}
