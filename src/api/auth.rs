//! Identity endpoints

use axum::Json;

use crate::{
    error::{AppResult, ErrorResponse},
    models::user::Caller,
};

use super::AuthenticatedUser;

/// Get the current caller as resolved from the access token
#[utoipa::path(
    get,
    path = "/auth/me",
    tag = "auth",
    security(("cookie_auth" = []), ("bearer_auth" = [])),
    responses(
        (status = 200, description = "Current user", body = Caller),
        (status = 401, description = "Not authenticated", body = ErrorResponse)
    )
)]
pub async fn me(AuthenticatedUser(caller): AuthenticatedUser) -> AppResult<Json<Caller>> {
    Ok(Json(caller))
}
