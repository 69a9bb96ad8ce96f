//! Authentication endpoints

use axum::{extract::State, http::HeaderMap, Json};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    error::AppResult,
    models::LibrarianInfo,
    validation::{check, not_blank},
    AppState,
};

use super::{session_token, ApiJson, AuthenticatedLibrarian, SESSION_COOKIE};

/// Login request
#[derive(Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    /// Username
    #[validate(custom(function = "not_blank"))]
    pub user: String,
    /// Password
    #[validate(custom(function = "not_blank"))]
    pub pass: String,
}

/// Login response
#[derive(Serialize, ToSchema)]
pub struct LoginResponse {
    pub message: String,
    pub librarian_id: Uuid,
    /// Session token, also set as the `session_id` cookie
    pub token: String,
}

#[derive(Serialize, ToSchema)]
pub struct LogoutResponse {
    pub message: String,
}

/// Login with username and password
#[utoipa::path(
    post,
    path = "/auth/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 400, description = "Missing credentials", body = crate::error::ErrorResponse),
        (status = 401, description = "Invalid credentials", body = crate::error::ErrorResponse)
    )
)]
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    ApiJson(request): ApiJson<LoginRequest>,
) -> AppResult<(CookieJar, Json<LoginResponse>)> {
    check(&request)?;

    let (librarian, token) = state.services.auth.login(&request.user, &request.pass).await?;

    let cookie = Cookie::build((SESSION_COOKIE, token.clone()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax);

    Ok((
        jar.add(cookie),
        Json(LoginResponse {
            message: "Login successful".to_string(),
            librarian_id: librarian.id,
            token,
        }),
    ))
}

/// Close the current session
#[utoipa::path(
    post,
    path = "/auth/logout",
    tag = "auth",
    responses(
        (status = 200, description = "Logged out", body = LogoutResponse)
    )
)]
pub async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
    jar: CookieJar,
) -> AppResult<(CookieJar, Json<LogoutResponse>)> {
    if let Some(token) = session_token(&headers) {
        state.services.auth.logout(&token).await?;
    }

    Ok((
        jar.remove(Cookie::build(SESSION_COOKIE).path("/")),
        Json(LogoutResponse {
            message: "Logged out".to_string(),
        }),
    ))
}

/// Get current librarian
#[utoipa::path(
    get,
    path = "/auth/me",
    tag = "auth",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Current librarian", body = LibrarianInfo),
        (status = 401, description = "Not authenticated", body = crate::error::ErrorResponse)
    )
)]
pub async fn me(AuthenticatedLibrarian(librarian): AuthenticatedLibrarian) -> Json<LibrarianInfo> {
    Json(librarian)
}
