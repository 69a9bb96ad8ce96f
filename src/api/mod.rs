//! API handlers for the book rental REST endpoints

pub mod auth;
pub mod books;
pub mod health;
pub mod openapi;
pub mod reports;
pub mod rents;
pub mod students;

use axum::{
    async_trait,
    extract::{FromRequest, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
};
use axum_extra::extract::CookieJar;

use crate::{error::AppError, models::LibrarianInfo, AppState};

/// JSON body; malformed input is rejected as `InvalidRequest`
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

/// Path parameters; malformed input is rejected as `InvalidRequest`
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(AppError))]
pub struct ApiPath<T>(pub T);

/// Query string; malformed input is rejected as `InvalidRequest`
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct ApiQuery<T>(pub T);

/// Name of the session cookie set at login
pub const SESSION_COOKIE: &str = "session_id";

/// Bearer token from the Authorization header, else the session cookie
pub fn session_token(headers: &HeaderMap) -> Option<String> {
    let bearer = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty());

    if let Some(token) = bearer {
        return Some(token.to_string());
    }

    CookieJar::from_headers(headers)
        .get(SESSION_COOKIE)
        .map(|cookie| cookie.value().to_string())
        .filter(|token| !token.is_empty())
}

/// Extractor for the librarian owning the request's session
pub struct AuthenticatedLibrarian(pub LibrarianInfo);

#[async_trait]
impl FromRequestParts<AppState> for AuthenticatedLibrarian {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = session_token(&parts.headers)
            .ok_or_else(|| AppError::Authentication("Missing session".to_string()))?;

        let librarian = state.services.auth.validate_session(&token).await?;
        Ok(AuthenticatedLibrarian(LibrarianInfo::from(&librarian)))
    }
}
