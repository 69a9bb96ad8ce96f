//! Rental transaction endpoints

use axum::{
    extract::State,
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::rental::{
        CreateRentRequest, CreateRentResponse, RentListQuery, RentListResponse, RentedBooksQuery,
        ReturnBooksResponse,
    },
    AppState,
};

use super::{ApiJson, ApiPath, ApiQuery, AuthenticatedLibrarian};

/// Rent one or more books to a student
#[utoipa::path(
    post,
    path = "/rents",
    tag = "rents",
    security(("bearer_auth" = [])),
    request_body = CreateRentRequest,
    responses(
        (status = 201, description = "Cart created", body = CreateRentResponse),
        (status = 400, description = "Empty request or too many distinct books", body = crate::error::ErrorResponse),
        (status = 404, description = "Student or book not found", body = crate::error::ErrorResponse),
        (status = 409, description = "Not enough copies available", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_rent(
    State(state): State<AppState>,
    AuthenticatedLibrarian(librarian): AuthenticatedLibrarian,
    ApiJson(request): ApiJson<CreateRentRequest>,
) -> AppResult<(StatusCode, Json<CreateRentResponse>)> {
    tracing::debug!("Librarian {} renting {} copies", librarian.username, request.book_ids.len());
    let response = state.services.rentals.create_rent(request).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// List currently rented copies
#[utoipa::path(
    get,
    path = "/rents",
    tag = "rents",
    security(("bearer_auth" = [])),
    params(RentListQuery),
    responses(
        (status = 200, description = "Rented copies, newest cart first", body = RentListResponse)
    )
)]
pub async fn list_rents(
    State(state): State<AppState>,
    _librarian: AuthenticatedLibrarian,
    ApiQuery(query): ApiQuery<RentListQuery>,
) -> AppResult<Json<RentListResponse>> {
    let rents = state.services.reports.list_rents(&query).await?;
    Ok(Json(rents))
}

/// Copies currently rented, optionally by one student
#[utoipa::path(
    get,
    path = "/rents/student",
    tag = "rents",
    security(("bearer_auth" = [])),
    params(RentedBooksQuery),
    responses(
        (status = 200, description = "Rented copies", body = RentListResponse)
    )
)]
pub async fn rented_books(
    State(state): State<AppState>,
    _librarian: AuthenticatedLibrarian,
    ApiQuery(query): ApiQuery<RentedBooksQuery>,
) -> AppResult<Json<RentListResponse>> {
    let (results, pagination) = state
        .services
        .reports
        .rented_books(query.student_card_id.as_deref())
        .await?;
    Ok(Json(RentListResponse {
        results,
        pagination,
    }))
}

/// Return every book of a cart
#[utoipa::path(
    post,
    path = "/carts/{id}/return",
    tag = "rents",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Cart ID")),
    responses(
        (status = 200, description = "Cart returned", body = ReturnBooksResponse),
        (status = 404, description = "Cart not found", body = crate::error::ErrorResponse),
        (status = 409, description = "Cart already returned", body = crate::error::ErrorResponse)
    )
)]
pub async fn return_cart(
    State(state): State<AppState>,
    _librarian: AuthenticatedLibrarian,
    ApiPath(cart_id): ApiPath<Uuid>,
) -> AppResult<Json<ReturnBooksResponse>> {
    let response = state.services.rentals.return_books(cart_id).await?;
    Ok(Json(response))
}
