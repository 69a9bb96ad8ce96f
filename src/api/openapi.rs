//! OpenAPI documentation

use axum::Router;
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{auth, books, health, reports, rents, students};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Book Rental API",
        version = "1.0.0",
        description = "Library book rental REST API"
    ),
    servers(
        (url = "/api/v1", description = "API v1")
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Auth
        auth::login,
        auth::logout,
        auth::me,
        // Books
        books::list_books,
        books::get_book,
        books::create_book,
        books::delete_book,
        // Students
        students::list_students,
        students::get_student,
        students::get_student_by_card,
        students::create_student,
        students::delete_student,
        // Rents
        rents::create_rent,
        rents::list_rents,
        rents::rented_books,
        rents::return_cart,
        // Reports
        reports::overdue_report,
        reports::rent_report,
    ),
    components(
        schemas(
            // Auth
            auth::LoginRequest,
            auth::LoginResponse,
            auth::LogoutResponse,
            crate::models::LibrarianInfo,
            // Books
            crate::models::book::Book,
            crate::models::book::CreateBook,
            crate::models::book::BooksResponse,
            // Students
            crate::models::student::Student,
            crate::models::student::CreateStudent,
            crate::models::student::StudentsResponse,
            // Rents
            crate::models::rental::CreateRentRequest,
            crate::models::rental::CreateRentResponse,
            crate::models::rental::ReturnBooksResponse,
            crate::models::rental::RentSummary,
            crate::models::rental::RentListResponse,
            // Reports
            crate::models::report::OverdueStudent,
            crate::models::report::OverdueResponse,
            crate::models::report::BookRentStats,
            crate::models::report::RentReport,
            crate::models::PaginationInfo,
            // Health
            health::HealthResponse,
            // Errors
            crate::error::ErrorResponse,
            crate::validation::FieldError,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "auth", description = "Authentication endpoints"),
        (name = "books", description = "Book catalog"),
        (name = "students", description = "Student roster"),
        (name = "rents", description = "Rental transactions"),
        (name = "reports", description = "Rental reports")
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Bearer).build()),
            );
        }
    }
}

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
