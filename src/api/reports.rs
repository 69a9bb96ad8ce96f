//! Report endpoints

use axum::{
    extract::State,
    Json,
};

use crate::{
    error::AppResult,
    models::report::{OverdueQuery, OverdueResponse, RentReport, ReportQuery},
    AppState,
};

use super::{ApiQuery, AuthenticatedLibrarian};

/// Students past the rental period
#[utoipa::path(
    get,
    path = "/reports/overdue",
    tag = "reports",
    security(("bearer_auth" = [])),
    params(OverdueQuery),
    responses(
        (status = 200, description = "Overdue students, most overdue first", body = OverdueResponse)
    )
)]
pub async fn overdue_report(
    State(state): State<AppState>,
    _librarian: AuthenticatedLibrarian,
    ApiQuery(query): ApiQuery<OverdueQuery>,
) -> AppResult<Json<OverdueResponse>> {
    let report = state
        .services
        .reports
        .overdue_report(query.student_card_id.as_deref(), query.limit, query.offset)
        .await?;
    Ok(Json(report))
}

/// Rental totals, most rented books and most overdue students
#[utoipa::path(
    get,
    path = "/reports",
    tag = "reports",
    security(("bearer_auth" = [])),
    params(ReportQuery),
    responses(
        (status = 200, description = "Aggregate rental report", body = RentReport)
    )
)]
pub async fn rent_report(
    State(state): State<AppState>,
    _librarian: AuthenticatedLibrarian,
    ApiQuery(query): ApiQuery<ReportQuery>,
) -> AppResult<Json<RentReport>> {
    let report = state.services.reports.rent_report(query.limit, query.offset).await?;
    Ok(Json(report))
}
