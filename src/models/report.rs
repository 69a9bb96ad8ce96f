//! Overdue and aggregate rental reports

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use super::pagination::{PageParams, PaginationInfo};

/// A student holding at least one cart past the rental period
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct OverdueStudent {
    /// Earliest open cart of the student
    pub cart_id: Uuid,
    pub student_name: String,
    pub student_card_id: String,
    pub phone: String,
    /// Rented copies across every open cart of the student
    pub total_books: i64,
    pub date_rented: DateTime<Utc>,
    pub days_overdue: i64,
}

/// Per-student aggregate over open carts, as read from storage
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct OverdueRow {
    pub cart_id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub card_id: String,
    pub phone: String,
    pub total_books: i64,
    pub date_rented: DateTime<Utc>,
    pub elapsed_days: i64,
}

impl OverdueRow {
    /// `None` when the student is still within the rental period
    pub fn into_overdue(self, period_days: i64) -> Option<OverdueStudent> {
        let days_overdue = days_past_deadline(self.elapsed_days, period_days)?;
        Some(OverdueStudent {
            cart_id: self.cart_id,
            student_name: format!("{} {}", self.first_name, self.last_name),
            student_card_id: self.card_id,
            phone: self.phone,
            total_books: self.total_books,
            date_rented: self.date_rented,
            days_overdue,
        })
    }
}

/// Whole days elapsed between two instants, never negative
pub fn elapsed_days(from: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    (now - from).num_days().max(0)
}

/// Days past the end of the rental period, if the period has been exceeded
pub fn days_past_deadline(elapsed_days: i64, period_days: i64) -> Option<i64> {
    if elapsed_days > period_days {
        Some(elapsed_days - period_days)
    } else {
        None
    }
}

/// Storage-side selection of overdue students
#[derive(Debug, Clone, PartialEq)]
pub struct OverdueCriteria {
    pub card_id: Option<String>,
    pub period_days: i64,
    pub now: DateTime<Utc>,
    pub page: PageParams,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct BookRentStats {
    pub book_title: String,
    pub rented_count: i64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, FromRow)]
pub struct RentTotals {
    pub total_rents: i64,
    pub total_students: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RentReport {
    /// Rent line items ever recorded
    pub total_rents: i64,
    /// Distinct students who ever opened a cart
    pub total_students: i64,
    pub top_books: Vec<BookRentStats>,
    pub top_overdue: Vec<OverdueStudent>,
}

/// Overdue report query parameters
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct OverdueQuery {
    pub student_card_id: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Aggregate report query parameters
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct ReportQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OverdueResponse {
    pub results: Vec<OverdueStudent>,
    pub pagination: PaginationInfo,
}
