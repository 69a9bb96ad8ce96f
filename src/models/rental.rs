//! Rental transaction requests, responses and listing filters

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use super::pagination::PaginationInfo;

/// Create rental transaction request
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateRentRequest {
    pub student_id: Uuid,
    /// One entry per copy; repeat an id to rent several copies of a title
    #[validate(length(min = 1, message = "must contain at least one book"))]
    pub book_ids: Vec<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreateRentResponse {
    pub cart_id: Uuid,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ReturnBooksResponse {
    pub message: String,
    pub cart_id: Uuid,
}

/// A rented copy joined with its book title and student name
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct RentSummary {
    pub rent_id: Uuid,
    pub cart_id: Uuid,
    pub book_title: String,
    pub student_name: String,
    pub rented_date: DateTime<Utc>,
}

/// Query parameters of the rent listing
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct RentListQuery {
    /// Case-insensitive fragment of the book title
    pub book_name: Option<String>,
    /// Student first name, last name, or "first last"
    pub student_name: Option<String>,
    /// Calendar day (UTC) the cart was opened, `YYYY-MM-DD`
    pub date: Option<NaiveDate>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct RentedBooksQuery {
    pub student_card_id: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RentListResponse {
    pub results: Vec<RentSummary>,
    pub pagination: PaginationInfo,
}

/// Lower-cases a search term and strips surrounding whitespace and double quotes.
/// Empty terms are dropped.
fn normalize_term(raw: &str) -> Option<String> {
    let term = raw.trim().trim_matches('"').trim().to_lowercase();
    if term.is_empty() {
        None
    } else {
        Some(term)
    }
}

/// Student name search.
///
/// A single token matches either the first or the last name. Several tokens
/// match the first token against the first name, the last token against the
/// last name, or the whole string against "first last".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameFilter {
    pub first_name: String,
    pub last_name: String,
    pub full_name: String,
}

impl NameFilter {
    pub fn parse(raw: &str) -> Option<Self> {
        let full_name = normalize_term(raw)?;
        let parts: Vec<&str> = full_name.split_whitespace().collect();
        let first_name = parts.first()?.to_string();
        let last_name = parts.last()?.to_string();

        Some(Self {
            first_name,
            last_name,
            full_name,
        })
    }

    pub fn matches(&self, first_name: &str, last_name: &str) -> bool {
        let first = first_name.to_lowercase();
        let last = last_name.to_lowercase();
        first.contains(&self.first_name)
            || last.contains(&self.last_name)
            || format!("{} {}", first, last).contains(&self.full_name)
    }
}

/// Parsed filters of the rent listing
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RentFilter {
    pub book_title: Option<String>,
    pub student_name: Option<NameFilter>,
    pub date: Option<NaiveDate>,
}

impl RentFilter {
    pub fn from_query(query: &RentListQuery) -> Self {
        Self {
            book_title: query.book_name.as_deref().and_then(normalize_term),
            student_name: query.student_name.as_deref().and_then(NameFilter::parse),
            date: query.date,
        }
    }

    pub fn matches_title(&self, title: &str) -> bool {
        match &self.book_title {
            Some(term) => title.to_lowercase().contains(term),
            None => true,
        }
    }

    pub fn matches_student(&self, first_name: &str, last_name: &str) -> bool {
        match &self.student_name {
            Some(name) => name.matches(first_name, last_name),
            None => true,
        }
    }

    pub fn matches_date(&self, rented_at: DateTime<Utc>) -> bool {
        match self.date {
            Some(date) => {
                let (start, end) = day_window(date);
                rented_at >= start && rented_at < end
            }
            None => true,
        }
    }
}

/// `[start of day, start of next day)` in UTC
pub fn day_window(date: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = date.and_time(chrono::NaiveTime::MIN).and_utc();
    (start, start + chrono::Duration::days(1))
}
