//! Book (catalog) model and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::validation::not_blank;

use super::pagination::PaginationInfo;

/// Book model from database
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Book {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    /// Copies currently available for rent
    pub count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Create book request
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateBook {
    #[validate(
        custom(function = "not_blank"),
        length(max = 255, message = "must be at most 255 characters")
    )]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[validate(range(min = 0, message = "must not be negative"))]
    pub count: i32,
}

impl CreateBook {
    /// Builds the row to insert, with a fresh identifier
    pub fn into_book(self, now: DateTime<Utc>) -> Book {
        Book {
            id: Uuid::new_v4(),
            title: self.title.trim().to_string(),
            description: self.description,
            count: self.count,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Book list query parameters
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct BookQuery {
    /// Book id, or a case-insensitive title fragment
    pub query: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BooksResponse {
    pub results: Vec<Book>,
    pub pagination: PaginationInfo,
}
