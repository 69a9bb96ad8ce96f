//! Student model and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::validation::not_blank;

use super::pagination::PaginationInfo;

/// Student model from database
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Student {
    pub id: Uuid,
    /// Library card number, unique per student
    #[serde(rename = "student_card_id")]
    pub card_id: String,
    pub first_name: String,
    pub last_name: String,
    pub major: String,
    pub phone: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Student {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Create student request
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateStudent {
    #[serde(rename = "student_card_id")]
    #[validate(custom(function = "not_blank"), length(max = 255, message = "is too long"))]
    pub card_id: String,
    #[validate(custom(function = "not_blank"), length(max = 255, message = "is too long"))]
    pub first_name: String,
    #[validate(custom(function = "not_blank"), length(max = 255, message = "is too long"))]
    pub last_name: String,
    #[validate(custom(function = "not_blank"), length(max = 255, message = "is too long"))]
    pub major: String,
    #[validate(custom(function = "not_blank"), length(max = 255, message = "is too long"))]
    pub phone: String,
}

impl CreateStudent {
    pub fn into_student(self, now: DateTime<Utc>) -> Student {
        Student {
            id: Uuid::new_v4(),
            card_id: self.card_id.trim().to_string(),
            first_name: self.first_name.trim().to_string(),
            last_name: self.last_name.trim().to_string(),
            major: self.major.trim().to_string(),
            phone: self.phone.trim().to_string(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// Student list query parameters
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct StudentQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct StudentsResponse {
    pub results: Vec<Student>,
    pub pagination: PaginationInfo,
}
