//! Cart (rental transaction) and rent line-item models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Decode, Encode, FromRow, Postgres};
use utoipa::ToSchema;
use uuid::Uuid;

/// Cart lifecycle. The only transition is `Rented` -> `Returned`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum CartStatus {
    Rented,
    Returned,
}

impl CartStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CartStatus::Rented => "RENTED",
            CartStatus::Returned => "RETURNED",
        }
    }
}

impl std::fmt::Display for CartStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for CartStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "RENTED" => Ok(CartStatus::Rented),
            "RETURNED" => Ok(CartStatus::Returned),
            _ => Err(format!("Invalid cart status: {}", s)),
        }
    }
}

// SQLx conversion for CartStatus
impl sqlx::Type<Postgres> for CartStatus {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<Postgres>>::type_info()
    }
}

impl<'r> Decode<'r, Postgres> for CartStatus {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s: String = Decode::<Postgres>::decode(value)?;
        s.parse().map_err(|e: String| e.into())
    }
}

impl Encode<'_, Postgres> for CartStatus {
    fn encode_by_ref(&self, buf: &mut sqlx::postgres::PgArgumentBuffer) -> sqlx::encode::IsNull {
        <&str as Encode<Postgres>>::encode(self.as_str(), buf)
    }
}

/// One checkout event for a student
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Cart {
    pub id: Uuid,
    pub student_id: Uuid,
    pub status: CartStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub returned_at: Option<DateTime<Utc>>,
}

impl Cart {
    /// A freshly opened cart
    pub fn open(student_id: Uuid, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            student_id,
            status: CartStatus::Rented,
            created_at: now,
            updated_at: now,
            returned_at: None,
        }
    }

    pub fn is_open(&self) -> bool {
        self.status == CartStatus::Rented
    }
}

/// A single borrowed copy within a cart
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Rent {
    pub id: Uuid,
    pub cart_id: Uuid,
    pub book_id: Uuid,
    pub created_at: DateTime<Utc>,
}

impl Rent {
    /// One line item per requested id, preserving order and duplicates
    pub fn for_books(cart_id: Uuid, book_ids: &[Uuid], now: DateTime<Utc>) -> Vec<Rent> {
        book_ids
            .iter()
            .map(|&book_id| Rent {
                id: Uuid::new_v4(),
                cart_id,
                book_id,
                created_at: now,
            })
            .collect()
    }
}
