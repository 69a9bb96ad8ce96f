//! Librarian accounts and login sessions

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

/// Librarian account from database
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct Librarian {
    pub id: Uuid,
    pub username: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

/// Public view of a librarian
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct LibrarianInfo {
    pub id: Uuid,
    pub username: String,
}

impl From<&Librarian> for LibrarianInfo {
    fn from(librarian: &Librarian) -> Self {
        Self {
            id: librarian.id,
            username: librarian.username.clone(),
        }
    }
}

/// Login session. Only the sha256 of the bearer token is stored.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct Session {
    pub id: String,
    pub librarian_id: Uuid,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl Session {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}
