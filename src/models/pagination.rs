//! Limit/offset pagination shared by list endpoints

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Normalized limit/offset pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageParams {
    pub limit: i64,
    pub offset: i64,
}

impl PageParams {
    /// Absent or non-positive limits fall back to `default`, large ones are capped at `max`.
    /// Absent or negative offsets become 0.
    pub fn clamp(limit: Option<i64>, offset: Option<i64>, default: i64, max: i64) -> Self {
        let limit = match limit {
            Some(l) if l > 0 => l.min(max),
            _ => default,
        };
        let offset = offset.filter(|o| *o > 0).unwrap_or(0);
        Self { limit, offset }
    }
}

/// Pagination block attached to list responses
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PaginationInfo {
    pub offset: i64,
    pub limit: i64,
    pub total: i64,
    pub has_next: bool,
    pub has_previous: bool,
}

impl PaginationInfo {
    pub fn new(page: PageParams, total: i64) -> Self {
        Self {
            offset: page.offset,
            limit: page.limit,
            total,
            has_next: page.offset.saturating_add(page.limit) < total,
            has_previous: page.offset > 0,
        }
    }

    /// Describes a complete, unpaginated result set
    pub fn unpaginated(total: i64) -> Self {
        Self {
            offset: 0,
            limit: 0,
            total,
            has_next: false,
            has_previous: false,
        }
    }
}
