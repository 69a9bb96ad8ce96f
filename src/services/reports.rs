//! Reporting engine: rent listings, overdue students and aggregate figures

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::{
    error::AppResult,
    models::{
        rental::{RentListQuery, RentListResponse},
        report::{OverdueResponse, RentReport},
        OverdueCriteria, PageParams, PaginationInfo, RentFilter, RentSummary,
    },
    repository::{RentalStore, ReportStore},
};

/// Page size limits of list endpoints
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageLimits {
    pub default: i64,
    pub max: i64,
}

impl PageLimits {
    pub fn clamp(&self, limit: Option<i64>, offset: Option<i64>) -> PageParams {
        PageParams::clamp(limit, offset, self.default, self.max)
    }
}

impl Default for PageLimits {
    fn default() -> Self {
        Self {
            default: 10,
            max: 100,
        }
    }
}

#[derive(Clone)]
pub struct ReportService {
    rentals: Arc<dyn RentalStore>,
    reports: Arc<dyn ReportStore>,
    overdue_period_days: i64,
    limits: PageLimits,
}

impl ReportService {
    pub fn new(
        rentals: Arc<dyn RentalStore>,
        reports: Arc<dyn ReportStore>,
        overdue_period_days: i64,
        limits: PageLimits,
    ) -> Self {
        Self {
            rentals,
            reports,
            overdue_period_days,
            limits,
        }
    }

    /// Every currently rented copy, optionally for one student card
    pub async fn rented_books(
        &self,
        card_id: Option<&str>,
    ) -> AppResult<(Vec<RentSummary>, PaginationInfo)> {
        let card_id = card_id.map(str::trim).filter(|c| !c.is_empty());
        let rows = self.rentals.rented_books_by_card(card_id).await?;
        let pagination = PaginationInfo::unpaginated(rows.len() as i64);
        Ok((rows, pagination))
    }

    /// Paginated, filtered listing of currently rented copies
    pub async fn list_rents(&self, query: &RentListQuery) -> AppResult<RentListResponse> {
        let filter = RentFilter::from_query(query);
        let page = self.limits.clamp(query.limit, query.offset);

        let (results, total) = self.rentals.find_open_rents(&filter, page).await?;
        Ok(RentListResponse {
            results,
            pagination: PaginationInfo::new(page, total),
        })
    }

    /// Students past the rental period, most overdue first
    pub async fn overdue_report(
        &self,
        card_id: Option<&str>,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> AppResult<OverdueResponse> {
        self.overdue_report_at(card_id, limit, offset, Utc::now()).await
    }

    pub async fn overdue_report_at(
        &self,
        card_id: Option<&str>,
        limit: Option<i64>,
        offset: Option<i64>,
        now: DateTime<Utc>,
    ) -> AppResult<OverdueResponse> {
        let page = self.limits.clamp(limit, offset);
        let criteria = OverdueCriteria {
            card_id: card_id
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .map(str::to_string),
            period_days: self.overdue_period_days,
            now,
            page,
        };

        let (rows, total) = self.reports.overdue_students(&criteria).await?;
        let results = rows
            .into_iter()
            .filter_map(|row| row.into_overdue(self.overdue_period_days))
            .collect();

        Ok(OverdueResponse {
            results,
            pagination: PaginationInfo::new(page, total),
        })
    }

    /// Totals, most rented titles and most overdue students
    pub async fn rent_report(&self, limit: Option<i64>, offset: Option<i64>) -> AppResult<RentReport> {
        self.rent_report_at(limit, offset, Utc::now()).await
    }

    pub async fn rent_report_at(
        &self,
        limit: Option<i64>,
        offset: Option<i64>,
        now: DateTime<Utc>,
    ) -> AppResult<RentReport> {
        let page = self.limits.clamp(limit, offset);

        let totals = self.reports.rent_totals().await?;
        let top_books = self.reports.top_books(page).await?;
        let top_overdue = self
            .overdue_report_at(None, limit, offset, now)
            .await?
            .results;

        Ok(RentReport {
            total_rents: totals.total_rents,
            total_students: totals.total_students,
            top_books,
            top_overdue,
        })
    }
}
