//! Business logic services

pub mod auth;
pub mod catalog;
pub mod rentals;
pub mod reports;
pub mod session_sweeper;
pub mod students;

use std::sync::Arc;

use crate::{config::AppConfig, repository::Repository};

use self::{rentals::RentalPolicy, reports::PageLimits};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub auth: auth::AuthService,
    pub catalog: catalog::CatalogService,
    pub students: students::StudentsService,
    pub rentals: rentals::RentalService,
    pub reports: reports::ReportService,
}

impl Services {
    /// Create all services with the given repository
    pub fn new(repository: Repository, config: &AppConfig) -> Self {
        let limits = PageLimits {
            default: config.rentals.default_page_size,
            max: config.rentals.max_page_size,
        };

        let rentals = rentals::RentalService::new(
            Arc::new(repository.students.clone()),
            Arc::new(repository.books.clone()),
            Arc::new(repository.carts.clone()),
            RentalPolicy {
                max_distinct_books: config.rentals.max_distinct_books,
            },
        );
        let reports = reports::ReportService::new(
            Arc::new(repository.carts.clone()),
            Arc::new(repository.reports.clone()),
            config.rentals.overdue_period_days,
            limits,
        );

        Self {
            auth: auth::AuthService::new(repository.clone(), config.auth.clone()),
            catalog: catalog::CatalogService::new(repository.clone(), limits),
            students: students::StudentsService::new(repository, limits),
            rentals,
            reports,
        }
    }
}
