//! Repository layer for database operations
//!
//! The rental engine and the reporting engine only see the capability traits
//! declared here; Postgres implementations live in the submodules.

pub mod books;
pub mod carts;
pub mod librarians;
pub mod reports;
pub mod sessions;
pub mod students;


use async_trait::async_trait;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{
        Book, BookRentStats, Cart, InventoryDeltas, OverdueCriteria, OverdueRow, PageParams, Rent,
        RentFilter, RentSummary, RentTotals, Student,
    },
};

/// Student existence checks for the rental engine
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StudentLookup: Send + Sync {
    /// `NotFound` when no student has this id
    async fn get_by_id(&self, id: Uuid) -> AppResult<Student>;
}

/// Book existence checks for the rental engine
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BookLookup: Send + Sync {
    /// `NotFound` when no book has this id
    async fn get_by_id(&self, id: Uuid) -> AppResult<Book>;

    /// Books for the given ids; unknown ids are simply absent from the result
    async fn get_by_ids(&self, ids: &[Uuid]) -> AppResult<Vec<Book>>;
}

/// Open-rent listings, plus the entry point to a unit of work
#[async_trait]
pub trait RentalStore: Send + Sync {
    /// Starts a unit of work. Dropping it without `commit` discards every write.
    async fn begin(&self) -> AppResult<Box<dyn RentalTransaction>>;

    /// Line items of open carts matching `filter`, newest cart first, with the
    /// total number of matches
    async fn find_open_rents(
        &self,
        filter: &RentFilter,
        page: PageParams,
    ) -> AppResult<(Vec<RentSummary>, i64)>;

    /// Every line item of open carts, optionally for one student card
    async fn rented_books_by_card(&self, card_id: Option<&str>) -> AppResult<Vec<RentSummary>>;
}

/// Writes performed atomically on behalf of one rental or return
#[async_trait]
pub trait RentalTransaction: Send {
    /// Applies the whole batch or nothing; see [`InventoryDeltas::apply`]
    async fn adjust_counts(&mut self, deltas: &InventoryDeltas) -> AppResult<()>;

    async fn open_cart(&mut self, student_id: Uuid) -> AppResult<Cart>;

    /// One line item per id, in order, duplicates kept
    async fn add_line_items(&mut self, cart_id: Uuid, book_ids: &[Uuid]) -> AppResult<Vec<Rent>>;

    /// Reads the cart and holds it until the unit of work ends
    async fn lock_cart(&mut self, cart_id: Uuid) -> AppResult<Option<Cart>>;

    async fn line_items_for_cart(&mut self, cart_id: Uuid) -> AppResult<Vec<Rent>>;

    /// `NotFound` for an unknown cart, `AlreadyClosed` unless it is rented
    async fn close_cart(&mut self, cart_id: Uuid) -> AppResult<()>;

    async fn commit(self: Box<Self>) -> AppResult<()>;
}

/// Aggregate queries for reports
#[async_trait]
pub trait ReportStore: Send + Sync {
    /// Students past the rental period, most overdue first, with the total
    /// number of such students
    async fn overdue_students(&self, criteria: &OverdueCriteria)
        -> AppResult<(Vec<OverdueRow>, i64)>;

    async fn rent_totals(&self) -> AppResult<RentTotals>;

    /// Book titles by number of line items, highest first
    async fn top_books(&self, page: PageParams) -> AppResult<Vec<BookRentStats>>;
}

/// `%term%` with LIKE wildcards in `term` escaped
pub(crate) fn like_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

/// Main repository struct holding database connection pool
#[derive(Clone)]
pub struct Repository {
    pub pool: Pool<Postgres>,
    pub books: books::BooksRepository,
    pub students: students::StudentsRepository,
    pub carts: carts::CartsRepository,
    pub reports: reports::ReportsRepository,
    pub librarians: librarians::LibrariansRepository,
    pub sessions: sessions::SessionsRepository,
}

impl Repository {
    /// Create a new repository with the given database pool
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self {
            books: books::BooksRepository::new(pool.clone()),
            students: students::StudentsRepository::new(pool.clone()),
            carts: carts::CartsRepository::new(pool.clone()),
            reports: reports::ReportsRepository::new(pool.clone()),
            librarians: librarians::LibrariansRepository::new(pool.clone()),
            sessions: sessions::SessionsRepository::new(pool.clone()),
            pool,
        }
    }
}
