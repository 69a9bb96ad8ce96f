//! Catalog management service

use chrono::Utc;
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::book::{Book, BookQuery, BooksResponse, CreateBook},
    models::PaginationInfo,
    repository::Repository,
    validation,
};

use super::reports::PageLimits;

#[derive(Clone)]
pub struct CatalogService {
    repository: Repository,
    limits: PageLimits,
}

impl CatalogService {
    pub fn new(repository: Repository, limits: PageLimits) -> Self {
        Self { repository, limits }
    }

    /// Search books by id or title fragment
    pub async fn search_books(&self, query: &BookQuery) -> AppResult<BooksResponse> {
        let page = self.limits.clamp(query.limit, query.offset);
        let (results, total) = self.repository.books.list(query.query.as_deref(), page).await?;
        Ok(BooksResponse {
            results,
            pagination: PaginationInfo::new(page, total),
        })
    }

    pub async fn get_book(&self, id: Uuid) -> AppResult<Book> {
        self.repository.books.get_by_id(id).await
    }

    pub async fn create_book(&self, request: CreateBook) -> AppResult<Book> {
        validation::check(&request)?;
        let book = self.repository.books.create(&request.into_book(Utc::now())).await?;
        tracing::info!("Book {} created with {} copies", book.id, book.count);
        Ok(book)
    }

    pub async fn delete_book(&self, id: Uuid) -> AppResult<()> {
        self.repository.books.delete(id).await?;
        tracing::info!("Book {} deleted", id);
        Ok(())
    }
}
