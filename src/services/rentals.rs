//! Rental transaction manager
//!
//! Creating a rental validates the student, the books, the distinct-book
//! policy and availability against committed counts, then applies the
//! inventory debit and writes the cart and its line items in one unit of
//! work. Returning reverses it under a lock on the cart.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{
        rental::{CreateRentRequest, CreateRentResponse, ReturnBooksResponse},
        BookCount, InventoryDeltas,
    },
    repository::{BookLookup, RentalStore, StudentLookup},
    validation,
};

/// Rental limits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RentalPolicy {
    /// Maximum number of distinct titles in one cart
    pub max_distinct_books: usize,
}

impl Default for RentalPolicy {
    fn default() -> Self {
        Self {
            max_distinct_books: 3,
        }
    }
}

#[derive(Clone)]
pub struct RentalService {
    students: Arc<dyn StudentLookup>,
    books: Arc<dyn BookLookup>,
    store: Arc<dyn RentalStore>,
    policy: RentalPolicy,
}

impl RentalService {
    pub fn new(
        students: Arc<dyn StudentLookup>,
        books: Arc<dyn BookLookup>,
        store: Arc<dyn RentalStore>,
        policy: RentalPolicy,
    ) -> Self {
        Self {
            students,
            books,
            store,
            policy,
        }
    }

    /// Create a rental transaction for a student
    pub async fn create_rent(&self, request: CreateRentRequest) -> AppResult<CreateRentResponse> {
        validation::check(&request)?;

        self.students.get_by_id(request.student_id).await?;

        let distinct: Vec<Uuid> = request
            .book_ids
            .iter()
            .copied()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let books = self.books.get_by_ids(&distinct).await?;
        if books.len() != distinct.len() {
            return Err(AppError::NotFound("one or more books not found".to_string()));
        }

        if distinct.is_empty() || distinct.len() > self.policy.max_distinct_books {
            return Err(AppError::InvalidRequest(format!(
                "invalid book counts: {}",
                distinct.len()
            )));
        }

        // Checked against committed counts; the ledger checks again under lock
        let debit = InventoryDeltas::debit(&request.book_ids);
        let committed: HashMap<Uuid, BookCount> = books
            .into_iter()
            .map(|b| {
                (
                    b.id,
                    BookCount {
                        id: b.id,
                        title: b.title,
                        count: b.count,
                    },
                )
            })
            .collect();
        debit.apply(&committed)?;

        // Debit first: book rows are locked before any rent row references them
        let mut tx = self.store.begin().await?;
        tx.adjust_counts(&debit).await?;
        let cart = tx.open_cart(request.student_id).await?;
        tx.add_line_items(cart.id, &request.book_ids).await?;
        tx.commit().await?;

        tracing::info!(
            "Cart {} opened for student {} with {} copies",
            cart.id,
            request.student_id,
            request.book_ids.len()
        );

        Ok(CreateRentResponse {
            cart_id: cart.id,
            message: "Books rented successfully".to_string(),
        })
    }

    /// Return every copy of a cart and close it
    pub async fn return_books(&self, cart_id: Uuid) -> AppResult<ReturnBooksResponse> {
        let mut tx = self.store.begin().await?;

        let cart = tx
            .lock_cart(cart_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Cart {} not found", cart_id)))?;

        if !cart.is_open() {
            return Err(AppError::AlreadyClosed(format!(
                "cart {} is not currently rented (status: {})",
                cart_id, cart.status
            )));
        }

        let rents = tx.line_items_for_cart(cart_id).await?;
        if rents.is_empty() {
            return Err(AppError::Internal(format!("cart {} has no line items", cart_id)));
        }

        let book_ids: Vec<Uuid> = rents.iter().map(|r| r.book_id).collect();
        tx.adjust_counts(&InventoryDeltas::credit(&book_ids)).await?;
        tx.close_cart(cart_id).await?;
        tx.commit().await?;

        tracing::info!("Cart {} returned ({} copies)", cart_id, book_ids.len());

        Ok(ReturnBooksResponse {
            message: "Cart marked as returned".to_string(),
            cart_id,
        })
    }
}
