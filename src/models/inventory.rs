//! Inventory ledger adjustments
//!
//! A batch of signed per-book deltas is checked as a whole against current
//! counts: if any resulting count would be negative, nothing is applied.

use std::collections::{BTreeMap, HashMap};

use sqlx::FromRow;
use uuid::Uuid;

use crate::error::{AppError, AppResult};

/// Current count of one book, as read (and locked) by the ledger
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct BookCount {
    pub id: Uuid,
    pub title: String,
    pub count: i32,
}

/// Signed per-book adjustments, ordered by book id
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InventoryDeltas(BTreeMap<Uuid, i32>);

impl InventoryDeltas {
    /// One copy out per occurrence of a book id
    pub fn debit(book_ids: &[Uuid]) -> Self {
        Self::tally(book_ids, -1)
    }

    /// One copy back per occurrence of a book id
    pub fn credit(book_ids: &[Uuid]) -> Self {
        Self::tally(book_ids, 1)
    }

    fn tally(book_ids: &[Uuid], step: i32) -> Self {
        let mut deltas = BTreeMap::new();
        for id in book_ids {
            *deltas.entry(*id).or_insert(0) += step;
        }
        Self(deltas)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of distinct books touched
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Distinct book ids in ascending order (the row-locking order)
    pub fn book_ids(&self) -> Vec<Uuid> {
        self.0.keys().copied().collect()
    }

    pub fn get(&self, book_id: &Uuid) -> Option<i32> {
        self.0.get(book_id).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Uuid, i32)> + '_ {
        self.0.iter().map(|(id, delta)| (*id, *delta))
    }

    /// Computes the new count of every touched book.
    ///
    /// Fails with `NotFound` if a book is missing from `current` and with
    /// `InsufficientInventory` (naming the first offending book) if any count
    /// would drop below zero.
    pub fn apply(&self, current: &HashMap<Uuid, BookCount>) -> AppResult<Vec<(Uuid, i32)>> {
        let mut updated = Vec::with_capacity(self.0.len());

        for (id, delta) in self.iter() {
            let book = current
                .get(&id)
                .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", id)))?;

            let new_count = book.count.checked_add(delta).ok_or_else(|| {
                AppError::Internal(format!("count overflow for book {}", id))
            })?;

            if new_count < 0 {
                return Err(AppError::InsufficientInventory(format!(
                    "insufficient copies of book '{}': available={}, requested={}",
                    book.title, book.count, -delta
                )));
            }

            updated.push((id, new_count));
        }

        Ok(updated)
    }
}
