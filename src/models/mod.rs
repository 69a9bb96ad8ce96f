//! Data models for the book rental server

pub mod book;
pub mod cart;
pub mod inventory;
pub mod librarian;
pub mod pagination;
pub mod rental;
pub mod report;
pub mod student;

// Re-export commonly used types
pub use book::Book;
pub use cart::{Cart, CartStatus, Rent};
pub use inventory::{BookCount, InventoryDeltas};
pub use librarian::{Librarian, LibrarianInfo, Session};
pub use pagination::{PageParams, PaginationInfo};
pub use rental::{RentFilter, RentSummary};
pub use report::{BookRentStats, OverdueCriteria, OverdueRow, OverdueStudent, RentTotals};
pub use student::Student;
