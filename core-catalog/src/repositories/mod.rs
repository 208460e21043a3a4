//! Repository pattern implementations for catalog data access
//!
//! Each repository pairs a trait (the seam for mocking in service tests)
//! with a SQLite implementation over a shared connection pool.

pub mod author;
pub mod book;
pub mod book_file;
pub mod exclusion;
pub mod history;

pub use author::{AuthorRepository, SqliteAuthorRepository};
pub use book::{BookRepository, SqliteBookRepository};
pub use book_file::{BookFileRepository, SqliteBookFileRepository};
pub use exclusion::{ExclusionRepository, SqliteExclusionRepository};
pub use history::{HistoryRepository, SqliteHistoryRepository};
