//! Book repository trait and implementation
//!
//! Books are owned by authors through the author's stable metadata id.
//! Batch writes (`insert_many`, `update_many`) each run inside a single
//! transaction so a refresh either lands every row or none of them.

use crate::error::{CatalogError, Result};
use crate::models::Book;
use async_trait::async_trait;
use sqlx::{query, query_as, SqlitePool};
use tracing::debug;

/// Book repository interface for data access operations
#[async_trait]
pub trait BookRepository: Send + Sync {
    /// Find a book by its local id
    async fn find_by_id(&self, id: &str) -> Result<Option<Book>>;

    /// List all books owned by the given metadata record, ordered by title
    async fn get_by_author_metadata(&self, author_metadata_id: &str) -> Result<Vec<Book>>;

    /// Load an author's books for reconciliation, skipping any whose foreign
    /// id appears in `excluded_foreign_ids`.
    ///
    /// Resolves ownership through the author's metadata id so books
    /// re-pointed by a merge are included.
    async fn get_for_refresh(
        &self,
        author_id: &str,
        excluded_foreign_ids: &[String],
    ) -> Result<Vec<Book>>;

    /// Insert a batch of new books in one transaction
    async fn insert_many(&self, books: &[Book]) -> Result<()>;

    /// Update a batch of existing books in one transaction.
    ///
    /// # Errors
    /// Returns `NotFound` (and rolls back the whole batch) if any book row
    /// does not exist.
    async fn update_many(&self, books: &[Book]) -> Result<()>;
}

/// SQLite implementation of BookRepository
pub struct SqliteBookRepository {
    pool: SqlitePool,
}

impl SqliteBookRepository {
    /// Create a new SqliteBookRepository
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn validate_all(books: &[Book]) -> Result<()> {
        for book in books {
            book.validate().map_err(|e| CatalogError::InvalidInput {
                field: "Book".to_string(),
                message: e,
            })?;
        }
        Ok(())
    }
}

#[async_trait]
impl BookRepository for SqliteBookRepository {
    async fn find_by_id(&self, id: &str) -> Result<Option<Book>> {
        let book = query_as::<_, Book>("SELECT * FROM books WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(book)
    }

    async fn get_by_author_metadata(&self, author_metadata_id: &str) -> Result<Vec<Book>> {
        let books = query_as::<_, Book>(
            "SELECT * FROM books WHERE author_metadata_id = ? ORDER BY title",
        )
        .bind(author_metadata_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(books)
    }

    async fn get_for_refresh(
        &self,
        author_id: &str,
        excluded_foreign_ids: &[String],
    ) -> Result<Vec<Book>> {
        let books = query_as::<_, Book>(
            r#"
            SELECT b.*
            FROM books b
            JOIN authors a ON a.metadata_id = b.author_metadata_id
            WHERE a.id = ?
            ORDER BY b.title
            "#,
        )
        .bind(author_id)
        .fetch_all(&self.pool)
        .await?;

        let books: Vec<Book> = books
            .into_iter()
            .filter(|b| !excluded_foreign_ids.contains(&b.foreign_book_id))
            .collect();

        debug!(
            author_id = %author_id,
            count = books.len(),
            "Loaded books for refresh"
        );

        Ok(books)
    }

    async fn insert_many(&self, books: &[Book]) -> Result<()> {
        if books.is_empty() {
            return Ok(());
        }

        Self::validate_all(books)?;

        let mut tx = self.pool.begin().await?;

        for book in books {
            query(
                r#"
                INSERT INTO books (
                    id, foreign_book_id, author_metadata_id, title, title_slug,
                    overview, release_date, rating, rating_count, monitored,
                    created_at, updated_at
                )
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(&book.id)
            .bind(&book.foreign_book_id)
            .bind(&book.author_metadata_id)
            .bind(&book.title)
            .bind(&book.title_slug)
            .bind(&book.overview)
            .bind(book.release_date)
            .bind(book.rating)
            .bind(book.rating_count)
            .bind(book.monitored)
            .bind(book.created_at)
            .bind(book.updated_at)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        debug!(count = books.len(), "Inserted books");
        Ok(())
    }

    async fn update_many(&self, books: &[Book]) -> Result<()> {
        if books.is_empty() {
            return Ok(());
        }

        Self::validate_all(books)?;

        let mut tx = self.pool.begin().await?;

        for book in books {
            let result = query(
                r#"
                UPDATE books
                SET foreign_book_id = ?, author_metadata_id = ?, title = ?,
                    title_slug = ?, overview = ?, release_date = ?, rating = ?,
                    rating_count = ?, monitored = ?, updated_at = ?
                WHERE id = ?
                "#,
            )
            .bind(&book.foreign_book_id)
            .bind(&book.author_metadata_id)
            .bind(&book.title)
            .bind(&book.title_slug)
            .bind(&book.overview)
            .bind(book.release_date)
            .bind(book.rating)
            .bind(book.rating_count)
            .bind(book.monitored)
            .bind(book.updated_at)
            .bind(&book.id)
            .execute(&mut *tx)
            .await?;

            if result.rows_affected() == 0 {
                return Err(CatalogError::NotFound {
                    entity_type: "Book".to_string(),
                    id: book.id.clone(),
                });
            }
        }

        tx.commit().await?;

        debug!(count = books.len(), "Updated books");
        Ok(())
    }
}
