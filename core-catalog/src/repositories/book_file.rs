//! Book file repository trait and implementation
//!
//! File records are evidence of on-disk artifacts. The engine consults them
//! to decide delete-vs-preserve and re-points them during a merge; it never
//! touches the files themselves.

use crate::error::Result;
use crate::models::BookFile;
use async_trait::async_trait;
use sqlx::{query, query_as, SqlitePool};
use tracing::debug;

/// Book file repository interface for data access operations
#[async_trait]
pub trait BookFileRepository: Send + Sync {
    /// List all file records belonging to an author
    async fn get_by_author(&self, author_id: &str) -> Result<Vec<BookFile>>;

    /// Count the file records belonging to an author
    async fn count_by_author(&self, author_id: &str) -> Result<i64>;

    /// Insert a new file record
    async fn insert(&self, file: &BookFile) -> Result<()>;

    /// Re-point all file records from one author to another.
    ///
    /// Returns the number of records moved.
    async fn reassign_author(&self, from_author_id: &str, to_author_id: &str) -> Result<u64>;
}

/// SQLite implementation of BookFileRepository
pub struct SqliteBookFileRepository {
    pool: SqlitePool,
}

impl SqliteBookFileRepository {
    /// Create a new SqliteBookFileRepository
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BookFileRepository for SqliteBookFileRepository {
    async fn get_by_author(&self, author_id: &str) -> Result<Vec<BookFile>> {
        let files = query_as::<_, BookFile>(
            "SELECT * FROM book_files WHERE author_id = ? ORDER BY path",
        )
        .bind(author_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(files)
    }

    async fn count_by_author(&self, author_id: &str) -> Result<i64> {
        let (count,): (i64,) =
            query_as("SELECT COUNT(*) FROM book_files WHERE author_id = ?")
                .bind(author_id)
                .fetch_one(&self.pool)
                .await?;

        Ok(count)
    }

    async fn insert(&self, file: &BookFile) -> Result<()> {
        query(
            r#"
            INSERT INTO book_files (id, author_id, book_id, path, size_bytes, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&file.id)
        .bind(&file.author_id)
        .bind(&file.book_id)
        .bind(&file.path)
        .bind(file.size_bytes)
        .bind(file.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn reassign_author(&self, from_author_id: &str, to_author_id: &str) -> Result<u64> {
        let result = query("UPDATE book_files SET author_id = ? WHERE author_id = ?")
            .bind(to_author_id)
            .bind(from_author_id)
            .execute(&self.pool)
            .await?;

        let moved = result.rows_affected();
        debug!(
            from = %from_author_id,
            to = %to_author_id,
            moved,
            "Reassigned book files"
        );

        Ok(moved)
    }
}
