//! History repository trait and implementation

use crate::error::Result;
use crate::models::{HistoryRecord, HISTORY_EVENT_BOOK_REMOVED};
use async_trait::async_trait;
use sqlx::{query, query_as, SqlitePool};
use tracing::debug;

/// History repository interface for data access operations
#[async_trait]
pub trait HistoryRepository: Send + Sync {
    /// Append a history entry
    async fn insert(&self, record: &HistoryRecord) -> Result<()>;

    /// List all history entries for an author, newest first
    async fn get_by_author(&self, author_id: &str) -> Result<Vec<HistoryRecord>>;

    /// Foreign book ids the user has removed from this author's catalog.
    ///
    /// These must never be re-inserted by a refresh.
    async fn removed_foreign_book_ids(&self, author_id: &str) -> Result<Vec<String>>;

    /// Re-point all history entries from one author to another.
    ///
    /// Returns the number of entries moved.
    async fn reassign_author(&self, from_author_id: &str, to_author_id: &str) -> Result<u64>;
}

/// SQLite implementation of HistoryRepository
pub struct SqliteHistoryRepository {
    pool: SqlitePool,
}

impl SqliteHistoryRepository {
    /// Create a new SqliteHistoryRepository
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl HistoryRepository for SqliteHistoryRepository {
    async fn insert(&self, record: &HistoryRecord) -> Result<()> {
        query(
            r#"
            INSERT INTO history (id, author_id, foreign_book_id, event_type, date)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&record.id)
        .bind(&record.author_id)
        .bind(&record.foreign_book_id)
        .bind(&record.event_type)
        .bind(record.date)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get_by_author(&self, author_id: &str) -> Result<Vec<HistoryRecord>> {
        let records = query_as::<_, HistoryRecord>(
            "SELECT * FROM history WHERE author_id = ? ORDER BY date DESC",
        )
        .bind(author_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }

    async fn removed_foreign_book_ids(&self, author_id: &str) -> Result<Vec<String>> {
        let rows: Vec<(String,)> = query_as(
            "SELECT DISTINCT foreign_book_id FROM history WHERE author_id = ? AND event_type = ?",
        )
        .bind(author_id)
        .bind(HISTORY_EVENT_BOOK_REMOVED)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|(id,)| id).collect())
    }

    async fn reassign_author(&self, from_author_id: &str, to_author_id: &str) -> Result<u64> {
        let result = query("UPDATE history SET author_id = ? WHERE author_id = ?")
            .bind(to_author_id)
            .bind(from_author_id)
            .execute(&self.pool)
            .await?;

        let moved = result.rows_affected();
        debug!(
            from = %from_author_id,
            to = %to_author_id,
            moved,
            "Reassigned history entries"
        );

        Ok(moved)
    }
}
