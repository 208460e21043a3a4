//! Import list exclusion repository trait and implementation

use crate::error::Result;
use crate::models::ImportListExclusion;
use async_trait::async_trait;
use sqlx::{query, query_as, SqlitePool};

/// Exclusion repository interface for data access operations
#[async_trait]
pub trait ExclusionRepository: Send + Sync {
    /// Record a new exclusion
    async fn insert(&self, exclusion: &ImportListExclusion) -> Result<()>;

    /// List all exclusions
    async fn all(&self) -> Result<Vec<ImportListExclusion>>;

    /// All excluded foreign ids (authors and books alike)
    async fn foreign_ids(&self) -> Result<Vec<String>>;
}

/// SQLite implementation of ExclusionRepository
pub struct SqliteExclusionRepository {
    pool: SqlitePool,
}

impl SqliteExclusionRepository {
    /// Create a new SqliteExclusionRepository
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ExclusionRepository for SqliteExclusionRepository {
    async fn insert(&self, exclusion: &ImportListExclusion) -> Result<()> {
        query(
            r#"
            INSERT INTO import_list_exclusions (id, foreign_id, name, created_at)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(&exclusion.id)
        .bind(&exclusion.foreign_id)
        .bind(&exclusion.name)
        .bind(exclusion.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn all(&self) -> Result<Vec<ImportListExclusion>> {
        let exclusions = query_as::<_, ImportListExclusion>(
            "SELECT * FROM import_list_exclusions ORDER BY created_at",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(exclusions)
    }

    async fn foreign_ids(&self) -> Result<Vec<String>> {
        let rows: Vec<(String,)> =
            query_as("SELECT foreign_id FROM import_list_exclusions")
                .fetch_all(&self.pool)
                .await?;

        Ok(rows.into_iter().map(|(id,)| id).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::create_test_pool;
    use crate::error::CatalogError;

    #[tokio::test]
    async fn test_insert_and_list() {
        let pool = create_test_pool().await.unwrap();
        let repo = SqliteExclusionRepository::new(pool);

        repo.insert(&ImportListExclusion::new("fb-1", "Unwanted Book"))
            .await
            .unwrap();
        repo.insert(&ImportListExclusion::new("fa-9", "Unwanted Author"))
            .await
            .unwrap();

        let all = repo.all().await.unwrap();
        assert_eq!(all.len(), 2);

        let ids = repo.foreign_ids().await.unwrap();
        assert!(ids.contains(&"fb-1".to_string()));
        assert!(ids.contains(&"fa-9".to_string()));
    }

    #[tokio::test]
    async fn test_duplicate_foreign_id_rejected() {
        let pool = create_test_pool().await.unwrap();
        let repo = SqliteExclusionRepository::new(pool);

        repo.insert(&ImportListExclusion::new("fb-1", "First"))
            .await
            .unwrap();
        let result = repo.insert(&ImportListExclusion::new("fb-1", "Second")).await;
        assert!(matches!(result, Err(CatalogError::Database(_))));
    }
}
