//! Author repository trait and implementation
//!
//! Authors and their metadata records are persisted together: the author row
//! carries identity and local settings, the metadata row carries the
//! provider-owned descriptive fields. `update` writes both in one
//! transaction so a refresh commit point is a single atomic write.

use crate::error::{CatalogError, Result};
use crate::models::{Author, AuthorMetadata};
use async_trait::async_trait;
use sqlx::{query, query_as, SqlitePool};
use tracing::debug;

/// Author repository interface for data access operations
#[async_trait]
pub trait AuthorRepository: Send + Sync {
    /// Find an author by its local id
    async fn find_by_id(&self, id: &str) -> Result<Option<Author>>;

    /// Find an author by its foreign id, optionally excluding one local id
    /// (used for collision lookups during identity resolution).
    async fn find_by_foreign_id(
        &self,
        foreign_author_id: &str,
        exclude_author_id: Option<&str>,
    ) -> Result<Option<Author>>;

    /// Load the metadata record owned by an author
    async fn get_metadata(&self, metadata_id: &str) -> Result<Option<AuthorMetadata>>;

    /// Insert a new author together with its metadata record.
    ///
    /// Authors are created by the out-of-core import flow; the engine only
    /// uses this in tests.
    async fn insert(&self, author: &Author, metadata: &AuthorMetadata) -> Result<()>;

    /// Update an author and its metadata record atomically.
    ///
    /// Returns the persisted author copy.
    ///
    /// # Errors
    /// Returns `NotFound` if either row does not exist, `InvalidInput` if
    /// validation fails.
    async fn update(&self, author: &Author, metadata: &AuthorMetadata) -> Result<Author>;

    /// Delete an author, its metadata, and its books from the catalog.
    ///
    /// This is a soft removal: on-disk artifacts are never touched.
    /// `delete_files` removes the author's book file *records*;
    /// `delete_from_disk` is recorded for the out-of-core file collaborator
    /// and otherwise ignored by this store.
    ///
    /// # Returns
    /// - `Ok(true)` if the author was deleted
    /// - `Ok(false)` if the author was not found
    async fn delete(&self, id: &str, delete_files: bool, delete_from_disk: bool) -> Result<bool>;
}

/// SQLite implementation of AuthorRepository
pub struct SqliteAuthorRepository {
    pool: SqlitePool,
}

impl SqliteAuthorRepository {
    /// Create a new SqliteAuthorRepository
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AuthorRepository for SqliteAuthorRepository {
    async fn find_by_id(&self, id: &str) -> Result<Option<Author>> {
        let author = query_as::<_, Author>("SELECT * FROM authors WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(author)
    }

    async fn find_by_foreign_id(
        &self,
        foreign_author_id: &str,
        exclude_author_id: Option<&str>,
    ) -> Result<Option<Author>> {
        let author = query_as::<_, Author>(
            "SELECT * FROM authors WHERE foreign_author_id = ? AND (? IS NULL OR id != ?) LIMIT 1",
        )
        .bind(foreign_author_id)
        .bind(exclude_author_id)
        .bind(exclude_author_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(author)
    }

    async fn get_metadata(&self, metadata_id: &str) -> Result<Option<AuthorMetadata>> {
        let metadata =
            query_as::<_, AuthorMetadata>("SELECT * FROM author_metadata WHERE id = ?")
                .bind(metadata_id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(metadata)
    }

    async fn insert(&self, author: &Author, metadata: &AuthorMetadata) -> Result<()> {
        author.validate().map_err(|e| CatalogError::InvalidInput {
            field: "Author".to_string(),
            message: e,
        })?;
        metadata
            .validate()
            .map_err(|e| CatalogError::InvalidInput {
                field: "AuthorMetadata".to_string(),
                message: e,
            })?;

        let mut tx = self.pool.begin().await?;

        query(
            r#"
            INSERT INTO author_metadata (
                id, foreign_author_id, name, sort_name, overview, status,
                images, rating, rating_count, created_at, updated_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&metadata.id)
        .bind(&metadata.foreign_author_id)
        .bind(&metadata.name)
        .bind(&metadata.sort_name)
        .bind(&metadata.overview)
        .bind(&metadata.status)
        .bind(&metadata.images)
        .bind(metadata.rating)
        .bind(metadata.rating_count)
        .bind(metadata.created_at)
        .bind(metadata.updated_at)
        .execute(&mut *tx)
        .await?;

        query(
            r#"
            INSERT INTO authors (
                id, foreign_author_id, metadata_id, root_folder_path,
                monitored, created_at, updated_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&author.id)
        .bind(&author.foreign_author_id)
        .bind(&author.metadata_id)
        .bind(&author.root_folder_path)
        .bind(author.monitored)
        .bind(author.created_at)
        .bind(author.updated_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(())
    }

    async fn update(&self, author: &Author, metadata: &AuthorMetadata) -> Result<Author> {
        author.validate().map_err(|e| CatalogError::InvalidInput {
            field: "Author".to_string(),
            message: e,
        })?;
        metadata
            .validate()
            .map_err(|e| CatalogError::InvalidInput {
                field: "AuthorMetadata".to_string(),
                message: e,
            })?;

        let mut tx = self.pool.begin().await?;

        let result = query(
            r#"
            UPDATE author_metadata
            SET foreign_author_id = ?, name = ?, sort_name = ?, overview = ?,
                status = ?, images = ?, rating = ?, rating_count = ?,
                updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&metadata.foreign_author_id)
        .bind(&metadata.name)
        .bind(&metadata.sort_name)
        .bind(&metadata.overview)
        .bind(&metadata.status)
        .bind(&metadata.images)
        .bind(metadata.rating)
        .bind(metadata.rating_count)
        .bind(metadata.updated_at)
        .bind(&metadata.id)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(CatalogError::NotFound {
                entity_type: "AuthorMetadata".to_string(),
                id: metadata.id.clone(),
            });
        }

        let result = query(
            r#"
            UPDATE authors
            SET foreign_author_id = ?, metadata_id = ?, root_folder_path = ?,
                monitored = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&author.foreign_author_id)
        .bind(&author.metadata_id)
        .bind(&author.root_folder_path)
        .bind(author.monitored)
        .bind(author.updated_at)
        .bind(&author.id)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(CatalogError::NotFound {
                entity_type: "Author".to_string(),
                id: author.id.clone(),
            });
        }

        tx.commit().await?;

        let persisted = query_as::<_, Author>("SELECT * FROM authors WHERE id = ?")
            .bind(&author.id)
            .fetch_one(&self.pool)
            .await?;

        Ok(persisted)
    }

    async fn delete(&self, id: &str, delete_files: bool, delete_from_disk: bool) -> Result<bool> {
        let mut tx = self.pool.begin().await?;

        let author = query_as::<_, Author>("SELECT * FROM authors WHERE id = ?")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;

        let Some(author) = author else {
            return Ok(false);
        };

        debug!(
            author_id = %id,
            foreign_author_id = %author.foreign_author_id,
            delete_files,
            delete_from_disk,
            "Deleting author from catalog"
        );

        if delete_files {
            query("DELETE FROM book_files WHERE author_id = ?")
                .bind(id)
                .execute(&mut *tx)
                .await?;
        }

        query("DELETE FROM books WHERE author_metadata_id = ?")
            .bind(&author.metadata_id)
            .execute(&mut *tx)
            .await?;

        query("DELETE FROM authors WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        query("DELETE FROM author_metadata WHERE id = ?")
            .bind(&author.metadata_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        debug!(author_id = %id, "Author deleted");
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::create_test_pool;

    fn new_author(foreign_id: &str, name: &str) -> (Author, AuthorMetadata) {
        let metadata = AuthorMetadata::new(foreign_id, name);
        let author = Author::new(foreign_id, metadata.id.clone(), "/books");
        (author, metadata)
    }

    #[tokio::test]
    async fn test_insert_and_find_author() {
        let pool = create_test_pool().await.unwrap();
        let repo = SqliteAuthorRepository::new(pool);

        let (author, mut metadata) = new_author("fa-1", "Jane Author");
        metadata.overview = Some("Wrote several novels".to_string());
        repo.insert(&author, &metadata).await.unwrap();

        let found = repo.find_by_id(&author.id).await.unwrap().unwrap();
        assert_eq!(found.foreign_author_id, "fa-1");
        assert_eq!(found.metadata_id, metadata.id);

        let found_meta = repo.get_metadata(&metadata.id).await.unwrap().unwrap();
        assert_eq!(found_meta.name, "Jane Author");
        assert_eq!(found_meta.overview.as_deref(), Some("Wrote several novels"));
    }

    #[tokio::test]
    async fn test_find_by_foreign_id_with_exclusion() {
        let pool = create_test_pool().await.unwrap();
        let repo = SqliteAuthorRepository::new(pool);

        let (author, metadata) = new_author("fa-1", "Jane Author");
        repo.insert(&author, &metadata).await.unwrap();

        // Lookup without exclusion finds the author
        let found = repo.find_by_foreign_id("fa-1", None).await.unwrap();
        assert_eq!(found.map(|a| a.id), Some(author.id.clone()));

        // Excluding the author itself yields no match
        let found = repo
            .find_by_foreign_id("fa-1", Some(&author.id))
            .await
            .unwrap();
        assert!(found.is_none());

        // Unknown foreign id yields no match
        let found = repo.find_by_foreign_id("fa-other", None).await.unwrap();
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn test_update_returns_persisted_copy() {
        let pool = create_test_pool().await.unwrap();
        let repo = SqliteAuthorRepository::new(pool);

        let (mut author, mut metadata) = new_author("fa-1", "Original Name");
        repo.insert(&author, &metadata).await.unwrap();

        author.foreign_author_id = "fa-2".to_string();
        metadata.foreign_author_id = "fa-2".to_string();
        metadata.name = "Updated Name".to_string();
        metadata.updated_at = chrono::Utc::now().timestamp();

        let persisted = repo.update(&author, &metadata).await.unwrap();
        assert_eq!(persisted.foreign_author_id, "fa-2");

        let found_meta = repo.get_metadata(&metadata.id).await.unwrap().unwrap();
        assert_eq!(found_meta.name, "Updated Name");
        assert_eq!(found_meta.foreign_author_id, "fa-2");
    }

    #[tokio::test]
    async fn test_update_missing_author_fails() {
        let pool = create_test_pool().await.unwrap();
        let repo = SqliteAuthorRepository::new(pool);

        let (author, metadata) = new_author("fa-1", "Jane Author");
        let result = repo.update(&author, &metadata).await;
        assert!(matches!(result, Err(CatalogError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_delete_author_removes_books_and_metadata() {
        let pool = create_test_pool().await.unwrap();
        let repo = SqliteAuthorRepository::new(pool.clone());

        let (author, metadata) = new_author("fa-1", "Jane Author");
        repo.insert(&author, &metadata).await.unwrap();

        let book = crate::models::Book::new("fb-1", metadata.id.clone(), "A Title");
        sqlx::query(
            "INSERT INTO books (id, foreign_book_id, author_metadata_id, title, rating_count, monitored, created_at, updated_at) \
             VALUES (?, ?, ?, ?, 0, 1, ?, ?)",
        )
        .bind(&book.id)
        .bind(&book.foreign_book_id)
        .bind(&book.author_metadata_id)
        .bind(&book.title)
        .bind(book.created_at)
        .bind(book.updated_at)
        .execute(&pool)
        .await
        .unwrap();

        let deleted = repo.delete(&author.id, true, false).await.unwrap();
        assert!(deleted);

        assert!(repo.find_by_id(&author.id).await.unwrap().is_none());
        assert!(repo.get_metadata(&metadata.id).await.unwrap().is_none());

        let (book_count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM books WHERE author_metadata_id = ?")
                .bind(&metadata.id)
                .fetch_one(&pool)
                .await
                .unwrap();
        assert_eq!(book_count, 0);
    }

    #[tokio::test]
    async fn test_delete_logs_below_warn() {
        use std::sync::atomic::{AtomicUsize, Ordering};
        use std::sync::Arc;
        use tracing_subscriber::layer::SubscriberExt;

        struct WarnCounter(Arc<AtomicUsize>);

        impl<S: tracing::Subscriber> tracing_subscriber::Layer<S> for WarnCounter {
            fn on_event(
                &self,
                event: &tracing::Event<'_>,
                _ctx: tracing_subscriber::layer::Context<'_, S>,
            ) {
                if *event.metadata().level() <= tracing::Level::WARN {
                    self.0.fetch_add(1, Ordering::SeqCst);
                }
            }
        }

        let pool = create_test_pool().await.unwrap();
        let repo = SqliteAuthorRepository::new(pool);
        let (author, metadata) = new_author("fa-1", "Jane Author");
        repo.insert(&author, &metadata).await.unwrap();

        // Warning/error severity on deletes belongs to the refresh
        // workflow; the store itself must stay below warn
        let warnings = Arc::new(AtomicUsize::new(0));
        let subscriber = tracing_subscriber::registry().with(WarnCounter(warnings.clone()));
        let _guard = tracing::subscriber::set_default(subscriber);

        let deleted = repo.delete(&author.id, true, false).await.unwrap();
        assert!(deleted);
        assert_eq!(warnings.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_delete_missing_author_returns_false() {
        let pool = create_test_pool().await.unwrap();
        let repo = SqliteAuthorRepository::new(pool);

        let deleted = repo.delete("no-such-id", false, false).await.unwrap();
        assert!(!deleted);
    }

    #[tokio::test]
    async fn test_insert_validation() {
        let pool = create_test_pool().await.unwrap();
        let repo = SqliteAuthorRepository::new(pool);

        let (author, mut metadata) = new_author("fa-1", "Jane Author");
        metadata.name = String::new();

        let result = repo.insert(&author, &metadata).await;
        assert!(matches!(result, Err(CatalogError::InvalidInput { .. })));
    }
}
