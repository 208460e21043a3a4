//! # Merge Coordinator
//!
//! When a refresh discovers that an author's new foreign id already belongs
//! to another local author, the two records are merged: the superseded
//! author's books and author-level associations move to the surviving
//! author, then the superseded record is removed.
//!
//! ## Ordering
//!
//! The steps run in a fixed order because each protects the next:
//! 1. Fetch every book owned by the superseded author.
//! 2. Re-point the fetched books and the author-level associations (files,
//!    history) to the surviving author, as batch operations.
//! 3. Delete the superseded record (soft removal, never touching disk).
//! 4. Persist the surviving author with metadata from the refresh payload.
//!
//! Step 3 must not run when step 2 fails partway; deleting after a partial
//! re-point would orphan the remaining books irrecoverably.

use crate::error::{RefreshError, Result};
use core_catalog::models::Author;
use core_catalog::repositories::{
    AuthorRepository, BookFileRepository, BookRepository, HistoryRepository,
};
use core_metadata::provider::RemoteAuthor;
use core_runtime::events::{AuthorEvent, CoreEvent, EventBus};
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// Coordinates author merges after identity collisions
pub struct MergeCoordinator {
    authors: Arc<dyn AuthorRepository>,
    books: Arc<dyn BookRepository>,
    book_files: Arc<dyn BookFileRepository>,
    history: Arc<dyn HistoryRepository>,
    event_bus: EventBus,
}

impl MergeCoordinator {
    /// Create a new merge coordinator
    pub fn new(
        authors: Arc<dyn AuthorRepository>,
        books: Arc<dyn BookRepository>,
        book_files: Arc<dyn BookFileRepository>,
        history: Arc<dyn HistoryRepository>,
        event_bus: EventBus,
    ) -> Self {
        Self {
            authors,
            books,
            book_files,
            history,
            event_bus,
        }
    }

    /// Merge `superseded` into `surviving`, applying metadata from the
    /// refresh payload to the surviving record.
    ///
    /// Returns the persisted surviving author.
    ///
    /// # Errors
    /// Returns [`RefreshError::MergeIntegrity`] if the batch re-point fails;
    /// the superseded author is guaranteed to still exist in that case.
    #[instrument(skip(self, incoming), fields(superseded = %superseded.id, surviving = %surviving.id))]
    pub async fn merge(
        &self,
        superseded: &Author,
        surviving: &Author,
        incoming: &RemoteAuthor,
    ) -> Result<Author> {
        warn!(
            superseded_foreign_id = %superseded.foreign_author_id,
            surviving_foreign_id = %surviving.foreign_author_id,
            "Merging author records after identity collision"
        );

        // Step 1: everything the superseded author owns
        let mut books = self
            .books
            .get_by_author_metadata(&superseded.metadata_id)
            .await?;

        // Step 2: re-point books and author-level associations, all before
        // the delete so a failure leaves the superseded record intact
        for book in &mut books {
            book.author_metadata_id = surviving.metadata_id.clone();
        }

        self.books
            .update_many(&books)
            .await
            .map_err(|e| self.integrity_error(superseded, surviving, e))?;

        self.book_files
            .reassign_author(&superseded.id, &surviving.id)
            .await
            .map_err(|e| self.integrity_error(superseded, surviving, e))?;

        self.history
            .reassign_author(&superseded.id, &surviving.id)
            .await
            .map_err(|e| self.integrity_error(superseded, surviving, e))?;

        debug!(moved_books = books.len(), "Re-pointed superseded author's records");

        // Step 3: soft removal of the superseded record
        self.authors.delete(&superseded.id, false, false).await?;

        // Step 4: surviving author takes the refresh payload's metadata
        let mut metadata = self
            .authors
            .get_metadata(&surviving.metadata_id)
            .await?
            .ok_or_else(|| core_catalog::CatalogError::NotFound {
                entity_type: "AuthorMetadata".to_string(),
                id: surviving.metadata_id.clone(),
            })?;
        metadata.apply(&incoming.to_metadata());

        let mut surviving = surviving.clone();
        surviving.updated_at = chrono::Utc::now().timestamp();
        let persisted = self.authors.update(&surviving, &metadata).await?;

        self.event_bus
            .emit(CoreEvent::Author(AuthorEvent::Merged {
                superseded_id: superseded.id.clone(),
                surviving_id: persisted.id.clone(),
            }))
            .ok();

        Ok(persisted)
    }

    fn integrity_error(
        &self,
        superseded: &Author,
        surviving: &Author,
        source: core_catalog::CatalogError,
    ) -> RefreshError {
        RefreshError::MergeIntegrity {
            superseded_id: superseded.id.clone(),
            surviving_id: surviving.id.clone(),
            reason: source.to_string(),
        }
    }
}
