//! # Refresh Orchestrator
//!
//! Top-level workflow for refreshing one author against the metadata
//! provider.
//!
//! ## Workflow
//!
//! 1. Load the local author by id (failure here is a caller error)
//! 2. Resolve the author's current foreign id against the provider
//!    - Not-found upstream triggers the delete-or-preserve branch: the
//!      author is removed when no local files reference it, otherwise it is
//!      kept untouched as an orphan
//! 3. Resolve identity drift (unchanged / changed / collision)
//! 4. Persist metadata, merging colliding records when needed. Identity
//!    changes use a two-commit protocol: the author is persisted with its
//!    new identity before book reconciliation and again after, so a crash
//!    mid-reconciliation never leaves books half-associated with an
//!    unrecorded identity
//! 5. Reconcile the remote book list (non-destructive inserts/updates)
//! 6. Publish a refresh-complete notification
//!
//! Steps are strictly sequential; durability comes from committing each
//! step before proceeding, not from cross-step locks. Refreshes of
//! different authors may run concurrently.

use crate::error::{RefreshError, Result};
use crate::identity::{IdentityOutcome, IdentityResolver};
use crate::merge::MergeCoordinator;
use crate::reconcile::BookReconciler;
use core_catalog::models::Author;
use core_catalog::repositories::{
    AuthorRepository, BookFileRepository, BookRepository, ExclusionRepository, HistoryRepository,
};
use core_catalog::CatalogError;
use core_metadata::profile::MetadataProfile;
use core_metadata::provider::{MetadataProvider, RemoteAuthor};
use core_runtime::events::{AuthorEvent, CoreEvent, EventBus};
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};

/// Terminal outcome of one refresh invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// The author was refreshed (metadata changed or not)
    Completed,
    /// The remote entity vanished and the author was removed
    Removed,
    /// The remote entity vanished but local files reference the author, so
    /// it was preserved untouched
    Preserved,
}

/// Orchestrates author refresh operations
pub struct RefreshOrchestrator {
    authors: Arc<dyn AuthorRepository>,
    book_files: Arc<dyn BookFileRepository>,
    provider: Arc<dyn MetadataProvider>,
    identity: IdentityResolver,
    merge: MergeCoordinator,
    reconciler: BookReconciler,
    event_bus: EventBus,
}

impl RefreshOrchestrator {
    /// Create a new refresh orchestrator wired to the given stores,
    /// provider, and event bus.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        authors: Arc<dyn AuthorRepository>,
        books: Arc<dyn BookRepository>,
        book_files: Arc<dyn BookFileRepository>,
        history: Arc<dyn HistoryRepository>,
        exclusions: Arc<dyn ExclusionRepository>,
        provider: Arc<dyn MetadataProvider>,
        profile: MetadataProfile,
        event_bus: EventBus,
    ) -> Self {
        let identity = IdentityResolver::new(Arc::clone(&authors));
        let merge = MergeCoordinator::new(
            Arc::clone(&authors),
            Arc::clone(&books),
            Arc::clone(&book_files),
            Arc::clone(&history),
            event_bus.clone(),
        );
        let reconciler = BookReconciler::new(
            books,
            history,
            exclusions,
            profile,
            event_bus.clone(),
        );

        Self {
            authors,
            book_files,
            provider,
            identity,
            merge,
            reconciler,
            event_bus,
        }
    }

    /// Refresh one author against the metadata provider.
    ///
    /// # Errors
    /// - [`RefreshError::AuthorNotFound`] when the local record is missing
    /// - [`RefreshError::Provider`] for provider failures other than
    ///   not-found (not-found resolves to `Removed` or `Preserved`)
    /// - [`RefreshError::MergeIntegrity`] when a collision merge fails
    /// - [`RefreshError::Catalog`] for store failures
    #[instrument(skip(self))]
    pub async fn refresh(&self, author_id: &str) -> Result<RefreshOutcome> {
        let author = self
            .authors
            .find_by_id(author_id)
            .await?
            .ok_or_else(|| RefreshError::AuthorNotFound {
                author_id: author_id.to_string(),
            })?;

        debug!(foreign_author_id = %author.foreign_author_id, "Starting author refresh");

        let remote = match self.provider.resolve_author(&author.foreign_author_id).await {
            Ok(remote) => remote,
            Err(e) if e.is_not_found() => return self.handle_missing_upstream(&author).await,
            Err(e) => {
                error!(
                    author_id = %author.id,
                    error = %e,
                    "Provider request failed during refresh"
                );
                return Err(e.into());
            }
        };

        let outcome = self.identity.resolve(&author, &remote.foreign_author_id).await?;

        let author = match outcome {
            IdentityOutcome::Unchanged => self.refresh_in_place(author, &remote).await?,
            IdentityOutcome::ChangedNoCollision => {
                self.refresh_with_new_identity(author, &remote).await?
            }
            IdentityOutcome::ChangedCollision(existing) => {
                let surviving = self.merge.merge(&author, &existing, &remote).await?;
                self.reconciler.reconcile(&surviving, &remote.books).await?;
                self.persist(surviving).await?
            }
        };

        self.event_bus
            .emit(CoreEvent::Author(AuthorEvent::RefreshComplete {
                author_id: author.id.clone(),
            }))
            .ok();

        info!(author_id = %author.id, "Author refresh complete");
        Ok(RefreshOutcome::Completed)
    }

    /// Same-identity path: persist metadata only when a field differs, then
    /// reconcile books.
    async fn refresh_in_place(&self, author: Author, remote: &RemoteAuthor) -> Result<Author> {
        let mut stored = self.load_metadata(&author).await?;
        let incoming = remote.to_metadata();

        let author = if stored.differs_from(&incoming) {
            stored.apply(&incoming);
            let mut author = author;
            author.updated_at = chrono::Utc::now().timestamp();
            let persisted = self.authors.update(&author, &stored).await?;

            self.event_bus
                .emit(CoreEvent::Author(AuthorEvent::Updated {
                    author_id: persisted.id.clone(),
                }))
                .ok();
            persisted
        } else {
            debug!(author_id = %author.id, "Author metadata unchanged, skipping write");
            author
        };

        self.reconciler.reconcile(&author, &remote.books).await?;
        Ok(author)
    }

    /// Identity-change path without collision: two commits bracket the book
    /// reconciliation.
    async fn refresh_with_new_identity(
        &self,
        author: Author,
        remote: &RemoteAuthor,
    ) -> Result<Author> {
        info!(
            author_id = %author.id,
            old = %author.foreign_author_id,
            new = %remote.foreign_author_id,
            "Persisting author under new foreign id"
        );

        let mut stored = self.load_metadata(&author).await?;
        stored.apply(&remote.to_metadata());

        let mut author = author;
        author.foreign_author_id = remote.foreign_author_id.clone();
        author.updated_at = chrono::Utc::now().timestamp();

        // First commit: identity change is durable before books move
        let author = self.authors.update(&author, &stored).await?;

        self.event_bus
            .emit(CoreEvent::Author(AuthorEvent::Updated {
                author_id: author.id.clone(),
            }))
            .ok();

        self.reconciler.reconcile(&author, &remote.books).await?;

        // Second commit: finalize post-reconciliation state
        self.persist(author).await
    }

    /// Delete-or-preserve branch for authors the provider no longer knows.
    async fn handle_missing_upstream(&self, author: &Author) -> Result<RefreshOutcome> {
        error!(
            author_id = %author.id,
            foreign_author_id = %author.foreign_author_id,
            "Metadata provider no longer resolves author"
        );

        let file_count = self.book_files.count_by_author(&author.id).await?;

        if file_count == 0 {
            warn!(
                author_id = %author.id,
                "Removing author and its books; no local files reference it"
            );
            self.authors.delete(&author.id, true, false).await?;

            self.event_bus
                .emit(CoreEvent::Author(AuthorEvent::Removed {
                    author_id: author.id.clone(),
                    foreign_author_id: author.foreign_author_id.clone(),
                }))
                .ok();

            return Ok(RefreshOutcome::Removed);
        }

        error!(
            author_id = %author.id,
            files = file_count,
            "Author retained as orphan; local files still reference it, refresh skipped"
        );
        Ok(RefreshOutcome::Preserved)
    }

    async fn load_metadata(
        &self,
        author: &Author,
    ) -> Result<core_catalog::models::AuthorMetadata> {
        let metadata = self
            .authors
            .get_metadata(&author.metadata_id)
            .await?
            .ok_or_else(|| CatalogError::NotFound {
                entity_type: "AuthorMetadata".to_string(),
                id: author.metadata_id.clone(),
            })?;
        Ok(metadata)
    }

    /// Re-persist an author with its current metadata, refreshing the
    /// updated-at stamp.
    async fn persist(&self, mut author: Author) -> Result<Author> {
        let metadata = self.load_metadata(&author).await?;
        author.updated_at = chrono::Utc::now().timestamp();
        Ok(self.authors.update(&author, &metadata).await?)
    }
}
