//! # Book Reconciler
//!
//! Diffs the provider's book list for an author against the locally
//! retained set and applies inserts and updates. Deliberately
//! non-destructive: books that vanished from the remote list are left
//! untouched, because a flaky or partial remote response must never cause
//! silent data loss. Removal is a separate, user-triggered operation.

use crate::error::Result;
use core_catalog::models::{Author, Book};
use core_catalog::repositories::{BookRepository, ExclusionRepository, HistoryRepository};
use core_metadata::profile::MetadataProfile;
use core_metadata::provider::RemoteBook;
use core_runtime::events::{BookEvent, CoreEvent, EventBus};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Counts of reconciliation side effects
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileStats {
    pub inserted: usize,
    pub updated: usize,
}

/// Reconciles remote book lists against the local catalog
pub struct BookReconciler {
    books: Arc<dyn BookRepository>,
    history: Arc<dyn HistoryRepository>,
    exclusions: Arc<dyn ExclusionRepository>,
    profile: MetadataProfile,
    event_bus: EventBus,
}

impl BookReconciler {
    /// Create a new book reconciler
    pub fn new(
        books: Arc<dyn BookRepository>,
        history: Arc<dyn HistoryRepository>,
        exclusions: Arc<dyn ExclusionRepository>,
        profile: MetadataProfile,
        event_bus: EventBus,
    ) -> Self {
        Self {
            books,
            history,
            exclusions,
            profile,
            event_bus,
        }
    }

    /// Apply the remote book list to the author's local set.
    ///
    /// Inserts and updates are each submitted as a single batch, so
    /// reconciling N books is not N round trips to storage.
    #[instrument(skip(self, remote_books), fields(author_id = %author.id))]
    pub async fn reconcile(
        &self,
        author: &Author,
        remote_books: &[RemoteBook],
    ) -> Result<ReconcileStats> {
        let now = chrono::Utc::now().timestamp();

        // User exclusions apply to both sides of the diff: an excluded book
        // is neither re-inserted nor refreshed
        let mut excluded = self.exclusions.foreign_ids().await?;
        excluded.extend(self.history.removed_foreign_book_ids(&author.id).await?);

        let eligible: Vec<&RemoteBook> = remote_books
            .iter()
            .filter(|b| self.profile.allows(b, now))
            .filter(|b| !excluded.contains(&b.foreign_book_id))
            .collect();

        let local = self.books.get_for_refresh(&author.id, &excluded).await?;
        let local_by_foreign_id: HashMap<&str, &Book> = local
            .iter()
            .map(|b| (b.foreign_book_id.as_str(), b))
            .collect();

        let mut inserts: Vec<Book> = Vec::new();
        let mut updates: Vec<Book> = Vec::new();

        for remote in eligible {
            let candidate = remote.to_book(author.metadata_id.clone());
            match local_by_foreign_id.get(remote.foreign_book_id.as_str()) {
                None => inserts.push(candidate),
                Some(stored) => {
                    if stored.differs_from(&candidate) {
                        let mut updated = (*stored).clone();
                        updated.apply(&candidate);
                        updates.push(updated);
                    }
                }
            }
        }

        debug!(
            remote = remote_books.len(),
            local = local.len(),
            inserts = inserts.len(),
            updates = updates.len(),
            "Computed book reconciliation diff"
        );

        self.books.insert_many(&inserts).await?;
        self.books.update_many(&updates).await?;

        if !inserts.is_empty() {
            self.event_bus
                .emit(CoreEvent::Book(BookEvent::Added {
                    author_id: author.id.clone(),
                    count: inserts.len(),
                }))
                .ok();
        }
        if !updates.is_empty() {
            self.event_bus
                .emit(CoreEvent::Book(BookEvent::Updated {
                    author_id: author.id.clone(),
                    count: updates.len(),
                }))
                .ok();
        }

        let stats = ReconcileStats {
            inserted: inserts.len(),
            updated: updates.len(),
        };

        if stats.inserted > 0 || stats.updated > 0 {
            info!(
                inserted = stats.inserted,
                updated = stats.updated,
                "Reconciled books"
            );
        }

        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{
        author_with_foreign_id, remote_book, MockBookRepo, MockExclusionRepo, MockHistoryRepo,
    };

    fn reconciler(
        books: MockBookRepo,
        history: MockHistoryRepo,
        exclusions: MockExclusionRepo,
        profile: MetadataProfile,
    ) -> BookReconciler {
        BookReconciler::new(
            Arc::new(books),
            Arc::new(history),
            Arc::new(exclusions),
            profile,
            EventBus::default(),
        )
    }

    fn no_exclusions() -> (MockHistoryRepo, MockExclusionRepo) {
        let mut history = MockHistoryRepo::new();
        history
            .expect_removed_foreign_book_ids()
            .returning(|_| Ok(vec![]));
        let mut exclusions = MockExclusionRepo::new();
        exclusions.expect_foreign_ids().returning(|| Ok(vec![]));
        (history, exclusions)
    }

    #[tokio::test]
    async fn test_new_books_inserted_as_batch() {
        let (author, metadata) = author_with_foreign_id("fa-1");
        let (history, exclusions) = no_exclusions();

        let mut books = MockBookRepo::new();
        books.expect_get_for_refresh().returning(|_, _| Ok(vec![]));
        let meta_id = metadata.id.clone();
        books
            .expect_insert_many()
            .withf(move |batch| {
                batch.len() == 2 && batch.iter().all(|b| b.author_metadata_id == meta_id)
            })
            .times(1)
            .returning(|_| Ok(()));
        books
            .expect_update_many()
            .withf(|batch| batch.is_empty())
            .times(1)
            .returning(|_| Ok(()));

        let reconciler = reconciler(books, history, exclusions, MetadataProfile::default());
        let stats = reconciler
            .reconcile(&author, &[remote_book("fb-1", "One"), remote_book("fb-2", "Two")])
            .await
            .unwrap();

        assert_eq!(stats, ReconcileStats { inserted: 2, updated: 0 });
    }

    #[tokio::test]
    async fn test_changed_books_updated_unchanged_skipped() {
        let (author, metadata) = author_with_foreign_id("fa-1");
        let (history, exclusions) = no_exclusions();

        // fb-1 matches the remote copy exactly, fb-2 has a stale title
        let same = remote_book("fb-1", "Same").to_book(metadata.id.clone());
        let mut stale = remote_book("fb-2", "New Title").to_book(metadata.id.clone());
        stale.title = "Old Title".to_string();
        let stale_id = stale.id.clone();

        let local = vec![same, stale];
        let mut books = MockBookRepo::new();
        books
            .expect_get_for_refresh()
            .returning(move |_, _| Ok(local.clone()));
        books
            .expect_insert_many()
            .withf(|batch| batch.is_empty())
            .times(1)
            .returning(|_| Ok(()));
        books
            .expect_update_many()
            .withf(move |batch| {
                batch.len() == 1 && batch[0].id == stale_id && batch[0].title == "New Title"
            })
            .times(1)
            .returning(|_| Ok(()));

        let reconciler = reconciler(books, history, exclusions, MetadataProfile::default());
        let stats = reconciler
            .reconcile(
                &author,
                &[remote_book("fb-1", "Same"), remote_book("fb-2", "New Title")],
            )
            .await
            .unwrap();

        assert_eq!(stats, ReconcileStats { inserted: 0, updated: 1 });
    }

    #[tokio::test]
    async fn test_locally_vanished_books_left_untouched() {
        let (author, metadata) = author_with_foreign_id("fa-1");
        let (history, exclusions) = no_exclusions();

        let orphan = remote_book("fb-gone", "No Longer Remote").to_book(metadata.id.clone());
        let local = vec![orphan];

        let mut books = MockBookRepo::new();
        books
            .expect_get_for_refresh()
            .returning(move |_, _| Ok(local.clone()));
        books
            .expect_insert_many()
            .withf(|batch| batch.is_empty())
            .returning(|_| Ok(()));
        // The vanished book must not appear in any write
        books
            .expect_update_many()
            .withf(|batch| batch.is_empty())
            .returning(|_| Ok(()));

        let reconciler = reconciler(books, history, exclusions, MetadataProfile::default());
        let stats = reconciler.reconcile(&author, &[]).await.unwrap();
        assert_eq!(stats, ReconcileStats::default());
    }

    #[tokio::test]
    async fn test_excluded_books_never_reinserted() {
        let (author, _) = author_with_foreign_id("fa-1");

        let mut history = MockHistoryRepo::new();
        history
            .expect_removed_foreign_book_ids()
            .returning(|_| Ok(vec!["fb-removed".to_string()]));
        let mut exclusions = MockExclusionRepo::new();
        exclusions
            .expect_foreign_ids()
            .returning(|| Ok(vec!["fb-banned".to_string()]));

        let mut books = MockBookRepo::new();
        books
            .expect_get_for_refresh()
            .withf(|_, excluded| {
                excluded.contains(&"fb-banned".to_string())
                    && excluded.contains(&"fb-removed".to_string())
            })
            .returning(|_, _| Ok(vec![]));
        books
            .expect_insert_many()
            .withf(|batch| batch.len() == 1 && batch[0].foreign_book_id == "fb-kept")
            .times(1)
            .returning(|_| Ok(()));
        books.expect_update_many().returning(|_| Ok(()));

        let reconciler = reconciler(books, history, exclusions, MetadataProfile::default());
        let stats = reconciler
            .reconcile(
                &author,
                &[
                    remote_book("fb-banned", "Banned"),
                    remote_book("fb-removed", "Removed"),
                    remote_book("fb-kept", "Kept"),
                ],
            )
            .await
            .unwrap();

        assert_eq!(stats.inserted, 1);
    }

    #[tokio::test]
    async fn test_profile_filters_remote_books() {
        let (author, _) = author_with_foreign_id("fa-1");
        let (history, exclusions) = no_exclusions();

        let profile = MetadataProfile {
            allowed_release_types: vec!["novel".to_string()],
            ..Default::default()
        };

        let mut books = MockBookRepo::new();
        books.expect_get_for_refresh().returning(|_, _| Ok(vec![]));
        books
            .expect_insert_many()
            .withf(|batch| batch.len() == 1 && batch[0].foreign_book_id == "fb-novel")
            .times(1)
            .returning(|_| Ok(()));
        books.expect_update_many().returning(|_| Ok(()));

        let mut novel = remote_book("fb-novel", "A Novel");
        novel.release_type = Some("novel".to_string());
        let mut anthology = remote_book("fb-anthology", "An Anthology");
        anthology.release_type = Some("anthology".to_string());

        let reconciler = reconciler(books, history, exclusions, profile);
        let stats = reconciler.reconcile(&author, &[novel, anthology]).await.unwrap();
        assert_eq!(stats.inserted, 1);
    }

    #[tokio::test]
    async fn test_events_emitted_for_changes() {
        let (author, _) = author_with_foreign_id("fa-1");
        let (history, exclusions) = no_exclusions();

        let mut books = MockBookRepo::new();
        books.expect_get_for_refresh().returning(|_, _| Ok(vec![]));
        books.expect_insert_many().returning(|_| Ok(()));
        books.expect_update_many().returning(|_| Ok(()));

        let event_bus = EventBus::default();
        let mut sub = event_bus.subscribe();

        let reconciler = BookReconciler::new(
            Arc::new(books),
            Arc::new(history),
            Arc::new(exclusions),
            MetadataProfile::default(),
            event_bus,
        );

        reconciler
            .reconcile(&author, &[remote_book("fb-1", "One")])
            .await
            .unwrap();

        let event = sub.try_recv().unwrap();
        assert!(matches!(
            event,
            CoreEvent::Book(BookEvent::Added { count: 1, .. })
        ));
        assert!(sub.try_recv().is_err(), "no update event without updates");
    }
}
