//! Metadata provider abstraction
//!
//! The provider owns author and book identity: every refresh resolves the
//! locally stored foreign id against it and treats the response as the
//! source of truth for descriptive fields.

use crate::error::Result;
use async_trait::async_trait;
use core_catalog::models::{AuthorMetadata, Book};
use serde::{Deserialize, Serialize};

/// Author payload as returned by the metadata provider.
///
/// `foreign_author_id` is the id the provider resolved the request to. When
/// the provider has merged or renumbered the author it differs from the id
/// that was asked for.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteAuthor {
    pub foreign_author_id: String,
    pub name: String,
    pub sort_name: Option<String>,
    pub overview: Option<String>,
    pub status: String,
    pub images: Vec<String>,
    pub rating: Option<f64>,
    pub rating_count: i64,
    pub books: Vec<RemoteBook>,
}

/// Book payload as returned by the metadata provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteBook {
    pub foreign_book_id: String,
    pub title: String,
    pub title_slug: Option<String>,
    pub overview: Option<String>,
    /// Release date as Unix timestamp; `None` means unreleased or unknown
    pub release_date: Option<i64>,
    /// Provider release type ("novel", "novella", "anthology", ...)
    pub release_type: Option<String>,
    pub rating: Option<f64>,
    pub rating_count: i64,
}

impl RemoteAuthor {
    /// Build a fresh metadata record from this payload. The caller decides
    /// whether to persist it as-is or `apply` it onto a stored record.
    pub fn to_metadata(&self) -> AuthorMetadata {
        let mut metadata = AuthorMetadata::new(&self.foreign_author_id, &self.name);
        metadata.sort_name = self.sort_name.clone();
        metadata.overview = self.overview.clone();
        metadata.status = self.status.clone();
        metadata.images = if self.images.is_empty() {
            None
        } else {
            serde_json::to_string(&self.images).ok()
        };
        metadata.rating = self.rating;
        metadata.rating_count = self.rating_count;
        metadata
    }
}

impl RemoteBook {
    /// Build a book record owned by the given metadata record.
    pub fn to_book(&self, author_metadata_id: impl Into<String>) -> Book {
        let mut book = Book::new(&self.foreign_book_id, author_metadata_id, &self.title);
        book.title_slug = self.title_slug.clone();
        book.overview = self.overview.clone();
        book.release_date = self.release_date;
        book.rating = self.rating;
        book.rating_count = self.rating_count;
        book
    }
}

/// Read-only gateway to the external metadata provider.
///
/// Implementations must not cache across calls: a refresh needs the
/// provider's current view, staleness here defeats reconciliation.
#[async_trait]
pub trait MetadataProvider: Send + Sync {
    /// Resolve an author by foreign id, returning the provider's current
    /// identity, descriptive fields, and full book list.
    ///
    /// # Errors
    /// Returns [`ProviderError::NotFound`](crate::error::ProviderError::NotFound)
    /// when the provider positively reports the id unknown; transport and
    /// protocol failures map to the other variants.
    async fn resolve_author(&self, foreign_author_id: &str) -> Result<RemoteAuthor>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn remote_author() -> RemoteAuthor {
        RemoteAuthor {
            foreign_author_id: "fa-1".to_string(),
            name: "Jane Author".to_string(),
            sort_name: Some("Author, Jane".to_string()),
            overview: Some("Bio".to_string()),
            status: "active".to_string(),
            images: vec!["https://img.example/1.jpg".to_string()],
            rating: Some(4.1),
            rating_count: 37,
            books: vec![],
        }
    }

    #[test]
    fn test_to_metadata_maps_fields() {
        let remote = remote_author();
        let metadata = remote.to_metadata();

        assert_eq!(metadata.foreign_author_id, "fa-1");
        assert_eq!(metadata.name, "Jane Author");
        assert_eq!(metadata.sort_name.as_deref(), Some("Author, Jane"));
        assert_eq!(metadata.rating, Some(4.1));
        assert_eq!(metadata.rating_count, 37);

        let images: Vec<String> =
            serde_json::from_str(metadata.images.as_deref().unwrap()).unwrap();
        assert_eq!(images, vec!["https://img.example/1.jpg".to_string()]);
    }

    #[test]
    fn test_to_metadata_empty_images() {
        let mut remote = remote_author();
        remote.images.clear();
        assert!(remote.to_metadata().images.is_none());
    }

    #[test]
    fn test_to_book_sets_owner() {
        let remote = RemoteBook {
            foreign_book_id: "fb-1".to_string(),
            title: "A Title".to_string(),
            title_slug: Some("a-title".to_string()),
            overview: None,
            release_date: Some(1_700_000_000),
            release_type: Some("novel".to_string()),
            rating: None,
            rating_count: 0,
        };

        let book = remote.to_book("meta-1");
        assert_eq!(book.author_metadata_id, "meta-1");
        assert_eq!(book.foreign_book_id, "fb-1");
        assert_eq!(book.title_slug.as_deref(), Some("a-title"));
        assert_eq!(book.release_date, Some(1_700_000_000));
        assert!(book.monitored);
    }
}
