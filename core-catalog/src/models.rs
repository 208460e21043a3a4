//! Domain models for the book catalog
//!
//! This module contains rich domain models with validation and database
//! mapping. Identity keys come in two flavors: local ids (UUID strings,
//! stable, never reused) and foreign ids (owned by the external metadata
//! provider, mutable because the provider can renumber or merge entities).

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// History event type recorded when a user removes a book from the catalog.
/// Books with such a record are excluded from re-insertion on refresh.
pub const HISTORY_EVENT_BOOK_REMOVED: &str = "book_removed";

fn now_timestamp() -> i64 {
    chrono::Utc::now().timestamp()
}

// =============================================================================
// Author
// =============================================================================

/// Local author record.
///
/// `foreign_author_id` is the provider's identity key and can change across
/// refreshes; `metadata_id` points at the [`AuthorMetadata`] row this author
/// owns and stays stable for the life of the record so book ownership
/// references survive identity drift.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Author {
    /// Local identifier (stable, never reused)
    pub id: String,
    /// The provider's identifier for this author (mutable identity key)
    pub foreign_author_id: String,
    /// Reference to the owned metadata record
    pub metadata_id: String,
    /// Root folder this author's files live under
    pub root_folder_path: String,
    /// Whether new books should be monitored
    pub monitored: bool,
    /// When first added
    pub created_at: i64,
    /// Last update time
    pub updated_at: i64,
}

impl Author {
    /// Create a new author owning the given metadata record.
    pub fn new(
        foreign_author_id: impl Into<String>,
        metadata_id: impl Into<String>,
        root_folder_path: impl Into<String>,
    ) -> Self {
        let now = now_timestamp();
        Self {
            id: Uuid::new_v4().to_string(),
            foreign_author_id: foreign_author_id.into(),
            metadata_id: metadata_id.into(),
            root_folder_path: root_folder_path.into(),
            monitored: true,
            created_at: now,
            updated_at: now,
        }
    }

    /// Validate author data
    pub fn validate(&self) -> Result<(), String> {
        if self.foreign_author_id.trim().is_empty() {
            return Err("Author foreign id cannot be empty".to_string());
        }

        if self.metadata_id.trim().is_empty() {
            return Err("Author metadata reference cannot be empty".to_string());
        }

        if self.root_folder_path.trim().is_empty() {
            return Err("Author root folder path cannot be empty".to_string());
        }

        Ok(())
    }
}

// =============================================================================
// AuthorMetadata
// =============================================================================

/// Descriptive metadata owned by exactly one [`Author`] at a time.
///
/// Replaced wholesale during refresh: every descriptive field and the
/// foreign id are overwritten, while the local `id` (and therefore book
/// ownership references) survives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct AuthorMetadata {
    /// Local identifier (stable across refreshes)
    pub id: String,
    /// The provider's identifier for this metadata record
    pub foreign_author_id: String,
    /// Author display name
    pub name: String,
    /// Name used for sorting (usually "Last, First")
    pub sort_name: Option<String>,
    /// Biography / overview text
    pub overview: Option<String>,
    /// Provider-reported status ("active", "deceased", ...)
    pub status: String,
    /// JSON-encoded list of image URLs
    pub images: Option<String>,
    /// Average rating from the provider
    pub rating: Option<f64>,
    /// Number of ratings backing the average
    pub rating_count: i64,
    /// Timestamps
    pub created_at: i64,
    pub updated_at: i64,
}

impl AuthorMetadata {
    /// Create a new metadata record with a fresh local id.
    pub fn new(foreign_author_id: impl Into<String>, name: impl Into<String>) -> Self {
        let now = now_timestamp();
        Self {
            id: Uuid::new_v4().to_string(),
            foreign_author_id: foreign_author_id.into(),
            name: name.into(),
            sort_name: None,
            overview: None,
            status: "active".to_string(),
            images: None,
            rating: None,
            rating_count: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Validate metadata
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("Author name cannot be empty".to_string());
        }

        if self.foreign_author_id.trim().is_empty() {
            return Err("Metadata foreign id cannot be empty".to_string());
        }

        if let Some(rating) = self.rating {
            if !(0.0..=10.0).contains(&rating) {
                return Err(format!("Rating {} is out of valid range", rating));
            }
        }

        Ok(())
    }

    /// Field-wise comparison ignoring synthetic ids and timestamps.
    ///
    /// Returns true when a refresh needs to persist this record because any
    /// provider-owned field differs.
    pub fn differs_from(&self, other: &AuthorMetadata) -> bool {
        self.foreign_author_id != other.foreign_author_id
            || self.name != other.name
            || self.sort_name != other.sort_name
            || self.overview != other.overview
            || self.status != other.status
            || self.images != other.images
            || self.rating != other.rating
            || self.rating_count != other.rating_count
    }

    /// Overwrite all provider-owned fields from `incoming`, keeping the
    /// local id and creation timestamp.
    pub fn apply(&mut self, incoming: &AuthorMetadata) {
        self.foreign_author_id = incoming.foreign_author_id.clone();
        self.name = incoming.name.clone();
        self.sort_name = incoming.sort_name.clone();
        self.overview = incoming.overview.clone();
        self.status = incoming.status.clone();
        self.images = incoming.images.clone();
        self.rating = incoming.rating;
        self.rating_count = incoming.rating_count;
        self.updated_at = now_timestamp();
    }
}

// =============================================================================
// Book
// =============================================================================

/// A book belonging to exactly one author, keyed by the owning author's
/// metadata id. The foreign book id is unique within one owner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Book {
    /// Local identifier
    pub id: String,
    /// The provider's identifier for this book
    pub foreign_book_id: String,
    /// Owning author's metadata id
    pub author_metadata_id: String,
    /// Book title
    pub title: String,
    /// URL-safe slug derived from the title
    pub title_slug: Option<String>,
    /// Description text
    pub overview: Option<String>,
    /// Release date (Unix timestamp)
    pub release_date: Option<i64>,
    /// Average rating from the provider
    pub rating: Option<f64>,
    /// Number of ratings backing the average
    pub rating_count: i64,
    /// Local user state, preserved across refreshes
    pub monitored: bool,
    /// Timestamps
    pub created_at: i64,
    pub updated_at: i64,
}

impl Book {
    /// Create a new book owned by the given metadata record.
    pub fn new(
        foreign_book_id: impl Into<String>,
        author_metadata_id: impl Into<String>,
        title: impl Into<String>,
    ) -> Self {
        let now = now_timestamp();
        Self {
            id: Uuid::new_v4().to_string(),
            foreign_book_id: foreign_book_id.into(),
            author_metadata_id: author_metadata_id.into(),
            title: title.into(),
            title_slug: None,
            overview: None,
            release_date: None,
            rating: None,
            rating_count: 0,
            monitored: true,
            created_at: now,
            updated_at: now,
        }
    }

    /// Validate book data
    pub fn validate(&self) -> Result<(), String> {
        if self.title.trim().is_empty() {
            return Err("Book title cannot be empty".to_string());
        }

        if self.foreign_book_id.trim().is_empty() {
            return Err("Book foreign id cannot be empty".to_string());
        }

        if self.author_metadata_id.trim().is_empty() {
            return Err("Book owner reference cannot be empty".to_string());
        }

        Ok(())
    }

    /// Field-wise comparison ignoring the local id, `monitored` (local user
    /// state), and timestamps. Ownership is included so a book left behind
    /// by a merge gets re-pointed on the next refresh.
    pub fn differs_from(&self, other: &Book) -> bool {
        self.foreign_book_id != other.foreign_book_id
            || self.author_metadata_id != other.author_metadata_id
            || self.title != other.title
            || self.title_slug != other.title_slug
            || self.overview != other.overview
            || self.release_date != other.release_date
            || self.rating != other.rating
            || self.rating_count != other.rating_count
    }

    /// Overwrite provider-owned fields from `incoming`, keeping the local
    /// id, `monitored` state, and creation timestamp.
    pub fn apply(&mut self, incoming: &Book) {
        self.foreign_book_id = incoming.foreign_book_id.clone();
        self.author_metadata_id = incoming.author_metadata_id.clone();
        self.title = incoming.title.clone();
        self.title_slug = incoming.title_slug.clone();
        self.overview = incoming.overview.clone();
        self.release_date = incoming.release_date;
        self.rating = incoming.rating;
        self.rating_count = incoming.rating_count;
        self.updated_at = now_timestamp();
    }
}

// =============================================================================
// BookFile
// =============================================================================

/// An on-disk file reference. The engine never touches the file itself; it
/// only consults these records to decide delete-vs-preserve and re-points
/// them during a merge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct BookFile {
    /// Local identifier
    pub id: String,
    /// Owning author
    pub author_id: String,
    /// Matched book, if any
    pub book_id: Option<String>,
    /// Path on disk
    pub path: String,
    /// File size in bytes
    pub size_bytes: i64,
    /// When first imported
    pub created_at: i64,
}

impl BookFile {
    /// Create a new file record for an author.
    pub fn new(author_id: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            author_id: author_id.into(),
            book_id: None,
            path: path.into(),
            size_bytes: 0,
            created_at: now_timestamp(),
        }
    }
}

// =============================================================================
// HistoryRecord
// =============================================================================

/// An append-only history entry keyed by author and foreign book id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct HistoryRecord {
    /// Local identifier
    pub id: String,
    /// Author the event belongs to
    pub author_id: String,
    /// Foreign id of the book the event concerns
    pub foreign_book_id: String,
    /// Event type (see [`HISTORY_EVENT_BOOK_REMOVED`])
    pub event_type: String,
    /// When the event occurred (Unix timestamp)
    pub date: i64,
}

impl HistoryRecord {
    /// Create a new history entry dated now.
    pub fn new(
        author_id: impl Into<String>,
        foreign_book_id: impl Into<String>,
        event_type: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            author_id: author_id.into(),
            foreign_book_id: foreign_book_id.into(),
            event_type: event_type.into(),
            date: now_timestamp(),
        }
    }
}

// =============================================================================
// ImportListExclusion
// =============================================================================

/// A user-maintained exclusion: the named foreign id must never be
/// (re-)added to the catalog by automated flows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct ImportListExclusion {
    /// Local identifier
    pub id: String,
    /// Excluded foreign id (author or book)
    pub foreign_id: String,
    /// Display name recorded at exclusion time
    pub name: String,
    /// When the exclusion was created
    pub created_at: i64,
}

impl ImportListExclusion {
    /// Create a new exclusion.
    pub fn new(foreign_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            foreign_id: foreign_id.into(),
            name: name.into(),
            created_at: now_timestamp(),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
