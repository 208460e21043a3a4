use core_catalog::CatalogError;
use core_metadata::ProviderError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RefreshError {
    /// The local author record could not be loaded. Caller error, not a
    /// recoverable condition of this engine.
    #[error("Author not found: {author_id}")]
    AuthorNotFound { author_id: String },

    /// Provider failure other than not-found. Not-found is recovered
    /// internally by the delete-or-preserve branch and never surfaces here.
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Batch re-pointing of books during a merge failed partway. The
    /// superseded author is guaranteed not to have been deleted.
    #[error("Merge integrity failure moving books from {superseded_id} to {surviving_id}: {reason}")]
    MergeIntegrity {
        superseded_id: String,
        surviving_id: String,
        reason: String,
    },

    /// A store write or read failed. Each store operation is its own
    /// transaction boundary, so no partial commit is left behind.
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),
}

pub type Result<T> = std::result::Result<T, RefreshError>;
