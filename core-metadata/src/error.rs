use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProviderError {
    /// The provider no longer resolves this foreign id. Drives the
    /// delete-vs-preserve decision during refresh.
    #[error("Provider has no entry for foreign id {foreign_author_id}")]
    NotFound { foreign_author_id: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("HTTP error: status {status}")]
    Http { status: u16, body: String },

    #[error("Rate limited by provider, retry after {retry_after_seconds}s")]
    RateLimited { retry_after_seconds: u64 },

    #[error("Invalid provider response: {0}")]
    InvalidResponse(String),
}

impl ProviderError {
    /// True when the provider positively reported the entity missing, as
    /// opposed to a transient failure.
    pub fn is_not_found(&self) -> bool {
        matches!(self, ProviderError::NotFound { .. })
    }
}

pub type Result<T> = std::result::Result<T, ProviderError>;
