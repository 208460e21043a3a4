//! # Identity Resolver
//!
//! Decides whether a refreshed author's foreign identifier has drifted and
//! whether the new identifier collides with another local author. Identity
//! is an opaque exact-match key owned by the external provider; there is no
//! fuzzy matching here.

use crate::error::Result;
use core_catalog::models::Author;
use core_catalog::repositories::AuthorRepository;
use std::sync::Arc;
use tracing::debug;

/// Outcome of resolving a fetched foreign id against the local author
#[derive(Debug, Clone)]
pub enum IdentityOutcome {
    /// Fetched id matches the stored one
    Unchanged,
    /// Id changed and no other local author holds the new id
    ChangedNoCollision,
    /// Id changed and the new id already belongs to another local author
    ChangedCollision(Author),
}

/// Resolves identity drift for refreshed authors
pub struct IdentityResolver {
    authors: Arc<dyn AuthorRepository>,
}

impl IdentityResolver {
    /// Create a new identity resolver
    pub fn new(authors: Arc<dyn AuthorRepository>) -> Self {
        Self { authors }
    }

    /// Compare the stored foreign id against the one the provider resolved
    /// the request to, checking for a collision when they differ.
    pub async fn resolve(
        &self,
        local: &Author,
        fetched_foreign_author_id: &str,
    ) -> Result<IdentityOutcome> {
        if local.foreign_author_id == fetched_foreign_author_id {
            return Ok(IdentityOutcome::Unchanged);
        }

        debug!(
            author_id = %local.id,
            old = %local.foreign_author_id,
            new = %fetched_foreign_author_id,
            "Author foreign id changed upstream"
        );

        let existing = self
            .authors
            .find_by_foreign_id(fetched_foreign_author_id, Some(&local.id))
            .await?;

        match existing {
            Some(collision) => Ok(IdentityOutcome::ChangedCollision(collision)),
            None => Ok(IdentityOutcome::ChangedNoCollision),
        }
    }
}
