//! Metadata profile based book eligibility
//!
//! A profile narrows the provider's book list to what the user wants in
//! their catalog. Filtering happens before reconciliation, so an ineligible
//! book is simply never inserted; books already in the catalog are left
//! alone when a profile tightens later.

use crate::provider::RemoteBook;
use serde::{Deserialize, Serialize};

/// Eligibility rules applied to the provider's book list
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetadataProfile {
    /// Release types to accept; empty accepts every type
    pub allowed_release_types: Vec<String>,
    /// Accept books without a past release date
    pub allow_unreleased: bool,
    /// Minimum provider rating; `None` disables the check
    pub min_rating: Option<f64>,
}

impl Default for MetadataProfile {
    fn default() -> Self {
        Self {
            allowed_release_types: Vec::new(),
            allow_unreleased: true,
            min_rating: None,
        }
    }
}

impl MetadataProfile {
    /// Whether a single remote book passes this profile at time `now`
    /// (Unix timestamp).
    pub fn allows(&self, book: &RemoteBook, now: i64) -> bool {
        if !self.allowed_release_types.is_empty() {
            let type_ok = book
                .release_type
                .as_ref()
                .is_some_and(|t| self.allowed_release_types.contains(t));
            if !type_ok {
                return false;
            }
        }

        if !self.allow_unreleased {
            let released = book.release_date.is_some_and(|d| d <= now);
            if !released {
                return false;
            }
        }

        if let Some(min) = self.min_rating {
            if book.rating.unwrap_or(0.0) < min {
                return false;
            }
        }

        true
    }

    /// Filter a provider book list down to the eligible set.
    pub fn filter_books(&self, books: Vec<RemoteBook>, now: i64) -> Vec<RemoteBook> {
        books.into_iter().filter(|b| self.allows(b, now)).collect()
    }
}
