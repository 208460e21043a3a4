//! # Author Refresh & Reconciliation Engine
//!
//! Keeps the local author/book catalog synchronized against the external
//! metadata provider, reconciling identity changes without losing or
//! duplicating local records, files, or history.
//!
//! ## Components
//!
//! - [`identity::IdentityResolver`] — detects foreign id drift and
//!   collisions with other local authors
//! - [`merge::MergeCoordinator`] — transfers books and associations from a
//!   superseded author to the surviving one
//! - [`reconcile::BookReconciler`] — non-destructive diff of the remote
//!   book list against the local set
//! - [`orchestrator::RefreshOrchestrator`] — the top-level
//!   `refresh(author_id)` workflow tying the above together

pub mod error;
pub mod identity;
pub mod merge;
pub mod orchestrator;
pub mod reconcile;

#[cfg(test)]
pub(crate) mod test_support;

pub use error::{RefreshError, Result};
pub use identity::{IdentityOutcome, IdentityResolver};
pub use merge::MergeCoordinator;
pub use orchestrator::{RefreshOrchestrator, RefreshOutcome};
pub use reconcile::{BookReconciler, ReconcileStats};
