//! # Catalog Management Module
//!
//! Owns the canonical author/book catalog database and provides repository
//! patterns for data access.
//!
//! ## Overview
//!
//! This module manages:
//! - SQLite database schema and migrations
//! - Repository patterns for authors, books, book files, history, and
//!   import list exclusions
//! - Referential integrity across author identity changes (books belong to
//!   authors through a stable metadata id)

pub mod db;
pub mod error;
pub mod models;
pub mod repositories;

pub use error::{CatalogError, Result};
