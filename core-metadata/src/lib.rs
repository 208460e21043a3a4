//! # Metadata Provider Module
//!
//! Integration with the external book metadata provider.
//!
//! ## Overview
//!
//! This module provides:
//! - The [`MetadataProvider`] trait the refresh engine depends on
//! - An HTTP client implementation ([`BookInfoClient`]) with rate limiting
//! - Metadata profile based book eligibility filtering

pub mod client;
pub mod error;
pub mod profile;
pub mod provider;

pub use client::BookInfoClient;
pub use error::{ProviderError, Result};
pub use profile::MetadataProfile;
pub use provider::{MetadataProvider, RemoteAuthor, RemoteBook};
