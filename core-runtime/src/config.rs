//! # Core Configuration Module
//!
//! Configuration management for the Book Platform Core.
//!
//! ## Overview
//!
//! The configuration system uses a builder pattern to construct a
//! [`CoreConfig`] instance holding the settings every core module needs:
//! database location, metadata server endpoint, provider etiquette
//! (user agent, rate limit), and event bus sizing. Validation is fail-fast
//! with actionable error messages.
//!
//! ## Usage
//!
//! ```
//! use core_runtime::config::CoreConfig;
//!
//! let config = CoreConfig::builder()
//!     .database_path("/path/to/catalog.db")
//!     .metadata_server_url("https://api.bookinfo.example")
//!     .user_agent("BookPlatformCore/0.1 (contact@example.com)")
//!     .build()
//!     .expect("Failed to build config");
//! ```

use crate::error::{Error, Result};
use std::path::PathBuf;

/// Default minimum delay between metadata provider requests.
const DEFAULT_RATE_LIMIT_DELAY_MS: u64 = 1000;

/// Default event bus buffer size.
const DEFAULT_EVENT_BUFFER_SIZE: usize = 100;

/// Core configuration for the Book Platform Core.
///
/// Use [`CoreConfigBuilder`] to construct instances.
#[derive(Debug, Clone)]
pub struct CoreConfig {
    /// Path to the SQLite catalog database file
    pub database_path: PathBuf,

    /// Base URL of the external bibliographic metadata service
    pub metadata_server_url: String,

    /// User agent sent with every provider request
    /// (format: "AppName/Version (Contact)")
    pub user_agent: String,

    /// Minimum delay between provider requests, in milliseconds
    pub rate_limit_delay_ms: u64,

    /// Event bus channel capacity
    pub event_buffer_size: usize,
}

impl CoreConfig {
    /// Creates a new builder for constructing a `CoreConfig`.
    pub fn builder() -> CoreConfigBuilder {
        CoreConfigBuilder::default()
    }

    /// Validates the configuration and returns an error if invalid.
    ///
    /// This checks:
    /// - Database path is not empty
    /// - Metadata server URL is a non-empty http(s) URL
    /// - User agent follows the "AppName/Version (Contact)" format
    /// - Rate limit delay is within a sane range
    pub fn validate(&self) -> Result<()> {
        if self.database_path.as_os_str().is_empty() {
            return Err(Error::Config("Database path cannot be empty".to_string()));
        }

        if self.metadata_server_url.is_empty() {
            return Err(Error::Config(
                "Metadata server URL cannot be empty".to_string(),
            ));
        }

        if !self.metadata_server_url.starts_with("http://")
            && !self.metadata_server_url.starts_with("https://")
        {
            return Err(Error::Config(
                "Metadata server URL must start with http:// or https://".to_string(),
            ));
        }

        if self.user_agent.is_empty() {
            return Err(Error::Config("User agent cannot be empty".to_string()));
        }

        if !self.user_agent.contains('/') {
            return Err(Error::Config(
                "User agent must follow format: 'AppName/Version (Contact)'".to_string(),
            ));
        }

        if self.rate_limit_delay_ms == 0 {
            return Err(Error::Config(
                "Rate limit delay must be greater than 0ms".to_string(),
            ));
        }

        if self.rate_limit_delay_ms > 60_000 {
            return Err(Error::Config(
                "Rate limit delay exceeds maximum of 60 seconds (60,000ms)".to_string(),
            ));
        }

        if self.event_buffer_size == 0 {
            return Err(Error::Config(
                "Event buffer size must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

/// Builder for constructing [`CoreConfig`] instances.
///
/// Incrementally set configuration options, then call
/// [`build()`](CoreConfigBuilder::build) to validate and create the final
/// config.
#[derive(Default)]
pub struct CoreConfigBuilder {
    database_path: Option<PathBuf>,
    metadata_server_url: Option<String>,
    user_agent: Option<String>,
    rate_limit_delay_ms: Option<u64>,
    event_buffer_size: Option<usize>,
}

impl CoreConfigBuilder {
    /// Sets the catalog database path.
    pub fn database_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.database_path = Some(path.into());
        self
    }

    /// Sets the metadata server base URL.
    pub fn metadata_server_url(mut self, url: impl Into<String>) -> Self {
        self.metadata_server_url = Some(url.into());
        self
    }

    /// Sets the provider user agent string.
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Sets the minimum delay between provider requests.
    pub fn rate_limit_delay_ms(mut self, delay_ms: u64) -> Self {
        self.rate_limit_delay_ms = Some(delay_ms);
        self
    }

    /// Sets the event bus buffer size.
    pub fn event_buffer_size(mut self, size: usize) -> Self {
        self.event_buffer_size = Some(size);
        self
    }

    /// Builds and validates the final [`CoreConfig`].
    ///
    /// # Errors
    ///
    /// Returns a `Config` error naming the missing or invalid field.
    pub fn build(self) -> Result<CoreConfig> {
        let database_path = self
            .database_path
            .ok_or_else(|| Error::Config("Database path is required".to_string()))?;

        let metadata_server_url = self
            .metadata_server_url
            .ok_or_else(|| Error::Config("Metadata server URL is required".to_string()))?;

        let user_agent = self
            .user_agent
            .ok_or_else(|| Error::Config("User agent is required".to_string()))?;

        let config = CoreConfig {
            database_path,
            metadata_server_url,
            user_agent,
            rate_limit_delay_ms: self
                .rate_limit_delay_ms
                .unwrap_or(DEFAULT_RATE_LIMIT_DELAY_MS),
            event_buffer_size: self.event_buffer_size.unwrap_or(DEFAULT_EVENT_BUFFER_SIZE),
        };

        config.validate()?;
        Ok(config)
    }
}
