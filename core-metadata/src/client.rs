//! Book info API client
//!
//! HTTP implementation of [`MetadataProvider`] against the book info server.
//!
//! ## API Endpoints
//!
//! - **Author**: `{base}/v1/author/{foreign_author_id}`
//!
//! ## Rate Limiting
//!
//! The server enforces per-client rate limits; the client spaces requests by
//! a configurable minimum delay and surfaces 429 responses with the server's
//! `Retry-After` value.
//!
//! ## User Agent Requirement
//!
//! The server requires clients to identify themselves with a proper
//! User-Agent header, format: "AppName/Version".

use crate::error::{ProviderError, Result};
use crate::provider::{MetadataProvider, RemoteAuthor, RemoteBook};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::sleep;
use tracing::{debug, warn};

/// Timeout for API requests
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Simple rate limiter to enforce delay between requests
struct RateLimiter {
    last_request_ms: Option<i64>,
    min_delay: Duration,
}

impl RateLimiter {
    fn new(delay_ms: u64) -> Self {
        Self {
            last_request_ms: None,
            min_delay: Duration::from_millis(delay_ms),
        }
    }

    async fn wait_if_needed(&mut self) {
        if let Some(last) = self.last_request_ms {
            let now = chrono::Utc::now().timestamp_millis();
            let elapsed_ms = now - last;
            let required_ms = self.min_delay.as_millis() as i64;
            if elapsed_ms < required_ms {
                let wait_time = Duration::from_millis((required_ms - elapsed_ms) as u64);
                debug!("Rate limiting: waiting {:?}", wait_time);
                sleep(wait_time).await;
            }
        }
        self.last_request_ms = Some(chrono::Utc::now().timestamp_millis());
    }
}

/// Author document on the wire
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AuthorResource {
    foreign_author_id: String,
    author_name: String,
    #[serde(default)]
    sort_name: Option<String>,
    #[serde(default)]
    overview: Option<String>,
    #[serde(default = "default_status")]
    status: String,
    #[serde(default)]
    images: Vec<ImageResource>,
    #[serde(default)]
    ratings: Option<RatingResource>,
    #[serde(default)]
    works: Vec<WorkResource>,
}

fn default_status() -> String {
    "active".to_string()
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ImageResource {
    url: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RatingResource {
    #[serde(default)]
    value: Option<f64>,
    #[serde(default)]
    votes: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WorkResource {
    foreign_book_id: String,
    title: String,
    #[serde(default)]
    title_slug: Option<String>,
    #[serde(default)]
    overview: Option<String>,
    #[serde(default)]
    release_date: Option<i64>,
    #[serde(default)]
    release_type: Option<String>,
    #[serde(default)]
    ratings: Option<RatingResource>,
}

impl From<AuthorResource> for RemoteAuthor {
    fn from(resource: AuthorResource) -> Self {
        let (rating, rating_count) = split_rating(resource.ratings);
        RemoteAuthor {
            foreign_author_id: resource.foreign_author_id,
            name: resource.author_name,
            sort_name: resource.sort_name,
            overview: resource.overview,
            status: resource.status,
            images: resource.images.into_iter().map(|i| i.url).collect(),
            rating,
            rating_count,
            books: resource.works.into_iter().map(RemoteBook::from).collect(),
        }
    }
}

impl From<WorkResource> for RemoteBook {
    fn from(resource: WorkResource) -> Self {
        let (rating, rating_count) = split_rating(resource.ratings);
        RemoteBook {
            foreign_book_id: resource.foreign_book_id,
            title: resource.title,
            title_slug: resource.title_slug,
            overview: resource.overview,
            release_date: resource.release_date,
            release_type: resource.release_type,
            rating,
            rating_count,
        }
    }
}

fn split_rating(ratings: Option<RatingResource>) -> (Option<f64>, i64) {
    match ratings {
        Some(r) => (r.value, r.votes),
        None => (None, 0),
    }
}

/// Book info server client
///
/// Fetches the provider's current view of an author. Responses are never
/// cached: each call hits the server so refreshes see current identity.
pub struct BookInfoClient {
    http_client: reqwest::Client,
    base_url: String,
    user_agent: String,
    rate_limiter: Mutex<RateLimiter>,
}

impl BookInfoClient {
    /// Creates a new book info client
    ///
    /// # Arguments
    ///
    /// * `base_url` - Server base URL without trailing slash
    /// * `user_agent` - User agent string (format: "AppName/Version")
    /// * `rate_limit_delay_ms` - Minimum delay between requests in milliseconds
    pub fn new(base_url: impl Into<String>, user_agent: impl Into<String>, rate_limit_delay_ms: u64) -> Self {
        Self {
            http_client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            user_agent: user_agent.into(),
            rate_limiter: Mutex::new(RateLimiter::new(rate_limit_delay_ms)),
        }
    }
}

#[async_trait]
impl MetadataProvider for BookInfoClient {
    async fn resolve_author(&self, foreign_author_id: &str) -> Result<RemoteAuthor> {
        let url = format!(
            "{}/v1/author/{}",
            self.base_url,
            urlencoding::encode(foreign_author_id)
        );

        debug!(url = %url, "Resolving author against provider");

        self.rate_limiter.lock().await.wait_if_needed().await;

        let response = self
            .http_client
            .get(&url)
            .header("User-Agent", &self.user_agent)
            .header("Accept", "application/json")
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await
            .map_err(|e| ProviderError::Network(format!("Author request failed: {}", e)))?;

        let status = response.status();
        match status.as_u16() {
            200 => {
                let resource: AuthorResource = response.json().await.map_err(|e| {
                    ProviderError::InvalidResponse(format!("Failed to parse author: {}", e))
                })?;
                Ok(RemoteAuthor::from(resource))
            }
            404 => {
                debug!(
                    foreign_author_id = %foreign_author_id,
                    "Provider has no entry for author"
                );
                Err(ProviderError::NotFound {
                    foreign_author_id: foreign_author_id.to_string(),
                })
            }
            429 => {
                let retry_after = response
                    .headers()
                    .get("Retry-After")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.parse::<u64>().ok())
                    .unwrap_or(60);

                warn!(retry_after, "Provider rate limited the request");
                Err(ProviderError::RateLimited {
                    retry_after_seconds: retry_after,
                })
            }
            code => {
                let body = response.text().await.unwrap_or_default();
                Err(ProviderError::Http { status: code, body })
            }
        }
    }
}
