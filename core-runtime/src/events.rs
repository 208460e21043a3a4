//! # Event Bus System
//!
//! Event-driven notification layer for the Book Platform Core, built on
//! `tokio::sync::broadcast`. Modules publish typed events and downstream
//! collaborators (UI refresh, search triggers) subscribe independently.
//!
//! ## Overview
//!
//! - **Event Types**: strongly-typed enum hierarchy (`CoreEvent` wrapping
//!   domain events such as [`AuthorEvent`])
//! - **EventBus**: central broadcast channel, fire-and-forget `emit`
//! - **EventStream**: receiver wrapper with optional filtering
//!
//! ## Usage
//!
//! ```rust
//! use core_runtime::events::{EventBus, CoreEvent, AuthorEvent};
//!
//! let event_bus = EventBus::new(100);
//! let mut subscriber = event_bus.subscribe();
//!
//! event_bus
//!     .emit(CoreEvent::Author(AuthorEvent::RefreshComplete {
//!         author_id: "author-123".to_string(),
//!     }))
//!     .ok();
//! ```
//!
//! ## Error Handling
//!
//! `tokio::sync::broadcast` yields `RecvError::Lagged(n)` for slow
//! subscribers (non-fatal, `n` events were skipped) and `RecvError::Closed`
//! when every sender is gone. Publishers never block; an `emit` with no
//! subscribers is an `Err` the caller is free to ignore.

use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::broadcast;

// Re-export commonly used types
pub use tokio::sync::broadcast::error::{RecvError, SendError};
pub use tokio::sync::broadcast::Receiver;

/// Default buffer size for the event bus channel.
///
/// Subscribers that fall further behind than this receive
/// `RecvError::Lagged`.
pub const DEFAULT_EVENT_BUFFER_SIZE: usize = 100;

// ============================================================================
// Core Event Types
// ============================================================================

/// Top-level event enum encompassing all event categories.
///
/// This is the type published and received through the event bus. It wraps
/// domain-specific event types so subscribers can match on whole categories.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "payload")]
pub enum CoreEvent {
    /// Author catalog events (refresh, merge, removal)
    Author(AuthorEvent),
    /// Book catalog events (reconciliation results)
    Book(BookEvent),
}

impl CoreEvent {
    /// Returns a human-readable description of the event.
    pub fn description(&self) -> &str {
        match self {
            CoreEvent::Author(e) => e.description(),
            CoreEvent::Book(e) => e.description(),
        }
    }

    /// Returns the severity level of the event.
    pub fn severity(&self) -> EventSeverity {
        match self {
            CoreEvent::Author(AuthorEvent::Removed { .. }) => EventSeverity::Warning,
            CoreEvent::Author(AuthorEvent::Merged { .. }) => EventSeverity::Warning,
            CoreEvent::Author(AuthorEvent::Updated { .. }) => EventSeverity::Info,
            CoreEvent::Author(AuthorEvent::RefreshComplete { .. }) => EventSeverity::Info,
            _ => EventSeverity::Debug,
        }
    }
}

/// Event severity levels for filtering and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EventSeverity {
    /// Debug-level events (verbose)
    Debug,
    /// Informational events
    Info,
    /// Warning events
    Warning,
    /// Error events
    Error,
}

// ============================================================================
// Author Events
// ============================================================================

/// Events describing changes to author records in the catalog.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum AuthorEvent {
    /// Author metadata was updated from the remote source.
    Updated {
        /// The local author id.
        author_id: String,
    },
    /// A refresh pass finished for this author (metadata changed or not).
    RefreshComplete {
        /// The local author id.
        author_id: String,
    },
    /// Author record was removed because its remote counterpart vanished
    /// and no local files referenced it.
    Removed {
        /// The local author id that was removed.
        author_id: String,
        /// The foreign id that no longer resolves upstream.
        foreign_author_id: String,
    },
    /// Two author records were merged after an identity collision.
    Merged {
        /// The author record that was removed.
        superseded_id: String,
        /// The author record that absorbed the superseded one's books.
        surviving_id: String,
    },
}

impl AuthorEvent {
    fn description(&self) -> &str {
        match self {
            AuthorEvent::Updated { .. } => "Author metadata updated",
            AuthorEvent::RefreshComplete { .. } => "Author refresh complete",
            AuthorEvent::Removed { .. } => "Author removed from catalog",
            AuthorEvent::Merged { .. } => "Authors merged",
        }
    }
}

// ============================================================================
// Book Events
// ============================================================================

/// Events describing book-level changes produced by reconciliation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum BookEvent {
    /// New books were inserted for an author.
    Added {
        /// The local author id.
        author_id: String,
        /// Number of books inserted.
        count: usize,
    },
    /// Existing books were updated for an author.
    Updated {
        /// The local author id.
        author_id: String,
        /// Number of books updated.
        count: usize,
    },
}

impl BookEvent {
    fn description(&self) -> &str {
        match self {
            BookEvent::Added { .. } => "Books added",
            BookEvent::Updated { .. } => "Books updated",
        }
    }
}

// ============================================================================
// Event Bus
// ============================================================================

/// Central event bus for publishing and subscribing to events.
///
/// Uses `tokio::sync::broadcast` internally, which provides:
/// - Multiple producers (clone the `EventBus`)
/// - Multiple consumers (each `subscribe()` creates a new receiver)
/// - Non-blocking sends (events are cloned for each subscriber)
/// - Lagging detection (slow subscribers get `RecvError::Lagged`)
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<CoreEvent>,
}

impl EventBus {
    /// Creates a new event bus with the specified buffer size.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Creates a new event bus with the default buffer size.
    #[allow(clippy::should_implement_trait)]
    pub fn default() -> Self {
        Self::new(DEFAULT_EVENT_BUFFER_SIZE)
    }

    /// Publishes an event to all subscribers.
    ///
    /// Returns the number of subscribers that received the event, or an
    /// error if there are no active subscribers. Publishing is
    /// fire-and-forget; callers are not required to check the result.
    pub fn emit(&self, event: CoreEvent) -> Result<usize, SendError<CoreEvent>> {
        self.sender.send(event)
    }

    /// Creates a new subscriber to receive events.
    ///
    /// Each call creates an independent receiver that sees all future
    /// events. Past events are not replayed.
    pub fn subscribe(&self) -> Receiver<CoreEvent> {
        self.sender.subscribe()
    }

    /// Returns the number of active subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}

// ============================================================================
// Event Stream Wrapper
// ============================================================================

/// Type alias for event filter functions.
type EventFilter = Box<dyn Fn(&CoreEvent) -> bool + Send + Sync>;

/// A wrapper around `broadcast::Receiver` with optional filtering.
///
/// # Example
///
/// ```rust
/// use core_runtime::events::{EventBus, EventStream, CoreEvent};
///
/// let event_bus = EventBus::new(100);
/// let stream = EventStream::new(event_bus.subscribe())
///     .filter(|event| matches!(event, CoreEvent::Author(_)));
/// ```
pub struct EventStream {
    receiver: Receiver<CoreEvent>,
    filter: Option<EventFilter>,
}

impl EventStream {
    /// Creates a new event stream from a receiver.
    pub fn new(receiver: Receiver<CoreEvent>) -> Self {
        Self {
            receiver,
            filter: None,
        }
    }

    /// Adds a filter function to this stream.
    ///
    /// Only events that match the filter are returned by `recv()`.
    pub fn filter<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&CoreEvent) -> bool + Send + Sync + 'static,
    {
        self.filter = Some(Box::new(predicate));
        self
    }

    /// Receives the next event that passes the filter (if any).
    ///
    /// # Errors
    ///
    /// Returns `RecvError::Lagged(n)` if the subscriber fell behind by `n`
    /// events, `RecvError::Closed` if all senders have been dropped.
    pub async fn recv(&mut self) -> Result<CoreEvent, RecvError> {
        loop {
            let event = self.receiver.recv().await?;

            let Some(filter) = &self.filter else {
                return Ok(event);
            };

            if filter(&event) {
                return Ok(event);
            }
        }
    }

    /// Attempts to receive an event without blocking.
    ///
    /// Returns `None` if no matching events are currently available.
    pub fn try_recv(&mut self) -> Option<Result<CoreEvent, RecvError>> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) => {
                    let Some(filter) = &self.filter else {
                        return Some(Ok(event));
                    };

                    if filter(&event) {
                        return Some(Ok(event));
                    }
                }
                Err(broadcast::error::TryRecvError::Empty) => return None,
                Err(broadcast::error::TryRecvError::Lagged(n)) => {
                    return Some(Err(RecvError::Lagged(n)))
                }
                Err(broadcast::error::TryRecvError::Closed) => return Some(Err(RecvError::Closed)),
            }
        }
    }
}

impl fmt::Debug for EventStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventStream")
            .field("has_filter", &self.filter.is_some())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================
