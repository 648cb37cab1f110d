//! Persistence traits for events and bookings.
//!
//! Two implementations are provided:
//! - [`postgres::PostgresStore`]: production storage backed by sqlx.
//! - [`memory::InMemoryStore`]: lock-guarded in-process storage for
//!   development, demos and tests.
//!
//! The inventory ledger lives here: `reserve_tickets` is the *only* way
//! `available_tickets` decreases, and both implementations make the
//! check-and-decrement a single atomic operation so concurrent bookings
//! cannot oversell an event.

pub mod memory;
pub mod postgres;

pub use memory::InMemoryStore;
pub use postgres::PostgresStore;

use crate::error::Result;
use crate::types::{Booking, BookingId, Event, EventCategory, EventId, UserId};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Filter and pagination parameters for event listings.
#[derive(Clone, Debug)]
pub struct EventFilter {
    /// 1-based page number
    pub page: u32,
    /// Page size
    pub limit: u32,
    /// Case-insensitive substring match over title, description, location
    pub search: Option<String>,
    /// Category filter (`None` = all categories)
    pub category: Option<EventCategory>,
    /// Only events scheduled at or after this instant are returned
    pub after: DateTime<Utc>,
}

impl EventFilter {
    /// Filter for upcoming events with default pagination.
    #[must_use]
    pub fn upcoming() -> Self {
        Self {
            page: 1,
            limit: 9,
            search: None,
            category: None,
            after: Utc::now(),
        }
    }

    /// Row offset implied by page and limit.
    #[must_use]
    pub const fn offset(&self) -> u64 {
        (self.page.saturating_sub(1) as u64) * self.limit as u64
    }
}

/// One page of events plus the total match count.
#[derive(Clone, Debug)]
pub struct EventPage {
    /// Events on this page, ascending by date
    pub events: Vec<Event>,
    /// Total events matching the filter across all pages
    pub total: u64,
}

/// Event storage and the inventory ledger.
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Insert a new event (seed/import tooling).
    async fn insert_event(&self, event: &Event) -> Result<()>;

    /// Fetch a single event.
    async fn get_event(&self, id: EventId) -> Result<Option<Event>>;

    /// List events matching the filter, ascending by date.
    async fn list_events(&self, filter: &EventFilter) -> Result<EventPage>;

    /// Atomically reserve `quantity` tickets.
    ///
    /// The availability check and the decrement are one atomic operation:
    /// of two concurrent reservations that together exceed the remaining
    /// count, at most one succeeds.
    ///
    /// # Errors
    ///
    /// [`crate::error::Error::NotFound`] if the event does not exist;
    /// [`crate::error::Error::InsufficientInventory`] (with the current
    /// count) if fewer than `quantity` tickets remain.
    async fn reserve_tickets(&self, id: EventId, quantity: u32) -> Result<()>;
}

/// Booking storage.
///
/// Bookings are append-only: the lifecycle manager inserts each record once,
/// already carrying its terminal payment status.
#[async_trait]
pub trait BookingStore: Send + Sync {
    /// Persist a booking.
    ///
    /// The reference number carries a uniqueness constraint. On a conflict
    /// the store regenerates the reference and retries, so the returned
    /// booking is the authoritative record (its reference may differ from
    /// the one passed in).
    async fn insert_booking(&self, booking: Booking) -> Result<Booking>;

    /// Fetch a booking by id.
    async fn get_booking(&self, id: BookingId) -> Result<Option<Booking>>;

    /// All bookings owned by `user`, newest first.
    async fn list_for_user(&self, user: UserId) -> Result<Vec<Booking>>;

    /// Exact reference number lookup (public verification path).
    async fn find_by_reference(&self, reference: &str) -> Result<Option<Booking>>;
}

/// Attempts made to find a free reference number before giving up.
pub(crate) const REFERENCE_INSERT_ATTEMPTS: u32 = 5;
