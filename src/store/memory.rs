//! In-memory store for development, demos and tests.
//!
//! Mirrors the Postgres semantics, including the atomic conditional
//! decrement and the reference uniqueness constraint: all mutations happen
//! under a single mutex, so a concurrent reservation race resolves exactly
//! like the SQL `UPDATE ... WHERE available_tickets >= $n` does.

use super::{BookingStore, EventFilter, EventPage, EventStore, REFERENCE_INSERT_ATTEMPTS};
use crate::error::{Error, Result};
use crate::reference;
use crate::types::{Booking, BookingId, Event, EventId, UserId};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

#[derive(Default)]
struct Inner {
    events: HashMap<EventId, Event>,
    bookings: HashMap<BookingId, Booking>,
    references: HashSet<String>,
}

/// In-memory implementation of [`EventStore`] and [`BookingStore`].
#[derive(Default)]
pub struct InMemoryStore {
    inner: Mutex<Inner>,
}

impl InMemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-populated with the sample events.
    #[must_use]
    pub fn with_sample_events() -> Self {
        let store = Self::new();
        {
            let mut inner = store.lock();
            for event in Event::sample_events() {
                inner.events.insert(event.id, event);
            }
        }
        store
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // A poisoned lock only means another test thread panicked; the data
        // is still consistent because every mutation is a single step.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl EventStore for InMemoryStore {
    async fn insert_event(&self, event: &Event) -> Result<()> {
        event.check_inventory_invariant()?;
        self.lock().events.insert(event.id, event.clone());
        Ok(())
    }

    async fn get_event(&self, id: EventId) -> Result<Option<Event>> {
        Ok(self.lock().events.get(&id).cloned())
    }

    async fn list_events(&self, filter: &EventFilter) -> Result<EventPage> {
        let inner = self.lock();
        let needle = filter.search.as_deref().map(str::to_lowercase);

        let mut matched: Vec<Event> = inner
            .events
            .values()
            .filter(|event| event.date >= filter.after)
            .filter(|event| {
                filter
                    .category
                    .is_none_or(|category| event.category == category)
            })
            .filter(|event| {
                needle.as_deref().is_none_or(|needle| {
                    event.title.to_lowercase().contains(needle)
                        || event.description.to_lowercase().contains(needle)
                        || event.location.to_lowercase().contains(needle)
                })
            })
            .cloned()
            .collect();
        matched.sort_by_key(|event| event.date);

        let total = matched.len() as u64;
        let events = matched
            .into_iter()
            .skip(usize::try_from(filter.offset()).unwrap_or(usize::MAX))
            .take(filter.limit as usize)
            .collect();

        Ok(EventPage { events, total })
    }

    async fn reserve_tickets(&self, id: EventId, quantity: u32) -> Result<()> {
        let mut inner = self.lock();
        let event = inner
            .events
            .get_mut(&id)
            .ok_or(Error::NotFound { resource: "Event" })?;

        // Check and decrement under one lock: the atomic reservation.
        if event.available_tickets < quantity {
            return Err(Error::InsufficientInventory {
                available: event.available_tickets,
            });
        }
        event.available_tickets -= quantity;
        Ok(())
    }
}

#[async_trait]
impl BookingStore for InMemoryStore {
    async fn insert_booking(&self, mut booking: Booking) -> Result<Booking> {
        let mut inner = self.lock();
        for _ in 0..REFERENCE_INSERT_ATTEMPTS {
            if inner.references.insert(booking.reference_number.clone()) {
                inner.bookings.insert(booking.id, booking.clone());
                return Ok(booking);
            }
            tracing::warn!(
                reference = %booking.reference_number,
                "reference collision, regenerating"
            );
            booking.reference_number = reference::generate();
        }
        Err(Error::Database {
            message: "could not find a free reference number".to_string(),
        })
    }

    async fn get_booking(&self, id: BookingId) -> Result<Option<Booking>> {
        Ok(self.lock().bookings.get(&id).cloned())
    }

    async fn list_for_user(&self, user: UserId) -> Result<Vec<Booking>> {
        let inner = self.lock();
        let mut bookings: Vec<Booking> = inner
            .bookings
            .values()
            .filter(|booking| booking.user_id == user)
            .cloned()
            .collect();
        bookings.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(bookings)
    }

    async fn find_by_reference(&self, reference: &str) -> Result<Option<Booking>> {
        let inner = self.lock();
        Ok(inner
            .bookings
            .values()
            .find(|booking| booking.reference_number == reference)
            .cloned())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::{CustomerInfo, Money, PaymentMethod, PaymentStatus};
    use chrono::Utc;
    use std::sync::Arc;

    fn test_event(available: u32) -> Event {
        let mut event = Event::sample_events().remove(0);
        event.available_tickets = available;
        event.total_tickets = available.max(event.total_tickets);
        event
    }

    fn test_booking(event_id: EventId, reference: &str) -> Booking {
        Booking {
            id: BookingId::new(),
            user_id: UserId::new(),
            event_id,
            ticket_quantity: 2,
            total_amount: Money::from_dollars(150),
            customer_info: CustomerInfo {
                name: "Alice".to_string(),
                email: "alice@example.com".to_string(),
                phone: "+15551234567".to_string(),
            },
            payment_method: PaymentMethod::Credit,
            payment_status: PaymentStatus::Success,
            reference_number: reference.to_string(),
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn reserve_decrements_until_exhausted() {
        let store = InMemoryStore::new();
        let event = test_event(3);
        let id = event.id;
        store.insert_event(&event).await.unwrap();

        store.reserve_tickets(id, 2).await.unwrap();
        let err = store.reserve_tickets(id, 2).await.unwrap_err();
        assert!(matches!(err, Error::InsufficientInventory { available: 1 }));

        let stored = store.get_event(id).await.unwrap().unwrap();
        assert_eq!(stored.available_tickets, 1);
    }

    #[tokio::test]
    async fn concurrent_reservations_never_oversell() {
        let store = Arc::new(InMemoryStore::new());
        let event = test_event(1);
        let id = event.id;
        store.insert_event(&event).await.unwrap();

        let a = tokio::spawn({
            let store = Arc::clone(&store);
            async move { store.reserve_tickets(id, 1).await }
        });
        let b = tokio::spawn({
            let store = Arc::clone(&store);
            async move { store.reserve_tickets(id, 1).await }
        });

        let (a, b) = (a.await.unwrap(), b.await.unwrap());
        assert_eq!(u32::from(a.is_ok()) + u32::from(b.is_ok()), 1);

        let stored = store.get_event(id).await.unwrap().unwrap();
        assert_eq!(stored.available_tickets, 0);
    }

    #[tokio::test]
    async fn duplicate_reference_is_regenerated_on_insert() {
        let store = InMemoryStore::new();
        let event = test_event(10);
        store.insert_event(&event).await.unwrap();

        let first = store
            .insert_booking(test_booking(event.id, "BK1700000000000AAAAA"))
            .await
            .unwrap();
        let second = store
            .insert_booking(test_booking(event.id, "BK1700000000000AAAAA"))
            .await
            .unwrap();

        assert_ne!(first.reference_number, second.reference_number);
        assert!(
            store
                .find_by_reference(&second.reference_number)
                .await
                .unwrap()
                .is_some()
        );
    }

    #[tokio::test]
    async fn list_for_user_is_newest_first() {
        let store = InMemoryStore::new();
        let event = test_event(10);
        store.insert_event(&event).await.unwrap();
        let user = UserId::new();

        let mut older = test_booking(event.id, "BK1OLD00000000AAAAA");
        older.user_id = user;
        older.created_at = Utc::now() - chrono::Duration::hours(1);
        let mut newer = test_booking(event.id, "BK1NEW00000000AAAAA");
        newer.user_id = user;

        store.insert_booking(older).await.unwrap();
        let newer = store.insert_booking(newer).await.unwrap();

        let listed = store.list_for_user(user).await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].id, newer.id);
    }

    #[tokio::test]
    async fn list_events_filters_and_paginates() {
        let store = InMemoryStore::with_sample_events();

        let mut filter = EventFilter::upcoming();
        filter.search = Some("festival".to_string());
        let page = store.list_events(&filter).await.unwrap();
        assert_eq!(page.total, 2); // music festival + food & wine festival
        assert!(page.events.windows(2).all(|w| w[0].date <= w[1].date));

        filter.search = None;
        filter.limit = 2;
        filter.page = 2;
        let page = store.list_events(&filter).await.unwrap();
        assert_eq!(page.total, 5);
        assert_eq!(page.events.len(), 2);
    }
}
