//! Public ticket verification.
//!
//! A venue scanner looks a booking up by its reference number, with no
//! session attached. The response shape is uniform: a miss is
//! `{ valid: false }`, never an error, and a hit returns only what a
//! scanner needs. The customer's email, phone and internal identifiers are
//! deliberately omitted so the endpoint is safe for unauthenticated use.

use crate::error::{Error, Result};
use crate::store::{BookingStore, EventStore};
use crate::types::PaymentStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Scanner-safe booking summary.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct VerificationSummary {
    /// Reference number that was verified
    #[serde(rename = "referenceNumber")]
    pub reference_number: String,
    /// Event title
    pub event: String,
    /// Customer display name
    pub customer: String,
    /// Number of tickets booked
    pub tickets: u32,
    /// Payment status of the booking
    pub status: PaymentStatus,
    /// Event date
    pub date: DateTime<Utc>,
}

/// Outcome of a verification lookup.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum VerificationOutcome {
    /// No booking carries this reference number.
    Invalid,
    /// The booking exists; here is its scanner-safe summary.
    Valid(VerificationSummary),
}

/// Reference-number verification over the persisted booking records,
/// decoupled from the booking session.
pub struct VerificationService {
    bookings: Arc<dyn BookingStore>,
    events: Arc<dyn EventStore>,
}

impl VerificationService {
    /// Creates a verification service over the stores.
    #[must_use]
    pub fn new(bookings: Arc<dyn BookingStore>, events: Arc<dyn EventStore>) -> Self {
        Self { bookings, events }
    }

    /// Looks a booking up by exact reference number match.
    ///
    /// A miss is a normal outcome ([`VerificationOutcome::Invalid`]), not
    /// an error; the error channel is reserved for system faults.
    ///
    /// # Errors
    ///
    /// Returns storage errors, or [`Error::Internal`] if a booking
    /// references an event that no longer exists.
    pub async fn verify(&self, reference: &str) -> Result<VerificationOutcome> {
        if !crate::reference::looks_like_reference(reference) {
            return Ok(VerificationOutcome::Invalid);
        }
        let Some(booking) = self.bookings.find_by_reference(reference).await? else {
            return Ok(VerificationOutcome::Invalid);
        };

        let event = self
            .events
            .get_event(booking.event_id)
            .await?
            .ok_or_else(|| {
                Error::Internal(anyhow::anyhow!(
                    "booking {} references missing event {}",
                    booking.id,
                    booking.event_id
                ))
            })?;

        Ok(VerificationOutcome::Valid(VerificationSummary {
            reference_number: booking.reference_number,
            event: event.title,
            customer: booking.customer_info.name,
            tickets: booking.ticket_quantity,
            status: booking.payment_status,
            date: event.date,
        }))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::store::InMemoryStore;
    use crate::types::{
        Booking, BookingId, CustomerInfo, Event, Money, PaymentMethod, UserId,
    };

    async fn seeded() -> (VerificationService, Event, Booking) {
        let store = Arc::new(InMemoryStore::new());
        let event = Event::sample_events().remove(0);
        store.insert_event(&event).await.unwrap();

        let booking = Booking {
            id: BookingId::new(),
            user_id: UserId::new(),
            event_id: event.id,
            ticket_quantity: 4,
            total_amount: Money::from_dollars(300),
            customer_info: CustomerInfo {
                name: "Alice".to_string(),
                email: "alice@example.com".to_string(),
                phone: "+15551234567".to_string(),
            },
            payment_method: PaymentMethod::WalletTransfer,
            payment_status: PaymentStatus::Success,
            reference_number: "BK1700000000000A1B2C".to_string(),
            created_at: Utc::now(),
        };
        let booking = store.insert_booking(booking).await.unwrap();

        let service = VerificationService::new(
            Arc::clone(&store) as Arc<dyn BookingStore>,
            store as Arc<dyn EventStore>,
        );
        (service, event, booking)
    }

    #[tokio::test]
    async fn unknown_reference_is_invalid_not_an_error() {
        let (service, _, _) = seeded().await;
        let outcome = service.verify("BK9999999999999ZZZZZ").await.unwrap();
        assert_eq!(outcome, VerificationOutcome::Invalid);
    }

    #[tokio::test]
    async fn known_reference_returns_the_summary() {
        let (service, event, booking) = seeded().await;
        let outcome = service.verify(&booking.reference_number).await.unwrap();

        let VerificationOutcome::Valid(summary) = outcome else {
            panic!("expected a valid outcome");
        };
        assert_eq!(summary.reference_number, booking.reference_number);
        assert_eq!(summary.event, event.title);
        assert_eq!(summary.customer, "Alice");
        assert_eq!(summary.tickets, 4);
        assert_eq!(summary.status, PaymentStatus::Success);
        assert_eq!(summary.date, event.date);
    }

    #[tokio::test]
    async fn summary_never_exposes_contact_details() {
        let (service, _, booking) = seeded().await;
        let outcome = service.verify(&booking.reference_number).await.unwrap();
        let VerificationOutcome::Valid(summary) = outcome else {
            panic!("expected a valid outcome");
        };

        let json = serde_json::to_string(&summary).unwrap();
        assert!(!json.contains("alice@example.com"));
        assert!(!json.contains("+15551234567"));
        assert!(!json.contains(&booking.id.to_string()));
        assert!(!json.contains(&booking.user_id.to_string()));
    }

    #[tokio::test]
    async fn lookup_is_exact_match_only() {
        let (service, _, booking) = seeded().await;
        let lowered = booking.reference_number.to_lowercase();
        let outcome = service.verify(&lowered).await.unwrap();
        assert_eq!(outcome, VerificationOutcome::Invalid);
    }
}
