//! End-to-end booking lifecycle tests over the in-memory store.
//!
//! These exercise the full path a request takes below the HTTP layer:
//! lifecycle manager -> payment gateway -> inventory ledger -> ticket
//! generator -> notifier -> verification.

#![allow(clippy::unwrap_used)]

use event_booker::booking::{BookingRequest, BookingService};
use event_booker::notify::{RecordingNotifier, TicketNotifier};
use event_booker::payment_gateway::FixedOutcomeGateway;
use event_booker::store::{BookingStore, EventStore, InMemoryStore};
use event_booker::ticket::{QrPayload, TicketGenerator};
use event_booker::types::{
    CustomerInfo, Event, Money, PaymentMethod, PaymentStatus, UserId,
};
use event_booker::verify::{VerificationOutcome, VerificationService};
use event_booker::{Error, reference};
use proptest::prelude::*;
use std::sync::Arc;
use std::time::Duration;

const BASE_URL: &str = "http://localhost:8080";

struct World {
    store: Arc<InMemoryStore>,
    notifier: Arc<RecordingNotifier>,
    service: BookingService,
    verifier: VerificationService,
}

fn world(gateway: FixedOutcomeGateway) -> World {
    let store = Arc::new(InMemoryStore::new());
    let notifier = Arc::new(RecordingNotifier::new());
    let service = BookingService::new(
        Arc::clone(&store) as Arc<dyn EventStore>,
        Arc::clone(&store) as Arc<dyn BookingStore>,
        Arc::new(gateway),
        Arc::clone(&notifier) as Arc<dyn TicketNotifier>,
        TicketGenerator::new(BASE_URL),
        Duration::from_secs(5),
    );
    let verifier = VerificationService::new(
        Arc::clone(&store) as Arc<dyn BookingStore>,
        Arc::clone(&store) as Arc<dyn EventStore>,
    );
    World {
        store,
        notifier,
        service,
        verifier,
    }
}

async fn seed_event(store: &InMemoryStore, available: u32, price: Money) -> Event {
    let mut event = Event::sample_events().remove(0);
    event.total_tickets = event.total_tickets.max(available);
    event.available_tickets = available;
    event.price = price;
    store.insert_event(&event).await.unwrap();
    event
}

fn request(event: &Event, quantity: u32) -> BookingRequest {
    BookingRequest {
        event_id: event.id,
        ticket_quantity: quantity,
        customer_info: CustomerInfo {
            name: "Alice".to_string(),
            email: "alice@example.com".to_string(),
            phone: "+15551234567".to_string(),
        },
        payment_method: PaymentMethod::Credit,
    }
}

#[tokio::test]
async fn confirmed_booking_flows_through_to_verification() {
    let w = world(FixedOutcomeGateway::approving());
    let event = seed_event(&w.store, 10, Money::from_dollars(75)).await;
    let user = UserId::new();

    let outcome = w
        .service
        .create_booking(user, request(&event, 2))
        .await
        .unwrap();
    assert!(outcome.confirmed);
    assert_eq!(outcome.booking.total_amount, Money::from_dollars(150));

    // Inventory was reserved exactly once.
    let stored = w.store.get_event(event.id).await.unwrap().unwrap();
    assert_eq!(stored.available_tickets, 8);

    // The ticket document certifies the booking's reference and embeds a
    // verification link to the public endpoint.
    let document = w.service.ticket_for(user, outcome.booking.id).await.unwrap();
    assert!(document.pdf.starts_with(b"%PDF"));
    assert_eq!(document.reference_number, outcome.booking.reference_number);
    assert_eq!(
        document.qr_payload.verification_url,
        format!(
            "{BASE_URL}/api/tickets/verify/{}",
            outcome.booking.reference_number
        )
    );

    // A scanner following that link gets the scanner-safe summary.
    let verified = w
        .verifier
        .verify(&outcome.booking.reference_number)
        .await
        .unwrap();
    let VerificationOutcome::Valid(summary) = verified else {
        panic!("expected the reference to verify");
    };
    assert_eq!(summary.event, event.title);
    assert_eq!(summary.tickets, 2);
    assert_eq!(summary.status, PaymentStatus::Success);
}

#[tokio::test]
async fn declined_booking_leaves_no_trace_but_the_record() {
    let w = world(FixedOutcomeGateway::declining());
    let event = seed_event(&w.store, 10, Money::from_dollars(75)).await;
    let user = UserId::new();

    let outcome = w
        .service
        .create_booking(user, request(&event, 2))
        .await
        .unwrap();
    assert!(!outcome.confirmed);
    assert_eq!(outcome.booking.payment_status, PaymentStatus::Failed);

    // No reservation, no delivery.
    let stored = w.store.get_event(event.id).await.unwrap().unwrap();
    assert_eq!(stored.available_tickets, 10);
    assert!(w.notifier.sends().is_empty());

    // No ticket either: the artifact is gated on confirmation.
    let err = w
        .service
        .ticket_for(user, outcome.booking.id)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::NotConfirmed));

    // But the attempt still verifies, with its failed status visible to
    // the scanner.
    let verified = w
        .verifier
        .verify(&outcome.booking.reference_number)
        .await
        .unwrap();
    let VerificationOutcome::Valid(summary) = verified else {
        panic!("failed bookings still verify");
    };
    assert_eq!(summary.status, PaymentStatus::Failed);
}

#[tokio::test]
async fn amount_is_snapshotted_against_later_price_changes() {
    let w = world(FixedOutcomeGateway::approving());
    let event = seed_event(&w.store, 10, Money::from_dollars(50)).await;
    let user = UserId::new();

    let outcome = w
        .service
        .create_booking(user, request(&event, 3))
        .await
        .unwrap();
    assert_eq!(outcome.booking.total_amount, Money::from_dollars(150));

    // Reprice the event after the fact.
    let mut repriced = w.store.get_event(event.id).await.unwrap().unwrap();
    repriced.price = Money::from_dollars(500);
    w.store.insert_event(&repriced).await.unwrap();

    // The persisted booking still carries the amount charged at booking
    // time.
    let fetched = w.service.get_booking(user, outcome.booking.id).await.unwrap();
    assert_eq!(fetched.total_amount, Money::from_dollars(150));
}

#[tokio::test]
async fn a_swarm_of_bookings_never_oversells() {
    let w = world(FixedOutcomeGateway::approving());
    let event = seed_event(&w.store, 7, Money::from_dollars(20)).await;
    let service = Arc::new(w.service);

    let mut handles = Vec::new();
    for _ in 0..20 {
        let service = Arc::clone(&service);
        let event = event.clone();
        handles.push(tokio::spawn(async move {
            service.create_booking(UserId::new(), request(&event, 1)).await
        }));
    }

    let mut confirmed = 0;
    for handle in handles {
        if handle.await.unwrap().is_ok_and(|o| o.confirmed) {
            confirmed += 1;
        }
    }

    assert_eq!(confirmed, 7);
    let stored = w.store.get_event(event.id).await.unwrap().unwrap();
    assert_eq!(stored.available_tickets, 0);
}

#[tokio::test]
async fn bookings_list_newest_first_per_user() {
    let w = world(FixedOutcomeGateway::approving());
    let event = seed_event(&w.store, 10, Money::from_dollars(10)).await;

    let alice = UserId::new();
    let bob = UserId::new();
    let first = w.service.create_booking(alice, request(&event, 1)).await.unwrap();
    let _bob = w.service.create_booking(bob, request(&event, 1)).await.unwrap();
    let second = w.service.create_booking(alice, request(&event, 1)).await.unwrap();

    let listed = w.service.list_bookings(alice).await.unwrap();
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0].id, second.booking.id);
    assert_eq!(listed[1].id, first.booking.id);
}

#[tokio::test]
async fn verification_miss_is_invalid_not_an_error() {
    let w = world(FixedOutcomeGateway::approving());
    let outcome = w.verifier.verify("BK1700000000000ZZZZZ").await.unwrap();
    assert_eq!(outcome, VerificationOutcome::Invalid);
}

proptest! {
    #[test]
    fn generated_references_always_pass_the_shape_check(_seed in 0u8..32) {
        let reference = reference::generate();
        prop_assert!(reference::looks_like_reference(&reference));
    }

    #[test]
    fn amount_snapshot_is_exact_for_any_price_and_quantity(
        price_cents in 1u64..=10_000_000,
        quantity in 1u32..=1_000,
    ) {
        let price = Money::from_cents(price_cents);
        let total = price.checked_mul_quantity(quantity).unwrap();
        prop_assert_eq!(total.cents(), price_cents * u64::from(quantity));
    }

    #[test]
    fn qr_payload_round_trips_for_any_reference(
        suffix in "[A-Z0-9]{5}",
        millis in 1_500_000_000_000i64..=2_000_000_000_000,
    ) {
        let reference = format!("BK{millis}{suffix}");
        let payload = QrPayload {
            booking_id: event_booker::types::BookingId::new(),
            reference_number: reference.clone(),
            event_id: event_booker::types::EventId::new(),
            customer_email: "alice@example.com".to_string(),
            ticket_quantity: 2,
            verification_url: format!("{BASE_URL}/api/tickets/verify/{reference}"),
        };
        let decoded = QrPayload::decode(&payload.encode().unwrap()).unwrap();
        prop_assert_eq!(decoded, payload);
    }
}
