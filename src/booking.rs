//! Booking lifecycle manager.
//!
//! Orchestrates one booking attempt from validation through its terminal
//! state: validate -> snapshot amount -> attempt payment -> reserve
//! inventory (success branch only) -> persist -> hand off ticket + email.
//!
//! Ordering guarantees within one attempt: the inventory decrement
//! happens-before the `success` booking is persisted, so a crash between
//! the two never leaves a confirmed booking against unreserved inventory.
//! The ticket/notification handoff happens after persistence and is
//! best-effort: its failure is reported as a warning, never as a booking
//! failure.

use crate::error::{Error, Result};
use crate::notify::TicketNotifier;
use crate::payment_gateway::{PaymentGateway, PaymentOutcome};
use crate::reference;
use crate::store::{BookingStore, EventStore};
use crate::ticket::{TicketDocument, TicketGenerator};
use crate::types::{
    Booking, BookingId, CustomerInfo, Event, EventId, Money, PaymentMethod, PaymentState,
    PaymentStatus, UserId,
};
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;

/// Bound on the post-confirmation ticket + email handoff.
const NOTIFY_TIMEOUT: Duration = Duration::from_secs(10);

/// A validated booking request.
#[derive(Clone, Debug)]
pub struct BookingRequest {
    /// Target event
    pub event_id: EventId,
    /// Tickets requested (>= 1)
    pub ticket_quantity: u32,
    /// Customer contact details
    pub customer_info: CustomerInfo,
    /// Payment method
    pub payment_method: PaymentMethod,
}

/// Terminal result of a booking attempt.
///
/// Produced for both confirmed and declined payments: a declined payment is
/// a normal outcome with its own persisted record, not an error.
#[derive(Clone, Debug)]
pub struct BookingOutcome {
    /// The persisted booking record
    pub booking: Booking,
    /// Event snapshot taken at validation time
    pub event: Event,
    /// Whether the payment was confirmed
    pub confirmed: bool,
    /// Secondary warning when the post-confirmation handoff failed
    pub notification_warning: Option<String>,
}

/// Orchestrates the booking lifecycle.
pub struct BookingService {
    events: Arc<dyn EventStore>,
    bookings: Arc<dyn BookingStore>,
    gateway: Arc<dyn PaymentGateway>,
    notifier: Arc<dyn TicketNotifier>,
    tickets: TicketGenerator,
    payment_timeout: Duration,
    notify_timeout: Duration,
}

impl BookingService {
    /// Creates a lifecycle manager over its collaborators.
    #[must_use]
    pub fn new(
        events: Arc<dyn EventStore>,
        bookings: Arc<dyn BookingStore>,
        gateway: Arc<dyn PaymentGateway>,
        notifier: Arc<dyn TicketNotifier>,
        tickets: TicketGenerator,
        payment_timeout: Duration,
    ) -> Self {
        Self {
            events,
            bookings,
            gateway,
            notifier,
            tickets,
            payment_timeout,
            notify_timeout: NOTIFY_TIMEOUT,
        }
    }

    /// Overrides the bound on the post-confirmation handoff.
    #[must_use]
    pub const fn with_notify_timeout(mut self, timeout: Duration) -> Self {
        self.notify_timeout = timeout;
        self
    }

    /// Runs one booking attempt to a terminal state.
    ///
    /// # Errors
    ///
    /// [`Error::NotFound`] if the event does not exist;
    /// [`Error::Validation`] for a zero quantity, bad contact fields or an
    /// amount overflow; [`Error::InsufficientInventory`] when the request
    /// exceeds availability (pre-check) or when a concurrent booking takes
    /// the last tickets between payment approval and reservation (in that
    /// case a `failed` record has already been persisted for audit).
    /// A declined payment is *not* an error: it returns `Ok` with
    /// `confirmed: false`.
    pub async fn create_booking(
        &self,
        user_id: UserId,
        request: BookingRequest,
    ) -> Result<BookingOutcome> {
        // Requested -> Validated | Rejected
        let event = self
            .events
            .get_event(request.event_id)
            .await?
            .ok_or(Error::NotFound { resource: "Event" })?;

        if request.ticket_quantity == 0 {
            return Err(Error::Validation {
                message: "ticket quantity must be at least 1".to_string(),
            });
        }
        request.customer_info.validate()?;
        if request.ticket_quantity > event.available_tickets {
            return Err(Error::InsufficientInventory {
                available: event.available_tickets,
            });
        }

        // Validated -> PaymentPending: the amount is fixed here and never
        // recomputed, even if the event's price changes later.
        let total_amount = event
            .price
            .checked_mul_quantity(request.ticket_quantity)
            .ok_or_else(|| Error::Validation {
                message: "total amount overflows".to_string(),
            })?;

        let outcome = match tokio::time::timeout(
            self.payment_timeout,
            self.gateway.attempt(total_amount, request.payment_method),
        )
        .await
        {
            Ok(outcome) => outcome,
            Err(_) => PaymentOutcome::Declined {
                reason: "gateway timeout".to_string(),
            },
        };

        let state = match outcome {
            PaymentOutcome::Approved { transaction_id } => {
                let reference = reference::generate();
                tracing::debug!(
                    reference = %reference,
                    transaction_id = %transaction_id,
                    "payment approved"
                );
                PaymentState::Confirmed {
                    reference,
                    amount: total_amount,
                }
            }
            PaymentOutcome::Declined { reason } => PaymentState::Declined { reason },
        };

        match state {
            PaymentState::Confirmed { reference, amount } => {
                self.confirm(user_id, request, event, amount, reference).await
            }
            PaymentState::Declined { reason } => {
                // PaymentPending -> Declined: persist for audit/history,
                // no inventory effect, no ticket, no notification.
                let booking = self
                    .persist(
                        user_id,
                        &request,
                        total_amount,
                        reference::generate(),
                        PaymentStatus::Failed,
                    )
                    .await?;
                tracing::info!(
                    reference = %booking.reference_number,
                    reason = %reason,
                    "booking declined"
                );
                Ok(BookingOutcome {
                    booking,
                    event,
                    confirmed: false,
                    notification_warning: None,
                })
            }
            PaymentState::Pending => Err(Error::Internal(anyhow::anyhow!(
                "payment attempt did not reach a terminal state"
            ))),
        }
    }

    /// PaymentPending -> Confirmed: reserve, persist, hand off.
    async fn confirm(
        &self,
        user_id: UserId,
        request: BookingRequest,
        event: Event,
        total_amount: Money,
        reference_number: String,
    ) -> Result<BookingOutcome> {
        // The conditional decrement is the race guard: a concurrent booking
        // may have taken the tickets since the pre-check.
        match self
            .events
            .reserve_tickets(event.id, request.ticket_quantity)
            .await
        {
            Ok(()) => {}
            Err(Error::InsufficientInventory { available }) => {
                // An approved charge against lost inventory would need a
                // refund with a real gateway; the simulator has nothing to
                // refund. The failed record is kept for audit.
                let booking = self
                    .persist(
                        user_id,
                        &request,
                        total_amount,
                        reference_number,
                        PaymentStatus::Failed,
                    )
                    .await?;
                tracing::warn!(
                    reference = %booking.reference_number,
                    event_id = %event.id,
                    available,
                    "inventory lost to a concurrent booking after payment approval"
                );
                return Err(Error::InsufficientInventory { available });
            }
            Err(e) => return Err(e),
        }

        // Decrement happened-before this persist. If the insert fails here
        // the reserved tickets are stranded; the error log carries the
        // reference for reconciliation (no automatic compensating release).
        let booking = self
            .persist(
                user_id,
                &request,
                total_amount,
                reference_number,
                PaymentStatus::Success,
            )
            .await
            .inspect_err(|e| {
                tracing::error!(
                    event_id = %event.id,
                    quantity = request.ticket_quantity,
                    error = %e,
                    "booking persistence failed after inventory decrement"
                );
            })?;

        tracing::info!(
            reference = %booking.reference_number,
            event_id = %event.id,
            quantity = booking.ticket_quantity,
            amount = booking.total_amount.cents(),
            "booking confirmed"
        );

        let notification_warning = self.dispatch_ticket(&booking, &event).await;

        Ok(BookingOutcome {
            booking,
            event,
            confirmed: true,
            notification_warning,
        })
    }

    /// Best-effort ticket + confirmation handoff, bounded by
    /// [`NOTIFY_TIMEOUT`]. Returns a warning string on failure.
    async fn dispatch_ticket(&self, booking: &Booking, event: &Event) -> Option<String> {
        let result = tokio::time::timeout(self.notify_timeout, async {
            let document = self.tickets.generate(booking, event)?;
            self.notifier.send_confirmation(booking, event).await?;
            self.notifier
                .send_ticket(&document, booking, event, &booking.customer_info.email)
                .await
        })
        .await;

        let warning = match result {
            Ok(Ok(())) => return None,
            Ok(Err(e)) => e.to_string(),
            Err(_) => "ticket delivery timed out".to_string(),
        };
        tracing::warn!(
            reference = %booking.reference_number,
            warning = %warning,
            "ticket handoff failed; booking remains confirmed"
        );
        Some(warning)
    }

    async fn persist(
        &self,
        user_id: UserId,
        request: &BookingRequest,
        total_amount: Money,
        reference_number: String,
        payment_status: PaymentStatus,
    ) -> Result<Booking> {
        let booking = Booking {
            id: BookingId::new(),
            user_id,
            event_id: request.event_id,
            ticket_quantity: request.ticket_quantity,
            total_amount,
            customer_info: request.customer_info.clone(),
            payment_method: request.payment_method,
            payment_status,
            reference_number,
            created_at: Utc::now(),
        };
        self.bookings.insert_booking(booking).await
    }

    /// The caller's bookings, newest first.
    ///
    /// # Errors
    ///
    /// Returns storage errors.
    pub async fn list_bookings(&self, user_id: UserId) -> Result<Vec<Booking>> {
        self.bookings.list_for_user(user_id).await
    }

    /// A single booking, visible only to its owner.
    ///
    /// # Errors
    ///
    /// [`Error::NotFound`] when the booking is absent *or* owned by someone
    /// else: ownership misses are indistinguishable from absence so the
    /// endpoint does not leak which ids exist.
    pub async fn get_booking(&self, user_id: UserId, id: BookingId) -> Result<Booking> {
        let booking = self
            .bookings
            .get_booking(id)
            .await?
            .filter(|booking| booking.user_id == user_id);
        booking.ok_or(Error::NotFound {
            resource: "Booking",
        })
    }

    /// Event snapshot for response embedding.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if the event is gone.
    pub async fn event_snapshot(&self, id: EventId) -> Result<Event> {
        self.events
            .get_event(id)
            .await?
            .ok_or(Error::NotFound { resource: "Event" })
    }

    /// Generates the ticket document for a caller-owned booking.
    ///
    /// # Errors
    ///
    /// [`Error::NotFound`] for absent/unowned bookings;
    /// [`Error::NotConfirmed`] unless the payment succeeded;
    /// [`Error::Generation`] on rendering failure.
    pub async fn ticket_for(&self, user_id: UserId, id: BookingId) -> Result<TicketDocument> {
        let booking = self.get_booking(user_id, id).await?;
        let event = self.event_snapshot(booking.event_id).await?;
        self.tickets.generate(&booking, &event)
    }

    /// Re-sends the ticket document, to `email` when given or to the
    /// booking's customer email otherwise. Returns the recipient address.
    ///
    /// # Errors
    ///
    /// Everything [`Self::ticket_for`] returns, plus [`Error::Validation`]
    /// for a malformed override address and [`Error::Notification`] when
    /// the send fails (resend is caller-initiated, so unlike the
    /// confirmation handoff the failure is surfaced).
    pub async fn resend_ticket(
        &self,
        user_id: UserId,
        id: BookingId,
        email: Option<String>,
    ) -> Result<String> {
        let booking = self.get_booking(user_id, id).await?;
        let event = self.event_snapshot(booking.event_id).await?;
        let document = self.tickets.generate(&booking, &event)?;

        let to = match email {
            Some(address) => {
                if !crate::types::is_valid_email(&address) {
                    return Err(Error::Validation {
                        message: format!("invalid email address: {address}"),
                    });
                }
                address
            }
            None => booking.customer_info.email.clone(),
        };

        self.notifier
            .send_ticket(&document, &booking, &event, &to)
            .await?;
        Ok(to)
    }
}
