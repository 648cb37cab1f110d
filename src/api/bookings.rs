//! Booking lifecycle endpoints.
//!
//! - POST /api/bookings - run one booking attempt to a terminal state
//! - GET /api/bookings - the caller's bookings, newest first
//! - GET /api/bookings/:id - a single caller-owned booking
//!
//! A declined payment answers 201 with `success: false`: the request
//! itself was valid and the attempt is on record.

use crate::auth::AuthUser;
use crate::booking::{BookingOutcome, BookingRequest};
use crate::error::Result;
use crate::server::state::AppState;
use crate::types::{Booking, BookingId, CustomerInfo, Event, EventId, PaymentMethod};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Request to create a booking.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookingRequest {
    /// Target event id
    pub event_id: Uuid,
    /// Tickets requested
    pub ticket_quantity: u32,
    /// Customer contact details
    pub customer_info: CustomerInfo,
    /// Payment method wire name (`gpay`, `debit`, `credit`)
    pub payment_method: String,
}

/// Event summary embedded in booking responses.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventSummary {
    /// Event id
    pub id: Uuid,
    /// Title
    pub title: String,
    /// Scheduled date
    pub date: DateTime<Utc>,
    /// Location
    pub location: String,
}

impl From<Event> for EventSummary {
    fn from(event: Event) -> Self {
        Self {
            id: *event.id.as_uuid(),
            title: event.title,
            date: event.date,
            location: event.location,
        }
    }
}

/// Booking details on the wire.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingResponse {
    /// Booking id
    pub id: Uuid,
    /// Reference number
    pub reference_number: String,
    /// Event summary, when the event still exists
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event: Option<EventSummary>,
    /// Number of tickets
    pub ticket_quantity: u32,
    /// Snapshotted total in cents
    pub total_amount: u64,
    /// Customer contact details
    pub customer_info: CustomerInfo,
    /// Payment method
    pub payment_method: crate::types::PaymentMethod,
    /// Terminal payment status
    pub payment_status: crate::types::PaymentStatus,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl BookingResponse {
    fn new(booking: Booking, event: Option<Event>) -> Self {
        Self {
            id: *booking.id.as_uuid(),
            reference_number: booking.reference_number,
            event: event.map(EventSummary::from),
            ticket_quantity: booking.ticket_quantity,
            total_amount: booking.total_amount.cents(),
            customer_info: booking.customer_info,
            payment_method: booking.payment_method,
            payment_status: booking.payment_status,
            created_at: booking.created_at,
        }
    }
}

/// Response after a booking attempt.
#[derive(Debug, Serialize)]
pub struct CreateBookingResponse {
    /// Outcome message for the user
    pub message: String,
    /// The persisted booking record
    pub booking: BookingResponse,
    /// Whether the payment was confirmed
    pub success: bool,
    /// Secondary warning when the ticket handoff failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

/// Create a booking and run it to a terminal state.
///
/// # Errors
///
/// 404 for an unknown event; 400 for validation failures and insufficient
/// inventory (the latter carries the `available` count).
pub async fn create_booking(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(request): Json<CreateBookingRequest>,
) -> Result<(StatusCode, Json<CreateBookingResponse>)> {
    let payment_method = PaymentMethod::parse(&request.payment_method)?;
    let outcome: BookingOutcome = state
        .service
        .create_booking(
            auth.user_id,
            BookingRequest {
                event_id: EventId::from_uuid(request.event_id),
                ticket_quantity: request.ticket_quantity,
                customer_info: request.customer_info,
                payment_method,
            },
        )
        .await?;

    let message = if outcome.confirmed {
        "Booking successful!".to_string()
    } else {
        "Payment failed. Please try again.".to_string()
    };

    Ok((
        StatusCode::CREATED,
        Json(CreateBookingResponse {
            message,
            booking: BookingResponse::new(outcome.booking, Some(outcome.event)),
            success: outcome.confirmed,
            warning: outcome.notification_warning,
        }),
    ))
}

/// List the caller's bookings, newest first.
///
/// # Errors
///
/// Returns storage errors.
pub async fn list_bookings(
    auth: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<BookingResponse>>> {
    let bookings = state.service.list_bookings(auth.user_id).await?;

    let mut responses = Vec::with_capacity(bookings.len());
    for booking in bookings {
        let event = state.service.event_snapshot(booking.event_id).await.ok();
        responses.push(BookingResponse::new(booking, event));
    }
    Ok(Json(responses))
}

/// Get a single caller-owned booking.
///
/// # Errors
///
/// 404 when the booking is absent or owned by someone else.
pub async fn get_booking(
    auth: AuthUser,
    Path(booking_id): Path<Uuid>,
    State(state): State<AppState>,
) -> Result<Json<BookingResponse>> {
    let booking = state
        .service
        .get_booking(auth.user_id, BookingId::from_uuid(booking_id))
        .await?;
    let event = state.service.event_snapshot(booking.event_id).await.ok();
    Ok(Json(BookingResponse::new(booking, event)))
}
