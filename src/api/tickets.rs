//! Ticket artifact endpoints.
//!
//! - GET /api/tickets/download/:booking_id - render and stream the PDF
//! - POST /api/tickets/resend/:booking_id - re-deliver the ticket by email
//! - GET /api/tickets/verify/:reference - public scanner lookup
//!
//! Download and resend require the caller to own the booking; verification
//! is deliberately unauthenticated and answers with a scanner-safe summary.

use crate::auth::AuthUser;
use crate::error::Result;
use crate::server::state::AppState;
use crate::types::BookingId;
use crate::verify::{VerificationOutcome, VerificationSummary};
use axum::{
    Json,
    extract::{Path, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Optional body for resending a ticket.
#[derive(Debug, Default, Deserialize)]
pub struct ResendRequest {
    /// Override recipient; the booking's customer email when absent
    pub email: Option<String>,
}

/// Response after resending a ticket.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResendResponse {
    /// Outcome message for the user
    pub message: String,
    /// Address the ticket was sent to
    pub sent_to: String,
}

/// Verification result on the wire.
#[derive(Debug, Serialize)]
pub struct VerifyResponse {
    /// Whether a booking carries this reference number
    pub valid: bool,
    /// Present on a miss
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Present on a hit
    #[serde(skip_serializing_if = "Option::is_none")]
    pub booking: Option<VerificationSummary>,
}

/// Render the ticket PDF for a caller-owned, confirmed booking.
///
/// # Errors
///
/// 404 for absent/unowned bookings; 400 (`NOT_CONFIRMED`) unless the
/// payment succeeded; 500 on rendering failure.
pub async fn download_ticket(
    auth: AuthUser,
    Path(booking_id): Path<Uuid>,
    State(state): State<AppState>,
) -> Result<Response> {
    let document = state
        .service
        .ticket_for(auth.user_id, BookingId::from_uuid(booking_id))
        .await?;

    let disposition = format!("attachment; filename=\"{}\"", document.filename);
    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        document.pdf,
    )
        .into_response())
}

/// Re-deliver the ticket by email, to the body's address when given.
///
/// # Errors
///
/// Everything download returns, plus 400 for a malformed override address
/// and 500 (`NOTIFICATION`) when the send fails.
pub async fn resend_ticket(
    auth: AuthUser,
    Path(booking_id): Path<Uuid>,
    State(state): State<AppState>,
    body: Option<Json<ResendRequest>>,
) -> Result<Json<ResendResponse>> {
    let email = body.and_then(|Json(request)| request.email);
    let sent_to = state
        .service
        .resend_ticket(auth.user_id, BookingId::from_uuid(booking_id), email)
        .await?;
    Ok(Json(ResendResponse {
        message: "Ticket sent".to_string(),
        sent_to,
    }))
}

/// Public reference-number verification for venue scanners.
///
/// A miss answers 404 with `{ valid: false }`; the error channel is
/// reserved for system faults.
///
/// # Errors
///
/// Returns storage errors.
pub async fn verify_ticket(
    Path(reference): Path<String>,
    State(state): State<AppState>,
) -> Result<Response> {
    let response = match state.verifier.verify(&reference).await? {
        VerificationOutcome::Invalid => (
            StatusCode::NOT_FOUND,
            Json(VerifyResponse {
                valid: false,
                message: Some("Booking not found".to_string()),
                booking: None,
            }),
        ),
        VerificationOutcome::Valid(summary) => (
            StatusCode::OK,
            Json(VerifyResponse {
                valid: true,
                message: None,
                booking: Some(summary),
            }),
        ),
    };
    Ok(response.into_response())
}
