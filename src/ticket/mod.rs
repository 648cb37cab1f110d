//! Ticket artifact generation.
//!
//! Turns a confirmed booking plus its event snapshot into a durable,
//! verifiable document: a PDF carrying the human-readable booking details
//! and a QR code whose payload round-trips to the same reference number.
//!
//! Generation is a pure function of its inputs (apart from the wall-clock
//! "generated at" stamp) and has no write access to booking or event state:
//! a rendering failure can never corrupt a persisted record.

pub mod pdf;
pub mod qr;

pub use qr::{QrMatrix, QrPayload};

use crate::error::{Error, Result};
use crate::types::{Booking, Event, PaymentStatus};
use chrono::{DateTime, Utc};

/// A generated ticket document.
#[derive(Clone, Debug)]
pub struct TicketDocument {
    /// Rendered PDF bytes
    pub pdf: Vec<u8>,
    /// Download filename (`ticket-<reference>.pdf`)
    pub filename: String,
    /// Reference number the document certifies
    pub reference_number: String,
    /// Machine-readable payload embedded in the QR code
    pub qr_payload: QrPayload,
    /// Wall-clock generation stamp printed in the footer
    pub generated_at: DateTime<Utc>,
}

/// Ticket document generator.
#[derive(Clone, Debug)]
pub struct TicketGenerator {
    /// Public base URL embedded in verification links.
    base_url: String,
}

impl TicketGenerator {
    /// Creates a generator that links verification to `base_url`.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }

    /// Generates the ticket document for a confirmed booking.
    ///
    /// # Errors
    ///
    /// [`Error::NotConfirmed`] unless `booking.payment_status` is
    /// [`PaymentStatus::Success`]; [`Error::Generation`] if QR encoding or
    /// PDF rendering fails.
    pub fn generate(&self, booking: &Booking, event: &Event) -> Result<TicketDocument> {
        if booking.payment_status != PaymentStatus::Success {
            return Err(Error::NotConfirmed);
        }

        let qr_payload = QrPayload::for_booking(booking, event, &self.base_url);
        let matrix = QrMatrix::encode(&qr_payload.encode()?)?;
        let generated_at = Utc::now();
        let pdf = pdf::render(booking, event, &matrix, generated_at)?;

        Ok(TicketDocument {
            pdf,
            filename: format!("ticket-{}.pdf", booking.reference_number),
            reference_number: booking.reference_number.clone(),
            qr_payload,
            generated_at,
        })
    }
}
