//! QR payload for ticket verification.
//!
//! The payload is a structured JSON record embedded in the ticket's QR
//! code. It must round-trip exactly: a scanner decodes the same fields the
//! generator encoded, and the embedded reference number matches the
//! human-readable one on the document.

use crate::error::{Error, Result};
use crate::types::{Booking, BookingId, Event, EventId};
use qrcode::QrCode;
use serde::{Deserialize, Serialize};

/// Machine-readable ticket record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QrPayload {
    /// Booking identifier
    pub booking_id: BookingId,
    /// Human-facing reference number
    pub reference_number: String,
    /// Event identifier
    pub event_id: EventId,
    /// Ticket delivery email
    pub customer_email: String,
    /// Number of tickets
    pub ticket_quantity: u32,
    /// Public verification URL keyed by reference number
    pub verification_url: String,
}

impl QrPayload {
    /// Builds the payload for a booking against its event snapshot.
    #[must_use]
    pub fn for_booking(booking: &Booking, event: &Event, base_url: &str) -> Self {
        Self {
            booking_id: booking.id,
            reference_number: booking.reference_number.clone(),
            event_id: event.id,
            customer_email: booking.customer_info.email.clone(),
            ticket_quantity: booking.ticket_quantity,
            verification_url: format!(
                "{}/api/tickets/verify/{}",
                base_url.trim_end_matches('/'),
                booking.reference_number
            ),
        }
    }

    /// Serializes the payload to its JSON wire form.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Generation`] if serialization fails.
    pub fn encode(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| Error::Generation {
            message: format!("QR payload serialization failed: {e}"),
        })
    }

    /// Parses a payload from its JSON wire form.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] for malformed payloads.
    pub fn decode(data: &str) -> Result<Self> {
        serde_json::from_str(data).map_err(|e| Error::Validation {
            message: format!("malformed QR payload: {e}"),
        })
    }
}

/// A rendered QR matrix: `size` x `size` modules, row-major, `true` = dark.
#[derive(Clone, Debug)]
pub struct QrMatrix {
    /// Modules per side
    pub size: usize,
    /// Row-major module colors
    pub modules: Vec<bool>,
}

impl QrMatrix {
    /// Encodes arbitrary data into a QR matrix.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Generation`] if the data exceeds QR capacity.
    pub fn encode(data: &str) -> Result<Self> {
        let code = QrCode::new(data.as_bytes()).map_err(|e| Error::Generation {
            message: format!("QR encoding failed: {e}"),
        })?;
        let size = code.width();
        let modules = code
            .to_colors()
            .into_iter()
            .map(|color| color == qrcode::Color::Dark)
            .collect();
        Ok(Self { size, modules })
    }

    /// Whether the module at (`row`, `col`) is dark.
    #[must_use]
    pub fn is_dark(&self, row: usize, col: usize) -> bool {
        self.modules
            .get(row * self.size + col)
            .copied()
            .unwrap_or(false)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::{CustomerInfo, Money, PaymentMethod, PaymentStatus, UserId};
    use chrono::Utc;

    fn fixtures() -> (Booking, Event) {
        let event = Event::sample_events().remove(0);
        let booking = Booking {
            id: BookingId::new(),
            user_id: UserId::new(),
            event_id: event.id,
            ticket_quantity: 3,
            total_amount: Money::from_dollars(225),
            customer_info: CustomerInfo {
                name: "Alice".to_string(),
                email: "alice@example.com".to_string(),
                phone: "+15551234567".to_string(),
            },
            payment_method: PaymentMethod::Credit,
            payment_status: PaymentStatus::Success,
            reference_number: "BK1700000000000A1B2C".to_string(),
            created_at: Utc::now(),
        };
        (booking, event)
    }

    #[test]
    fn payload_round_trips() {
        let (booking, event) = fixtures();
        let payload = QrPayload::for_booking(&booking, &event, "https://tickets.example.com");

        let encoded = payload.encode().unwrap();
        let decoded = QrPayload::decode(&encoded).unwrap();

        assert_eq!(decoded, payload);
        assert_eq!(decoded.reference_number, booking.reference_number);
        assert_eq!(decoded.ticket_quantity, 3);
    }

    #[test]
    fn verification_url_is_keyed_by_reference() {
        let (booking, event) = fixtures();
        // Trailing slash on the base URL must not produce a double slash.
        let payload = QrPayload::for_booking(&booking, &event, "https://tickets.example.com/");
        assert_eq!(
            payload.verification_url,
            "https://tickets.example.com/api/tickets/verify/BK1700000000000A1B2C"
        );
    }

    #[test]
    fn wire_form_uses_camel_case_fields() {
        let (booking, event) = fixtures();
        let payload = QrPayload::for_booking(&booking, &event, "http://localhost:8080");
        let encoded = payload.encode().unwrap();
        for field in [
            "bookingId",
            "referenceNumber",
            "eventId",
            "customerEmail",
            "ticketQuantity",
            "verificationUrl",
        ] {
            assert!(encoded.contains(field), "missing {field} in {encoded}");
        }
    }

    #[test]
    fn matrix_encodes_real_payloads() {
        let (booking, event) = fixtures();
        let payload = QrPayload::for_booking(&booking, &event, "http://localhost:8080");
        let matrix = QrMatrix::encode(&payload.encode().unwrap()).unwrap();

        assert!(matrix.size >= 21); // smallest QR version
        assert_eq!(matrix.modules.len(), matrix.size * matrix.size);
        // Finder pattern corner is always dark.
        assert!(matrix.is_dark(0, 0));
    }

    #[test]
    fn decode_rejects_garbage() {
        assert!(QrPayload::decode("not json").is_err());
        assert!(QrPayload::decode("{}").is_err());
    }
}
