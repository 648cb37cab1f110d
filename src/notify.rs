//! Ticket and confirmation delivery.
//!
//! Delivery is best-effort: on the confirmation path a failed send is
//! logged and never rolls back a confirmed booking. The trait abstracts the
//! transport so production SMTP, console logging (development) and the
//! recording double (tests) are interchangeable.

use crate::config::SmtpConfig;
use crate::error::{Error, Result};
use crate::ticket::TicketDocument;
use crate::types::{Booking, Event};
use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::{Attachment, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use std::sync::{Mutex, PoisonError};

/// Outbound ticket notifications.
#[async_trait]
pub trait TicketNotifier: Send + Sync {
    /// Send the booking confirmation summary.
    async fn send_confirmation(&self, booking: &Booking, event: &Event) -> Result<()>;

    /// Send the PDF ticket to `to`.
    async fn send_ticket(
        &self,
        document: &TicketDocument,
        booking: &Booking,
        event: &Event,
        to: &str,
    ) -> Result<()>;
}

fn confirmation_subject(event: &Event) -> String {
    format!("Booking confirmed: {}", event.title)
}

fn confirmation_body(booking: &Booking, event: &Event) -> String {
    format!(
        "Hi {name},\n\n\
         Your booking is confirmed.\n\n\
         Reference: {reference}\n\
         Event: {title}\n\
         Date: {date}\n\
         Location: {location}\n\
         Tickets: {quantity}\n\
         Total: {total}\n\n\
         Show the QR code on your ticket at the entrance.\n\n\
         EventBooker",
        name = booking.customer_info.name,
        reference = booking.reference_number,
        title = event.title,
        date = event.date.format("%A, %B %e %Y, %H:%M UTC"),
        location = event.location,
        quantity = booking.ticket_quantity,
        total = booking.total_amount,
    )
}

// ============================================================================
// SMTP (production)
// ============================================================================

/// SMTP notifier using Lettre.
#[derive(Clone)]
pub struct SmtpNotifier {
    server: String,
    port: u16,
    credentials: Credentials,
    from: String,
}

impl SmtpNotifier {
    /// Creates an SMTP notifier from configuration.
    #[must_use]
    pub fn new(config: &SmtpConfig) -> Self {
        Self {
            server: config.server.clone(),
            port: config.port,
            credentials: Credentials::new(config.username.clone(), config.password.clone()),
            from: format!("{} <{}>", config.from_name, config.from_email),
        }
    }

    /// Builds a transport per send to avoid connection pooling issues.
    fn build_transport(&self) -> Result<SmtpTransport> {
        let transport = SmtpTransport::relay(&self.server)
            .map_err(|e| Error::Notification {
                message: format!("SMTP relay error: {e}"),
            })?
            .port(self.port)
            .credentials(self.credentials.clone())
            .build();
        Ok(transport)
    }

    fn mailbox(&self, address: &str) -> Result<Mailbox> {
        address.parse().map_err(|e| Error::Notification {
            message: format!("invalid recipient {address}: {e}"),
        })
    }

    /// Lettre's `SmtpTransport` is blocking, so the send runs on the
    /// blocking pool; the await point keeps the caller's timeout effective.
    async fn send(&self, message: Message) -> Result<()> {
        let transport = self.build_transport()?;
        tokio::task::spawn_blocking(move || {
            transport.send(&message).map_err(|e| Error::Notification {
                message: format!("SMTP send failed: {e}"),
            })
        })
        .await
        .map_err(|e| Error::Notification {
            message: format!("send task failed: {e}"),
        })??;
        Ok(())
    }
}

#[async_trait]
impl TicketNotifier for SmtpNotifier {
    async fn send_confirmation(&self, booking: &Booking, event: &Event) -> Result<()> {
        let message = Message::builder()
            .from(self.mailbox(&self.from)?)
            .to(self.mailbox(&booking.customer_info.email)?)
            .subject(confirmation_subject(event))
            .header(ContentType::TEXT_PLAIN)
            .body(confirmation_body(booking, event))
            .map_err(|e| Error::Notification {
                message: format!("message build failed: {e}"),
            })?;
        self.send(message).await
    }

    async fn send_ticket(
        &self,
        document: &TicketDocument,
        booking: &Booking,
        event: &Event,
        to: &str,
    ) -> Result<()> {
        let pdf_type = ContentType::parse("application/pdf").map_err(|e| Error::Notification {
            message: format!("content type error: {e}"),
        })?;
        let message = Message::builder()
            .from(self.mailbox(&self.from)?)
            .to(self.mailbox(to)?)
            .subject(format!("Your ticket: {}", event.title))
            .multipart(
                MultiPart::mixed()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(confirmation_body(booking, event)),
                    )
                    .singlepart(
                        Attachment::new(document.filename.clone())
                            .body(document.pdf.clone(), pdf_type),
                    ),
            )
            .map_err(|e| Error::Notification {
                message: format!("message build failed: {e}"),
            })?;
        self.send(message).await
    }
}

// ============================================================================
// Console (development)
// ============================================================================

/// Console notifier: logs deliveries instead of sending them.
#[derive(Clone, Debug, Default)]
pub struct ConsoleNotifier;

impl ConsoleNotifier {
    /// Creates a console notifier.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl TicketNotifier for ConsoleNotifier {
    async fn send_confirmation(&self, booking: &Booking, event: &Event) -> Result<()> {
        tracing::info!(
            to = %booking.customer_info.email,
            reference = %booking.reference_number,
            event = %event.title,
            "confirmation email (console mode)"
        );
        Ok(())
    }

    async fn send_ticket(
        &self,
        document: &TicketDocument,
        booking: &Booking,
        event: &Event,
        to: &str,
    ) -> Result<()> {
        tracing::info!(
            to = %to,
            reference = %booking.reference_number,
            event = %event.title,
            attachment = %document.filename,
            pdf_bytes = document.pdf.len(),
            "ticket email (console mode)"
        );
        Ok(())
    }
}

// ============================================================================
// Recording double (tests)
// ============================================================================

/// A delivered message captured by [`RecordingNotifier`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecordedSend {
    /// Recipient address
    pub to: String,
    /// Booking reference
    pub reference: String,
    /// Whether a PDF ticket was attached
    pub with_ticket: bool,
}

/// Test double that records every send instead of delivering it.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    sends: Mutex<Vec<RecordedSend>>,
    /// When set, every send fails (exercises the best-effort path).
    pub fail_sends: bool,
}

impl RecordingNotifier {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a recorder whose sends always fail.
    #[must_use]
    pub fn failing() -> Self {
        Self {
            sends: Mutex::new(Vec::new()),
            fail_sends: true,
        }
    }

    /// Everything recorded so far.
    #[must_use]
    pub fn sends(&self) -> Vec<RecordedSend> {
        self.sends
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn record(&self, send: RecordedSend) -> Result<()> {
        if self.fail_sends {
            return Err(Error::Notification {
                message: "recording notifier configured to fail".to_string(),
            });
        }
        self.sends
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(send);
        Ok(())
    }
}

#[async_trait]
impl TicketNotifier for RecordingNotifier {
    async fn send_confirmation(&self, booking: &Booking, _event: &Event) -> Result<()> {
        self.record(RecordedSend {
            to: booking.customer_info.email.clone(),
            reference: booking.reference_number.clone(),
            with_ticket: false,
        })
    }

    async fn send_ticket(
        &self,
        _document: &TicketDocument,
        booking: &Booking,
        _event: &Event,
        to: &str,
    ) -> Result<()> {
        self.record(RecordedSend {
            to: to.to_string(),
            reference: booking.reference_number.clone(),
            with_ticket: true,
        })
    }
}
