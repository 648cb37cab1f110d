//! PDF layout for the ticket document.
//!
//! A4 portrait, built from printpdf primitives: brand header, confirmation
//! badge, reference box with the QR matrix beside it, then event, customer
//! and payment sections, entry instructions, and a generated-at footer.
//! The QR matrix is drawn as filled rectangles so no raster image pipeline
//! is needed.

use super::qr::QrMatrix;
use crate::error::{Error, Result};
use crate::types::{Booking, Event};
use chrono::{DateTime, Utc};
use printpdf::path::PaintMode;
use printpdf::{BuiltinFont, Color, IndirectFontRef, Mm, PdfDocument, PdfLayerReference, Rect, Rgb};

const PAGE_WIDTH: f64 = 210.0;
const PAGE_HEIGHT: f64 = 297.0;
const MARGIN: f64 = 18.0;

/// Brand blue used for headings and the reference number.
const BRAND: (f64, f64, f64) = (0.1, 0.46, 0.82);
/// Confirmation green.
const CONFIRMED: (f64, f64, f64) = (0.3, 0.69, 0.31);
/// Body text.
const INK: (f64, f64, f64) = (0.2, 0.2, 0.2);
/// Secondary text.
const MUTED: (f64, f64, f64) = (0.4, 0.4, 0.4);

#[allow(clippy::cast_possible_truncation)]
fn mm(v: f64) -> Mm {
    Mm(v as _)
}

fn rgb(layer: &PdfLayerReference, (r, g, b): (f64, f64, f64)) {
    layer.set_fill_color(Color::Rgb(Rgb::new(r as _, g as _, b as _, None)));
}

struct Fonts {
    regular: IndirectFontRef,
    bold: IndirectFontRef,
}

/// Renders the ticket PDF for a confirmed booking.
///
/// Pure rendering: no store access, no side effects beyond computation.
///
/// # Errors
///
/// Returns [`Error::Generation`] if the document cannot be produced.
pub fn render(
    booking: &Booking,
    event: &Event,
    qr: &QrMatrix,
    generated_at: DateTime<Utc>,
) -> Result<Vec<u8>> {
    let (doc, page, layer) = PdfDocument::new(
        format!("Booking Confirmation - {}", event.title),
        mm(PAGE_WIDTH),
        mm(PAGE_HEIGHT),
        "ticket",
    );
    let layer = doc.get_page(page).get_layer(layer);

    let fonts = Fonts {
        regular: doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(generation_error)?,
        bold: doc
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .map_err(generation_error)?,
    };

    draw_header(&layer, &fonts);
    draw_reference_box(&layer, &fonts, &booking.reference_number);
    draw_qr(&layer, &fonts, qr);

    let mut y = 200.0;
    y = draw_section(
        &layer,
        &fonts,
        y,
        "Event Details",
        &[
            ("Event", event.title.as_str()),
            ("Date & Time", &event.date.format("%A, %B %e %Y, %H:%M UTC").to_string()),
            ("Location", event.location.as_str()),
            ("Category", &event.category.as_str().to_uppercase()),
            ("Organizer", event.organizer.as_str()),
        ],
    );
    y = draw_section(
        &layer,
        &fonts,
        y,
        "Customer Details",
        &[
            ("Name", booking.customer_info.name.as_str()),
            ("Email", booking.customer_info.email.as_str()),
            ("Phone", booking.customer_info.phone.as_str()),
        ],
    );
    y = draw_section(
        &layer,
        &fonts,
        y,
        "Booking Summary",
        &[
            (
                "Tickets",
                &format!("{} x {}", booking.ticket_quantity, event.price),
            ),
            ("Total Amount", &booking.total_amount.to_string()),
            (
                "Payment Method",
                &booking.payment_method.as_str().to_uppercase(),
            ),
        ],
    );

    draw_instructions(&layer, &fonts, y);
    draw_footer(&layer, &fonts, generated_at);

    doc.save_to_bytes().map_err(generation_error)
}

fn generation_error(e: impl std::fmt::Display) -> Error {
    Error::Generation {
        message: e.to_string(),
    }
}

fn draw_header(layer: &PdfLayerReference, fonts: &Fonts) {
    rgb(layer, BRAND);
    layer.use_text("EventBooker", 24.0, mm(MARGIN), mm(270.0), &fonts.bold);

    rgb(layer, MUTED);
    layer.use_text(
        "Event Booking Confirmation",
        11.0,
        mm(MARGIN),
        mm(262.0),
        &fonts.regular,
    );

    rgb(layer, CONFIRMED);
    layer.use_text("CONFIRMED", 16.0, mm(145.0), mm(270.0), &fonts.bold);
}

fn draw_reference_box(layer: &PdfLayerReference, fonts: &Fonts, reference: &str) {
    rgb(layer, MUTED);
    layer.use_text(
        "BOOKING REFERENCE",
        9.0,
        mm(MARGIN + 4.0),
        mm(246.0),
        &fonts.regular,
    );
    rgb(layer, BRAND);
    layer.use_text(reference, 18.0, mm(MARGIN + 4.0), mm(236.0), &fonts.bold);
}

/// QR block on the right of the reference area, drawn module by module.
fn draw_qr(layer: &PdfLayerReference, fonts: &Fonts, qr: &QrMatrix) {
    const QR_SIZE: f64 = 40.0;
    const QR_LEFT: f64 = PAGE_WIDTH - MARGIN - QR_SIZE;
    const QR_TOP: f64 = 255.0;

    if qr.size == 0 {
        return;
    }
    #[allow(clippy::cast_precision_loss)]
    let module = QR_SIZE / qr.size as f64;

    rgb(layer, (0.0, 0.0, 0.0));
    for row in 0..qr.size {
        for col in 0..qr.size {
            if !qr.is_dark(row, col) {
                continue;
            }
            #[allow(clippy::cast_precision_loss)]
            let x = QR_LEFT + col as f64 * module;
            #[allow(clippy::cast_precision_loss)]
            let y = QR_TOP - row as f64 * module;
            let rect = Rect::new(mm(x), mm(y - module), mm(x + module), mm(y))
                .with_mode(PaintMode::Fill);
            layer.add_rect(rect);
        }
    }

    rgb(layer, MUTED);
    layer.use_text(
        "Scan to verify",
        8.0,
        mm(QR_LEFT + 8.0),
        mm(QR_TOP - QR_SIZE - 6.0),
        &fonts.regular,
    );
}

/// Draws a titled label/value section, returning the y where the next
/// section starts.
fn draw_section(
    layer: &PdfLayerReference,
    fonts: &Fonts,
    top: f64,
    title: &str,
    rows: &[(&str, &str)],
) -> f64 {
    rgb(layer, INK);
    layer.use_text(title, 14.0, mm(MARGIN), mm(top), &fonts.bold);

    let mut y = top - 9.0;
    for (label, value) in rows {
        rgb(layer, MUTED);
        layer.use_text(format!("{label}:"), 10.0, mm(MARGIN), mm(y), &fonts.regular);
        rgb(layer, INK);
        layer.use_text(*value, 10.0, mm(MARGIN + 38.0), mm(y), &fonts.regular);
        y -= 7.0;
    }
    y - 6.0
}

fn draw_instructions(layer: &PdfLayerReference, fonts: &Fonts, top: f64) {
    rgb(layer, INK);
    layer.use_text("Important Information", 14.0, mm(MARGIN), mm(top), &fonts.bold);

    let lines = [
        "- Please arrive 30 minutes before the event starts",
        "- Bring a valid ID for verification",
        "- Show the QR code at the entrance for quick check-in",
        "- Contact support@eventbooker.example for any queries",
    ];
    let mut y = top - 9.0;
    rgb(layer, MUTED);
    for line in lines {
        layer.use_text(line, 9.0, mm(MARGIN), mm(y), &fonts.regular);
        y -= 6.0;
    }
}

fn draw_footer(layer: &PdfLayerReference, fonts: &Fonts, generated_at: DateTime<Utc>) {
    rgb(layer, MUTED);
    layer.use_text(
        format!("Generated on {}", generated_at.format("%Y-%m-%d %H:%M:%S UTC")),
        8.0,
        mm(MARGIN),
        mm(14.0),
        &fonts.regular,
    );
    layer.use_text(
        "EventBooker - your trusted event booking platform",
        8.0,
        mm(115.0),
        mm(14.0),
        &fonts.regular,
    );
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::ticket::qr::QrPayload;
    use crate::types::{BookingId, CustomerInfo, Money, PaymentMethod, PaymentStatus, UserId};

    #[test]
    fn renders_a_parseable_pdf() {
        let event = Event::sample_events().remove(0);
        let booking = Booking {
            id: BookingId::new(),
            user_id: UserId::new(),
            event_id: event.id,
            ticket_quantity: 2,
            total_amount: Money::from_dollars(150),
            customer_info: CustomerInfo {
                name: "Alice".to_string(),
                email: "alice@example.com".to_string(),
                phone: "+15551234567".to_string(),
            },
            payment_method: PaymentMethod::Debit,
            payment_status: PaymentStatus::Success,
            reference_number: "BK1700000000000A1B2C".to_string(),
            created_at: Utc::now(),
        };
        let payload = QrPayload::for_booking(&booking, &event, "http://localhost:8080");
        let qr = QrMatrix::encode(&payload.encode().unwrap()).unwrap();

        let bytes = render(&booking, &event, &qr, Utc::now()).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
        assert!(bytes.len() > 1_000);
    }
}
