//! Domain types for the event booking system.
//!
//! Value objects (identifiers, `Money`), the `Event` and `Booking` entities,
//! and the booking payment lifecycle state machine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::error::{Error, Result};

// ============================================================================
// Identifiers
// ============================================================================

/// Unique identifier for an event.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventId(Uuid);

impl EventId {
    /// Creates a new random `EventId`.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create an `EventId` from a `Uuid`.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the inner UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for EventId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a booking.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BookingId(Uuid);

impl BookingId {
    /// Creates a new random `BookingId`.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create a `BookingId` from a `Uuid`.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the inner UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for BookingId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for BookingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a user (supplied by the session collaborator).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub Uuid);

impl UserId {
    /// Creates a new random `UserId`.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Money Value Object (cents-based to avoid floating point errors)
// ============================================================================

/// Represents money in cents to avoid floating-point arithmetic errors.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Money(u64);

impl Money {
    /// Creates a `Money` value from cents.
    #[must_use]
    pub const fn from_cents(cents: u64) -> Self {
        Self(cents)
    }

    /// Creates a `Money` value from whole dollars.
    ///
    /// # Panics
    ///
    /// Panics on overflow. Use `checked_from_dollars` for a non-panicking
    /// conversion.
    #[must_use]
    pub const fn from_dollars(dollars: u64) -> Self {
        match dollars.checked_mul(100) {
            Some(cents) => Self(cents),
            None => panic!("Money::from_dollars overflow"),
        }
    }

    /// Creates a `Money` value from whole dollars without panicking.
    #[must_use]
    pub const fn checked_from_dollars(dollars: u64) -> Option<Self> {
        match dollars.checked_mul(100) {
            Some(cents) => Some(Self(cents)),
            None => None,
        }
    }

    /// Returns the amount in cents.
    #[must_use]
    pub const fn cents(&self) -> u64 {
        self.0
    }

    /// Multiplies a unit price by a ticket quantity.
    ///
    /// Returns `None` on overflow.
    #[must_use]
    pub const fn checked_mul_quantity(&self, quantity: u32) -> Option<Self> {
        match self.0.checked_mul(quantity as u64) {
            Some(cents) => Some(Self(cents)),
            None => None,
        }
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${}.{:02}", self.0 / 100, self.0 % 100)
    }
}

// ============================================================================
// Event
// ============================================================================

/// Event category.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventCategory {
    /// Concerts and festivals
    Music,
    /// Matches and tournaments
    Sports,
    /// Exhibitions, theatre, galleries
    Arts,
    /// Conferences and meetups
    Technology,
    /// Culinary events
    Food,
    /// Anything else
    Other,
}

impl EventCategory {
    /// Stable lowercase name, used for storage and query filters.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Music => "music",
            Self::Sports => "sports",
            Self::Arts => "arts",
            Self::Technology => "technology",
            Self::Food => "food",
            Self::Other => "other",
        }
    }

    /// Parse a category from its stored name.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] for unknown category names.
    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "music" => Ok(Self::Music),
            "sports" => Ok(Self::Sports),
            "arts" => Ok(Self::Arts),
            "technology" => Ok(Self::Technology),
            "food" => Ok(Self::Food),
            "other" => Ok(Self::Other),
            _ => Err(Error::Validation {
                message: format!("unknown event category: {s}"),
            }),
        }
    }
}

impl fmt::Display for EventCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A bookable event.
///
/// Invariant: `available_tickets <= total_tickets` at all times.
/// `available_tickets` only decreases through the store's conditional
/// decrement on the payment-success path.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Event identifier
    pub id: EventId,
    /// Event title
    pub title: String,
    /// Event description
    pub description: String,
    /// Scheduled date and time
    pub date: DateTime<Utc>,
    /// Venue / location
    pub location: String,
    /// Unit ticket price
    pub price: Money,
    /// Total ticket capacity
    pub total_tickets: u32,
    /// Remaining bookable tickets
    pub available_tickets: u32,
    /// Event category
    pub category: EventCategory,
    /// Cover image URL
    pub image: String,
    /// Organizer display name
    pub organizer: String,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl Event {
    /// Validates the inventory invariant.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if `available_tickets > total_tickets`.
    pub fn check_inventory_invariant(&self) -> Result<()> {
        if self.available_tickets > self.total_tickets {
            return Err(Error::Validation {
                message: format!(
                    "event {} has {} available tickets but only {} total",
                    self.id, self.available_tickets, self.total_tickets
                ),
            });
        }
        Ok(())
    }
}

// ============================================================================
// Booking
// ============================================================================

/// How the customer paid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PaymentMethod {
    /// Wallet / app-to-app transfer
    #[serde(rename = "gpay")]
    WalletTransfer,
    /// Debit card
    #[serde(rename = "debit")]
    Debit,
    /// Credit card
    #[serde(rename = "credit")]
    Credit,
}

impl PaymentMethod {
    /// Stable wire name, used for storage.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::WalletTransfer => "gpay",
            Self::Debit => "debit",
            Self::Credit => "credit",
        }
    }

    /// Parse a payment method from its stored name.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] for unsupported methods.
    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "gpay" => Ok(Self::WalletTransfer),
            "debit" => Ok(Self::Debit),
            "credit" => Ok(Self::Credit),
            _ => Err(Error::Validation {
                message: format!("unsupported payment method: {s}"),
            }),
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stored payment status discriminant.
///
/// `Pending` exists for generality (an implementation that persists before
/// the payment attempt), but a booking is never externally observable in
/// that state here: the lifecycle reaches a terminal status within the same
/// operation that creates the record. Terminal statuses are immutable.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    /// Created, payment not yet attempted
    Pending,
    /// Payment succeeded; ticket is retrievable
    Success,
    /// Payment declined or inventory lost to a concurrent booking
    Failed,
}

impl PaymentStatus {
    /// Stable lowercase name, used for storage.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Success => "success",
            Self::Failed => "failed",
        }
    }

    /// Parse a status from its stored name.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] for unknown status names.
    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "pending" => Ok(Self::Pending),
            "success" => Ok(Self::Success),
            "failed" => Ok(Self::Failed),
            _ => Err(Error::Validation {
                message: format!("unknown payment status: {s}"),
            }),
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Explicit payment lifecycle state machine.
///
/// Illegal transitions are unrepresentable: a confirmed state carries the
/// reference and snapshotted amount, a declined state carries the reason.
/// Only the discriminant is persisted (as [`PaymentStatus`]).
#[derive(Clone, Debug, PartialEq)]
pub enum PaymentState {
    /// Payment not yet attempted
    Pending,
    /// Terminal: payment succeeded and inventory was reserved
    Confirmed {
        /// Reference number issued for the booking
        reference: String,
        /// Amount charged (quantity x unit price at booking time)
        amount: Money,
    },
    /// Terminal: payment declined or inventory unavailable
    Declined {
        /// Human-readable decline reason
        reason: String,
    },
}

impl PaymentState {
    /// Projects the stored status discriminant.
    #[must_use]
    pub const fn status(&self) -> PaymentStatus {
        match self {
            Self::Pending => PaymentStatus::Pending,
            Self::Confirmed { .. } => PaymentStatus::Success,
            Self::Declined { .. } => PaymentStatus::Failed,
        }
    }
}

/// Customer contact details captured with a booking.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerInfo {
    /// Customer display name
    pub name: String,
    /// Contact email (ticket delivery target)
    pub email: String,
    /// Contact phone number
    pub phone: String,
}

impl CustomerInfo {
    /// Validates that all contact fields are present and well-formed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] naming the first violated field.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::Validation {
                message: "customer name is required".to_string(),
            });
        }
        if !is_valid_email(&self.email) {
            return Err(Error::Validation {
                message: format!("invalid customer email: {}", self.email),
            });
        }
        if !is_valid_phone(&self.phone) {
            return Err(Error::Validation {
                message: format!("invalid customer phone: {}", self.phone),
            });
        }
        Ok(())
    }
}

/// Syntactic email check: one `@`, non-empty local part, dotted domain.
#[must_use]
pub fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.is_empty() || email.contains(char::is_whitespace) {
        return false;
    }
    // Domain needs a dot that is neither leading nor trailing.
    domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
}

/// Syntactic phone check: 7-15 digits, optional leading `+`,
/// spaces/dashes/parentheses ignored.
#[must_use]
pub fn is_valid_phone(phone: &str) -> bool {
    let trimmed = phone.trim();
    let unsigned = trimmed.strip_prefix('+').unwrap_or(trimmed);
    let digits: String = unsigned
        .chars()
        .filter(|c| !matches!(c, ' ' | '-' | '(' | ')'))
        .collect();
    (7..=15).contains(&digits.len()) && digits.chars().all(|c| c.is_ascii_digit())
}

/// A booking attempt and its terminal outcome.
///
/// `total_amount` is snapshotted at creation time (quantity x the event's
/// unit price at that instant) and never recomputed. Records are append-only;
/// the payment status is set exactly once by the lifecycle manager.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Booking {
    /// Booking identifier
    pub id: BookingId,
    /// Owning user
    pub user_id: UserId,
    /// Booked event
    pub event_id: EventId,
    /// Number of tickets (>= 1)
    pub ticket_quantity: u32,
    /// Snapshotted total amount
    pub total_amount: Money,
    /// Customer contact details
    pub customer_info: CustomerInfo,
    /// Payment method used
    pub payment_method: PaymentMethod,
    /// Terminal payment status
    pub payment_status: PaymentStatus,
    /// Globally unique, human-shareable reference number
    pub reference_number: String,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

// ============================================================================
// Sample data (dev seeding)
// ============================================================================

impl Event {
    /// Sample events for local development and demos.
    #[must_use]
    pub fn sample_events() -> Vec<Self> {
        let now = Utc::now();
        let mk = |title: &str,
                  description: &str,
                  days_ahead: i64,
                  location: &str,
                  dollars: u64,
                  total: u32,
                  available: u32,
                  category: EventCategory,
                  image: &str,
                  organizer: &str| Self {
            id: EventId::new(),
            title: title.to_string(),
            description: description.to_string(),
            date: now + chrono::Duration::days(days_ahead),
            location: location.to_string(),
            price: Money::from_dollars(dollars),
            total_tickets: total,
            available_tickets: available,
            category,
            image: image.to_string(),
            organizer: organizer.to_string(),
            created_at: now,
        };

        vec![
            mk(
                "Summer Music Festival",
                "An amazing summer music festival featuring top artists from around the world. \
                 Live music, food trucks, and great vibes.",
                30,
                "Central Park, New York",
                75,
                1000,
                850,
                EventCategory::Music,
                "https://images.unsplash.com/photo-1493225457124-a3eb161ffa5f?w=800",
                "Music Events Inc.",
            ),
            mk(
                "Tech Conference 2026",
                "The biggest technology conference of the year. Industry leaders, networking, \
                 and the latest innovations.",
                60,
                "Convention Center, San Francisco",
                299,
                500,
                320,
                EventCategory::Technology,
                "https://images.unsplash.com/photo-1540575467063-178a50c2df87?w=800",
                "TechWorld Events",
            ),
            mk(
                "Food & Wine Festival",
                "Taste the finest cuisines and wines from renowned chefs and wineries.",
                45,
                "Downtown Plaza, Chicago",
                125,
                300,
                180,
                EventCategory::Food,
                "https://images.unsplash.com/photo-1414235077428-338989a2e8c0?w=800",
                "Culinary Masters",
            ),
            mk(
                "Championship Football Match",
                "The most anticipated football match of the season, live from the stadium.",
                20,
                "National Stadium, Los Angeles",
                150,
                2000,
                1200,
                EventCategory::Sports,
                "https://images.unsplash.com/photo-1431324155629-1a6deb1dec8d?w=800",
                "Sports Entertainment LLC",
            ),
            mk(
                "Art Exhibition Opening",
                "Contemporary art from emerging and established artists.",
                25,
                "Modern Art Gallery, Miami",
                50,
                150,
                90,
                EventCategory::Arts,
                "https://images.unsplash.com/photo-1541961017774-22349e4a1262?w=800",
                "Contemporary Arts Foundation",
            ),
        ]
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn money_display_renders_cents() {
        assert_eq!(Money::from_cents(7500).to_string(), "$75.00");
        assert_eq!(Money::from_cents(125).to_string(), "$1.25");
        assert_eq!(Money::from_cents(5).to_string(), "$0.05");
    }

    #[test]
    fn money_quantity_multiplication() {
        let price = Money::from_dollars(75);
        assert_eq!(price.checked_mul_quantity(3), Some(Money::from_cents(22500)));
        assert_eq!(Money::from_cents(u64::MAX).checked_mul_quantity(2), None);
    }

    #[test]
    fn payment_method_wire_names_round_trip() {
        for method in [
            PaymentMethod::WalletTransfer,
            PaymentMethod::Debit,
            PaymentMethod::Credit,
        ] {
            assert_eq!(PaymentMethod::parse(method.as_str()).unwrap(), method);
        }
        assert!(PaymentMethod::parse("cash").is_err());
    }

    #[test]
    fn payment_state_projects_status() {
        assert_eq!(PaymentState::Pending.status(), PaymentStatus::Pending);
        assert_eq!(
            PaymentState::Confirmed {
                reference: "BK1X".to_string(),
                amount: Money::from_dollars(10),
            }
            .status(),
            PaymentStatus::Success
        );
        assert_eq!(
            PaymentState::Declined {
                reason: "card declined".to_string(),
            }
            .status(),
            PaymentStatus::Failed
        );
    }

    #[test]
    fn email_validation() {
        assert!(is_valid_email("alice@example.com"));
        assert!(is_valid_email("a.b+c@sub.example.co"));
        assert!(!is_valid_email("alice"));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email("alice@"));
        assert!(!is_valid_email("alice@example"));
        assert!(!is_valid_email("alice@.com"));
        assert!(!is_valid_email("alice smith@example.com"));
    }

    #[test]
    fn phone_validation() {
        assert!(is_valid_phone("+1 (555) 123-4567"));
        assert!(is_valid_phone("5551234567"));
        assert!(!is_valid_phone("123"));
        assert!(!is_valid_phone("phone-number"));
        assert!(!is_valid_phone(""));
    }

    #[test]
    fn customer_info_requires_all_fields() {
        let valid = CustomerInfo {
            name: "Alice".to_string(),
            email: "alice@example.com".to_string(),
            phone: "+15551234567".to_string(),
        };
        assert!(valid.validate().is_ok());

        let mut missing_name = valid.clone();
        missing_name.name = "  ".to_string();
        assert!(missing_name.validate().is_err());

        let mut bad_email = valid.clone();
        bad_email.email = "not-an-email".to_string();
        assert!(bad_email.validate().is_err());

        let mut bad_phone = valid;
        bad_phone.phone = "abc".to_string();
        assert!(bad_phone.validate().is_err());
    }

    #[test]
    fn sample_events_respect_inventory_invariant() {
        for event in Event::sample_events() {
            assert!(event.check_inventory_invariant().is_ok());
            assert!(event.available_tickets <= event.total_tickets);
        }
    }
}
