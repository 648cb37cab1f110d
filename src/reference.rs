//! Booking reference number generation.
//!
//! Reference numbers are the human-facing key for a booking: printed on the
//! ticket, embedded in the QR payload, and used for public verification.
//! Format: `BK` + unix-epoch milliseconds + 5 random uppercase alphanumeric
//! characters. URL-safe, uppercase, short enough to type by hand.
//!
//! The random suffix makes collisions negligible but not impossible, so the
//! booking store enforces a uniqueness constraint and regenerates on
//! conflict (see `BookingStore::insert_booking`).

use chrono::Utc;
use rand::Rng;

/// Fixed reference number prefix.
pub const REFERENCE_PREFIX: &str = "BK";

/// Length of the random suffix.
const SUFFIX_LEN: usize = 5;

/// Uppercase alphanumeric alphabet for the suffix.
const SUFFIX_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Generates a new booking reference number.
#[must_use]
pub fn generate() -> String {
    let mut rng = rand::thread_rng();
    let suffix: String = (0..SUFFIX_LEN)
        .map(|_| {
            let idx = rng.gen_range(0..SUFFIX_ALPHABET.len());
            SUFFIX_ALPHABET[idx] as char
        })
        .collect();
    format!("{REFERENCE_PREFIX}{}{suffix}", Utc::now().timestamp_millis())
}

/// Checks whether a string is shaped like a reference number.
///
/// Used as a cheap guard before hitting the store on the public
/// verification endpoint.
#[must_use]
pub fn looks_like_reference(candidate: &str) -> bool {
    candidate.len() > REFERENCE_PREFIX.len() + SUFFIX_LEN
        && candidate.starts_with(REFERENCE_PREFIX)
        && candidate[REFERENCE_PREFIX.len()..]
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn generated_references_have_the_expected_shape() {
        let reference = generate();
        assert!(reference.starts_with(REFERENCE_PREFIX));
        assert!(looks_like_reference(&reference));
        // Millis timestamp (13 digits today) plus prefix and suffix.
        assert!(reference.len() >= REFERENCE_PREFIX.len() + 13 + SUFFIX_LEN);
    }

    #[test]
    fn references_are_url_safe_uppercase() {
        let reference = generate();
        assert!(
            reference
                .chars()
                .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
        );
    }

    #[test]
    fn a_batch_of_references_does_not_collide() {
        // Timestamp + 36^5 suffix space makes collisions in a small batch
        // astronomically unlikely; the store still guards the general case.
        let references: HashSet<String> = (0..1_000).map(|_| generate()).collect();
        assert_eq!(references.len(), 1_000);
    }

    #[test]
    fn shape_check_rejects_foreign_strings() {
        assert!(!looks_like_reference(""));
        assert!(!looks_like_reference("BK"));
        assert!(!looks_like_reference("bk1699999999999abcde"));
        assert!(!looks_like_reference("TK1699999999999ABCDE"));
        assert!(!looks_like_reference("BK16999999!9999ABCDE"));
    }
}
