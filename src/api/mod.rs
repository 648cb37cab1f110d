//! HTTP API handlers, organized by domain.
//!
//! - Events: public catalog browsing
//! - Bookings: the authenticated booking lifecycle
//! - Tickets: download, resend and public verification

pub mod bookings;
pub mod events;
pub mod tickets;
