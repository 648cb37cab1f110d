//! Event ticket booking service.
//!
//! A small HTTP backend for browsing events, booking tickets against a
//! simulated payment gateway, and issuing PDF tickets with QR codes that a
//! venue scanner can verify by reference number.
//!
//! # Architecture
//!
//! - [`types`] - domain types shared across the crate
//! - [`store`] - event/booking persistence behind [`store::EventStore`] and
//!   [`store::BookingStore`] (Postgres for real, in-memory for dev/tests)
//! - [`payment_gateway`] - the simulated payment collaborator
//! - [`booking`] - the lifecycle manager driving one attempt to a terminal
//!   state
//! - [`ticket`] - PDF rendering and the QR payload
//! - [`notify`] - email/console ticket delivery
//! - [`verify`] - public reference-number verification
//! - [`auth`] - the session collaborator and its Axum extractors
//! - [`api`] / [`server`] - HTTP handlers and router wiring

pub mod api;
pub mod auth;
pub mod booking;
pub mod config;
pub mod error;
pub mod notify;
pub mod payment_gateway;
pub mod reference;
pub mod server;
pub mod store;
pub mod ticket;
pub mod types;
pub mod verify;

pub use error::{Error, Result};
