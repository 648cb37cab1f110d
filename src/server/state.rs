//! Application state for the HTTP server.

use crate::auth::SessionProvider;
use crate::booking::BookingService;
use crate::store::EventStore;
use crate::verify::VerificationService;
use std::sync::Arc;

/// Application state shared across all HTTP handlers.
///
/// Cloned (cheaply via `Arc`) for each request.
#[derive(Clone)]
pub struct AppState {
    /// Booking lifecycle manager
    pub service: Arc<BookingService>,
    /// Public ticket verification
    pub verifier: Arc<VerificationService>,
    /// Event catalog queries
    pub events: Arc<dyn EventStore>,
    /// Session collaborator for auth-gated routes
    pub sessions: Arc<dyn SessionProvider>,
}

impl AppState {
    /// Creates the shared state.
    #[must_use]
    pub fn new(
        service: Arc<BookingService>,
        verifier: Arc<VerificationService>,
        events: Arc<dyn EventStore>,
        sessions: Arc<dyn SessionProvider>,
    ) -> Self {
        Self {
            service,
            verifier,
            events,
            sessions,
        }
    }
}
