//! Router configuration.

use super::health::{health_check, readiness_check};
use super::state::AppState;
use crate::api::{bookings, events, tickets};
use axum::{
    Router,
    routing::{get, post},
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Builds the complete Axum router.
///
/// - Health checks (no authentication)
/// - Event catalog (public)
/// - Bookings (auth via bearer token)
/// - Ticket download/resend (auth) and verification (public)
pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        // Event catalog
        .route("/events", get(events::list_events))
        .route("/events/:id", get(events::get_event))
        // Booking lifecycle
        .route("/bookings", post(bookings::create_booking))
        .route("/bookings", get(bookings::list_bookings))
        .route("/bookings/:id", get(bookings::get_booking))
        // Ticket artifacts
        .route("/tickets/download/:booking_id", get(tickets::download_ticket))
        .route("/tickets/resend/:booking_id", post(tickets::resend_ticket))
        .route("/tickets/verify/:reference", get(tickets::verify_ticket));

    Router::new()
        .route("/health", get(health_check))
        .route("/ready", get(readiness_check))
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
