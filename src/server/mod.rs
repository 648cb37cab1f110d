//! HTTP server module.
//!
//! Axum server wiring: shared state, health checks and the router.

pub mod health;
pub mod routes;
pub mod state;

pub use routes::build_router;
pub use state::AppState;
