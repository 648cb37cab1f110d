//! Booking service binary.
//!
//! Wires configuration, storage, the payment simulator, ticket delivery and
//! the HTTP server together and runs until interrupted.

use event_booker::auth::{SessionProvider, StaticSessionProvider};
use event_booker::booking::BookingService;
use event_booker::config::Config;
use event_booker::notify::{ConsoleNotifier, SmtpNotifier, TicketNotifier};
use event_booker::payment_gateway::{PaymentGateway, SimulatedPaymentGateway};
use event_booker::server::{AppState, build_router};
use event_booker::store::{BookingStore, EventStore, InMemoryStore, PostgresStore};
use event_booker::ticket::TicketGenerator;
use event_booker::types::UserId;
use event_booker::verify::VerificationService;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "event_booker=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .try_init()?;

    let config = Config::from_env();

    let (events, bookings): (Arc<dyn EventStore>, Arc<dyn BookingStore>) =
        match config.app.store_backend.as_str() {
            "memory" => {
                tracing::info!(
                    seeded = config.app.seed_sample_events,
                    "using in-memory storage"
                );
                let store = if config.app.seed_sample_events {
                    Arc::new(InMemoryStore::with_sample_events())
                } else {
                    Arc::new(InMemoryStore::new())
                };
                (Arc::clone(&store) as Arc<dyn EventStore>, store)
            }
            _ => {
                let store = Arc::new(PostgresStore::connect(&config.postgres).await?);
                store.migrate().await?;
                tracing::info!("connected to postgres and ran migrations");
                (Arc::clone(&store) as Arc<dyn EventStore>, store)
            }
        };

    let gateway: Arc<dyn PaymentGateway> =
        Arc::new(SimulatedPaymentGateway::new(config.payment.success_rate));
    let notifier: Arc<dyn TicketNotifier> = match &config.smtp {
        Some(smtp) => {
            tracing::info!(server = %smtp.server, "ticket delivery via smtp");
            Arc::new(SmtpNotifier::new(smtp))
        }
        None => {
            tracing::info!("no smtp configured, logging tickets to the console");
            Arc::new(ConsoleNotifier::new())
        }
    };

    let service = Arc::new(BookingService::new(
        Arc::clone(&events),
        Arc::clone(&bookings),
        gateway,
        notifier,
        TicketGenerator::new(&config.app.base_url),
        Duration::from_millis(config.payment.timeout_ms),
    ));
    let verifier = Arc::new(VerificationService::new(
        Arc::clone(&bookings),
        Arc::clone(&events),
    ));

    // Sessions are external to this system; the static provider stands in.
    let sessions = Arc::new(StaticSessionProvider::new());
    let demo_user = UserId::new();
    let demo_token = sessions.issue(demo_user);
    tracing::info!(user = %demo_user.0, token = %demo_token, "issued demo session token");

    let state = AppState::new(
        service,
        verifier,
        events,
        sessions as Arc<dyn SessionProvider>,
    );
    let router = build_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "booking service listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to install ctrl-c handler");
        return;
    }
    tracing::info!("shutdown signal received");
}
