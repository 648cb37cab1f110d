//! `PostgreSQL` store implementation.
//!
//! Uses runtime-checked sqlx queries (no compile-time DB macros, so the
//! crate builds without a live `DATABASE_URL`). The inventory ledger is a
//! single conditional `UPDATE`: the availability check and the decrement
//! happen in one statement, so concurrent bookings cannot oversell.

use super::{BookingStore, EventFilter, EventPage, EventStore, REFERENCE_INSERT_ATTEMPTS};
use crate::config::PostgresConfig;
use crate::error::{Error, Result};
use crate::reference;
use crate::types::{
    Booking, BookingId, CustomerInfo, Event, EventCategory, EventId, Money, PaymentMethod,
    PaymentStatus, UserId,
};
use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::{QueryBuilder, Row};
use std::time::Duration;

/// `PostgreSQL` implementation of [`EventStore`] and [`BookingStore`].
#[derive(Clone)]
pub struct PostgresStore {
    /// Connection pool.
    pool: PgPool,
}

impl PostgresStore {
    /// Wraps an existing pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connects a pool from configuration.
    ///
    /// # Errors
    ///
    /// Returns error if the database is unreachable.
    pub async fn connect(config: &PostgresConfig) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.connect_timeout))
            .connect(&config.url)
            .await?;
        Ok(Self::new(pool))
    }

    /// Runs database migrations.
    ///
    /// # Errors
    ///
    /// Returns error if migrations fail.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| Error::Database {
                message: format!("migration failed: {e}"),
            })?;
        Ok(())
    }

    /// Access the underlying pool (tests, health checks).
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }
}

const EVENT_COLUMNS: &str = "id, title, description, date, location, price_cents, \
     total_tickets, available_tickets, category, image, organizer, created_at";

const BOOKING_COLUMNS: &str = "id, user_id, event_id, ticket_quantity, total_amount_cents, \
     customer_name, customer_email, customer_phone, payment_method, payment_status, \
     reference_number, created_at";

fn row_to_event(row: &PgRow) -> Result<Event> {
    let price_cents: i64 = row.try_get("price_cents")?;
    let total_tickets: i32 = row.try_get("total_tickets")?;
    let available_tickets: i32 = row.try_get("available_tickets")?;
    let category: String = row.try_get("category")?;

    Ok(Event {
        id: EventId::from_uuid(row.try_get("id")?),
        title: row.try_get("title")?,
        description: row.try_get("description")?,
        date: row.try_get("date")?,
        location: row.try_get("location")?,
        price: Money::from_cents(u64::try_from(price_cents).unwrap_or(0)),
        total_tickets: u32::try_from(total_tickets).unwrap_or(0),
        available_tickets: u32::try_from(available_tickets).unwrap_or(0),
        category: EventCategory::parse(&category)?,
        image: row.try_get("image")?,
        organizer: row.try_get("organizer")?,
        created_at: row.try_get("created_at")?,
    })
}

fn row_to_booking(row: &PgRow) -> Result<Booking> {
    let total_amount_cents: i64 = row.try_get("total_amount_cents")?;
    let ticket_quantity: i32 = row.try_get("ticket_quantity")?;
    let payment_method: String = row.try_get("payment_method")?;
    let payment_status: String = row.try_get("payment_status")?;

    Ok(Booking {
        id: BookingId::from_uuid(row.try_get("id")?),
        user_id: UserId(row.try_get("user_id")?),
        event_id: EventId::from_uuid(row.try_get("event_id")?),
        ticket_quantity: u32::try_from(ticket_quantity).unwrap_or(0),
        total_amount: Money::from_cents(u64::try_from(total_amount_cents).unwrap_or(0)),
        customer_info: CustomerInfo {
            name: row.try_get("customer_name")?,
            email: row.try_get("customer_email")?,
            phone: row.try_get("customer_phone")?,
        },
        payment_method: PaymentMethod::parse(&payment_method)?,
        payment_status: PaymentStatus::parse(&payment_status)?,
        reference_number: row.try_get("reference_number")?,
        created_at: row.try_get("created_at")?,
    })
}

/// Appends the shared event filter predicates to a query.
fn push_event_filters(qb: &mut QueryBuilder<'_, sqlx::Postgres>, filter: &EventFilter) {
    qb.push(" WHERE date >= ");
    qb.push_bind(filter.after);
    if let Some(category) = filter.category {
        qb.push(" AND category = ");
        qb.push_bind(category.as_str());
    }
    if let Some(search) = &filter.search {
        let pattern = format!("%{search}%");
        qb.push(" AND (title ILIKE ");
        qb.push_bind(pattern.clone());
        qb.push(" OR description ILIKE ");
        qb.push_bind(pattern.clone());
        qb.push(" OR location ILIKE ");
        qb.push_bind(pattern);
        qb.push(")");
    }
}

#[async_trait]
impl EventStore for PostgresStore {
    async fn insert_event(&self, event: &Event) -> Result<()> {
        event.check_inventory_invariant()?;
        sqlx::query(
            "INSERT INTO events (id, title, description, date, location, price_cents, \
             total_tickets, available_tickets, category, image, organizer, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)",
        )
        .bind(event.id.as_uuid())
        .bind(&event.title)
        .bind(&event.description)
        .bind(event.date)
        .bind(&event.location)
        .bind(i64::try_from(event.price.cents()).unwrap_or(i64::MAX))
        .bind(i32::try_from(event.total_tickets).unwrap_or(i32::MAX))
        .bind(i32::try_from(event.available_tickets).unwrap_or(i32::MAX))
        .bind(event.category.as_str())
        .bind(&event.image)
        .bind(&event.organizer)
        .bind(event.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_event(&self, id: EventId) -> Result<Option<Event>> {
        let row = sqlx::query(&format!("SELECT {EVENT_COLUMNS} FROM events WHERE id = $1"))
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(row_to_event).transpose()
    }

    async fn list_events(&self, filter: &EventFilter) -> Result<EventPage> {
        let mut count_qb = QueryBuilder::new("SELECT COUNT(*) FROM events");
        push_event_filters(&mut count_qb, filter);
        let total: i64 = count_qb.build_query_scalar().fetch_one(&self.pool).await?;

        let mut qb = QueryBuilder::new(format!("SELECT {EVENT_COLUMNS} FROM events"));
        push_event_filters(&mut qb, filter);
        qb.push(" ORDER BY date ASC LIMIT ");
        qb.push_bind(i64::from(filter.limit));
        qb.push(" OFFSET ");
        qb.push_bind(i64::try_from(filter.offset()).unwrap_or(i64::MAX));

        let rows = qb.build().fetch_all(&self.pool).await?;
        let events = rows
            .iter()
            .map(row_to_event)
            .collect::<Result<Vec<Event>>>()?;

        Ok(EventPage {
            events,
            total: u64::try_from(total).unwrap_or(0),
        })
    }

    async fn reserve_tickets(&self, id: EventId, quantity: u32) -> Result<()> {
        let quantity = i32::try_from(quantity).map_err(|_| Error::Validation {
            message: "ticket quantity out of range".to_string(),
        })?;

        // Check-and-decrement in a single statement. Zero rows affected
        // means either the event is gone or the inventory no longer covers
        // the request.
        let result = sqlx::query(
            "UPDATE events SET available_tickets = available_tickets - $2 \
             WHERE id = $1 AND available_tickets >= $2",
        )
        .bind(id.as_uuid())
        .bind(quantity)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() > 0 {
            return Ok(());
        }

        let available: Option<i32> =
            sqlx::query_scalar("SELECT available_tickets FROM events WHERE id = $1")
                .bind(id.as_uuid())
                .fetch_optional(&self.pool)
                .await?;

        match available {
            None => Err(Error::NotFound { resource: "Event" }),
            Some(available) => Err(Error::InsufficientInventory {
                available: u32::try_from(available).unwrap_or(0),
            }),
        }
    }
}

#[async_trait]
impl BookingStore for PostgresStore {
    async fn insert_booking(&self, mut booking: Booking) -> Result<Booking> {
        for attempt in 0..REFERENCE_INSERT_ATTEMPTS {
            let result = sqlx::query(
                "INSERT INTO bookings (id, user_id, event_id, ticket_quantity, \
                 total_amount_cents, customer_name, customer_email, customer_phone, \
                 payment_method, payment_status, reference_number, created_at) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)",
            )
            .bind(booking.id.as_uuid())
            .bind(booking.user_id.0)
            .bind(booking.event_id.as_uuid())
            .bind(i32::try_from(booking.ticket_quantity).unwrap_or(i32::MAX))
            .bind(i64::try_from(booking.total_amount.cents()).unwrap_or(i64::MAX))
            .bind(&booking.customer_info.name)
            .bind(&booking.customer_info.email)
            .bind(&booking.customer_info.phone)
            .bind(booking.payment_method.as_str())
            .bind(booking.payment_status.as_str())
            .bind(&booking.reference_number)
            .bind(booking.created_at)
            .execute(&self.pool)
            .await;

            match result {
                Ok(_) => return Ok(booking),
                Err(e) if is_unique_violation(&e) => {
                    tracing::warn!(
                        reference = %booking.reference_number,
                        attempt,
                        "reference collision, regenerating"
                    );
                    booking.reference_number = reference::generate();
                }
                Err(e) => return Err(e.into()),
            }
        }
        Err(Error::Database {
            message: "could not find a free reference number".to_string(),
        })
    }

    async fn get_booking(&self, id: BookingId) -> Result<Option<Booking>> {
        let row = sqlx::query(&format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = $1"
        ))
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(row_to_booking).transpose()
    }

    async fn list_for_user(&self, user: UserId) -> Result<Vec<Booking>> {
        let rows = sqlx::query(&format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings WHERE user_id = $1 \
             ORDER BY created_at DESC"
        ))
        .bind(user.0)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(row_to_booking).collect()
    }

    async fn find_by_reference(&self, reference: &str) -> Result<Option<Booking>> {
        let row = sqlx::query(&format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings WHERE reference_number = $1"
        ))
        .bind(reference)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(row_to_booking).transpose()
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .is_some_and(sqlx::error::DatabaseError::is_unique_violation)
}
