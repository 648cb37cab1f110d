//! Event catalog endpoints.
//!
//! - GET /api/events - paginated, searchable list of upcoming events
//! - GET /api/events/:id - single event

use crate::error::{Error, Result};
use crate::server::state::AppState;
use crate::store::EventFilter;
use crate::types::{Event, EventCategory};
use axum::{
    Json,
    extract::{Path, Query, State},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Query parameters for listing events.
#[derive(Debug, Deserialize)]
pub struct ListEventsQuery {
    /// 1-based page number
    #[serde(default = "default_page")]
    pub page: u32,
    /// Page size (clamped to 1..=100)
    #[serde(default = "default_limit")]
    pub limit: u32,
    /// Case-insensitive search over title, description and location
    pub search: Option<String>,
    /// Category filter; `all` (or absent) means every category
    pub category: Option<String>,
}

const fn default_page() -> u32 {
    1
}

const fn default_limit() -> u32 {
    9
}

/// Event details on the wire.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventResponse {
    /// Event id
    pub id: Uuid,
    /// Title
    pub title: String,
    /// Description
    pub description: String,
    /// Scheduled date
    pub date: DateTime<Utc>,
    /// Location
    pub location: String,
    /// Unit price in cents
    pub price: u64,
    /// Total capacity
    pub total_tickets: u32,
    /// Remaining tickets
    pub available_tickets: u32,
    /// Category
    pub category: EventCategory,
    /// Cover image URL
    pub image: String,
    /// Organizer name
    pub organizer: String,
}

impl From<Event> for EventResponse {
    fn from(event: Event) -> Self {
        Self {
            id: *event.id.as_uuid(),
            title: event.title,
            description: event.description,
            date: event.date,
            location: event.location,
            price: event.price.cents(),
            total_tickets: event.total_tickets,
            available_tickets: event.available_tickets,
            category: event.category,
            image: event.image,
            organizer: event.organizer,
        }
    }
}

/// Pagination envelope.
#[derive(Debug, Serialize)]
pub struct Pagination {
    /// Current page (1-based)
    pub current: u32,
    /// Total pages
    pub pages: u64,
    /// Total matching events
    pub total: u64,
}

/// Response for listing events.
#[derive(Debug, Serialize)]
pub struct ListEventsResponse {
    /// Events on this page, ascending by date
    pub events: Vec<EventResponse>,
    /// Pagination envelope
    pub pagination: Pagination,
}

/// List upcoming events with pagination, search and category filters.
///
/// Public endpoint. Only future events (`date >= now`) are returned,
/// sorted ascending by date.
///
/// # Errors
///
/// Returns [`Error::Validation`] for an unknown category.
pub async fn list_events(
    Query(query): Query<ListEventsQuery>,
    State(state): State<AppState>,
) -> Result<Json<ListEventsResponse>> {
    let category = match query.category.as_deref() {
        None | Some("all" | "") => None,
        Some(name) => Some(EventCategory::parse(name)?),
    };

    let filter = EventFilter {
        page: query.page.max(1),
        limit: query.limit.clamp(1, 100),
        search: query.search.clone().filter(|s| !s.trim().is_empty()),
        category,
        after: Utc::now(),
    };

    let page = state.events.list_events(&filter).await?;
    let pages = page.total.div_ceil(u64::from(filter.limit));

    Ok(Json(ListEventsResponse {
        events: page.events.into_iter().map(EventResponse::from).collect(),
        pagination: Pagination {
            current: filter.page,
            pages,
            total: page.total,
        },
    }))
}

/// Get a single event by id.
///
/// Public endpoint.
///
/// # Errors
///
/// Returns [`Error::NotFound`] if the event does not exist.
pub async fn get_event(
    Path(event_id): Path<Uuid>,
    State(state): State<AppState>,
) -> Result<Json<EventResponse>> {
    let event = state
        .events
        .get_event(crate::types::EventId::from_uuid(event_id))
        .await?
        .ok_or(Error::NotFound { resource: "Event" })?;
    Ok(Json(event.into()))
}
