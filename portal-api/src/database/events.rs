use chrono::{DateTime, Datelike, Utc};
use shared_types::{CalendarEvent, CreateEventRequest, ListEventsRequest, DEFAULT_EVENT_COLOR};

use super::seeds;
use super::store::{self, KeyValueStore, StoreError, StoredCollection};

impl StoredCollection for CalendarEvent {
    const KEY: &'static str = store::EVENTS;

    fn seed() -> Vec<Self> {
        seeds::events(Utc::now())
    }
}

/// Events of the requested month, defaulting to the month of `now`
pub fn filter_events(
    events: &[CalendarEvent],
    request: &ListEventsRequest,
    now: DateTime<Utc>,
) -> Vec<CalendarEvent> {
    let month = request.month.unwrap_or_else(|| now.month());
    let year = request.year.unwrap_or_else(|| now.year());

    events
        .iter()
        .filter(|e| e.is_in_month(month, year))
        .cloned()
        .collect()
}

pub async fn load_events(store: &dyn KeyValueStore) -> Result<Vec<CalendarEvent>, StoreError> {
    Ok(store::load_collection::<CalendarEvent>(store).await?.items)
}

pub async fn get_event(
    store: &dyn KeyValueStore,
    id: i64,
) -> Result<Option<CalendarEvent>, StoreError> {
    Ok(load_events(store).await?.into_iter().find(|e| e.id == id))
}

/// Appends a new event. Missing month and year come from `now`.
pub async fn insert_event(
    store: &dyn KeyValueStore,
    request: &CreateEventRequest,
    now: DateTime<Utc>,
) -> Result<CalendarEvent, StoreError> {
    store::update_collection::<CalendarEvent, _, _>(store, |events| {
        let event = CalendarEvent {
            id: store::next_id(events.iter().map(|e| e.id), now.timestamp_millis()),
            day: request.day,
            month: request.month.unwrap_or_else(|| now.month()),
            year: request.year.unwrap_or_else(|| now.year()),
            title: request.title.trim().to_string(),
            time: request.time.trim().to_string(),
            location: non_blank(request.location.as_deref()),
            color: non_blank(request.color.as_deref())
                .unwrap_or_else(|| DEFAULT_EVENT_COLOR.to_string()),
            guest_email: non_blank(request.guest_email.as_deref()),
            meeting_link: non_blank(request.meeting_link.as_deref()),
        };
        events.push(event.clone());
        event
    })
    .await
}

/// Removes the event from storage
pub async fn delete_event(
    store: &dyn KeyValueStore,
    id: i64,
) -> Result<Option<CalendarEvent>, StoreError> {
    store::update_collection::<CalendarEvent, _, _>(store, |events| {
        let position = events.iter().position(|e| e.id == id)?;
        Some(events.remove(position))
    })
    .await
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
