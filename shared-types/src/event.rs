use serde::{Deserialize, Serialize};
use ts_rs::TS;

pub const DEFAULT_EVENT_COLOR: &str = "blue";

/// Calendar entry. The date is kept as separate day/month/year fields and
/// compared field by field; `month` is 1-based.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CalendarEvent {
    pub id: i64,
    pub day: u32,
    pub month: u32,
    pub year: i32,
    pub title: String,
    pub time: String,
    pub location: Option<String>,
    pub color: String,
    pub guest_email: Option<String>,
    pub meeting_link: Option<String>,
}

impl CalendarEvent {
    pub fn is_in_month(&self, month: u32, year: i32) -> bool {
        self.month == month && self.year == year
    }
}

#[derive(Debug, Deserialize, TS)]
#[ts(export)]
pub struct CreateEventRequest {
    pub title: String,
    pub day: u32,
    /// Defaults to the current month
    pub month: Option<u32>,
    pub year: Option<i32>,
    #[serde(default)]
    pub time: String,
    pub location: Option<String>,
    pub color: Option<String>,
    pub guest_email: Option<String>,
    pub meeting_link: Option<String>,
    #[serde(default)]
    pub notify_participants: bool,
}

#[derive(Debug, Default, Deserialize, TS)]
#[ts(export)]
pub struct ListEventsRequest {
    pub month: Option<u32>,
    pub year: Option<i32>,
}

#[derive(Debug, Serialize, TS)]
#[ts(export)]
pub struct EventsResponse {
    pub events: Vec<CalendarEvent>,
}
