use serde::{Deserialize, Serialize};
use ts_rs::TS;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Email,
    Event,
    System,
}

/// Entry of the header bell panel. Recomputed on every request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Notification {
    pub id: i64,
    pub title: String,
    pub message: String,
    pub time: String,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub read: bool,
}

#[derive(Debug, Serialize, TS)]
#[ts(export)]
pub struct NotificationsResponse {
    pub notifications: Vec<Notification>,
    pub unread_count: usize,
}
