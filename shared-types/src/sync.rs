use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::Notice;

/// Action tag carried by every webhook payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum SyncAction {
    #[serde(rename = "CREATE")]
    Create,
    #[serde(rename = "UPDATE")]
    Update,
    #[serde(rename = "DELETE")]
    Delete,
    #[serde(rename = "signup")]
    Signup,
    #[serde(rename = "login")]
    Login,
}

impl SyncAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncAction::Create => "CREATE",
            SyncAction::Update => "UPDATE",
            SyncAction::Delete => "DELETE",
            SyncAction::Signup => "signup",
            SyncAction::Login => "login",
        }
    }
}

/// Collections that mirror a published spreadsheet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum SyncCollection {
    Alliances,
    Emails,
    Events,
    Users,
}

impl SyncCollection {
    pub const ALL: [SyncCollection; 4] = [
        SyncCollection::Alliances,
        SyncCollection::Emails,
        SyncCollection::Events,
        SyncCollection::Users,
    ];

    /// Logical sheet name sent in the `sheet` field of webhook payloads
    pub fn sheet_name(&self) -> &'static str {
        match self {
            SyncCollection::Alliances => "Alianzas",
            SyncCollection::Emails => "Correos",
            SyncCollection::Events => "Eventos",
            SyncCollection::Users => "Usuarios",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum OutboxStatus {
    Pending,
    Failed,
}

/// A local mutation waiting to be mirrored to the remote sheet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct OutboxEntry {
    pub id: String,
    pub sheet: String,
    pub action: SyncAction,
    #[ts(type = "Record<string, unknown>")]
    pub payload: serde_json::Value,
    pub attempts: u32,
    pub status: OutboxStatus,
    pub next_attempt_at: i64, // unix millis
    pub last_error: Option<String>,
    pub created_at: i64,
}

#[derive(Debug, Serialize, TS)]
#[ts(export)]
pub struct OutboxResponse {
    pub entries: Vec<OutboxEntry>,
    pub pending: usize,
    pub failed: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct FlushReport {
    pub delivered: usize,
    pub retried: usize,
    pub failed: usize,
    pub remaining: usize,
}

/// Outcome of one fetch-and-reconcile pass over a collection
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SyncReport {
    pub collection: SyncCollection,
    pub fetched: usize,
    pub kept_local: usize,
    pub total: usize,
    pub notice: Notice,
}
