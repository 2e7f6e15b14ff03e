use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::AllianceStats;

/// Counters for the landing page
#[derive(Debug, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DashboardStats {
    pub volunteers: usize,
    pub unread_emails: usize,
    pub events: usize,
    pub alliances: AllianceStats,
}
