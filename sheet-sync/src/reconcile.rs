//! Merging a freshly fetched remote snapshot into the local collection.
//!
//! One algorithm serves every collection. What differs per collection is
//! the [`MergePolicy`]: how records are matched, how long a local-only
//! record survives before it is treated as remotely deleted, and the
//! output order. Records with changes still waiting to reach the sheet
//! keep their local state whatever the snapshot says.

use chrono::{DateTime, Duration, Utc};
use shared_types::{Alliance, CalendarEvent, EmailFolder, EmailMessage, UserAccount};
use std::collections::HashSet;

pub const ALLIANCE_GRACE_WINDOW_MINUTES: i64 = 15;

pub trait Reconcilable {
    fn record_id(&self) -> i64;

    /// Key used instead of the id when ids are not stable across sources
    fn natural_key(&self) -> Option<String> {
        None
    }

    /// Records that never exist remotely and are carried over verbatim
    fn is_local_only(&self) -> bool {
        false
    }

    /// Identifier the sheet webhook addresses the record by
    fn sheet_key(&self) -> String {
        self.record_id().to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyStrategy {
    /// Remote suppresses local when ids match
    Id,
    /// Remote suppresses local when ids or case-insensitive natural keys match
    NaturalKey,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOrder {
    IdDescending,
    /// Remote records in sheet order, then surviving local records
    RemoteFirst,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergePolicy {
    pub key: KeyStrategy,
    /// `None` keeps local records absent from the remote set indefinitely
    pub grace_window: Option<Duration>,
    pub order: MergeOrder,
    /// Lowercased sheet keys of records with unsent local changes
    pub pending: HashSet<String>,
}

impl MergePolicy {
    pub fn alliances() -> Self {
        Self {
            key: KeyStrategy::Id,
            grace_window: Some(Duration::minutes(ALLIANCE_GRACE_WINDOW_MINUTES)),
            order: MergeOrder::IdDescending,
            pending: HashSet::new(),
        }
    }

    pub fn calendar() -> Self {
        Self {
            key: KeyStrategy::Id,
            grace_window: None,
            order: MergeOrder::RemoteFirst,
            pending: HashSet::new(),
        }
    }

    pub fn emails() -> Self {
        Self {
            key: KeyStrategy::NaturalKey,
            grace_window: None,
            order: MergeOrder::IdDescending,
            pending: HashSet::new(),
        }
    }

    pub fn users() -> Self {
        Self {
            key: KeyStrategy::NaturalKey,
            grace_window: None,
            order: MergeOrder::RemoteFirst,
            pending: HashSet::new(),
        }
    }

    pub fn with_grace_window(mut self, grace_window: Option<Duration>) -> Self {
        self.grace_window = grace_window;
        self
    }

    pub fn with_pending(mut self, keys: impl IntoIterator<Item = String>) -> Self {
        self.pending = keys.into_iter().map(|key| key.to_lowercase()).collect();
        self
    }

    fn is_pending<T: Reconcilable>(&self, record: &T) -> bool {
        !self.pending.is_empty() && self.pending.contains(&record.sheet_key().to_lowercase())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MergeOutcome<T> {
    pub records: Vec<T>,
    /// Distinct remote records taken into the result
    pub fetched: usize,
    /// Local records that survived the merge
    pub kept_local: usize,
}

/// Combines `remote` (authoritative) with `local`.
///
/// Output ids are unique. For a fixed `now`, merging the same remote
/// snapshot again yields the same records.
pub fn reconcile<T>(
    local: &[T],
    remote: Vec<T>,
    policy: &MergePolicy,
    now: DateTime<Utc>,
) -> MergeOutcome<T>
where
    T: Reconcilable + Clone,
{
    let mut remote_ids = HashSet::new();
    let mut remote_keys = HashSet::new();
    let mut merged: Vec<T> = Vec::with_capacity(remote.len() + local.len());

    for record in remote {
        // The local side is ahead of the sheet for this record
        if policy.is_pending(&record) {
            continue;
        }
        if !remote_ids.insert(record.record_id()) {
            continue;
        }
        if let Some(key) = record.natural_key() {
            remote_keys.insert(key.to_lowercase());
        }
        merged.push(record);
    }
    let fetched = merged.len();

    let now_ms = now.timestamp_millis();
    let mut preserved = Vec::new();

    for record in local {
        if remote_ids.contains(&record.record_id()) {
            continue;
        }

        if record.is_local_only() || policy.is_pending(record) {
            preserved.push(record.clone());
            continue;
        }

        if policy.key == KeyStrategy::NaturalKey {
            let shadowed = record
                .natural_key()
                .is_some_and(|key| remote_keys.contains(&key.to_lowercase()));
            if shadowed {
                continue;
            }
        }

        // Local ids are creation timestamps in milliseconds
        let within_grace = match policy.grace_window {
            Some(window) => now_ms - record.record_id() < window.num_milliseconds(),
            None => true,
        };
        if within_grace {
            merged.push(record.clone());
        }
    }

    merged.extend(preserved);

    // A local record may repeat an id that was already taken from local
    let mut seen = HashSet::new();
    merged.retain(|record| seen.insert(record.record_id()));
    // Remote ids are unique, so the first `fetched` records all survive
    let kept_local = merged.len() - fetched;

    if policy.order == MergeOrder::IdDescending {
        merged.sort_by(|a, b| b.record_id().cmp(&a.record_id()));
    }

    MergeOutcome {
        records: merged,
        fetched,
        kept_local,
    }
}

impl Reconcilable for Alliance {
    fn record_id(&self) -> i64 {
        self.id
    }
}

impl Reconcilable for CalendarEvent {
    fn record_id(&self) -> i64 {
        self.id
    }
}

impl Reconcilable for EmailMessage {
    fn record_id(&self) -> i64 {
        self.id
    }

    fn natural_key(&self) -> Option<String> {
        Some(format!("{}-{}", self.sender, self.subject))
    }

    /// Sent mail and trashed mail exist only on this side
    fn is_local_only(&self) -> bool {
        matches!(self.folder, EmailFolder::Sent | EmailFolder::Trash)
    }
}

impl Reconcilable for UserAccount {
    fn record_id(&self) -> i64 {
        self.id
    }

    fn natural_key(&self) -> Option<String> {
        Some(self.email.clone())
    }

    fn sheet_key(&self) -> String {
        self.email.trim().to_lowercase()
    }
}
