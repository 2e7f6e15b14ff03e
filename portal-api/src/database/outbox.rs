use serde_json::Value;
use shared_types::OutboxEntry;
use std::collections::HashSet;

use super::store::{self, KeyValueStore, StoreError, StoredCollection};

impl StoredCollection for OutboxEntry {
    const KEY: &'static str = store::OUTBOX;
}

/// Entries in creation order
pub async fn list_entries(store: &dyn KeyValueStore) -> Result<Vec<OutboxEntry>, StoreError> {
    let mut entries = store::load_collection::<OutboxEntry>(store).await?.items;
    entries.sort_by_key(|entry| entry.created_at);
    Ok(entries)
}

pub async fn push_entry(store: &dyn KeyValueStore, entry: OutboxEntry) -> Result<(), StoreError> {
    store::update_collection::<OutboxEntry, _, _>(store, |entries| entries.push(entry.clone()))
        .await
}

/// Identifier the webhook addresses the record by, lowercased
pub fn record_key(entry: &OutboxEntry) -> Option<String> {
    match entry.payload.get("id")? {
        Value::String(id) if !id.trim().is_empty() => Some(id.trim().to_lowercase()),
        Value::Number(id) => Some(id.to_string()),
        _ => None,
    }
}

/// Keys of records on `sheet` with changes the sheet has not received yet
pub async fn unsent_keys(
    store: &dyn KeyValueStore,
    sheet: &str,
) -> Result<HashSet<String>, StoreError> {
    let entries = store::load_collection::<OutboxEntry>(store).await?.items;
    Ok(entries
        .iter()
        .filter(|entry| entry.sheet == sheet)
        .filter_map(record_key)
        .collect())
}
