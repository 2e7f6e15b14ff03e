//! Persisted queue of mutations waiting to be mirrored to the sheet webhook.
//!
//! Local state is committed before anything is queued. Delivery happens on
//! the flush loop (or an explicit flush) with exponential backoff, and
//! entries that exhaust their attempts stay visible as `failed` until
//! retried by hand.

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use shared_types::{
    FlushReport, Notice, OutboxEntry, OutboxResponse, OutboxStatus, SyncAction, SyncCollection,
};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::config::OutboxConfig;
use crate::database::outbox as outbox_db;
use crate::database::store;
use crate::database::KeyValueStore;
use crate::integrations::webhook::MutationSink;

const MAX_BACKOFF_SECS: u64 = 3600;

pub struct OutboxRelay {
    store: Arc<dyn KeyValueStore>,
    sink: Arc<dyn MutationSink>,
    max_attempts: u32,
    base_backoff_secs: u64,
    /// Serializes flushes so an entry is never handed to the sink twice
    flush_lock: Mutex<()>,
    shutting_down: AtomicBool,
}

impl OutboxRelay {
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        sink: Arc<dyn MutationSink>,
        config: &OutboxConfig,
    ) -> Self {
        Self {
            store,
            sink,
            max_attempts: config.max_attempts.max(1),
            base_backoff_secs: config.base_backoff_secs,
            flush_lock: Mutex::new(()),
            shutting_down: AtomicBool::new(false),
        }
    }

    /// Queues `record` for the webhook. Never fails the caller: a store error
    /// is logged and reported through the returned notice.
    pub async fn enqueue(
        &self,
        collection: SyncCollection,
        action: SyncAction,
        mut record: Map<String, Value>,
        now: DateTime<Utc>,
    ) -> Notice {
        let sheet = collection.sheet_name();
        record.insert("action".to_string(), Value::from(action.as_str()));
        record.insert("sheet".to_string(), Value::from(sheet));

        let entry = OutboxEntry {
            id: uuid::Uuid::new_v4().to_string(),
            sheet: sheet.to_string(),
            action,
            payload: Value::Object(record),
            attempts: 0,
            status: OutboxStatus::Pending,
            next_attempt_at: now.timestamp_millis(),
            last_error: None,
            created_at: now.timestamp_millis(),
        };
        let entry_id = entry.id.clone();

        if let Err(e) = outbox_db::push_entry(self.store.as_ref(), entry).await {
            tracing::warn!("Failed to queue {} for sheet {}: {}", action.as_str(), sheet, e);
            return Notice::error(
                "Error de sincronización",
                "No se pudo registrar el cambio para la hoja remota.",
            );
        }

        tracing::info!("Queued {} for sheet {} ({})", action.as_str(), sheet, entry_id);

        if self.sink.is_configured() {
            Notice::info(
                "Sincronizando",
                format!("Operación {} enviada a la nube.", action.as_str()),
            )
        } else {
            Notice::warning(
                "Sincronización pendiente",
                "No hay webhook configurado; el cambio queda en cola.",
            )
        }
    }

    /// Delivers due pending entries in creation order.
    ///
    /// Entries for the same record go out strictly in sequence: once one of
    /// them is failed, backing off or fails now, the later ones wait.
    pub async fn flush(&self, now: DateTime<Utc>) -> Result<FlushReport> {
        let _flushing = self.flush_lock.lock().await;
        let entries = outbox_db::list_entries(self.store.as_ref()).await?;

        if !self.sink.is_configured() {
            let remaining = entries.len();
            if remaining > 0 {
                tracing::debug!("No webhook configured, {} outbox entries left queued", remaining);
            }
            return Ok(FlushReport {
                remaining,
                ..FlushReport::default()
            });
        }

        let now_ms = now.timestamp_millis();
        let mut blocked: HashSet<String> = HashSet::new();
        let mut results: HashMap<String, Option<String>> = HashMap::new();

        for entry in &entries {
            let key = outbox_db::record_key(entry).map(|id| format!("{}:{}", entry.sheet, id));
            if key.as_ref().is_some_and(|key| blocked.contains(key)) {
                tracing::debug!("Holding {} {} behind an earlier entry", entry.action.as_str(), entry.id);
                continue;
            }

            if entry.status != OutboxStatus::Pending || entry.next_attempt_at > now_ms {
                blocked.extend(key);
                continue;
            }

            // Delivery runs outside the store write so slow webhooks never hold it
            match self.sink.deliver(&entry.payload).await {
                Ok(()) => {
                    tracing::info!("Delivered {} to sheet {}", entry.action.as_str(), entry.sheet);
                    results.insert(entry.id.clone(), None);
                }
                Err(e) => {
                    tracing::warn!(
                        "Delivery of {} to sheet {} failed: {}",
                        entry.action.as_str(),
                        entry.sheet,
                        e
                    );
                    results.insert(entry.id.clone(), Some(e.to_string()));
                    blocked.extend(key);
                }
            }
        }

        let max_attempts = self.max_attempts;
        let base_backoff_secs = self.base_backoff_secs;

        let report = store::update_collection::<OutboxEntry, _, _>(self.store.as_ref(), |entries| {
            let mut report = FlushReport::default();

            entries.retain_mut(|entry| match results.get(&entry.id) {
                None => true,
                Some(None) => {
                    report.delivered += 1;
                    false
                }
                Some(Some(error)) => {
                    entry.attempts += 1;
                    entry.last_error = Some(error.clone());
                    if entry.attempts >= max_attempts {
                        entry.status = OutboxStatus::Failed;
                        report.failed += 1;
                    } else {
                        let delay = backoff_secs(base_backoff_secs, entry.attempts);
                        entry.next_attempt_at = now_ms + (delay as i64) * 1000;
                        report.retried += 1;
                    }
                    true
                }
            });

            report.remaining = entries.len();
            report
        })
        .await?;

        Ok(report)
    }

    /// Makes a failed or backing-off entry due again. It keeps its place in
    /// creation order.
    pub async fn retry(&self, id: &str, now: DateTime<Utc>) -> Result<Option<OutboxEntry>> {
        let now_ms = now.timestamp_millis();
        let entry = store::update_collection::<OutboxEntry, _, _>(self.store.as_ref(), |entries| {
            let entry = entries.iter_mut().find(|e| e.id == id)?;
            entry.status = OutboxStatus::Pending;
            entry.attempts = 0;
            entry.next_attempt_at = now_ms;
            entry.last_error = None;
            Some(entry.clone())
        })
        .await?;

        Ok(entry)
    }

    pub async fn list(&self) -> Result<OutboxResponse> {
        let entries = outbox_db::list_entries(self.store.as_ref()).await?;
        let pending = entries
            .iter()
            .filter(|e| e.status == OutboxStatus::Pending)
            .count();
        let failed = entries.len() - pending;

        Ok(OutboxResponse {
            entries,
            pending,
            failed,
        })
    }

    pub fn shutdown(&self) {
        self.shutting_down.store(true, Ordering::SeqCst);
    }

    pub fn is_shutting_down(&self) -> bool {
        self.shutting_down.load(Ordering::SeqCst)
    }
}

/// `base * 2^(attempts - 1)`, capped at one hour
pub fn backoff_secs(base_secs: u64, attempts: u32) -> u64 {
    let factor = 1u64
        .checked_shl(attempts.saturating_sub(1))
        .unwrap_or(u64::MAX);
    base_secs.saturating_mul(factor).min(MAX_BACKOFF_SECS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::MemoryStore;
    use crate::testing::RecordingSink;
    use chrono::Duration;
    use serde_json::json;

    fn config(max_attempts: u32) -> OutboxConfig {
        OutboxConfig {
            flush_interval_secs: 30,
            max_attempts,
            base_backoff_secs: 30,
        }
    }

    fn record(id: i64) -> Map<String, Value> {
        match json!({ "id": id, "empresa": "Acme" }) {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_backoff_doubles_and_caps() {
        assert_eq!(backoff_secs(30, 1), 30);
        assert_eq!(backoff_secs(30, 2), 60);
        assert_eq!(backoff_secs(30, 4), 240);
        assert_eq!(backoff_secs(30, 20), 3600);
        assert_eq!(backoff_secs(30, 200), 3600);
    }

    #[tokio::test]
    async fn test_enqueue_tags_payload_and_delivers_in_order() {
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let sink = Arc::new(RecordingSink::configured());
        let relay = OutboxRelay::new(store, sink.clone(), &config(8));
        let now = Utc::now();

        let notice = relay
            .enqueue(SyncCollection::Alliances, SyncAction::Create, record(1), now)
            .await;
        assert_eq!(notice.title, "Sincronizando");
        relay
            .enqueue(
                SyncCollection::Alliances,
                SyncAction::Delete,
                record(2),
                now + Duration::milliseconds(1),
            )
            .await;

        let report = relay.flush(now + Duration::seconds(1)).await.unwrap();
        assert_eq!(report.delivered, 2);
        assert_eq!(report.remaining, 0);

        let delivered = sink.delivered().await;
        assert_eq!(delivered[0]["action"], "CREATE");
        assert_eq!(delivered[0]["sheet"], "Alianzas");
        assert_eq!(delivered[0]["empresa"], "Acme");
        assert_eq!(delivered[1]["action"], "DELETE");
    }

    #[tokio::test]
    async fn test_failures_back_off_then_fail() {
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let sink = Arc::new(RecordingSink::failing());
        let relay = OutboxRelay::new(store, sink.clone(), &config(2));
        let now = Utc::now();

        relay
            .enqueue(SyncCollection::Events, SyncAction::Update, record(7), now)
            .await;

        let report = relay.flush(now).await.unwrap();
        assert_eq!(report.retried, 1);
        let entry = relay.list().await.unwrap().entries.remove(0);
        assert_eq!(entry.attempts, 1);
        assert_eq!(entry.next_attempt_at, now.timestamp_millis() + 30_000);
        assert!(entry.last_error.is_some());

        // Not due yet
        let report = relay.flush(now + Duration::seconds(10)).await.unwrap();
        assert_eq!(report, FlushReport { remaining: 1, ..FlushReport::default() });

        let report = relay.flush(now + Duration::seconds(31)).await.unwrap();
        assert_eq!(report.failed, 1);

        let listing = relay.list().await.unwrap();
        assert_eq!(listing.failed, 1);
        assert_eq!(listing.pending, 0);

        // Failed entries are skipped until retried
        let report = relay.flush(now + Duration::hours(2)).await.unwrap();
        assert_eq!(report.failed, 0);
        assert_eq!(sink.attempts().await, 2);

        let id = listing.entries[0].id.clone();
        let retried = relay.retry(&id, now).await.unwrap().unwrap();
        assert_eq!(retried.status, OutboxStatus::Pending);
        assert_eq!(retried.attempts, 0);
        assert!(relay.retry("missing", now).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_later_entries_for_a_record_wait_behind_a_failure() {
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let sink = Arc::new(RecordingSink::failing_times(1));
        let relay = OutboxRelay::new(store, sink.clone(), &config(8));
        let now = Utc::now();

        relay
            .enqueue(SyncCollection::Alliances, SyncAction::Create, record(1), now)
            .await;
        relay
            .enqueue(
                SyncCollection::Alliances,
                SyncAction::Delete,
                record(1),
                now + Duration::milliseconds(1),
            )
            .await;
        relay
            .enqueue(
                SyncCollection::Alliances,
                SyncAction::Create,
                record(2),
                now + Duration::milliseconds(2),
            )
            .await;

        let first = now + Duration::seconds(1);
        let report = relay.flush(first).await.unwrap();
        assert_eq!(report.retried, 1);
        assert_eq!(report.delivered, 1);
        assert_eq!(report.remaining, 2);
        let delivered = sink.delivered().await;
        assert_eq!(delivered.len(), 1);
        assert_eq!(delivered[0]["id"], 2);

        // The DELETE is due but its CREATE is still backing off
        let report = relay.flush(first + Duration::seconds(10)).await.unwrap();
        assert_eq!(report.delivered, 0);
        assert_eq!(report.remaining, 2);
        assert_eq!(sink.attempts().await, 2);

        let report = relay.flush(first + Duration::seconds(31)).await.unwrap();
        assert_eq!(report.delivered, 2);
        assert_eq!(report.remaining, 0);

        let delivered = sink.delivered().await;
        let sequence: Vec<(i64, &str)> = delivered
            .iter()
            .map(|p| (p["id"].as_i64().unwrap(), p["action"].as_str().unwrap()))
            .collect();
        assert_eq!(sequence, vec![(2, "CREATE"), (1, "CREATE"), (1, "DELETE")]);
    }

    #[tokio::test]
    async fn test_failed_entry_holds_its_record_until_retried() {
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let sink = Arc::new(RecordingSink::failing_times(1));
        let relay = OutboxRelay::new(store, sink.clone(), &config(1));
        let now = Utc::now();

        relay
            .enqueue(SyncCollection::Events, SyncAction::Create, record(4), now)
            .await;
        let report = relay.flush(now).await.unwrap();
        assert_eq!(report.failed, 1);

        relay
            .enqueue(
                SyncCollection::Events,
                SyncAction::Update,
                record(4),
                now + Duration::seconds(1),
            )
            .await;
        let report = relay.flush(now + Duration::seconds(2)).await.unwrap();
        assert_eq!(report.delivered, 0);
        assert!(sink.delivered().await.is_empty());

        let failed = relay.list().await.unwrap().entries.remove(0);
        relay.retry(&failed.id, now + Duration::seconds(3)).await.unwrap();
        let report = relay.flush(now + Duration::seconds(3)).await.unwrap();
        assert_eq!(report.delivered, 2);

        let actions: Vec<Value> = sink
            .delivered()
            .await
            .iter()
            .map(|p| p["action"].clone())
            .collect();
        assert_eq!(actions, vec![json!("CREATE"), json!("UPDATE")]);
    }

    #[tokio::test]
    async fn test_overlapping_flushes_deliver_once() {
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let sink = Arc::new(RecordingSink::slow(std::time::Duration::from_millis(50)));
        let relay = OutboxRelay::new(store, sink.clone(), &config(8));
        let now = Utc::now();

        relay
            .enqueue(SyncCollection::Alliances, SyncAction::Create, record(9), now)
            .await;

        let (a, b) = tokio::join!(relay.flush(now), relay.flush(now));
        let (a, b) = (a.unwrap(), b.unwrap());

        assert_eq!(a.delivered + b.delivered, 1);
        assert_eq!(sink.attempts().await, 1);
        assert_eq!(sink.delivered().await.len(), 1);
        assert_eq!(relay.list().await.unwrap().entries.len(), 0);
    }

    #[tokio::test]
    async fn test_unconfigured_sink_keeps_entries_pending() {
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let sink = Arc::new(RecordingSink::unconfigured());
        let relay = OutboxRelay::new(store, sink.clone(), &config(8));
        let now = Utc::now();

        let notice = relay
            .enqueue(SyncCollection::Users, SyncAction::Signup, record(3), now)
            .await;
        assert_eq!(notice.title, "Sincronización pendiente");

        let report = relay.flush(now).await.unwrap();
        assert_eq!(report.delivered, 0);
        assert_eq!(report.remaining, 1);
        assert_eq!(sink.attempts().await, 0);
    }

    #[test]
    fn test_shutdown_flag() {
        let relay = OutboxRelay::new(
            Arc::new(MemoryStore::new()),
            Arc::new(RecordingSink::configured()),
            &config(8),
        );
        assert!(!relay.is_shutting_down());
        relay.shutdown();
        assert!(relay.is_shutting_down());
    }
}
