use chrono::{DateTime, Duration, Utc};
use futures::future::join_all;
use sheet_sync::{map_rows, reconcile, CsvParser, MergePolicy, Reconcilable, SheetFetch, SheetRecord};
use shared_types::{Alliance, CalendarEvent, EmailMessage, Notice, SyncCollection, SyncReport, UserAccount};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::config::{SheetsConfig, SyncConfig};
use crate::database::outbox as outbox_db;
use crate::database::store::{self, StoredCollection};
use crate::database::KeyValueStore;
use crate::integrations::sheets_client::SheetSource;

/// Fetches published sheet exports and merges them into the store
pub struct SyncManager {
    store: Arc<dyn KeyValueStore>,
    source: Arc<dyn SheetSource>,
    sheets: SheetsConfig,
    alliance_grace: Duration,
    shutting_down: AtomicBool,
}

impl SyncManager {
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        source: Arc<dyn SheetSource>,
        sheets: SheetsConfig,
        sync: &SyncConfig,
    ) -> Self {
        Self {
            store,
            source,
            sheets,
            alliance_grace: Duration::minutes(sync.alliance_grace_minutes),
            shutting_down: AtomicBool::new(false),
        }
    }

    pub fn is_configured(&self, collection: SyncCollection) -> bool {
        self.sheets.url_for(collection).is_some()
    }

    pub fn policy_for(&self, collection: SyncCollection) -> MergePolicy {
        match collection {
            SyncCollection::Alliances => {
                MergePolicy::alliances().with_grace_window(Some(self.alliance_grace))
            }
            SyncCollection::Events => MergePolicy::calendar(),
            SyncCollection::Emails => MergePolicy::emails(),
            SyncCollection::Users => MergePolicy::users(),
        }
    }

    pub async fn sync(&self, collection: SyncCollection, now: DateTime<Utc>) -> SyncReport {
        match collection {
            SyncCollection::Alliances => self.sync_collection::<Alliance>(collection, now).await,
            SyncCollection::Events => self.sync_collection::<CalendarEvent>(collection, now).await,
            SyncCollection::Emails => self.sync_collection::<EmailMessage>(collection, now).await,
            SyncCollection::Users => self.sync_collection::<UserAccount>(collection, now).await,
        }
    }

    /// Syncs every collection that has a sheet URL, concurrently
    pub async fn sync_all(&self, now: DateTime<Utc>) -> Vec<SyncReport> {
        let configured: Vec<SyncCollection> = SyncCollection::ALL
            .into_iter()
            .filter(|c| self.is_configured(*c))
            .collect();

        if configured.is_empty() {
            tracing::debug!("No sheet URLs configured, skipping sync");
            return Vec::new();
        }

        join_all(configured.into_iter().map(|c| self.sync(c, now))).await
    }

    async fn sync_collection<T>(&self, collection: SyncCollection, now: DateTime<Utc>) -> SyncReport
    where
        T: SheetRecord + Reconcilable + StoredCollection,
    {
        let report = |notice: Notice, fetched: usize, kept_local: usize, total: usize| SyncReport {
            collection,
            fetched,
            kept_local,
            total,
            notice,
        };

        let Some(url) = self.sheets.url_for(collection) else {
            let total = self.local_count::<T>().await;
            return report(
                Notice::info(
                    "Modo simulación",
                    "Configura una URL de Google Sheets para leer datos reales.",
                ),
                0,
                total,
                total,
            );
        };

        let body = match self.source.fetch(url).await {
            Ok(body) => body,
            Err(e) => {
                tracing::warn!("Sync of {} failed: {}", collection.sheet_name(), e);
                let total = self.local_count::<T>().await;
                return report(connection_error(), 0, total, total);
            }
        };

        let rows = match CsvParser::new().parse_sheet(&body) {
            Ok(SheetFetch::Rows(rows)) => rows,
            Ok(SheetFetch::Empty) => {
                tracing::warn!("Sheet {} has no data rows", collection.sheet_name());
                let total = self.local_count::<T>().await;
                return report(
                    Notice::warning("Hoja vacía", "No se encontraron registros en el archivo."),
                    0,
                    total,
                    total,
                );
            }
            Err(e) => {
                tracing::warn!("Sheet {} could not be parsed: {}", collection.sheet_name(), e);
                let total = self.local_count::<T>().await;
                return report(connection_error(), 0, total, total);
            }
        };

        let remote: Vec<T> = map_rows(&rows, now);

        // Records with queued webhook changes keep their local state
        let unsent = match outbox_db::unsent_keys(self.store.as_ref(), collection.sheet_name()).await {
            Ok(keys) => keys,
            Err(e) => {
                tracing::error!("Failed to read outbox before syncing {}: {}", collection.sheet_name(), e);
                let total = self.local_count::<T>().await;
                return report(connection_error(), 0, total, total);
            }
        };
        if !unsent.is_empty() {
            tracing::debug!(
                "{} records of {} have unsent changes",
                unsent.len(),
                collection.sheet_name()
            );
        }
        let policy = self.policy_for(collection).with_pending(unsent);

        let merged = store::update_collection::<T, _, _>(self.store.as_ref(), |items| {
            let outcome = reconcile(items, remote.clone(), &policy, now);
            *items = outcome.records;
            (outcome.fetched, outcome.kept_local, items.len())
        })
        .await;

        match merged {
            Ok((fetched, kept_local, total)) => {
                tracing::info!(
                    "Synced {}: {} remote, {} local kept, {} total",
                    collection.sheet_name(),
                    fetched,
                    kept_local,
                    total
                );
                report(
                    Notice::success("Sincronización exitosa")
                        .with_description(format!("Se han procesado {} registros.", fetched)),
                    fetched,
                    kept_local,
                    total,
                )
            }
            Err(e) => {
                tracing::error!("Failed to store synced {}: {}", collection.sheet_name(), e);
                let total = self.local_count::<T>().await;
                report(connection_error(), 0, total, total)
            }
        }
    }

    async fn local_count<T: StoredCollection>(&self) -> usize {
        match store::load_collection::<T>(self.store.as_ref()).await {
            Ok(snapshot) => snapshot.items.len(),
            Err(_) => 0,
        }
    }

    pub fn shutdown(&self) {
        self.shutting_down.store(true, Ordering::SeqCst);
    }

    pub fn is_shutting_down(&self) -> bool {
        self.shutting_down.load(Ordering::SeqCst)
    }
}

fn connection_error() -> Notice {
    Notice::error(
        "Error de sincronización",
        "No se pudo conectar con la fuente de datos.",
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::{alliances as alliances_db, emails as emails_db, MemoryStore};
    use crate::config::OutboxConfig;
    use crate::jobs::outbox::OutboxRelay;
    use crate::testing::{RecordingSink, StaticSheetSource};
    use shared_types::{AllianceChannel, AllianceStatus, EmailFolder, NoticeLevel, SyncAction};

    const ALLIANCES_URL: &str = "https://sheets.example/alianzas.csv";
    const EMAILS_URL: &str = "https://sheets.example/correos.csv";

    fn sheets() -> SheetsConfig {
        SheetsConfig {
            alliances: Some(ALLIANCES_URL.to_string()),
            emails: Some(EMAILS_URL.to_string()),
            ..SheetsConfig::default()
        }
    }

    fn manager(store: Arc<dyn KeyValueStore>, source: StaticSheetSource) -> SyncManager {
        SyncManager::new(store, Arc::new(source), sheets(), &SyncConfig::default())
    }

    fn acme(id: i64) -> Alliance {
        Alliance {
            id,
            company: "Acme".to_string(),
            tax_id: "20123456789".to_string(),
            contact_name: "Luis".to_string(),
            contact_email: None,
            contact_phone: None,
            document_url: None,
            channel: AllianceChannel::Email,
            status: AllianceStatus::New,
            first_contact: "2024-01-10".to_string(),
            subject: "Donación".to_string(),
            deleted: false,
            updated_at: None,
        }
    }

    #[tokio::test]
    async fn test_remote_wins_on_shared_id() {
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        store::update_collection::<Alliance, _, _>(store.as_ref(), |items| items.push(acme(100)))
            .await
            .unwrap();

        let source = StaticSheetSource::new()
            .with_body(ALLIANCES_URL, "id,empresa,ruc\n100,Acme Corp,20123456789\n");
        let report = manager(store.clone(), source)
            .sync(SyncCollection::Alliances, Utc::now())
            .await;

        assert_eq!(report.notice.level, NoticeLevel::Success);
        assert_eq!(report.fetched, 1);
        assert_eq!(report.total, 1);

        let alliances = alliances_db::list_alliances(store.as_ref(), &Default::default())
            .await
            .unwrap();
        assert_eq!(alliances.len(), 1);
        assert_eq!(alliances[0].id, 100);
        assert_eq!(alliances[0].company, "Acme Corp");
    }

    #[tokio::test]
    async fn test_empty_sheet_leaves_store_untouched() {
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        store::update_collection::<Alliance, _, _>(store.as_ref(), |items| items.push(acme(5)))
            .await
            .unwrap();
        let before = store.get(store::ALLIANCES).await.unwrap().unwrap();

        let source = StaticSheetSource::new().with_body(ALLIANCES_URL, "id,empresa\n");
        let report = manager(store.clone(), source)
            .sync(SyncCollection::Alliances, Utc::now())
            .await;

        assert_eq!(report.notice.level, NoticeLevel::Warning);
        assert_eq!(report.notice.title, "Hoja vacía");
        assert_eq!(report.total, 1);
        assert_eq!(store.get(store::ALLIANCES).await.unwrap().unwrap(), before);
    }

    #[tokio::test]
    async fn test_fetch_failure_leaves_store_untouched() {
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let source = StaticSheetSource::new().with_status(EMAILS_URL, 500);

        let report = manager(store.clone(), source)
            .sync(SyncCollection::Emails, Utc::now())
            .await;

        assert_eq!(report.notice.level, NoticeLevel::Error);
        assert_eq!(report.notice.title, "Error de sincronización");
        // Seed inbox still served, nothing written
        assert_eq!(report.total, 5);
        assert!(store.get(store::EMAILS).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_unconfigured_collection_is_simulated() {
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let sync = manager(store, StaticSheetSource::new());

        let report = sync.sync(SyncCollection::Events, Utc::now()).await;
        assert_eq!(report.notice.level, NoticeLevel::Info);
        assert_eq!(report.notice.title, "Modo simulación");
        assert_eq!(report.total, 3);
    }

    #[tokio::test]
    async fn test_email_sync_keeps_sent_mail() {
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let mut inbox = emails_db::load_emails(store.as_ref()).await.unwrap();
        let sent = EmailMessage {
            id: 4242,
            sender: "Yo".to_string(),
            subject: "Informe mensual".to_string(),
            preview: "Adjunto el informe".to_string(),
            body: None,
            date: "Ahora".to_string(),
            starred: false,
            read: true,
            label: None,
            folder: EmailFolder::Sent,
            deleted: false,
            attachments: Vec::new(),
        };
        inbox.push(sent.clone());
        store::update_collection::<EmailMessage, _, _>(store.as_ref(), |items| *items = inbox.clone())
            .await
            .unwrap();

        let source = StaticSheetSource::new().with_body(
            EMAILS_URL,
            "id,sender,subject,body\n999,Dirección Médica,Nuevo protocolo,Revisar adjunto\n",
        );
        let sync = manager(store.clone(), source);

        let report = sync.sync(SyncCollection::Emails, Utc::now()).await;
        assert_eq!(report.fetched, 1);

        let emails = emails_db::load_emails(store.as_ref()).await.unwrap();
        assert!(emails.iter().any(|e| e.id == 999));
        let kept: Vec<&EmailMessage> = emails.iter().filter(|e| e.id == 4242).collect();
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0], &sent);
        assert!(report.kept_local >= 1);
    }

    #[tokio::test]
    async fn test_alliance_with_queued_change_survives_sync() {
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let now = Utc::now();
        let created = now - Duration::minutes(20);
        let local = acme(created.timestamp_millis());
        store::update_collection::<Alliance, _, _>(store.as_ref(), |items| items.push(local.clone()))
            .await
            .unwrap();

        let relay = OutboxRelay::new(
            store.clone(),
            Arc::new(RecordingSink::unconfigured()),
            &OutboxConfig::default(),
        );
        relay
            .enqueue(
                SyncCollection::Alliances,
                SyncAction::Create,
                local.to_sheet_payload(),
                created,
            )
            .await;
        assert_eq!(relay.list().await.unwrap().pending, 1);

        let source = StaticSheetSource::new().with_body(ALLIANCES_URL, "id,empresa\n5,Globex\n");
        let report = manager(store.clone(), source)
            .sync(SyncCollection::Alliances, now)
            .await;
        assert_eq!(report.total, 2);

        let alliances = alliances_db::list_alliances(store.as_ref(), &Default::default())
            .await
            .unwrap();
        let ids: Vec<i64> = alliances.iter().map(|a| a.id).collect();
        assert_eq!(ids, vec![local.id, 5]);
    }

    #[tokio::test]
    async fn test_alliance_without_queued_change_expires() {
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let now = Utc::now();
        let stale = acme((now - Duration::minutes(20)).timestamp_millis());
        store::update_collection::<Alliance, _, _>(store.as_ref(), |items| items.push(stale.clone()))
            .await
            .unwrap();

        let source = StaticSheetSource::new().with_body(ALLIANCES_URL, "id,empresa\n5,Globex\n");
        let report = manager(store.clone(), source)
            .sync(SyncCollection::Alliances, now)
            .await;

        assert_eq!(report.total, 1);
        assert_eq!(report.kept_local, 0);
    }

    #[tokio::test]
    async fn test_sync_all_covers_configured_collections() {
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let source = StaticSheetSource::new()
            .with_body(ALLIANCES_URL, "id,empresa\n1,Uno\n")
            .with_body(EMAILS_URL, "id,sender,subject\n2,Ana,Hola\n");

        let reports = manager(store, source).sync_all(Utc::now()).await;
        let collections: Vec<SyncCollection> = reports.iter().map(|r| r.collection).collect();
        assert_eq!(collections, vec![SyncCollection::Alliances, SyncCollection::Emails]);
    }
}
