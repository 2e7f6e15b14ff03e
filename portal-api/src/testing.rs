//! In-process fakes for the network-facing traits.

use async_trait::async_trait;
use serde_json::Value;
use sheet_sync::SheetError;
use shared_types::EmailRelaySettings;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

use crate::config::{ApiConfig, OutboxConfig, SheetsConfig, SyncConfig};
use crate::database::{KeyValueStore, MemoryStore};
use crate::handlers::AppState;
use crate::integrations::email_relay::{DispatchParams, EmailRelay, MailDispatcher};
use crate::integrations::sheets_client::SheetSource;
use crate::integrations::webhook::{MutationSink, RemoteAuthenticator, RemoteLogin};
use crate::jobs::outbox::OutboxRelay;
use crate::jobs::sheet_sync::SyncManager;

pub struct RecordingSink {
    configured: bool,
    failures_left: Mutex<usize>,
    delay: Option<Duration>,
    delivered: Mutex<Vec<Value>>,
    attempts: Mutex<usize>,
}

impl RecordingSink {
    fn build(configured: bool, failures: usize) -> Self {
        Self {
            configured,
            failures_left: Mutex::new(failures),
            delay: None,
            delivered: Mutex::new(Vec::new()),
            attempts: Mutex::new(0),
        }
    }

    pub fn configured() -> Self {
        Self::build(true, 0)
    }

    pub fn failing() -> Self {
        Self::build(true, usize::MAX)
    }

    /// Rejects the first `failures` deliveries, then accepts
    pub fn failing_times(failures: usize) -> Self {
        Self::build(true, failures)
    }

    pub fn unconfigured() -> Self {
        Self::build(false, 0)
    }

    /// Waits `delay` inside every delivery
    pub fn slow(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::configured()
        }
    }

    pub async fn delivered(&self) -> Vec<Value> {
        self.delivered.lock().await.clone()
    }

    pub async fn attempts(&self) -> usize {
        *self.attempts.lock().await
    }
}

#[async_trait]
impl MutationSink for RecordingSink {
    fn is_configured(&self) -> bool {
        self.configured
    }

    async fn deliver(&self, payload: &Value) -> anyhow::Result<()> {
        *self.attempts.lock().await += 1;
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        {
            let mut failures_left = self.failures_left.lock().await;
            if *failures_left > 0 {
                *failures_left -= 1;
                anyhow::bail!("webhook unreachable");
            }
        }
        self.delivered.lock().await.push(payload.clone());
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingMailer {
    fail: bool,
    sent: Mutex<Vec<DispatchParams>>,
}

impl RecordingMailer {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub async fn sent(&self) -> Vec<DispatchParams> {
        self.sent.lock().await.clone()
    }
}

#[async_trait]
impl MailDispatcher for RecordingMailer {
    async fn dispatch(
        &self,
        _settings: &EmailRelaySettings,
        params: &DispatchParams,
    ) -> anyhow::Result<()> {
        if self.fail {
            anyhow::bail!("relay rejected the request");
        }
        self.sent.lock().await.push(params.clone());
        Ok(())
    }
}

/// Serves canned bodies or statuses per URL; unknown URLs fail to connect
#[derive(Default)]
pub struct StaticSheetSource {
    responses: HashMap<String, Result<String, u16>>,
}

impl StaticSheetSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_body(mut self, url: &str, body: &str) -> Self {
        self.responses.insert(url.to_string(), Ok(body.to_string()));
        self
    }

    pub fn with_status(mut self, url: &str, status: u16) -> Self {
        self.responses.insert(url.to_string(), Err(status));
        self
    }
}

#[async_trait]
impl SheetSource for StaticSheetSource {
    async fn fetch(&self, url: &str) -> Result<String, SheetError> {
        match self.responses.get(url) {
            Some(Ok(body)) => Ok(body.clone()),
            Some(Err(status)) => Err(SheetError::Status(*status)),
            None => Err(SheetError::Http(format!("connection refused: {url}"))),
        }
    }
}

pub struct FakeAuthenticator {
    reply: RemoteLogin,
}

impl FakeAuthenticator {
    pub fn accepting(name: &str, role: &str, id: Value) -> Self {
        Self {
            reply: RemoteLogin {
                status: "success".to_string(),
                role: Some(role.to_string()),
                name: Some(name.to_string()),
                id: Some(id),
                message: None,
            },
        }
    }

    pub fn rejecting() -> Self {
        Self {
            reply: RemoteLogin {
                status: "error".to_string(),
                role: None,
                name: None,
                id: None,
                message: Some("Usuario o contraseña incorrectos".to_string()),
            },
        }
    }
}

#[async_trait]
impl RemoteAuthenticator for FakeAuthenticator {
    async fn verify(&self, _email: &str, _password: &str) -> anyhow::Result<RemoteLogin> {
        Ok(self.reply.clone())
    }
}

/// Handles kept by tests to inspect side effects
pub struct TestHarness {
    pub state: AppState,
    pub store: Arc<dyn KeyValueStore>,
    pub sink: Arc<RecordingSink>,
    pub mailer: Arc<RecordingMailer>,
}

pub fn harness(config: ApiConfig, sheets: StaticSheetSource, relay: EmailRelaySettings) -> TestHarness {
    harness_with_mailer(config, sheets, relay, RecordingMailer::default())
}

pub fn harness_with_mailer(
    config: ApiConfig,
    sheets: StaticSheetSource,
    relay: EmailRelaySettings,
    mailer: RecordingMailer,
) -> TestHarness {
    let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
    let sink = Arc::new(RecordingSink::configured());
    let mailer = Arc::new(mailer);

    let outbox = Arc::new(OutboxRelay::new(store.clone(), sink.clone(), &OutboxConfig::default()));
    let sync = Arc::new(SyncManager::new(
        store.clone(),
        Arc::new(sheets),
        config.sheets.clone().unwrap_or_else(SheetsConfig::default),
        &SyncConfig::default(),
    ));
    let email_relay = Arc::new(EmailRelay::new(store.clone(), mailer.clone(), relay));

    let state = AppState {
        store: store.clone(),
        outbox,
        sync,
        email_relay,
        authenticator: Arc::new(FakeAuthenticator::rejecting()),
        config: Arc::new(std::sync::RwLock::new(config)),
        config_path: None,
    };

    TestHarness {
        state,
        store,
        sink,
        mailer,
    }
}

/// Default config, no sheets, placeholder relay identifiers
pub fn default_harness() -> TestHarness {
    harness(
        ApiConfig::default(),
        StaticSheetSource::new(),
        EmailRelaySettings::default(),
    )
}
