use async_trait::async_trait;
use serde_json::{json, Value};
use shared_types::{EmailRelaySettings, Notice};
use std::sync::Arc;
use std::time::Duration;

use crate::database::settings as settings_db;
use crate::database::KeyValueStore;

/// One outgoing transactional email
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchParams {
    pub to_email: String,
    pub subject: String,
    pub message: String,
    pub from_name: String,
}

impl DispatchParams {
    /// Variables handed to the relay template. Recipient is repeated under
    /// the names common templates use.
    pub fn template_params(&self) -> Value {
        json!({
            "to_email": self.to_email,
            "email_to": self.to_email,
            "to_name": self.to_email,
            "subject": self.subject,
            "message": self.message,
            "from_name": self.from_name,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DispatchOutcome {
    Sent,
    /// Relay not configured; nothing left the server
    Simulated,
    /// Relay configured but the call failed; treated as simulated
    Failed(String),
}

impl DispatchOutcome {
    pub fn is_sent(&self) -> bool {
        matches!(self, DispatchOutcome::Sent)
    }

    /// Extra notice for failures, on top of whatever the caller reports
    pub fn failure_notice(&self) -> Option<Notice> {
        match self {
            DispatchOutcome::Failed(reason) => Some(Notice::error(
                "Error al enviar correo real",
                format!("Se guardó como simulado: {}", reason),
            )),
            _ => None,
        }
    }
}

/// Transport to the email relay service
#[async_trait]
pub trait MailDispatcher: Send + Sync {
    async fn dispatch(
        &self,
        settings: &EmailRelaySettings,
        params: &DispatchParams,
    ) -> anyhow::Result<()>;
}

/// EmailJS REST transport
pub struct EmailJsClient {
    client: reqwest::Client,
    endpoint: String,
}

impl EmailJsClient {
    pub fn new(endpoint: &str, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            endpoint: endpoint.to_string(),
        }
    }
}

pub fn request_body(settings: &EmailRelaySettings, params: &DispatchParams) -> Value {
    json!({
        "service_id": settings.service_id,
        "template_id": settings.template_id,
        "user_id": settings.public_key,
        "template_params": params.template_params(),
    })
}

#[async_trait]
impl MailDispatcher for EmailJsClient {
    async fn dispatch(
        &self,
        settings: &EmailRelaySettings,
        params: &DispatchParams,
    ) -> anyhow::Result<()> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&request_body(settings, params))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Email relay responded with status {}: {}", status, body);
        }
        Ok(())
    }
}

/// Resolves relay identifiers and sends, degrading to simulation
pub struct EmailRelay {
    store: Arc<dyn KeyValueStore>,
    dispatcher: Arc<dyn MailDispatcher>,
    defaults: EmailRelaySettings,
}

impl EmailRelay {
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        dispatcher: Arc<dyn MailDispatcher>,
        defaults: EmailRelaySettings,
    ) -> Self {
        Self {
            store,
            dispatcher,
            defaults,
        }
    }

    /// Stored identifiers win over config, which wins over placeholders
    pub async fn settings(&self) -> EmailRelaySettings {
        match settings_db::load_email_relay(self.store.as_ref()).await {
            Ok(Some(settings)) => settings,
            Ok(None) => self.defaults.clone(),
            Err(e) => {
                tracing::warn!("Failed to read email relay settings, using defaults: {}", e);
                self.defaults.clone()
            }
        }
    }

    pub async fn send(&self, params: &DispatchParams) -> DispatchOutcome {
        let settings = self.settings().await;

        if !settings.is_configured() {
            tracing::warn!(
                "Email relay not configured, simulating message to {}",
                params.to_email
            );
            return DispatchOutcome::Simulated;
        }

        match self.dispatcher.dispatch(&settings, params).await {
            Ok(()) => {
                tracing::info!("Email relayed to {}", params.to_email);
                DispatchOutcome::Sent
            }
            Err(e) => {
                tracing::warn!("Failed to relay email to {}: {}", params.to_email, e);
                DispatchOutcome::Failed(e.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::MemoryStore;
    use crate::testing::RecordingMailer;

    fn params() -> DispatchParams {
        DispatchParams {
            to_email: "aliado@empresa.pe".to_string(),
            subject: "Invitación".to_string(),
            message: "Hola".to_string(),
            from_name: "Aniquem Portal System".to_string(),
        }
    }

    fn configured() -> EmailRelaySettings {
        EmailRelaySettings {
            service_id: "service_1".to_string(),
            template_id: "template_1".to_string(),
            public_key: "pk_1".to_string(),
        }
    }

    #[tokio::test]
    async fn test_placeholders_short_circuit_to_simulation() {
        let mailer = Arc::new(RecordingMailer::default());
        let relay = EmailRelay::new(
            Arc::new(MemoryStore::new()),
            mailer.clone(),
            EmailRelaySettings::default(),
        );

        assert_eq!(relay.send(&params()).await, DispatchOutcome::Simulated);
        assert!(mailer.sent().await.is_empty());
    }

    #[tokio::test]
    async fn test_stored_settings_override_defaults() {
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        settings_db::save_email_relay(store.as_ref(), &configured())
            .await
            .unwrap();
        let mailer = Arc::new(RecordingMailer::default());
        let relay = EmailRelay::new(store, mailer.clone(), EmailRelaySettings::default());

        assert_eq!(relay.send(&params()).await, DispatchOutcome::Sent);
        let sent = mailer.sent().await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to_email, "aliado@empresa.pe");
    }

    #[tokio::test]
    async fn test_transport_failure_degrades() {
        let mailer = Arc::new(RecordingMailer::failing());
        let relay = EmailRelay::new(Arc::new(MemoryStore::new()), mailer, configured());

        let outcome = relay.send(&params()).await;
        assert!(matches!(outcome, DispatchOutcome::Failed(_)));
        assert!(!outcome.is_sent());
        assert!(outcome.failure_notice().is_some());
    }

    #[test]
    fn test_request_body_shape() {
        let body = request_body(&configured(), &params());
        assert_eq!(body["service_id"], "service_1");
        assert_eq!(body["user_id"], "pk_1");
        assert_eq!(body["template_params"]["to_email"], "aliado@empresa.pe");
        assert_eq!(body["template_params"]["email_to"], "aliado@empresa.pe");
    }
}
