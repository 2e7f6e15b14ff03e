use config::{Config, ConfigError, File};
use serde::{Deserialize, Serialize};
use shared_types::{EmailRelaySettings, SyncCollection};
use std::path::{Path, PathBuf};

pub const DEFAULT_EMAIL_RELAY_ENDPOINT: &str = "https://api.emailjs.com/api/v1.0/email/send";

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ApiConfig {
    pub cors: Option<CorsConfig>,
    pub server: Option<ServerConfig>,
    pub sheets: Option<SheetsConfig>,
    pub webhook: Option<WebhookConfig>,
    pub email_relay: Option<EmailRelayConfig>,
    pub sync: Option<SyncConfig>,
    pub outbox: Option<OutboxConfig>,
    pub auth: Option<AuthConfig>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            cors: Some(CorsConfig {
                allowed_origins: vec!["http://localhost:5173".to_string()],
            }),
            server: Some(ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 8080,
            }),
            sheets: Some(SheetsConfig::default()),
            webhook: Some(WebhookConfig::default()),
            email_relay: Some(EmailRelayConfig::default()),
            sync: Some(SyncConfig::default()),
            outbox: Some(OutboxConfig::default()),
            auth: Some(AuthConfig::default()),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Published CSV export URLs, one per mirrored collection
#[derive(Debug, Default, Deserialize, Serialize, Clone)]
pub struct SheetsConfig {
    pub alliances: Option<String>,
    pub emails: Option<String>,
    pub events: Option<String>,
    pub users: Option<String>,
}

impl SheetsConfig {
    pub fn url_for(&self, collection: SyncCollection) -> Option<&str> {
        let url = match collection {
            SyncCollection::Alliances => self.alliances.as_deref(),
            SyncCollection::Emails => self.emails.as_deref(),
            SyncCollection::Events => self.events.as_deref(),
            SyncCollection::Users => self.users.as_deref(),
        };
        url.map(str::trim).filter(|url| !url.is_empty())
    }
}

#[derive(Debug, Default, Deserialize, Serialize, Clone)]
pub struct WebhookConfig {
    pub url: Option<String>,
    /// Shared key sent with webhook logins. Never leaves the server.
    pub api_key: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct EmailRelayConfig {
    #[serde(default = "default_email_relay_endpoint")]
    pub endpoint: String,
    pub service_id: Option<String>,
    pub template_id: Option<String>,
    pub public_key: Option<String>,
}

impl Default for EmailRelayConfig {
    fn default() -> Self {
        Self {
            endpoint: default_email_relay_endpoint(),
            service_id: None,
            template_id: None,
            public_key: None,
        }
    }
}

impl EmailRelayConfig {
    /// Identifiers from the config file, placeholders where unset
    pub fn default_settings(&self) -> EmailRelaySettings {
        let placeholders = EmailRelaySettings::default();
        EmailRelaySettings {
            service_id: self.service_id.clone().unwrap_or(placeholders.service_id),
            template_id: self.template_id.clone().unwrap_or(placeholders.template_id),
            public_key: self.public_key.clone().unwrap_or(placeholders.public_key),
        }
    }
}

fn default_email_relay_endpoint() -> String {
    DEFAULT_EMAIL_RELAY_ENDPOINT.to_string()
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct SyncConfig {
    /// Seconds between periodic syncs; 0 disables the loop
    pub interval_secs: u64,
    pub request_timeout_secs: u64,
    pub alliance_grace_minutes: i64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            interval_secs: 300,
            request_timeout_secs: 15,
            alliance_grace_minutes: sheet_sync::ALLIANCE_GRACE_WINDOW_MINUTES,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct OutboxConfig {
    pub flush_interval_secs: u64,
    pub max_attempts: u32,
    pub base_backoff_secs: u64,
}

impl Default for OutboxConfig {
    fn default() -> Self {
        Self {
            flush_interval_secs: 30,
            max_attempts: 8,
            base_backoff_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LoginStrategy {
    /// Any email is accepted. Development only.
    Open,
    /// Email and password checked against stored accounts
    #[default]
    Users,
    /// Credentials forwarded to the sheet webhook
    Webhook,
}

#[derive(Debug, Default, Deserialize, Serialize, Clone)]
pub struct AuthConfig {
    #[serde(default)]
    pub strategy: LoginStrategy,
}

const DEFAULT_CONFIG: &str = r#"
[cors]
allowed_origins = ["http://localhost:5173"]

[server]
host = "127.0.0.1"
port = 8080

[sheets]
# Published CSV exports (File > Share > Publish to web > CSV)
# alliances = "https://docs.google.com/spreadsheets/d/e/.../pub?output=csv"
# emails = "https://docs.google.com/spreadsheets/d/e/.../pub?output=csv"
# events = "https://docs.google.com/spreadsheets/d/e/.../pub?output=csv"
# users = "https://docs.google.com/spreadsheets/d/e/.../pub?output=csv"

[webhook]
# Apps Script web app receiving CREATE/UPDATE/DELETE mutations
# url = "https://script.google.com/macros/s/.../exec"
# api_key = "shared-login-key"

[email_relay]
endpoint = "https://api.emailjs.com/api/v1.0/email/send"
# service_id = "service_xxx"
# template_id = "template_xxx"
# public_key = "xxxxxxxx"

[sync]
interval_secs = 300
request_timeout_secs = 15
alliance_grace_minutes = 15

[outbox]
flush_interval_secs = 30
max_attempts = 8
base_backoff_secs = 30

[auth]
# open | users | webhook
strategy = "users"
"#;

impl ApiConfig {
    pub fn load() -> Result<(Self, PathBuf), ConfigError> {
        let config_path = get_config_path();

        // Create config directory if it doesn't exist
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                ConfigError::Message(format!("Failed to create config directory: {e}"))
            })?;
        }

        if !config_path.exists() {
            std::fs::write(&config_path, DEFAULT_CONFIG).map_err(|e| {
                ConfigError::Message(format!("Failed to write default config: {e}"))
            })?;
        }

        let config = Self::load_from(&config_path)?;

        Ok((config, config_path))
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let builder = Config::builder()
            .add_source(File::from(path.to_path_buf()))
            .build()?;

        builder.try_deserialize()
    }

    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        let toml_string = toml::to_string(self)?;
        std::fs::write(path, toml_string)?;
        Ok(())
    }

    pub fn server_address(&self) -> (String, u16) {
        match &self.server {
            Some(server) => (server.host.clone(), server.port),
            None => ("127.0.0.1".to_string(), 8080),
        }
    }

    pub fn sheets(&self) -> SheetsConfig {
        self.sheets.clone().unwrap_or_default()
    }

    pub fn webhook(&self) -> WebhookConfig {
        self.webhook.clone().unwrap_or_default()
    }

    pub fn email_relay(&self) -> EmailRelayConfig {
        self.email_relay.clone().unwrap_or_default()
    }

    pub fn sync(&self) -> SyncConfig {
        self.sync.clone().unwrap_or_default()
    }

    pub fn outbox(&self) -> OutboxConfig {
        self.outbox.clone().unwrap_or_default()
    }

    pub fn login_strategy(&self) -> LoginStrategy {
        self.auth.as_ref().map(|auth| auth.strategy).unwrap_or_default()
    }
}

pub fn get_config_path() -> PathBuf {
    if let Some(config_dir) = dirs::config_dir() {
        config_dir.join("aniquem").join("api.toml")
    } else {
        PathBuf::from("api.toml")
    }
}
