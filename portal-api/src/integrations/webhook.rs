//! Client for the spreadsheet's Apps Script web app.
//!
//! Mutations are posted as `text/plain` JSON so the script receives the raw
//! body, the same shape browser clients send. Logins go to the same URL with
//! `action: "login"` and the shared key held in server config.

use async_trait::async_trait;
use reqwest::header::{CONTENT_TYPE, HeaderValue};
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;

use crate::config::WebhookConfig;

/// Receives outbox payloads
#[async_trait]
pub trait MutationSink: Send + Sync {
    fn is_configured(&self) -> bool;

    async fn deliver(&self, payload: &Value) -> anyhow::Result<()>;
}

/// Reply of the webhook to a login request
#[derive(Debug, Clone, Deserialize)]
pub struct RemoteLogin {
    pub status: String,
    pub role: Option<String>,
    pub name: Option<String>,
    pub id: Option<Value>,
    pub message: Option<String>,
}

impl RemoteLogin {
    pub fn is_success(&self) -> bool {
        self.status.eq_ignore_ascii_case("success") || self.status.eq_ignore_ascii_case("ok")
    }
}

#[async_trait]
pub trait RemoteAuthenticator: Send + Sync {
    async fn verify(&self, email: &str, password: &str) -> anyhow::Result<RemoteLogin>;
}

pub struct WebhookClient {
    client: reqwest::Client,
    url: Option<String>,
    api_key: Option<String>,
}

impl WebhookClient {
    pub fn new(config: &WebhookConfig, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            url: config
                .url
                .as_deref()
                .map(str::trim)
                .filter(|url| !url.is_empty())
                .map(str::to_string),
            api_key: config.api_key.clone(),
        }
    }

    async fn post(&self, body: &Value) -> anyhow::Result<reqwest::Response> {
        let url = self
            .url
            .as_deref()
            .ok_or_else(|| anyhow::anyhow!("No webhook URL configured"))?;

        let response = self
            .client
            .post(url)
            .header(CONTENT_TYPE, HeaderValue::from_static("text/plain;charset=utf-8"))
            .body(serde_json::to_string(body)?)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("Webhook responded with status {}", status);
        }
        Ok(response)
    }
}

#[async_trait]
impl MutationSink for WebhookClient {
    fn is_configured(&self) -> bool {
        self.url.is_some()
    }

    async fn deliver(&self, payload: &Value) -> anyhow::Result<()> {
        self.post(payload).await?;
        Ok(())
    }
}

#[async_trait]
impl RemoteAuthenticator for WebhookClient {
    async fn verify(&self, email: &str, password: &str) -> anyhow::Result<RemoteLogin> {
        let body = json!({
            "action": "login",
            "email": email,
            "password": password,
            "apiKey": self.api_key.clone().unwrap_or_default(),
        });

        let response = self.post(&body).await?;
        let login: RemoteLogin = response.json().await?;
        Ok(login)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_url_is_not_configured() {
        let config = WebhookConfig {
            url: Some("  ".to_string()),
            api_key: None,
        };
        let client = WebhookClient::new(&config, Duration::from_secs(1));
        assert!(!client.is_configured());

        let config = WebhookConfig {
            url: Some("https://script.google.com/macros/s/abc/exec".to_string()),
            api_key: None,
        };
        assert!(WebhookClient::new(&config, Duration::from_secs(1)).is_configured());
    }

    #[tokio::test]
    async fn test_deliver_without_url_fails() {
        let client = WebhookClient::new(&WebhookConfig::default(), Duration::from_secs(1));
        let result = client.deliver(&json!({"id": 1})).await;
        assert!(result.is_err());
    }

    #[test]
    fn test_remote_login_status() {
        let login: RemoteLogin =
            serde_json::from_str(r#"{"status":"success","role":"admin","name":"Ana","id":12}"#)
                .unwrap();
        assert!(login.is_success());

        let login: RemoteLogin =
            serde_json::from_str(r#"{"status":"error","message":"Credenciales inválidas"}"#)
                .unwrap();
        assert!(!login.is_success());
    }
}
