use async_trait::async_trait;
use reqwest::header::{CACHE_CONTROL, HeaderValue};
use sheet_sync::SheetError;
use std::time::Duration;

/// Source of published CSV exports
#[async_trait]
pub trait SheetSource: Send + Sync {
    /// Raw CSV text of the sheet at `url`
    async fn fetch(&self, url: &str) -> Result<String, SheetError>;
}

pub struct HttpSheetSource {
    client: reqwest::Client,
}

impl HttpSheetSource {
    pub fn new(timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self { client }
    }
}

/// Appends `t=<millis>` so intermediate caches never serve a stale export
pub fn with_cache_buster(url: &str, now_ms: i64) -> String {
    let separator = if url.contains('?') { '&' } else { '?' };
    format!("{url}{separator}t={now_ms}")
}

#[async_trait]
impl SheetSource for HttpSheetSource {
    async fn fetch(&self, url: &str) -> Result<String, SheetError> {
        let url = with_cache_buster(url, chrono::Utc::now().timestamp_millis());
        tracing::debug!("Fetching sheet export {}", url);

        let response = self
            .client
            .get(&url)
            .header(CACHE_CONTROL, HeaderValue::from_static("no-store"))
            .send()
            .await
            .map_err(|e| SheetError::Http(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SheetError::Status(status.as_u16()));
        }

        // Content type is ignored; published exports are served as text/csv or text/plain
        response
            .text()
            .await
            .map_err(|e| SheetError::Http(e.to_string()))
    }
}
