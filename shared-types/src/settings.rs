use serde::{Deserialize, Serialize};
use ts_rs::TS;

pub const PLACEHOLDER_SERVICE_ID: &str = "YOUR_SERVICE_ID";
pub const PLACEHOLDER_TEMPLATE_ID: &str = "YOUR_TEMPLATE_ID";
pub const PLACEHOLDER_PUBLIC_KEY: &str = "YOUR_PUBLIC_KEY";

/// Identifiers for the transactional email relay
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct EmailRelaySettings {
    pub service_id: String,
    pub template_id: String,
    pub public_key: String,
}

impl Default for EmailRelaySettings {
    fn default() -> Self {
        Self {
            service_id: PLACEHOLDER_SERVICE_ID.to_string(),
            template_id: PLACEHOLDER_TEMPLATE_ID.to_string(),
            public_key: PLACEHOLDER_PUBLIC_KEY.to_string(),
        }
    }
}

impl EmailRelaySettings {
    /// Placeholder or blank identifiers mean dispatch is simulated
    pub fn is_configured(&self) -> bool {
        !self.service_id.trim().is_empty()
            && self.service_id != PLACEHOLDER_SERVICE_ID
            && !self.public_key.trim().is_empty()
            && self.public_key != PLACEHOLDER_PUBLIC_KEY
    }
}

/// Response for the email relay settings endpoint
#[derive(Debug, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct EmailRelaySettingsResponse {
    pub service_id: String,
    pub template_id: String,
    pub public_key: Option<String>,
    pub is_configured: bool,
}

/// Request to update the email relay identifiers
#[derive(Debug, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct UpdateEmailRelayRequest {
    pub service_id: String,
    pub template_id: String,
    pub public_key: String,
}
