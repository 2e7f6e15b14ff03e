use shared_types::EmailRelaySettings;

use super::store::{self, KeyValueStore, StoreError};

/// Relay identifiers saved through the settings endpoint, if any
pub async fn load_email_relay(
    store: &dyn KeyValueStore,
) -> Result<Option<EmailRelaySettings>, StoreError> {
    store::load_object(store, store::EMAIL_RELAY).await
}

pub async fn save_email_relay(
    store: &dyn KeyValueStore,
    settings: &EmailRelaySettings,
) -> Result<(), StoreError> {
    store::save_object(store, store::EMAIL_RELAY, settings).await
}
