use actix_web::{web, HttpResponse};
use shared_types::{
    EmailRelaySettings, EmailRelaySettingsResponse, MutationResponse, Notice,
    UpdateEmailRelayRequest,
};
use tracing::info;

use super::error::{require, ApiError};
use super::AppState;
use crate::config::EmailRelayConfig;
use crate::database::settings as settings_db;

/// At most six leading characters stay visible, and never more than half the key
fn mask_key(key: &str) -> Option<String> {
    let key = key.trim();
    if key.is_empty() {
        return None;
    }
    let length = key.chars().count();
    let shown = (length / 2).min(6);
    let visible: String = key.chars().take(shown).collect();
    let hidden = length - shown;
    let masked = format!("{}{}", visible, "*".repeat(hidden));
    if masked.chars().count() > 40 {
        Some(format!("{}...", masked.chars().take(37).collect::<String>()))
    } else {
        Some(masked)
    }
}

fn to_response(settings: &EmailRelaySettings) -> EmailRelaySettingsResponse {
    EmailRelaySettingsResponse {
        service_id: settings.service_id.clone(),
        template_id: settings.template_id.clone(),
        public_key: mask_key(&settings.public_key),
        is_configured: settings.is_configured(),
    }
}

pub async fn get_email_relay(state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let settings = state.email_relay.settings().await;
    Ok(HttpResponse::Ok().json(to_response(&settings)))
}

/// Stores the identifiers and writes them back to the config file
pub async fn update_email_relay(
    state: web::Data<AppState>,
    request: web::Json<UpdateEmailRelayRequest>,
) -> Result<HttpResponse, ApiError> {
    let req = request.into_inner();
    require(&req.service_id, "service_id")?;
    require(&req.template_id, "template_id")?;
    require(&req.public_key, "public_key")?;

    let settings = EmailRelaySettings {
        service_id: req.service_id.trim().to_string(),
        template_id: req.template_id.trim().to_string(),
        public_key: req.public_key.trim().to_string(),
    };
    settings_db::save_email_relay(state.store.as_ref(), &settings).await?;

    {
        let mut config = state
            .config
            .write()
            .map_err(|e| ApiError::Internal(format!("Failed to acquire config write lock: {}", e)))?;

        let endpoint = config.email_relay().endpoint;
        config.email_relay = Some(EmailRelayConfig {
            endpoint,
            service_id: Some(settings.service_id.clone()),
            template_id: Some(settings.template_id.clone()),
            public_key: Some(settings.public_key.clone()),
        });

        if let Some(path) = &state.config_path {
            config
                .save_to(path)
                .map_err(|e| ApiError::Internal(format!("Failed to write config file: {}", e)))?;
            info!("Updated email relay settings in {}", path.display());
        }
    }

    Ok(HttpResponse::Ok().json(MutationResponse {
        record: to_response(&settings),
        notice: Notice::success("Configuración de correo guardada"),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ApiConfig;
    use crate::handlers::configure;
    use crate::testing::default_harness;
    use actix_web::{http::StatusCode, test, App};
    use serde_json::{json, Value};

    #[::core::prelude::v1::test]
    fn test_mask_key() {
        assert_eq!(mask_key(""), None);
        assert_eq!(mask_key("pk_1"), Some("pk**".to_string()));
        assert_eq!(mask_key("x"), Some("*".to_string()));
        assert_eq!(mask_key("secret"), Some("sec***".to_string()));
        assert_eq!(mask_key("abcdefghij"), Some("abcde*****".to_string()));
        assert_eq!(mask_key("abcdefghijklmn"), Some("abcdef********".to_string()));
        let long = "x".repeat(60);
        assert_eq!(mask_key(&long).unwrap().chars().count(), 40);
    }

    #[actix_web::test]
    async fn test_update_persists_and_writes_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("api.toml");

        let mut harness = default_harness();
        harness.state.config_path = Some(path.clone());
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(harness.state.clone()))
                .configure(configure),
        )
        .await;

        let req = test::TestRequest::get().uri("/api/settings/email-relay").to_request();
        let before: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(before["is_configured"], false);

        let req = test::TestRequest::put()
            .uri("/api/settings/email-relay")
            .set_json(json!({
                "service_id": "service_abc",
                "template_id": "template_xyz",
                "public_key": "pk_live_123456789"
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let req = test::TestRequest::get().uri("/api/settings/email-relay").to_request();
        let after: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(after["is_configured"], true);
        assert_eq!(after["public_key"], "pk_liv***********");

        let saved = ApiConfig::load_from(&path).unwrap();
        assert_eq!(
            saved.email_relay().default_settings().service_id,
            "service_abc"
        );
        assert!(harness.state.email_relay.settings().await.is_configured());
    }

    #[actix_web::test]
    async fn test_update_rejects_blank_fields() {
        let harness = default_harness();
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(harness.state.clone()))
                .configure(configure),
        )
        .await;

        let req = test::TestRequest::put()
            .uri("/api/settings/email-relay")
            .set_json(json!({ "service_id": "", "template_id": "t", "public_key": "k" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }
}
