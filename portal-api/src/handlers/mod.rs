pub mod alliances;
pub mod auth;
pub mod dashboard;
pub mod emails;
pub mod error;
pub mod events;
pub mod notifications;
pub mod outbox;
pub mod settings;
pub mod sync;
pub mod users;
pub mod volunteers;

use actix_web::{web, HttpResponse};
use std::path::PathBuf;
use std::sync::{Arc, RwLock};

use crate::config::ApiConfig;
use crate::database::KeyValueStore;
use crate::integrations::email_relay::EmailRelay;
use crate::integrations::webhook::RemoteAuthenticator;
use crate::jobs::outbox::OutboxRelay;
use crate::jobs::sheet_sync::SyncManager;

pub use error::ApiError;

/// Shared state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn KeyValueStore>,
    pub outbox: Arc<OutboxRelay>,
    pub sync: Arc<SyncManager>,
    pub email_relay: Arc<EmailRelay>,
    pub authenticator: Arc<dyn RemoteAuthenticator>,
    pub config: Arc<RwLock<ApiConfig>>,
    /// Where settings changes are written back; `None` keeps them in memory
    pub config_path: Option<PathBuf>,
}

pub async fn health(state: web::Data<AppState>) -> HttpResponse {
    match state.store.get(crate::database::store::SESSION_USER).await {
        Ok(_) => HttpResponse::Ok().json(serde_json::json!({
            "status": "healthy",
            "database": "connected"
        })),
        Err(_) => HttpResponse::InternalServerError().json(serde_json::json!({
            "status": "unhealthy",
            "database": "disconnected"
        })),
    }
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health))
        // Alliances; literal segments before `{id}`
        .route("/api/alliances", web::get().to(alliances::list_alliances))
        .route("/api/alliances", web::post().to(alliances::create_alliance))
        .route("/api/alliances/stats", web::get().to(alliances::get_stats))
        .route("/api/alliances/sync", web::post().to(alliances::sync_alliances))
        .route("/api/alliances/{id}", web::get().to(alliances::get_alliance))
        .route("/api/alliances/{id}", web::put().to(alliances::update_alliance))
        .route("/api/alliances/{id}", web::delete().to(alliances::delete_alliance))
        // Mailbox
        .route("/api/emails", web::get().to(emails::list_emails))
        .route("/api/emails/send", web::post().to(emails::send_email))
        .route("/api/emails/sync", web::post().to(emails::sync_emails))
        .route("/api/emails/{id}", web::get().to(emails::get_email))
        .route("/api/emails/{id}", web::delete().to(emails::trash_email))
        .route("/api/emails/{id}/star", web::post().to(emails::toggle_star))
        .route("/api/emails/{id}/restore", web::post().to(emails::restore_email))
        // Calendar
        .route("/api/events", web::get().to(events::list_events))
        .route("/api/events", web::post().to(events::create_event))
        .route("/api/events/sync", web::post().to(events::sync_events))
        .route("/api/events/{id}", web::get().to(events::get_event))
        .route("/api/events/{id}", web::delete().to(events::delete_event))
        .route("/api/events/{id}/reminder", web::post().to(events::send_reminder))
        // Volunteers
        .route("/api/volunteers", web::get().to(volunteers::list_volunteers))
        .route("/api/volunteers", web::post().to(volunteers::create_volunteer))
        .route("/api/volunteers/export", web::get().to(volunteers::export_volunteers))
        .route("/api/volunteers/{id}", web::put().to(volunteers::update_volunteer))
        .route("/api/volunteers/{id}", web::delete().to(volunteers::delete_volunteer))
        // User accounts
        .route("/api/users", web::get().to(users::list_users))
        .route("/api/users", web::post().to(users::create_user))
        .route("/api/users/sync", web::post().to(users::sync_users))
        .route("/api/users/{id}", web::put().to(users::update_user))
        .route("/api/users/{id}", web::delete().to(users::delete_user))
        // Session
        .route("/api/login", web::post().to(auth::login))
        .route("/api/signup", web::post().to(auth::signup))
        .route("/api/session", web::get().to(auth::get_session))
        .route("/api/session", web::delete().to(auth::logout))
        .route("/api/profile", web::put().to(auth::update_profile))
        // Shell
        .route("/api/notifications", web::get().to(notifications::list_notifications))
        .route("/api/notifications/read-all", web::post().to(notifications::mark_all_read))
        .route("/api/dashboard", web::get().to(dashboard::get_dashboard))
        .route("/api/settings/email-relay", web::get().to(settings::get_email_relay))
        .route("/api/settings/email-relay", web::put().to(settings::update_email_relay))
        // Sheet mirroring
        .route("/api/sync", web::post().to(sync::sync_all))
        .route("/api/outbox", web::get().to(outbox::list_outbox))
        .route("/api/outbox/flush", web::post().to(outbox::flush_outbox))
        .route("/api/outbox/{id}/retry", web::post().to(outbox::retry_entry));
}
