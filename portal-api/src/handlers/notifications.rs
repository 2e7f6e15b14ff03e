use actix_web::{web, HttpResponse};
use shared_types::NotificationsResponse;

use super::error::ApiError;
use super::AppState;
use crate::helpers::notifications;

pub async fn list_notifications(state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let notifications = notifications::aggregate(state.store.as_ref()).await?;
    let unread_count = notifications.iter().filter(|n| !n.read).count();

    Ok(HttpResponse::Ok().json(NotificationsResponse {
        notifications,
        unread_count,
    }))
}

/// Clears the panel for this response only; the next listing rebuilds it
pub async fn mark_all_read() -> HttpResponse {
    HttpResponse::Ok().json(NotificationsResponse {
        notifications: Vec::new(),
        unread_count: 0,
    })
}
