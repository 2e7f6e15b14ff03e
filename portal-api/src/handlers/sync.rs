use actix_web::{web, HttpResponse};
use chrono::Utc;

use super::error::ApiError;
use super::AppState;

/// Runs a sync pass over every collection with a sheet URL
pub async fn sync_all(state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let reports = state.sync.sync_all(Utc::now()).await;
    Ok(HttpResponse::Ok().json(reports))
}
