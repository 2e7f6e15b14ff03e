use actix_web::{web, HttpResponse};
use chrono::Utc;

use super::error::ApiError;
use super::AppState;

pub async fn list_outbox(state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let response = state.outbox.list().await?;
    Ok(HttpResponse::Ok().json(response))
}

pub async fn flush_outbox(state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let report = state.outbox.flush(Utc::now()).await?;
    Ok(HttpResponse::Ok().json(report))
}

/// Makes a failed entry due again
pub async fn retry_entry(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let entry = state
        .outbox
        .retry(&path.into_inner(), Utc::now())
        .await?
        .ok_or(ApiError::NotFound("Outbox entry"))?;
    Ok(HttpResponse::Ok().json(entry))
}
