use actix_web::{web, HttpResponse};
use chrono::Utc;
use sheet_sync::mapping::sanitize_tax_id;
use sheet_sync::SheetRecord;
use shared_types::{
    AlliancesResponse, CreateAllianceRequest, ListAlliancesRequest, MutationResponse, SyncAction,
    SyncCollection, UpdateAllianceRequest,
};

use super::error::{require, ApiError};
use super::AppState;
use crate::database::alliances as alliances_db;

fn clean_tax_id(raw: &str) -> Result<String, ApiError> {
    let digits = sanitize_tax_id(raw);
    if digits.is_empty() {
        return Err(ApiError::Validation("tax_id must contain digits".to_string()));
    }
    Ok(digits)
}

pub async fn list_alliances(
    state: web::Data<AppState>,
    query: web::Query<ListAlliancesRequest>,
) -> Result<HttpResponse, ApiError> {
    let alliances = alliances_db::list_alliances(state.store.as_ref(), &query).await?;
    Ok(HttpResponse::Ok().json(AlliancesResponse { alliances }))
}

/// Counters over the same view the list shows
pub async fn get_stats(
    state: web::Data<AppState>,
    query: web::Query<ListAlliancesRequest>,
) -> Result<HttpResponse, ApiError> {
    let alliances = alliances_db::list_alliances(state.store.as_ref(), &query).await?;
    Ok(HttpResponse::Ok().json(alliances_db::compute_stats(&alliances)))
}

pub async fn get_alliance(
    state: web::Data<AppState>,
    path: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    let alliance = alliances_db::get_alliance(state.store.as_ref(), path.into_inner())
        .await?
        .ok_or(ApiError::NotFound("Alliance"))?;
    Ok(HttpResponse::Ok().json(alliance))
}

pub async fn create_alliance(
    state: web::Data<AppState>,
    request: web::Json<CreateAllianceRequest>,
) -> Result<HttpResponse, ApiError> {
    let req = request.into_inner();
    require(&req.company, "company")?;
    require(&req.contact_name, "contact_name")?;
    let tax_id = clean_tax_id(&req.tax_id)?;

    let now = Utc::now();
    let alliance = alliances_db::insert_alliance(state.store.as_ref(), &req, &tax_id, now).await?;
    tracing::info!("Created alliance {} ({})", alliance.id, alliance.company);

    let notice = state
        .outbox
        .enqueue(
            SyncCollection::Alliances,
            SyncAction::Create,
            alliance.to_sheet_payload(),
            now,
        )
        .await;

    Ok(HttpResponse::Created().json(MutationResponse {
        record: alliance,
        notice,
    }))
}

pub async fn update_alliance(
    state: web::Data<AppState>,
    path: web::Path<i64>,
    request: web::Json<UpdateAllianceRequest>,
) -> Result<HttpResponse, ApiError> {
    let req = request.into_inner();
    if let Some(company) = &req.company {
        require(company, "company")?;
    }
    let tax_id = req.tax_id.as_deref().map(clean_tax_id).transpose()?;

    let now = Utc::now();
    let alliance = alliances_db::update_alliance(
        state.store.as_ref(),
        path.into_inner(),
        &req,
        tax_id.as_deref(),
        now,
    )
    .await?
    .ok_or(ApiError::NotFound("Alliance"))?;

    let notice = state
        .outbox
        .enqueue(
            SyncCollection::Alliances,
            SyncAction::Update,
            alliance.to_sheet_payload(),
            now,
        )
        .await;

    Ok(HttpResponse::Ok().json(MutationResponse {
        record: alliance,
        notice,
    }))
}

/// Soft delete; the record stays stored with its flag set
pub async fn delete_alliance(
    state: web::Data<AppState>,
    path: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    let now = Utc::now();
    let alliance = alliances_db::soft_delete_alliance(state.store.as_ref(), path.into_inner(), now)
        .await?
        .ok_or(ApiError::NotFound("Alliance"))?;

    let notice = state
        .outbox
        .enqueue(
            SyncCollection::Alliances,
            SyncAction::Delete,
            alliance.to_sheet_payload(),
            now,
        )
        .await;

    Ok(HttpResponse::Ok().json(MutationResponse {
        record: alliance,
        notice,
    }))
}

pub async fn sync_alliances(state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let report = state.sync.sync(SyncCollection::Alliances, Utc::now()).await;
    Ok(HttpResponse::Ok().json(report))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::configure;
    use crate::testing::default_harness;
    use actix_web::{http::StatusCode, test, App};
    use serde_json::{json, Value};
    use shared_types::Alliance;

    #[actix_web::test]
    async fn test_create_update_soft_delete() {
        let harness = default_harness();
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(harness.state.clone()))
                .configure(configure),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/alliances")
            .set_json(json!({
                "company": "Acme",
                "tax_id": "20-123.456.789",
                "contact_name": "Luis",
                "subject": "Donación de insumos"
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["record"]["tax_id"], "20123456789");
        assert_eq!(body["record"]["status"], "New");
        assert_eq!(body["notice"]["title"], "Sincronizando");
        let id = body["record"]["id"].as_i64().unwrap();

        let req = test::TestRequest::put()
            .uri(&format!("/api/alliances/{id}"))
            .set_json(json!({ "status": "Negotiating" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let req = test::TestRequest::get().uri("/api/alliances/stats").to_request();
        let stats: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(stats["total"], 1);
        assert_eq!(stats["negotiating"], 1);

        let req = test::TestRequest::delete()
            .uri(&format!("/api/alliances/{id}"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        // Hidden from the default view, still stored
        let req = test::TestRequest::get().uri("/api/alliances").to_request();
        let listed: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(listed["alliances"].as_array().unwrap().len(), 0);

        let stored = alliances_db::list_alliances(
            harness.store.as_ref(),
            &ListAlliancesRequest {
                include_deleted: Some(true),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(stored.len(), 1);
        assert!(stored[0].deleted);

        let actions: Vec<String> = harness
            .state
            .outbox
            .list()
            .await
            .unwrap()
            .entries
            .iter()
            .map(|e| e.action.as_str().to_string())
            .collect();
        assert_eq!(actions, vec!["CREATE", "UPDATE", "DELETE"]);
    }

    #[actix_web::test]
    async fn test_validation_and_not_found() {
        let harness = default_harness();
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(harness.state.clone()))
                .configure(configure),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/alliances")
            .set_json(json!({
                "company": "  ",
                "tax_id": "123",
                "contact_name": "Luis",
                "subject": "x"
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let req = test::TestRequest::post()
            .uri("/api/alliances")
            .set_json(json!({
                "company": "Acme",
                "tax_id": "sin ruc",
                "contact_name": "Luis",
                "subject": "x"
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let req = test::TestRequest::get().uri("/api/alliances/42").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let alliances: Vec<Alliance> =
            alliances_db::list_alliances(harness.store.as_ref(), &Default::default())
                .await
                .unwrap();
        assert!(alliances.is_empty());
    }
}
