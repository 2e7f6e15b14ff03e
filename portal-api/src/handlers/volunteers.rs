use actix_web::http::header::{ContentDisposition, DispositionParam, DispositionType};
use actix_web::{web, HttpResponse};
use chrono::Utc;
use shared_types::{
    CreateVolunteerRequest, ListVolunteersRequest, MutationResponse, Notice,
    UpdateVolunteerRequest, VolunteersResponse,
};

use super::error::{require, ApiError};
use super::AppState;
use crate::database::volunteers as volunteers_db;

pub async fn list_volunteers(
    state: web::Data<AppState>,
    query: web::Query<ListVolunteersRequest>,
) -> Result<HttpResponse, ApiError> {
    let volunteers = volunteers_db::load_volunteers(state.store.as_ref()).await?;
    Ok(HttpResponse::Ok().json(VolunteersResponse {
        volunteers: volunteers_db::filter_volunteers(&volunteers, &query),
    }))
}

pub async fn create_volunteer(
    state: web::Data<AppState>,
    request: web::Json<CreateVolunteerRequest>,
) -> Result<HttpResponse, ApiError> {
    let req = request.into_inner();
    require(&req.name, "name")?;
    require(&req.role, "role")?;
    require(&req.email, "email")?;

    let volunteer = volunteers_db::insert_volunteer(state.store.as_ref(), &req, Utc::now()).await?;
    tracing::info!("Registered volunteer {}", volunteer.id);

    Ok(HttpResponse::Created().json(MutationResponse {
        record: volunteer,
        notice: Notice::success("Voluntario registrado"),
    }))
}

pub async fn update_volunteer(
    state: web::Data<AppState>,
    path: web::Path<i64>,
    request: web::Json<UpdateVolunteerRequest>,
) -> Result<HttpResponse, ApiError> {
    let req = request.into_inner();
    if let Some(name) = &req.name {
        require(name, "name")?;
    }

    let volunteer = volunteers_db::update_volunteer(state.store.as_ref(), path.into_inner(), &req)
        .await?
        .ok_or(ApiError::NotFound("Volunteer"))?;

    Ok(HttpResponse::Ok().json(MutationResponse {
        record: volunteer,
        notice: Notice::success("Voluntario actualizado"),
    }))
}

pub async fn delete_volunteer(
    state: web::Data<AppState>,
    path: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    let volunteer = volunteers_db::delete_volunteer(state.store.as_ref(), path.into_inner())
        .await?
        .ok_or(ApiError::NotFound("Volunteer"))?;

    Ok(HttpResponse::Ok().json(MutationResponse {
        record: volunteer,
        notice: Notice::success("Voluntario eliminado"),
    }))
}

/// Every stored volunteer as a CSV download
pub async fn export_volunteers(state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let volunteers = volunteers_db::load_volunteers(state.store.as_ref()).await?;
    let csv = volunteers_db::export_csv(&volunteers)?;

    Ok(HttpResponse::Ok()
        .content_type("text/csv; charset=utf-8")
        .insert_header(ContentDisposition {
            disposition: DispositionType::Attachment,
            parameters: vec![DispositionParam::Filename("voluntarios_aniquem.csv".to_string())],
        })
        .body(csv))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::configure;
    use crate::testing::default_harness;
    use actix_web::{http::header, http::StatusCode, test, App};
    use serde_json::{json, Value};

    #[actix_web::test]
    async fn test_crud_and_export() {
        let harness = default_harness();
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(harness.state.clone()))
                .configure(configure),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/volunteers")
            .set_json(json!({
                "name": "Rosa Quispe",
                "role": "Voluntaria",
                "email": "rosa@example.com",
                "status": "On Leave"
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let created: Value = test::read_body_json(resp).await;
        let id = created["record"]["id"].as_i64().unwrap();

        let req = test::TestRequest::get()
            .uri("/api/volunteers?search=rosa")
            .to_request();
        let listed: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(listed["volunteers"].as_array().unwrap().len(), 1);

        let req = test::TestRequest::get().uri("/api/volunteers/export").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let disposition = resp
            .headers()
            .get(header::CONTENT_DISPOSITION)
            .unwrap()
            .to_str()
            .unwrap()
            .to_string();
        assert!(disposition.contains("voluntarios_aniquem.csv"));
        let body = test::read_body(resp).await;
        let text = String::from_utf8(body.to_vec()).unwrap();
        assert!(text.starts_with("ID,Nombre,Rol,Estado,Email,Fecha de Ingreso"));
        assert!(text.contains("Rosa Quispe"));

        let req = test::TestRequest::delete()
            .uri(&format!("/api/volunteers/{id}"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let req = test::TestRequest::delete()
            .uri(&format!("/api/volunteers/{id}"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}
