use actix_web::{web, HttpResponse};
use chrono::Utc;
use sheet_sync::SheetRecord;
use shared_types::{
    CreateUserRequest, ListUsersRequest, MutationResponse, Notice, SyncAction, SyncCollection,
    UpdateUserRequest, UserAccount, UserView, UsersResponse,
};

use super::error::{require, ApiError};
use super::AppState;
use crate::database::users as users_db;

/// Relays the account and folds the queue outcome into the screen notice
async fn relay(
    state: &AppState,
    action: SyncAction,
    user: &UserAccount,
    title: &str,
) -> Notice {
    let queued = state
        .outbox
        .enqueue(
            SyncCollection::Users,
            action,
            user.to_sheet_payload(),
            Utc::now(),
        )
        .await;

    match queued.description {
        Some(description) => Notice::success(title).with_description(description),
        None => Notice::success(title),
    }
}

pub async fn list_users(
    state: web::Data<AppState>,
    query: web::Query<ListUsersRequest>,
) -> Result<HttpResponse, ApiError> {
    let users = users_db::load_users(state.store.as_ref()).await?;
    Ok(HttpResponse::Ok().json(UsersResponse {
        users: users_db::filter_users(&users, &query)
            .iter()
            .map(UserView::from)
            .collect(),
    }))
}

pub async fn create_user(
    state: web::Data<AppState>,
    request: web::Json<CreateUserRequest>,
) -> Result<HttpResponse, ApiError> {
    let req = request.into_inner();
    require(&req.name, "name")?;
    require(&req.email, "email")?;

    let user = users_db::insert_user(state.store.as_ref(), &req, Utc::now()).await?;
    tracing::info!("Registered user {} ({})", user.id, user.email);

    let notice = relay(&state, SyncAction::Create, &user, "Usuario registrado").await;
    Ok(HttpResponse::Created().json(MutationResponse {
        record: UserView::from(&user),
        notice,
    }))
}

pub async fn update_user(
    state: web::Data<AppState>,
    path: web::Path<i64>,
    request: web::Json<UpdateUserRequest>,
) -> Result<HttpResponse, ApiError> {
    let req = request.into_inner();
    if let Some(name) = &req.name {
        require(name, "name")?;
    }
    if let Some(email) = &req.email {
        require(email, "email")?;
    }

    let user = users_db::update_user(state.store.as_ref(), path.into_inner(), &req)
        .await?
        .ok_or(ApiError::NotFound("User"))?;

    let notice = relay(&state, SyncAction::Update, &user, "Usuario actualizado").await;
    Ok(HttpResponse::Ok().json(MutationResponse {
        record: UserView::from(&user),
        notice,
    }))
}

/// Hard delete. The sheet looks the row up by email.
pub async fn delete_user(
    state: web::Data<AppState>,
    path: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    let user = users_db::delete_user(state.store.as_ref(), path.into_inner())
        .await?
        .ok_or(ApiError::NotFound("User"))?;

    let notice = relay(&state, SyncAction::Delete, &user, "Usuario eliminado").await;
    Ok(HttpResponse::Ok().json(MutationResponse {
        record: UserView::from(&user),
        notice,
    }))
}

pub async fn sync_users(state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let report = state.sync.sync(SyncCollection::Users, Utc::now()).await;
    Ok(HttpResponse::Ok().json(report))
}
