use actix_web::{web, HttpResponse};
use chrono::Utc;
use sheet_sync::SheetRecord;
use shared_types::{
    CreateUserRequest, LoginRequest, MutationResponse, Notice, SessionResponse, SignupRequest,
    SyncAction, SyncCollection, UpdateProfileRequest, UserRole, UserView,
};

use super::error::{require, ApiError};
use super::AppState;
use crate::database::users as users_db;
use crate::helpers::auth::{authenticate, avatar_url};

pub async fn login(
    state: web::Data<AppState>,
    request: web::Json<LoginRequest>,
) -> Result<HttpResponse, ApiError> {
    let strategy = state
        .config
        .read()
        .map_err(|_| ApiError::Internal("Config lock poisoned".to_string()))?
        .login_strategy();

    let user = match authenticate(
        strategy,
        state.store.as_ref(),
        state.authenticator.as_ref(),
        &request,
    )
    .await
    {
        Ok(user) => user,
        Err(e) => {
            tracing::warn!("Login rejected for {}: {}", request.email.trim(), e);
            return Err(e.into());
        }
    };

    users_db::save_session(state.store.as_ref(), &user).await?;
    tracing::info!("User {} logged in", user.email);

    Ok(HttpResponse::Ok().json(SessionResponse {
        authenticated: true,
        notice: Some(Notice::success(format!("Bienvenido, {}", user.name))),
        user: Some(user),
    }))
}

/// Creates a regular account and mirrors it to the users sheet
pub async fn signup(
    state: web::Data<AppState>,
    request: web::Json<SignupRequest>,
) -> Result<HttpResponse, ApiError> {
    let req = request.into_inner();
    require(&req.name, "name")?;
    require(&req.email, "email")?;
    require(&req.password, "password")?;

    let now = Utc::now();
    let user = users_db::insert_user(
        state.store.as_ref(),
        &CreateUserRequest {
            name: req.name,
            email: req.email,
            password: Some(req.password),
            role: Some(UserRole::User),
        },
        now,
    )
    .await?;

    let queued = state
        .outbox
        .enqueue(
            SyncCollection::Users,
            SyncAction::Signup,
            user.to_sheet_payload(),
            now,
        )
        .await;
    let notice = match queued.description {
        Some(description) => Notice::success("Cuenta creada").with_description(description),
        None => Notice::success("Cuenta creada"),
    };

    Ok(HttpResponse::Created().json(MutationResponse {
        record: UserView::from(&user),
        notice,
    }))
}

pub async fn get_session(state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let user = users_db::load_session(state.store.as_ref()).await?;
    Ok(HttpResponse::Ok().json(SessionResponse {
        authenticated: user.is_some(),
        user,
        notice: None,
    }))
}

pub async fn logout(state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    users_db::clear_session(state.store.as_ref()).await?;
    Ok(HttpResponse::Ok().json(SessionResponse {
        authenticated: false,
        user: None,
        notice: Some(Notice::success("Sesión cerrada")),
    }))
}

/// Edits the logged-in user. A blank avatar falls back to a generated one.
pub async fn update_profile(
    state: web::Data<AppState>,
    request: web::Json<UpdateProfileRequest>,
) -> Result<HttpResponse, ApiError> {
    let req = request.into_inner();
    require(&req.name, "name")?;
    require(&req.email, "email")?;

    let mut user = users_db::load_session(state.store.as_ref())
        .await?
        .ok_or_else(|| ApiError::Unauthorized("No hay una sesión activa".to_string()))?;

    user.name = req.name.trim().to_string();
    user.email = req.email.trim().to_string();
    user.avatar = Some(
        req.avatar
            .map(|a| a.trim().to_string())
            .filter(|a| !a.is_empty())
            .unwrap_or_else(|| avatar_url(&user.name)),
    );

    users_db::save_session(state.store.as_ref(), &user).await?;

    Ok(HttpResponse::Ok().json(SessionResponse {
        authenticated: true,
        user: Some(user),
        notice: Some(Notice::success("Perfil actualizado correctamente")),
    }))
}
