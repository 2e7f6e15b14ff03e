use actix_web::{web, HttpResponse};
use chrono::Utc;
use shared_types::{
    ListEmailsRequest, ListEmailsResponse, MutationResponse, Notice, SendEmailRequest,
    SyncCollection,
};

use super::error::{require, ApiError};
use super::AppState;
use crate::database::emails as emails_db;
use crate::helpers::automations::{self, PORTAL_SENDER};
use crate::integrations::email_relay::{DispatchOutcome, DispatchParams};

pub async fn list_emails(
    state: web::Data<AppState>,
    query: web::Query<ListEmailsRequest>,
) -> Result<HttpResponse, ApiError> {
    let all = emails_db::load_emails(state.store.as_ref()).await?;
    let emails = emails_db::filter_emails(&all, &query);

    Ok(HttpResponse::Ok().json(ListEmailsResponse {
        total_count: emails.len(),
        unread_count: emails_db::count_unread_inbox(&all),
        emails,
    }))
}

/// Opening a message marks it read
pub async fn get_email(
    state: web::Data<AppState>,
    path: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    let email = emails_db::open_email(state.store.as_ref(), path.into_inner())
        .await?
        .ok_or(ApiError::NotFound("Email"))?;
    Ok(HttpResponse::Ok().json(email))
}

pub async fn toggle_star(
    state: web::Data<AppState>,
    path: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    let email = emails_db::toggle_star(state.store.as_ref(), path.into_inner())
        .await?
        .ok_or(ApiError::NotFound("Email"))?;

    let title = if email.starred {
        "Correo destacado"
    } else {
        "Correo sin destacar"
    };
    Ok(HttpResponse::Ok().json(MutationResponse {
        record: email,
        notice: Notice::success(title),
    }))
}

pub async fn trash_email(
    state: web::Data<AppState>,
    path: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    let email = emails_db::move_to_trash(state.store.as_ref(), path.into_inner())
        .await?
        .ok_or(ApiError::NotFound("Email"))?;

    Ok(HttpResponse::Ok().json(MutationResponse {
        record: email,
        notice: Notice::success("Correo movido a la papelera"),
    }))
}

pub async fn restore_email(
    state: web::Data<AppState>,
    path: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    let email = emails_db::restore_email(state.store.as_ref(), path.into_inner())
        .await?
        .ok_or(ApiError::NotFound("Email"))?;

    Ok(HttpResponse::Ok().json(MutationResponse {
        record: email,
        notice: Notice::success("Correo restaurado"),
    }))
}

/// Files the message under Sent, then hands it to the email relay
pub async fn send_email(
    state: web::Data<AppState>,
    request: web::Json<SendEmailRequest>,
) -> Result<HttpResponse, ApiError> {
    let req = request.into_inner();
    require(&req.to, "to")?;
    require(&req.subject, "subject")?;

    let now = Utc::now();
    let subject = req.subject.clone();
    let message = req.message.clone();
    let attachments = req.attachments.clone();
    let saved = emails_db::prepend_emails(state.store.as_ref(), now.timestamp_millis(), |id| {
        vec![automations::sent_copy(id, &subject, &message, attachments.clone())]
    })
    .await?;
    let record = saved
        .into_iter()
        .next()
        .ok_or_else(|| ApiError::Internal("Sent copy was not stored".to_string()))?;

    let to = req.to.trim().to_string();
    let outcome = state
        .email_relay
        .send(&DispatchParams {
            to_email: to.clone(),
            subject: req.subject.trim().to_string(),
            message: req.message,
            from_name: PORTAL_SENDER.to_string(),
        })
        .await;

    let notice = match &outcome {
        DispatchOutcome::Sent => Notice::success(format!("Correo enviado realmente a {}", to)),
        DispatchOutcome::Simulated => Notice::info(
            "Correo simulado guardado en Enviados",
            "Configura EmailJS para envío real",
        ),
        DispatchOutcome::Failed(_) => outcome.failure_notice().unwrap_or_else(|| {
            Notice::error("Error al enviar correo real", "Se guardó como simulado.")
        }),
    };

    Ok(HttpResponse::Created().json(MutationResponse { record, notice }))
}

pub async fn sync_emails(state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let report = state.sync.sync(SyncCollection::Emails, Utc::now()).await;
    Ok(HttpResponse::Ok().json(report))
}
