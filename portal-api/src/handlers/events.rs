use actix_web::{web, HttpResponse};
use chrono::Utc;
use sheet_sync::SheetRecord;
use shared_types::{
    CreateEventRequest, EventsResponse, ListEventsRequest, MutationResponse, Notice, SyncAction,
    SyncCollection,
};

use super::error::{require, ApiError};
use super::AppState;
use crate::database::emails as emails_db;
use crate::database::events as events_db;
use crate::helpers::automations;
use crate::integrations::email_relay::DispatchOutcome;

/// Marks a notice as a relay failure: error level, reason as description
fn flag_relay_failure(notice: Notice, outcome: &DispatchOutcome) -> Notice {
    match outcome.failure_notice() {
        Some(failure) => Notice {
            level: failure.level,
            description: failure.description,
            ..notice
        },
        None => notice,
    }
}

pub async fn list_events(
    state: web::Data<AppState>,
    query: web::Query<ListEventsRequest>,
) -> Result<HttpResponse, ApiError> {
    let events = events_db::load_events(state.store.as_ref()).await?;
    Ok(HttpResponse::Ok().json(EventsResponse {
        events: events_db::filter_events(&events, &query, Utc::now()),
    }))
}

pub async fn get_event(
    state: web::Data<AppState>,
    path: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    let event = events_db::get_event(state.store.as_ref(), path.into_inner())
        .await?
        .ok_or(ApiError::NotFound("Event"))?;
    Ok(HttpResponse::Ok().json(event))
}

/// Adds the event, then runs the mailbox automations it asks for
pub async fn create_event(
    state: web::Data<AppState>,
    request: web::Json<CreateEventRequest>,
) -> Result<HttpResponse, ApiError> {
    let req = request.into_inner();
    require(&req.title, "title")?;
    if !(1..=31).contains(&req.day) {
        return Err(ApiError::Validation("day must be between 1 and 31".to_string()));
    }
    if let Some(month) = req.month {
        if !(1..=12).contains(&month) {
            return Err(ApiError::Validation("month must be between 1 and 12".to_string()));
        }
    }

    let now = Utc::now();
    let event = events_db::insert_event(state.store.as_ref(), &req, now).await?;
    tracing::info!("Created event {} ({})", event.id, event.title);

    let sync_notice = state
        .outbox
        .enqueue(
            SyncCollection::Events,
            SyncAction::Create,
            event.to_sheet_payload(),
            now,
        )
        .await;

    let guest = event.guest_email.clone();
    let notify = req.notify_participants;

    let mut invitation = None;
    if notify || guest.is_some() {
        let event_ref = &event;
        let guest_ref = guest.as_deref();
        // Guest copy ends up above the internal notice, as in a mailbox
        let added = emails_db::prepend_emails(state.store.as_ref(), now.timestamp_millis(), |id| {
            let mut emails = Vec::new();
            if let Some(guest) = guest_ref {
                emails.push(automations::guest_invitation(id + 1, event_ref, guest).0);
            }
            if notify {
                emails.push(automations::internal_invitation(id, event_ref));
            }
            emails
        })
        .await;
        if let Err(e) = added {
            tracing::warn!("Failed to file invitation emails for event {}: {}", event.id, e);
        }

        if let Some(guest) = guest.as_deref() {
            let (_, params) = automations::guest_invitation(0, &event, guest);
            invitation = Some((guest.to_string(), state.email_relay.send(&params).await));
        }
    }

    let notice = match invitation {
        Some((guest, DispatchOutcome::Sent)) => {
            Notice::success(format!("Invitación oficial enviada a {}", guest))
        }
        Some((guest, outcome)) => flag_relay_failure(
            Notice::success(format!("Invitación simulada a {}", guest)),
            &outcome,
        ),
        None if notify => Notice::success("Evento creado y notificaciones internas enviadas"),
        None => Notice::success("Evento agregado al calendario"),
    };
    let notice = match sync_notice.description {
        Some(sync) => {
            let description = match notice.description.as_deref() {
                Some(own) => format!("{} {}", own, sync),
                None => sync,
            };
            notice.with_description(description)
        }
        None => notice,
    };

    Ok(HttpResponse::Created().json(MutationResponse {
        record: event,
        notice,
    }))
}

/// Files a reminder in the inbox
pub async fn send_reminder(
    state: web::Data<AppState>,
    path: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    let event = events_db::get_event(state.store.as_ref(), path.into_inner())
        .await?
        .ok_or(ApiError::NotFound("Event"))?;

    let event_ref = &event;
    let mut added = emails_db::prepend_emails(
        state.store.as_ref(),
        Utc::now().timestamp_millis(),
        |id| vec![automations::reminder(id, event_ref)],
    )
    .await?;
    let reminder = added
        .pop()
        .ok_or_else(|| ApiError::Internal("Reminder was not stored".to_string()))?;

    Ok(HttpResponse::Ok().json(MutationResponse {
        record: reminder,
        notice: Notice::success(format!("Recordatorio enviado para \"{}\"", event.title)),
    }))
}

/// Removes the event. A guest gets a cancellation and the inbox a confirmation.
pub async fn delete_event(
    state: web::Data<AppState>,
    path: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    let now = Utc::now();
    let event = events_db::delete_event(state.store.as_ref(), path.into_inner())
        .await?
        .ok_or(ApiError::NotFound("Event"))?;

    state
        .outbox
        .enqueue(
            SyncCollection::Events,
            SyncAction::Delete,
            event.to_sheet_payload(),
            now,
        )
        .await;

    let notice = match event.guest_email.as_deref() {
        Some(guest) => {
            let event_ref = &event;
            let added =
                emails_db::prepend_emails(state.store.as_ref(), now.timestamp_millis(), |id| {
                    automations::cancellation(id, event_ref, guest).0
                })
                .await;
            if let Err(e) = added {
                tracing::warn!("Failed to file cancellation emails for event {}: {}", event.id, e);
            }

            let (_, params) = automations::cancellation(0, &event, guest);
            let outcome = state.email_relay.send(&params).await;

            match outcome {
                DispatchOutcome::Failed(_) => flag_relay_failure(
                    Notice::success(format!("Evento eliminado; notificación simulada a {}", guest)),
                    &outcome,
                ),
                _ => Notice::success(format!("Evento eliminado y notificación enviada a {}", guest)),
            }
        }
        None => Notice::success("Evento eliminado"),
    };

    Ok(HttpResponse::Ok().json(MutationResponse {
        record: event,
        notice,
    }))
}

pub async fn sync_events(state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let report = state.sync.sync(SyncCollection::Events, Utc::now()).await;
    Ok(HttpResponse::Ok().json(report))
}
