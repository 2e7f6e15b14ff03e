//! Mailbox messages generated by calendar and compose actions.

use shared_types::{Attachment, CalendarEvent, EmailFolder, EmailMessage};

use crate::integrations::email_relay::DispatchParams;

pub const PORTAL_SENDER: &str = "Aniquem Portal System";
pub const EVENTS_SENDER: &str = "Aniquem Events";
const AGENDA_SENDER: &str = "Sistema de Agenda";
const SELF_SENDER: &str = "Yo";
const AUTOMATIC_LABEL: &str = "Automático";

const MONTHS: [&str; 12] = [
    "Enero",
    "Febrero",
    "Marzo",
    "Abril",
    "Mayo",
    "Junio",
    "Julio",
    "Agosto",
    "Septiembre",
    "Octubre",
    "Noviembre",
    "Diciembre",
];

/// Spanish name of a 1-based month
pub fn month_name(month: u32) -> &'static str {
    MONTHS
        .get(month.saturating_sub(1) as usize)
        .copied()
        .unwrap_or("")
}

fn message(
    id: i64,
    sender: &str,
    subject: String,
    preview: String,
    body: String,
    folder: EmailFolder,
) -> EmailMessage {
    let outgoing = folder == EmailFolder::Sent;
    EmailMessage {
        id,
        sender: sender.to_string(),
        subject,
        preview,
        body: Some(body),
        date: "Ahora".to_string(),
        starred: false,
        read: outgoing,
        label: if outgoing {
            None
        } else {
            Some(AUTOMATIC_LABEL.to_string())
        },
        deleted: false,
        folder,
        attachments: Vec::new(),
    }
}

fn location_of(event: &CalendarEvent) -> &str {
    event.location.as_deref().unwrap_or("Por definir")
}

/// Internal inbox notice for a newly scheduled event
pub fn internal_invitation(id: i64, event: &CalendarEvent) -> EmailMessage {
    message(
        id,
        AGENDA_SENDER,
        format!("Invitación: {}", event.title),
        format!("Se ha programado el evento {}...", event.title),
        format!(
            "Hola,\n\nSe le ha enviado esta notificación automática para confirmar su asistencia al evento:\n\nEvento: {}\nFecha: {} de {}\nHora: {}\nLugar: {}\n\nPor favor, agéndelo.\n\nSaludos,\nAniquem Portal",
            event.title,
            event.day,
            month_name(event.month),
            event.time,
            location_of(event)
        ),
        EmailFolder::Inbox,
    )
}

fn guest_invitation_body(event: &CalendarEvent) -> String {
    format!(
        "Estimado/a,\n\nNos complace invitarlo al siguiente evento:\n\nEvento: {}\nFecha: {} de {}\nHora: {}\nLugar: {}\n\nEsperamos contar con su presencia.\n\nAtentamente,\nEquipo Aniquem",
        event.title,
        event.day,
        month_name(event.month),
        event.time,
        location_of(event)
    )
}

/// Sent-folder copy and relay request for an invitation to `guest`
pub fn guest_invitation(id: i64, event: &CalendarEvent, guest: &str) -> (EmailMessage, DispatchParams) {
    let subject = format!("Invitación a Aliado: {}", event.title);
    let body = guest_invitation_body(event);

    let copy = message(
        id,
        SELF_SENDER,
        subject.clone(),
        format!("Estimado aliado, le invitamos al evento {}...", event.title),
        body.clone(),
        EmailFolder::Sent,
    );
    let params = DispatchParams {
        to_email: guest.to_string(),
        subject,
        message: body,
        from_name: EVENTS_SENDER.to_string(),
    };
    (copy, params)
}

pub fn reminder(id: i64, event: &CalendarEvent) -> EmailMessage {
    message(
        id,
        AGENDA_SENDER,
        format!("Recordatorio: {}", event.title),
        format!("Recordatorio del evento {} mañana...", event.title),
        format!(
            "Hola,\n\nEste es un recordatorio automático para el evento:\n\nEvento: {}\nFecha: {} de {}\nHora: {}\n\nNo olvide asistir.\n\nSaludos,\nAniquem Portal",
            event.title,
            event.day,
            month_name(event.month),
            event.time
        ),
        EmailFolder::Inbox,
    )
}

/// Inbox confirmation first, then the sent cancellation, plus its relay request
pub fn cancellation(
    first_id: i64,
    event: &CalendarEvent,
    guest: &str,
) -> (Vec<EmailMessage>, DispatchParams) {
    let body = format!(
        "Estimado/a,\n\nLamentamos informarle que el evento {} programado para el {} de {} ha sido cancelado.\n\nDisculpe las molestias.\n\nAtentamente,\nEquipo Aniquem",
        event.title,
        event.day,
        month_name(event.month)
    );

    let confirmation = message(
        first_id,
        AGENDA_SENDER,
        format!("Confirmación de Cancelación: {}", event.title),
        format!("Se ha enviado la notificación de cancelación a {}...", guest),
        format!(
            "Hola,\n\nSe ha eliminado el evento \"{}\" y se ha enviado un correo de cancelación a {}.\n\nSaludos,\nSistema",
            event.title, guest
        ),
        EmailFolder::Inbox,
    );
    let sent = message(
        first_id + 1,
        SELF_SENDER,
        format!("Cancelación: {}", event.title),
        format!(
            "Lamentamos informarle que el evento {} ha sido cancelado...",
            event.title
        ),
        body.clone(),
        EmailFolder::Sent,
    );
    let params = DispatchParams {
        to_email: guest.to_string(),
        subject: format!("CANCELACIÓN: {}", event.title),
        message: body,
        from_name: EVENTS_SENDER.to_string(),
    };

    (vec![confirmation, sent], params)
}

/// Sent-folder copy of a composed message
pub fn sent_copy(id: i64, subject: &str, body: &str, attachments: Vec<Attachment>) -> EmailMessage {
    let mut copy = message(
        id,
        SELF_SENDER,
        subject.trim().to_string(),
        sheet_sync::mapping::preview_of(body),
        body.to_string(),
        EmailFolder::Sent,
    );
    copy.attachments = attachments;
    copy
}
