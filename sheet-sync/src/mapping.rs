use chrono::{DateTime, Datelike, Utc};
use serde_json::{json, Map, Value};
use shared_types::{
    Alliance, AllianceChannel, AllianceStatus, CalendarEvent, EmailFolder, EmailMessage,
    UserAccount, UserRole, DEFAULT_EVENT_COLOR,
};

use crate::csv_parser::SheetRow;

pub const UNKNOWN_COMPANY: &str = "Empresa Desconocida";
pub const DEFAULT_TAX_ID: &str = "00000000000";
pub const UNKNOWN_CONTACT: &str = "Sin Contacto";
pub const NO_SUBJECT: &str = "Sin Asunto";
pub const UNKNOWN_SENDER: &str = "Remitente Desconocido";
pub const NO_CONTENT: &str = "Sin contenido";
pub const NO_TITLE: &str = "Sin Título";

/// Fallback ids for sheet rows without one start here, above seeded ids
pub const SHEET_FALLBACK_ID_BASE: i64 = 2_000_000;

const PREVIEW_CHARS: usize = 50;

/// A record that can be read from, and mirrored back to, a published sheet.
pub trait SheetRecord: Sized {
    /// Builds a record from a data row. `index` is the row position and
    /// feeds fallback ids; rows that cannot form a record yield `None`.
    fn from_row(row: &SheetRow, index: usize, now: DateTime<Utc>) -> Option<Self>;

    /// Column-keyed object posted to the sheet webhook
    fn to_sheet_payload(&self) -> Map<String, Value>;
}

/// First non-empty value among the given header aliases
pub fn field<'a>(row: &'a SheetRow, names: &[&str]) -> Option<&'a str> {
    names
        .iter()
        .filter_map(|name| row.get(*name))
        .map(|value| value.trim())
        .find(|value| !value.is_empty())
}

fn text(row: &SheetRow, names: &[&str], default: &str) -> String {
    field(row, names).unwrap_or(default).to_string()
}

fn optional(row: &SheetRow, names: &[&str]) -> Option<String> {
    field(row, names).map(str::to_string)
}

fn flag(row: &SheetRow, names: &[&str]) -> bool {
    field(row, names).is_some_and(|value| value.eq_ignore_ascii_case("true"))
}

fn parse_id(row: &SheetRow) -> Option<i64> {
    field(row, &["id"]).and_then(|value| value.parse::<i64>().ok())
}

/// Strips everything but ASCII digits
pub fn sanitize_tax_id(raw: &str) -> String {
    raw.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// First 50 characters followed by an ellipsis
pub fn preview_of(body: &str) -> String {
    let mut preview: String = body.chars().take(PREVIEW_CHARS).collect();
    preview.push_str("...");
    preview
}

impl SheetRecord for Alliance {
    fn from_row(row: &SheetRow, index: usize, now: DateTime<Utc>) -> Option<Self> {
        let tax_id = field(row, &["ruc", "tax_id"])
            .map(sanitize_tax_id)
            .filter(|digits| !digits.is_empty())
            .unwrap_or_else(|| DEFAULT_TAX_ID.to_string());

        let channel = field(row, &["canal", "channel"])
            .and_then(|value| value.parse().ok())
            .unwrap_or(AllianceChannel::Email);

        let status = field(row, &["estado", "status"])
            .and_then(|value| value.parse().ok())
            .unwrap_or(AllianceStatus::New);

        Some(Alliance {
            id: parse_id(row).unwrap_or_else(|| now.timestamp_millis() - index as i64),
            company: text(row, &["empresa", "company"], UNKNOWN_COMPANY),
            tax_id,
            contact_name: text(row, &["contacto", "contact", "contact_name"], UNKNOWN_CONTACT),
            contact_email: optional(row, &["contacto_email", "contact_email"]),
            contact_phone: optional(row, &["contacto_telefono", "contact_phone"]),
            document_url: optional(row, &["documento_url", "document_url"]),
            channel,
            status,
            first_contact: field(row, &["primer_contacto", "fecha", "first_contact"])
                .map(str::to_string)
                .unwrap_or_else(|| now.format("%Y-%m-%d").to_string()),
            subject: text(row, &["asunto", "subject"], NO_SUBJECT),
            deleted: flag(row, &["eliminado", "deleted"]),
            updated_at: Some(
                field(row, &["ultima_actualizacion", "updated_at"])
                    .map(str::to_string)
                    .unwrap_or_else(|| now.to_rfc3339()),
            ),
        })
    }

    fn to_sheet_payload(&self) -> Map<String, Value> {
        let value = json!({
            "id": self.id,
            "empresa": self.company,
            "ruc": self.tax_id,
            "contacto": self.contact_name,
            "contacto_email": self.contact_email.clone().unwrap_or_default(),
            "contacto_telefono": self.contact_phone.clone().unwrap_or_default(),
            "documento_url": self.document_url.clone().unwrap_or_default(),
            "canal": self.channel.as_str(),
            "estado": self.status.sheet_label(),
            "primer_contacto": self.first_contact,
            "asunto": self.subject,
            "eliminado": self.deleted,
            "ultima_actualizacion": self.updated_at.clone().unwrap_or_default(),
        });
        into_map(value)
    }
}

impl SheetRecord for CalendarEvent {
    fn from_row(row: &SheetRow, index: usize, now: DateTime<Utc>) -> Option<Self> {
        let day = field(row, &["day", "dia", "día"])?.parse::<u32>().ok()?;
        let month = match field(row, &["month", "mes"]) {
            Some(value) => value.parse::<u32>().ok()?,
            None => now.month(),
        };
        let year = match field(row, &["year", "anio", "año"]) {
            Some(value) => value.parse::<i32>().ok()?,
            None => now.year(),
        };

        if !(1..=31).contains(&day) || !(1..=12).contains(&month) {
            return None;
        }

        Some(CalendarEvent {
            id: parse_id(row).unwrap_or(SHEET_FALLBACK_ID_BASE + index as i64),
            day,
            month,
            year,
            title: text(row, &["title", "titulo", "título"], NO_TITLE),
            time: text(row, &["time", "hora"], ""),
            location: optional(row, &["location", "lugar"]),
            color: text(row, &["color"], DEFAULT_EVENT_COLOR),
            guest_email: optional(row, &["guest_email", "guestemail", "invitado"]),
            meeting_link: optional(row, &["meeting_link", "link", "meet"]),
        })
    }

    fn to_sheet_payload(&self) -> Map<String, Value> {
        let value = json!({
            "id": self.id,
            "day": self.day,
            "month": self.month,
            "year": self.year,
            "title": self.title,
            "time": self.time,
            "location": self.location.clone().unwrap_or_default(),
            "color": self.color,
            "guest_email": self.guest_email.clone().unwrap_or_default(),
            "meeting_link": self.meeting_link.clone().unwrap_or_default(),
        });
        into_map(value)
    }
}

impl SheetRecord for EmailMessage {
    fn from_row(row: &SheetRow, index: usize, _now: DateTime<Utc>) -> Option<Self> {
        let body = optional(row, &["body", "contenido", "text"]);
        let preview = match field(row, &["preview"]) {
            Some(preview) => preview.to_string(),
            None => body
                .as_deref()
                .map(preview_of)
                .unwrap_or_else(|| NO_CONTENT.to_string()),
        };
        let body = body.or_else(|| optional(row, &["preview"])).unwrap_or_default();

        let folder = field(row, &["folder", "carpeta"])
            .and_then(|value| value.parse().ok())
            .unwrap_or(EmailFolder::Inbox);

        Some(EmailMessage {
            id: parse_id(row).unwrap_or(SHEET_FALLBACK_ID_BASE + index as i64),
            sender: text(row, &["sender", "remitente", "from"], UNKNOWN_SENDER),
            subject: text(row, &["subject", "asunto"], NO_SUBJECT),
            preview,
            body: Some(body),
            date: text(row, &["date", "fecha"], "Ahora"),
            starred: flag(row, &["starred", "destacado"]),
            read: flag(row, &["read", "leido", "leído"]),
            label: Some(text(row, &["label", "etiqueta"], "Nuevo")),
            deleted: flag(row, &["deleted", "eliminado"]),
            folder,
            attachments: Vec::new(),
        })
    }

    fn to_sheet_payload(&self) -> Map<String, Value> {
        let folder = match self.folder {
            EmailFolder::Inbox => "inbox",
            EmailFolder::Sent => "sent",
            EmailFolder::Trash => "trash",
        };
        let value = json!({
            "id": self.id,
            "sender": self.sender,
            "subject": self.subject,
            "preview": self.preview,
            "body": self.body.clone().unwrap_or_default(),
            "date": self.date,
            "starred": self.starred,
            "read": self.read,
            "label": self.label.clone().unwrap_or_default(),
            "deleted": self.deleted,
            "folder": folder,
        });
        into_map(value)
    }
}

impl SheetRecord for UserAccount {
    fn from_row(row: &SheetRow, index: usize, _now: DateTime<Utc>) -> Option<Self> {
        let email = field(row, &["email", "correo"])?.to_string();
        let role = field(row, &["role", "rol"])
            .and_then(|value| value.parse().ok())
            .unwrap_or(UserRole::User);

        Some(UserAccount {
            id: parse_id(row).unwrap_or(index as i64),
            name: text(row, &["name", "nombre"], &email),
            email,
            password: optional(row, &["password", "contraseña"]),
            role,
        })
    }

    /// The sheet script looks users up by email, so it doubles as the id
    fn to_sheet_payload(&self) -> Map<String, Value> {
        let value = json!({
            "id": self.email,
            "email": self.email,
            "password": self.password.clone().unwrap_or_default(),
            "name": self.name,
            "role": self.role.as_str(),
        });
        into_map(value)
    }
}

fn into_map(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

/// Maps every row, skipping those that cannot form a record
pub fn map_rows<T: SheetRecord>(rows: &[SheetRow], now: DateTime<Utc>) -> Vec<T> {
    rows.iter()
        .enumerate()
        .filter_map(|(index, row)| T::from_row(row, index, now))
        .collect()
}
