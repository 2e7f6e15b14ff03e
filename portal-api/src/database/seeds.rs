//! Starting data for an empty store.

use chrono::{DateTime, Datelike, Utc};
use shared_types::{
    Attachment, CalendarEvent, EmailFolder, EmailMessage, Volunteer, VolunteerStatus,
};

fn inbox(
    id: i64,
    sender: &str,
    subject: &str,
    preview: &str,
    body: &str,
    date: &str,
) -> EmailMessage {
    EmailMessage {
        id,
        sender: sender.to_string(),
        subject: subject.to_string(),
        preview: preview.to_string(),
        body: Some(body.to_string()),
        date: date.to_string(),
        starred: false,
        read: true,
        label: None,
        deleted: false,
        folder: EmailFolder::Inbox,
        attachments: Vec::new(),
    }
}

pub fn emails() -> Vec<EmailMessage> {
    vec![
        EmailMessage {
            starred: true,
            read: false,
            label: Some("Importante".to_string()),
            attachments: vec![Attachment {
                name: "Horarios_Oct.pdf".to_string(),
                size: "1.2 MB".to_string(),
                kind: "pdf".to_string(),
            }],
            ..inbox(
                1,
                "Voluntariado Aniquem",
                "Horarios Octubre",
                "Hola equipo, adjunto los horarios para el mes de octubre...",
                "Hola equipo,\n\nAdjunto los horarios para el mes de octubre. Por favor revisar sus turnos y confirmar asistencia antes del viernes.\n\nSaludos,\nCoordinación de Voluntariado",
                "10:30 AM",
            )
        },
        inbox(
            2,
            "Recursos Humanos",
            "Bienvenida nuevos miembros",
            "Demos la bienvenida a los nuevos voluntarios de psicología...",
            "Estimados todos,\n\nDemos la bienvenida a los nuevos voluntarios de psicología que se unen a nosotros esta semana. Estamos muy emocionados de contar con su apoyo.\n\nAtentamente,\nRRHH",
            "Ayer",
        ),
        inbox(
            3,
            "Donaciones",
            "Reporte Mensual",
            "El reporte de donaciones de septiembre ya está disponible en el drive...",
            "Hola,\n\nEl reporte de donaciones de septiembre ya está disponible en el drive compartido. Tuvimos un incremento del 15% respecto al mes anterior.\n\nSaludos.",
            "2 Oct",
        ),
        EmailMessage {
            label: Some("Sistema".to_string()),
            ..inbox(
                4,
                "Soporte TI",
                "Mantenimiento programado",
                "El sistema estará en mantenimiento este sábado de 2am a 4am...",
                "El sistema estará en mantenimiento este sábado de 2am a 4am para realizar actualizaciones de seguridad. Disculpen las molestias.",
                "1 Oct",
            )
        },
        EmailMessage {
            starred: true,
            ..inbox(
                5,
                "Juan Perez",
                "Consulta sobre paciente",
                "Estimados, tengo una consulta sobre el paciente del caso 402...",
                "Estimados,\n\nTengo una consulta sobre el paciente del caso 402. Necesito verificar si ya se le programó la cita de seguimiento.\n\nGracias,\nJuan",
                "28 Sep",
            )
        },
    ]
}

/// Three events in the month of `now`
pub fn events(now: DateTime<Utc>) -> Vec<CalendarEvent> {
    let event = |id: i64, day: u32, title: &str, time: &str, location: Option<&str>, color: &str| {
        CalendarEvent {
            id,
            day,
            month: now.month(),
            year: now.year(),
            title: title.to_string(),
            time: time.to_string(),
            location: location.map(str::to_string),
            color: color.to_string(),
            guest_email: None,
            meeting_link: None,
        }
    };

    vec![
        event(1, 5, "Reunión Staff", "10:00 AM", None, "blue"),
        event(2, 12, "Campaña Salud", "08:00 AM", Some("Sede Central"), "red"),
        event(3, 15, "Entrega Donaciones", "03:00 PM", None, "green"),
    ]
}

pub fn volunteers() -> Vec<Volunteer> {
    let volunteer = |id: i64, name: &str, role: &str, status, email: &str, join_date: &str| {
        Volunteer {
            id,
            name: name.to_string(),
            role: role.to_string(),
            status,
            email: email.to_string(),
            join_date: join_date.to_string(),
        }
    };

    vec![
        volunteer(1, "Maria Garcia", "Psicóloga", VolunteerStatus::Active, "maria.g@example.com", "2023-01-15"),
        volunteer(2, "Juan Perez", "Logística", VolunteerStatus::Active, "juan.p@example.com", "2023-03-20"),
        volunteer(3, "Ana Lopez", "Enfermera", VolunteerStatus::Inactive, "ana.l@example.com", "2022-11-05"),
        volunteer(4, "Carlos Diaz", "Conductor", VolunteerStatus::Active, "carlos.d@example.com", "2023-06-10"),
        volunteer(5, "Lucia Minguez", "Trabajadora Social", VolunteerStatus::OnLeave, "lucia.m@example.com", "2021-08-22"),
    ]
}
