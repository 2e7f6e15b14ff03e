//! Bell panel entries, rebuilt from the mailbox and calendar on every call.

use anyhow::Result;
use shared_types::{CalendarEvent, EmailMessage, Notification, NotificationKind};

use crate::database::emails as emails_db;
use crate::database::events as events_db;
use crate::database::KeyValueStore;

const MAX_EMAIL_NOTIFICATIONS: usize = 3;
const MAX_EVENT_NOTIFICATIONS: usize = 2;

/// Welcome entry first, then unread inbox mail, then events, in source order
pub fn compose(emails: &[EmailMessage], events: &[CalendarEvent]) -> Vec<Notification> {
    let mut notifications = vec![Notification {
        id: 1,
        title: "Bienvenido al Portal".to_string(),
        message: "Has iniciado sesión correctamente.".to_string(),
        time: "Ahora".to_string(),
        kind: NotificationKind::System,
        read: false,
    }];

    notifications.extend(
        emails
            .iter()
            .filter(|e| e.is_unread_inbox())
            .take(MAX_EMAIL_NOTIFICATIONS)
            .map(|e| Notification {
                id: e.id,
                title: "Nuevo Correo".to_string(),
                message: format!("De {}: {}", e.sender, e.subject),
                time: e.date.clone(),
                kind: NotificationKind::Email,
                read: false,
            }),
    );

    notifications.extend(events.iter().take(MAX_EVENT_NOTIFICATIONS).map(|e| Notification {
        id: e.id,
        title: "Evento Próximo".to_string(),
        message: format!("{} - {}", e.title, e.time),
        time: "Hoy".to_string(),
        kind: NotificationKind::Event,
        read: false,
    }));

    notifications
}

pub async fn aggregate(store: &dyn KeyValueStore) -> Result<Vec<Notification>> {
    let emails = emails_db::load_emails(store).await?;
    let events = events_db::load_events(store).await?;
    Ok(compose(&emails, &events))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::{seeds, MemoryStore};
    use chrono::Utc;
    use shared_types::EmailFolder;

    #[test]
    fn test_order_and_limits() {
        let mut emails = seeds::emails();
        for email in emails.iter_mut() {
            email.read = false;
        }
        let events = seeds::events(Utc::now());

        let notifications = compose(&emails, &events);
        let kinds: Vec<NotificationKind> = notifications.iter().map(|n| n.kind).collect();

        assert_eq!(
            kinds,
            vec![
                NotificationKind::System,
                NotificationKind::Email,
                NotificationKind::Email,
                NotificationKind::Email,
                NotificationKind::Event,
                NotificationKind::Event,
            ]
        );
        assert_eq!(notifications[1].id, emails[0].id);
        assert!(notifications[1].message.starts_with("De "));
    }

    #[test]
    fn test_only_unread_inbox_mail_counts() {
        let mut emails = seeds::emails();
        for email in emails.iter_mut() {
            email.read = true;
        }
        emails[0].read = false;
        emails[0].folder = EmailFolder::Sent;
        emails[1].read = false;
        emails[1].deleted = true;

        let notifications = compose(&emails, &[]);
        assert_eq!(notifications.len(), 1);
        assert_eq!(notifications[0].kind, NotificationKind::System);
    }

    #[tokio::test]
    async fn test_aggregate_reads_seeds() {
        let store = MemoryStore::new();
        let notifications = aggregate(&store).await.unwrap();

        let unread = seeds::emails().iter().filter(|e| e.is_unread_inbox()).count();
        assert_eq!(notifications.len(), 1 + unread.min(3) + 2);
    }
}
