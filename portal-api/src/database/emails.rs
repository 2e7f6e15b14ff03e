use shared_types::{EmailFilter, EmailFolder, EmailMessage, ListEmailsRequest};

use super::seeds;
use super::store::{self, KeyValueStore, StoreError, StoredCollection};

impl StoredCollection for EmailMessage {
    const KEY: &'static str = store::EMAILS;

    fn seed() -> Vec<Self> {
        seeds::emails()
    }
}

fn in_folder(email: &EmailMessage, folder: EmailFolder) -> bool {
    match folder {
        EmailFolder::Inbox => email.folder == EmailFolder::Inbox && !email.deleted,
        EmailFolder::Sent => email.folder == EmailFolder::Sent && !email.deleted,
        EmailFolder::Trash => email.deleted || email.folder == EmailFolder::Trash,
    }
}

/// Messages of one folder, narrowed by read/star filter and free-text search.
/// Keeps stored order, which is newest first.
pub fn filter_emails(emails: &[EmailMessage], request: &ListEmailsRequest) -> Vec<EmailMessage> {
    let folder = request.folder.unwrap_or_default();
    let filter = request.filter.unwrap_or_default();
    let search = request
        .search
        .as_deref()
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty());

    emails
        .iter()
        .filter(|e| in_folder(e, folder))
        .filter(|e| match filter {
            EmailFilter::All => true,
            EmailFilter::Unread => !e.read,
            EmailFilter::Starred => e.starred,
        })
        .filter(|e| match &search {
            Some(term) => {
                e.sender.to_lowercase().contains(term)
                    || e.subject.to_lowercase().contains(term)
                    || e.preview.to_lowercase().contains(term)
            }
            None => true,
        })
        .cloned()
        .collect()
}

pub fn count_unread_inbox(emails: &[EmailMessage]) -> usize {
    emails.iter().filter(|e| e.is_unread_inbox()).count()
}

pub async fn load_emails(store: &dyn KeyValueStore) -> Result<Vec<EmailMessage>, StoreError> {
    Ok(store::load_collection::<EmailMessage>(store).await?.items)
}

/// Returns the message and marks it read
pub async fn open_email(
    store: &dyn KeyValueStore,
    id: i64,
) -> Result<Option<EmailMessage>, StoreError> {
    store::update_collection::<EmailMessage, _, _>(store, |emails| {
        let email = emails.iter_mut().find(|e| e.id == id)?;
        email.read = true;
        Some(email.clone())
    })
    .await
}

pub async fn toggle_star(
    store: &dyn KeyValueStore,
    id: i64,
) -> Result<Option<EmailMessage>, StoreError> {
    store::update_collection::<EmailMessage, _, _>(store, |emails| {
        let email = emails.iter_mut().find(|e| e.id == id)?;
        email.starred = !email.starred;
        Some(email.clone())
    })
    .await
}

/// Soft delete: the message moves to the trash and stays in storage
pub async fn move_to_trash(
    store: &dyn KeyValueStore,
    id: i64,
) -> Result<Option<EmailMessage>, StoreError> {
    store::update_collection::<EmailMessage, _, _>(store, |emails| {
        let email = emails.iter_mut().find(|e| e.id == id)?;
        email.deleted = true;
        email.folder = EmailFolder::Trash;
        Some(email.clone())
    })
    .await
}

pub async fn restore_email(
    store: &dyn KeyValueStore,
    id: i64,
) -> Result<Option<EmailMessage>, StoreError> {
    store::update_collection::<EmailMessage, _, _>(store, |emails| {
        let email = emails.iter_mut().find(|e| e.id == id && e.deleted)?;
        email.deleted = false;
        email.folder = EmailFolder::Inbox;
        Some(email.clone())
    })
    .await
}

/// Prepends messages built by `build`, which receives the first free id.
/// Ids handed out are consecutive from that value.
pub async fn prepend_emails<F>(
    store: &dyn KeyValueStore,
    now_ms: i64,
    build: F,
) -> Result<Vec<EmailMessage>, StoreError>
where
    F: Fn(i64) -> Vec<EmailMessage> + Send + Sync,
{
    store::update_collection::<EmailMessage, _, _>(store, |emails| {
        let first_id = store::next_id(emails.iter().map(|e| e.id), now_ms);
        let new_emails = build(first_id);
        let mut merged = new_emails.clone();
        merged.append(emails);
        *emails = merged;
        new_emails
    })
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::MemoryStore;

    fn sent(id: i64, subject: &str) -> EmailMessage {
        EmailMessage {
            id,
            sender: "Yo".to_string(),
            subject: subject.to_string(),
            preview: String::new(),
            body: None,
            date: "Ahora".to_string(),
            starred: false,
            read: true,
            label: None,
            deleted: false,
            folder: EmailFolder::Sent,
            attachments: Vec::new(),
        }
    }

    #[tokio::test]
    async fn test_seeded_inbox_and_filters() {
        let store = MemoryStore::new();
        let emails = load_emails(&store).await.unwrap();

        let inbox = filter_emails(&emails, &ListEmailsRequest::default());
        assert_eq!(inbox.len(), 5);

        let unread = filter_emails(
            &emails,
            &ListEmailsRequest {
                filter: Some(EmailFilter::Unread),
                ..ListEmailsRequest::default()
            },
        );
        assert_eq!(unread.len(), 1);

        let starred = filter_emails(
            &emails,
            &ListEmailsRequest {
                filter: Some(EmailFilter::Starred),
                ..ListEmailsRequest::default()
            },
        );
        assert_eq!(starred.len(), 2);

        let searched = filter_emails(
            &emails,
            &ListEmailsRequest {
                search: Some("donaciones".to_string()),
                ..ListEmailsRequest::default()
            },
        );
        assert_eq!(searched.len(), 1);
        assert_eq!(searched[0].id, 3);
    }

    #[tokio::test]
    async fn test_open_marks_read() {
        let store = MemoryStore::new();
        assert_eq!(count_unread_inbox(&load_emails(&store).await.unwrap()), 1);

        let opened = open_email(&store, 1).await.unwrap().unwrap();
        assert!(opened.read);
        assert_eq!(count_unread_inbox(&load_emails(&store).await.unwrap()), 0);

        assert!(open_email(&store, 404).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_trash_and_restore() {
        let store = MemoryStore::new();

        let trashed = move_to_trash(&store, 2).await.unwrap().unwrap();
        assert!(trashed.deleted);

        let emails = load_emails(&store).await.unwrap();
        assert_eq!(emails.len(), 5);
        let trash = filter_emails(
            &emails,
            &ListEmailsRequest {
                folder: Some(EmailFolder::Trash),
                ..ListEmailsRequest::default()
            },
        );
        assert_eq!(trash.len(), 1);
        assert_eq!(filter_emails(&emails, &ListEmailsRequest::default()).len(), 4);

        let restored = restore_email(&store, 2).await.unwrap().unwrap();
        assert!(!restored.deleted);
        assert_eq!(restored.folder, EmailFolder::Inbox);
        assert!(restore_email(&store, 2).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_prepend_assigns_consecutive_ids() {
        let store = MemoryStore::new();
        let now_ms = 1_700_000_000_000;

        let created = prepend_emails(&store, now_ms, |first_id| {
            vec![sent(first_id, "uno"), sent(first_id + 1, "dos")]
        })
        .await
        .unwrap();

        assert_eq!(created[0].id, now_ms);
        assert_eq!(created[1].id, now_ms + 1);

        let emails = load_emails(&store).await.unwrap();
        assert_eq!(emails.len(), 7);
        assert_eq!(emails[0].subject, "uno");

        let sent_folder = filter_emails(
            &emails,
            &ListEmailsRequest {
                folder: Some(EmailFolder::Sent),
                ..ListEmailsRequest::default()
            },
        );
        assert_eq!(sent_folder.len(), 2);
    }
}
