use serde::{Deserialize, Serialize};
use std::str::FromStr;
use ts_rs::TS;

use crate::ParseLabelError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum EmailFolder {
    #[default]
    Inbox,
    Sent,
    Trash,
}

impl FromStr for EmailFolder {
    type Err = ParseLabelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "inbox" | "entrada" | "" => Ok(EmailFolder::Inbox),
            "sent" | "enviados" => Ok(EmailFolder::Sent),
            "trash" | "papelera" => Ok(EmailFolder::Trash),
            _ => Err(ParseLabelError::new("folder", s)),
        }
    }
}

/// Descriptive attachment metadata. No binary content is stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Attachment {
    pub name: String,
    pub size: String,
    #[serde(rename = "type")]
    pub kind: String,
}

/// A message in the internal mailbox
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct EmailMessage {
    pub id: i64,
    pub sender: String,
    pub subject: String,
    pub preview: String,
    pub body: Option<String>,
    /// Free text ("10:30 AM", "Ayer"); never parsed
    pub date: String,
    #[serde(default)]
    pub starred: bool,
    #[serde(default)]
    pub read: bool,
    pub label: Option<String>,
    #[serde(default)]
    pub deleted: bool,
    #[serde(default)]
    pub folder: EmailFolder,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
}

impl EmailMessage {
    pub fn is_unread_inbox(&self) -> bool {
        self.folder == EmailFolder::Inbox && !self.deleted && !self.read
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum EmailFilter {
    #[default]
    All,
    Unread,
    Starred,
}

/// Request to list emails
#[derive(Debug, Default, Deserialize, TS)]
#[ts(export)]
pub struct ListEmailsRequest {
    pub folder: Option<EmailFolder>,
    pub filter: Option<EmailFilter>,
    pub search: Option<String>,
}

/// Response for email list
#[derive(Debug, Serialize, TS)]
#[ts(export)]
pub struct ListEmailsResponse {
    pub emails: Vec<EmailMessage>,
    pub total_count: usize,
    pub unread_count: usize,
}

#[derive(Debug, Deserialize, TS)]
#[ts(export)]
pub struct SendEmailRequest {
    pub to: String,
    pub subject: String,
    pub message: String,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
}
