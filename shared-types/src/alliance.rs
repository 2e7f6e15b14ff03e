use serde::{Deserialize, Serialize};
use std::str::FromStr;
use ts_rs::TS;

use crate::ParseLabelError;

/// Channel through which a prospective partner was first reached
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum AllianceChannel {
    Whatsapp,
    #[default]
    Email,
}

impl AllianceChannel {
    pub fn as_str(&self) -> &'static str {
        match self {
            AllianceChannel::Whatsapp => "whatsapp",
            AllianceChannel::Email => "email",
        }
    }
}

impl FromStr for AllianceChannel {
    type Err = ParseLabelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "whatsapp" => Ok(AllianceChannel::Whatsapp),
            "email" | "correo" => Ok(AllianceChannel::Email),
            _ => Err(ParseLabelError::new("channel", s)),
        }
    }
}

/// Pipeline stage: New -> Contacted -> Negotiating -> Closed / Discarded
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum AllianceStatus {
    #[default]
    New,
    Contacted,
    Negotiating,
    Closed,
    Discarded,
}

impl AllianceStatus {
    /// Label written to the shared spreadsheet
    pub fn sheet_label(&self) -> &'static str {
        match self {
            AllianceStatus::New => "Nuevo",
            AllianceStatus::Contacted => "Contactado",
            AllianceStatus::Negotiating => "En Negociación",
            AllianceStatus::Closed => "Cerrado",
            AllianceStatus::Discarded => "Descartado",
        }
    }
}

impl FromStr for AllianceStatus {
    type Err = ParseLabelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "new" | "nuevo" => Ok(AllianceStatus::New),
            "contacted" | "contactado" => Ok(AllianceStatus::Contacted),
            "negotiating" | "en negociación" | "en negociacion" => {
                Ok(AllianceStatus::Negotiating)
            }
            "closed" | "cerrado" => Ok(AllianceStatus::Closed),
            "discarded" | "descartado" => Ok(AllianceStatus::Discarded),
            _ => Err(ParseLabelError::new("status", s)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Alliance {
    pub id: i64, // millisecond timestamp for locally created records
    pub company: String,
    pub tax_id: String,
    pub contact_name: String,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
    pub document_url: Option<String>,
    pub channel: AllianceChannel,
    pub status: AllianceStatus,
    pub first_contact: String, // YYYY-MM-DD
    pub subject: String,
    #[serde(default)]
    pub deleted: bool,
    pub updated_at: Option<String>, // RFC 3339
}

#[derive(Debug, Deserialize, TS)]
#[ts(export)]
pub struct CreateAllianceRequest {
    pub company: String,
    pub tax_id: String,
    pub contact_name: String,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
    pub document_url: Option<String>,
    pub channel: Option<AllianceChannel>,
    pub subject: String,
}

#[derive(Debug, Default, Deserialize, TS)]
#[ts(export)]
pub struct UpdateAllianceRequest {
    pub company: Option<String>,
    pub tax_id: Option<String>,
    pub contact_name: Option<String>,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
    pub document_url: Option<String>,
    pub channel: Option<AllianceChannel>,
    pub status: Option<AllianceStatus>,
    pub subject: Option<String>,
}

#[derive(Debug, Default, Deserialize, TS)]
#[ts(export)]
pub struct ListAlliancesRequest {
    pub search: Option<String>,
    pub include_deleted: Option<bool>,
}

#[derive(Debug, Serialize, TS)]
#[ts(export)]
pub struct AlliancesResponse {
    pub alliances: Vec<Alliance>,
}

/// Counters shown above the alliance list
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct AllianceStats {
    pub total: usize,
    pub new: usize,
    pub negotiating: usize,
    pub closed: usize,
}
