use serde::{Deserialize, Serialize};
use std::str::FromStr;
use ts_rs::TS;

use crate::ParseLabelError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum VolunteerStatus {
    #[default]
    Active,
    Inactive,
    #[serde(rename = "On Leave")]
    OnLeave,
}

impl VolunteerStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            VolunteerStatus::Active => "Active",
            VolunteerStatus::Inactive => "Inactive",
            VolunteerStatus::OnLeave => "On Leave",
        }
    }
}

impl FromStr for VolunteerStatus {
    type Err = ParseLabelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "active" | "activo" => Ok(VolunteerStatus::Active),
            "inactive" | "inactivo" => Ok(VolunteerStatus::Inactive),
            "on leave" | "de vacaciones" => Ok(VolunteerStatus::OnLeave),
            _ => Err(ParseLabelError::new("volunteer status", s)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Volunteer {
    pub id: i64,
    pub name: String,
    pub role: String,
    pub status: VolunteerStatus,
    pub email: String,
    pub join_date: String, // YYYY-MM-DD
}

#[derive(Debug, Deserialize, TS)]
#[ts(export)]
pub struct CreateVolunteerRequest {
    pub name: String,
    pub role: String,
    pub email: String,
    pub status: Option<VolunteerStatus>,
}

#[derive(Debug, Default, Deserialize, TS)]
#[ts(export)]
pub struct UpdateVolunteerRequest {
    pub name: Option<String>,
    pub role: Option<String>,
    pub email: Option<String>,
    pub status: Option<VolunteerStatus>,
}

#[derive(Debug, Default, Deserialize, TS)]
#[ts(export)]
pub struct ListVolunteersRequest {
    pub search: Option<String>,
}

#[derive(Debug, Serialize, TS)]
#[ts(export)]
pub struct VolunteersResponse {
    pub volunteers: Vec<Volunteer>,
}
