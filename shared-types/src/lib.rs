use serde::{Deserialize, Serialize};

pub mod alliance;
pub mod dashboard;
pub mod email;
pub mod event;
pub mod notice;
pub mod notification;
pub mod settings;
pub mod sync;
pub mod user;
pub mod volunteer;

pub use alliance::{
    Alliance, AllianceChannel, AllianceStats, AllianceStatus, AlliancesResponse,
    CreateAllianceRequest, ListAlliancesRequest, UpdateAllianceRequest,
};
pub use dashboard::DashboardStats;
pub use email::{
    Attachment, EmailFilter, EmailFolder, EmailMessage, ListEmailsRequest, ListEmailsResponse,
    SendEmailRequest,
};
pub use event::{
    CalendarEvent, CreateEventRequest, EventsResponse, ListEventsRequest, DEFAULT_EVENT_COLOR,
};
pub use notice::{MutationResponse, Notice, NoticeLevel};
pub use notification::{Notification, NotificationKind, NotificationsResponse};
pub use settings::{EmailRelaySettings, EmailRelaySettingsResponse, UpdateEmailRelayRequest};
pub use sync::{
    FlushReport, OutboxEntry, OutboxResponse, OutboxStatus, SyncAction, SyncCollection,
    SyncReport,
};
pub use user::{
    CreateUserRequest, ListUsersRequest, LoginRequest, SessionResponse, SessionUser,
    SignupRequest, UpdateProfileRequest, UpdateUserRequest, UserAccount, UserRole, UserView,
    UsersResponse,
};
pub use volunteer::{
    CreateVolunteerRequest, ListVolunteersRequest, UpdateVolunteerRequest, Volunteer,
    VolunteerStatus, VolunteersResponse,
};

/// Error response for API endpoints
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// A label from a sheet cell or request did not match any known variant
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown {kind} value: {value}")]
pub struct ParseLabelError {
    pub kind: &'static str,
    pub value: String,
}

impl ParseLabelError {
    pub fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}
