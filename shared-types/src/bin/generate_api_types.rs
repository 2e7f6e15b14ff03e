use shared_types::*;
use std::fs;
use std::path::Path;
use ts_rs::TS;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Generate TypeScript definitions for API types
    let mut types = Vec::new();

    // Shared
    types.push(clean_type(Notice::export_to_string()?));
    types.push(clean_type(NoticeLevel::export_to_string()?));

    // Alliance types
    types.push(clean_type(Alliance::export_to_string()?));
    types.push(clean_type(AllianceChannel::export_to_string()?));
    types.push(clean_type(AllianceStatus::export_to_string()?));
    types.push(clean_type(AllianceStats::export_to_string()?));
    types.push(clean_type(CreateAllianceRequest::export_to_string()?));
    types.push(clean_type(UpdateAllianceRequest::export_to_string()?));
    types.push(clean_type(ListAlliancesRequest::export_to_string()?));
    types.push(clean_type(AlliancesResponse::export_to_string()?));

    // Email types
    types.push(clean_type(EmailMessage::export_to_string()?));
    types.push(clean_type(EmailFolder::export_to_string()?));
    types.push(clean_type(EmailFilter::export_to_string()?));
    types.push(clean_type(Attachment::export_to_string()?));
    types.push(clean_type(ListEmailsRequest::export_to_string()?));
    types.push(clean_type(ListEmailsResponse::export_to_string()?));
    types.push(clean_type(SendEmailRequest::export_to_string()?));

    // Calendar types
    types.push(clean_type(CalendarEvent::export_to_string()?));
    types.push(clean_type(CreateEventRequest::export_to_string()?));
    types.push(clean_type(ListEventsRequest::export_to_string()?));
    types.push(clean_type(EventsResponse::export_to_string()?));

    // Volunteer types
    types.push(clean_type(Volunteer::export_to_string()?));
    types.push(clean_type(VolunteerStatus::export_to_string()?));
    types.push(clean_type(CreateVolunteerRequest::export_to_string()?));
    types.push(clean_type(UpdateVolunteerRequest::export_to_string()?));
    types.push(clean_type(ListVolunteersRequest::export_to_string()?));
    types.push(clean_type(VolunteersResponse::export_to_string()?));

    // User and session types
    types.push(clean_type(UserRole::export_to_string()?));
    types.push(clean_type(UserView::export_to_string()?));
    types.push(clean_type(CreateUserRequest::export_to_string()?));
    types.push(clean_type(UpdateUserRequest::export_to_string()?));
    types.push(clean_type(ListUsersRequest::export_to_string()?));
    types.push(clean_type(UsersResponse::export_to_string()?));
    types.push(clean_type(SessionUser::export_to_string()?));
    types.push(clean_type(LoginRequest::export_to_string()?));
    types.push(clean_type(SignupRequest::export_to_string()?));
    types.push(clean_type(SessionResponse::export_to_string()?));
    types.push(clean_type(UpdateProfileRequest::export_to_string()?));

    // Notifications and dashboard
    types.push(clean_type(Notification::export_to_string()?));
    types.push(clean_type(NotificationKind::export_to_string()?));
    types.push(clean_type(NotificationsResponse::export_to_string()?));
    types.push(clean_type(DashboardStats::export_to_string()?));

    // Settings types
    types.push(clean_type(EmailRelaySettings::export_to_string()?));
    types.push(clean_type(EmailRelaySettingsResponse::export_to_string()?));
    types.push(clean_type(UpdateEmailRelayRequest::export_to_string()?));

    // Sync and outbox types
    types.push(clean_type(SyncAction::export_to_string()?));
    types.push(clean_type(SyncCollection::export_to_string()?));
    types.push(clean_type(SyncReport::export_to_string()?));
    types.push(clean_type(OutboxStatus::export_to_string()?));
    types.push(clean_type(OutboxEntry::export_to_string()?));
    types.push(clean_type(OutboxResponse::export_to_string()?));
    types.push(clean_type(FlushReport::export_to_string()?));

    let output_dir = Path::new("../web/src/api-types");
    fs::create_dir_all(output_dir)?;

    let output_path = output_dir.join("types.ts");
    let output = types.join("\n\n");

    fs::write(&output_path, output)?;
    println!("Generated TypeScript types in {}", output_path.display());

    Ok(())
}

/// Drops the per-file banner and imports; everything lands in one module
fn clean_type(mut type_def: String) -> String {
    type_def.retain(|c| c != '\r');

    let result = type_def
        .lines()
        .filter(|line| {
            let trimmed = line.trim();
            !trimmed.starts_with("import type")
                && !trimmed.starts_with("// This file was generated")
                && !trimmed.starts_with("/* This file was generated")
        })
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string();

    if result.is_empty() {
        result
    } else {
        format!("{}\n", result)
    }
}
