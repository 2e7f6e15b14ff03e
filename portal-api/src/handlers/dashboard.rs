use actix_web::{web, HttpResponse};
use shared_types::{DashboardStats, ListAlliancesRequest};

use super::error::ApiError;
use super::AppState;
use crate::database::alliances as alliances_db;
use crate::database::emails as emails_db;
use crate::database::events as events_db;
use crate::database::volunteers as volunteers_db;

pub async fn get_dashboard(state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let store = state.store.as_ref();

    let volunteers = volunteers_db::load_volunteers(store).await?;
    let emails = emails_db::load_emails(store).await?;
    let events = events_db::load_events(store).await?;
    let alliances = alliances_db::list_alliances(store, &ListAlliancesRequest::default()).await?;

    Ok(HttpResponse::Ok().json(DashboardStats {
        volunteers: volunteers.len(),
        unread_emails: emails_db::count_unread_inbox(&emails),
        events: events.len(),
        alliances: alliances_db::compute_stats(&alliances),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::seeds;
    use crate::handlers::configure;
    use crate::testing::default_harness;
    use actix_web::{test, App};
    use chrono::Utc;
    use serde_json::Value;

    #[actix_web::test]
    async fn test_counts_seeded_collections() {
        let harness = default_harness();
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(harness.state.clone()))
                .configure(configure),
        )
        .await;

        let req = test::TestRequest::get().uri("/api/dashboard").to_request();
        let stats: Value = test::call_and_read_body_json(&app, req).await;

        let unread = seeds::emails().iter().filter(|e| e.is_unread_inbox()).count();
        assert_eq!(stats["volunteers"], seeds::volunteers().len());
        assert_eq!(stats["events"], seeds::events(Utc::now()).len());
        assert_eq!(stats["unread_emails"], unread);
        assert_eq!(stats["alliances"]["total"], 0);
    }
}
