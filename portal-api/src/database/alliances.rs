use chrono::{DateTime, Utc};
use shared_types::{
    Alliance, AllianceStats, AllianceStatus, CreateAllianceRequest, ListAlliancesRequest,
    UpdateAllianceRequest,
};

use super::store::{self, KeyValueStore, StoreError, StoredCollection};

impl StoredCollection for Alliance {
    const KEY: &'static str = store::ALLIANCES;
}

/// Non-deleted alliances matching `search` on company or tax id, newest first
pub fn filter_alliances(alliances: &[Alliance], request: &ListAlliancesRequest) -> Vec<Alliance> {
    let include_deleted = request.include_deleted.unwrap_or(false);
    let search = request
        .search
        .as_deref()
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty());

    let mut result: Vec<Alliance> = alliances
        .iter()
        .filter(|a| include_deleted || !a.deleted)
        .filter(|a| match &search {
            Some(term) => a.company.to_lowercase().contains(term) || a.tax_id.contains(term),
            None => true,
        })
        .cloned()
        .collect();

    result.sort_by(|a, b| b.id.cmp(&a.id));
    result
}

pub fn compute_stats(alliances: &[Alliance]) -> AllianceStats {
    let count = |status: AllianceStatus| alliances.iter().filter(|a| a.status == status).count();

    AllianceStats {
        total: alliances.len(),
        new: count(AllianceStatus::New),
        negotiating: count(AllianceStatus::Negotiating),
        closed: count(AllianceStatus::Closed),
    }
}

pub async fn list_alliances(
    store: &dyn KeyValueStore,
    request: &ListAlliancesRequest,
) -> Result<Vec<Alliance>, StoreError> {
    let snapshot = store::load_collection::<Alliance>(store).await?;
    Ok(filter_alliances(&snapshot.items, request))
}

pub async fn get_alliance(
    store: &dyn KeyValueStore,
    id: i64,
) -> Result<Option<Alliance>, StoreError> {
    let snapshot = store::load_collection::<Alliance>(store).await?;
    Ok(snapshot.items.into_iter().find(|a| a.id == id))
}

/// Inserts a new alliance. `tax_id` must already be sanitized.
pub async fn insert_alliance(
    store: &dyn KeyValueStore,
    request: &CreateAllianceRequest,
    tax_id: &str,
    now: DateTime<Utc>,
) -> Result<Alliance, StoreError> {
    store::update_collection::<Alliance, _, _>(store, |alliances| {
        let alliance = Alliance {
            id: store::next_id(alliances.iter().map(|a| a.id), now.timestamp_millis()),
            company: request.company.trim().to_string(),
            tax_id: tax_id.to_string(),
            contact_name: request.contact_name.trim().to_string(),
            contact_email: non_blank(request.contact_email.as_deref()),
            contact_phone: non_blank(request.contact_phone.as_deref()),
            document_url: non_blank(request.document_url.as_deref()),
            channel: request.channel.unwrap_or_default(),
            status: AllianceStatus::New,
            first_contact: now.format("%Y-%m-%d").to_string(),
            subject: request.subject.trim().to_string(),
            deleted: false,
            updated_at: Some(now.to_rfc3339()),
        };
        alliances.insert(0, alliance.clone());
        alliance
    })
    .await
}

pub async fn update_alliance(
    store: &dyn KeyValueStore,
    id: i64,
    request: &UpdateAllianceRequest,
    tax_id: Option<&str>,
    now: DateTime<Utc>,
) -> Result<Option<Alliance>, StoreError> {
    store::update_collection::<Alliance, _, _>(store, |alliances| {
        let alliance = alliances.iter_mut().find(|a| a.id == id && !a.deleted)?;

        if let Some(company) = &request.company {
            alliance.company = company.trim().to_string();
        }
        if let Some(tax_id) = tax_id {
            alliance.tax_id = tax_id.to_string();
        }
        if let Some(contact_name) = &request.contact_name {
            alliance.contact_name = contact_name.trim().to_string();
        }
        if request.contact_email.is_some() {
            alliance.contact_email = non_blank(request.contact_email.as_deref());
        }
        if request.contact_phone.is_some() {
            alliance.contact_phone = non_blank(request.contact_phone.as_deref());
        }
        if request.document_url.is_some() {
            alliance.document_url = non_blank(request.document_url.as_deref());
        }
        if let Some(channel) = request.channel {
            alliance.channel = channel;
        }
        if let Some(status) = request.status {
            alliance.status = status;
        }
        if let Some(subject) = &request.subject {
            alliance.subject = subject.trim().to_string();
        }
        alliance.updated_at = Some(now.to_rfc3339());

        Some(alliance.clone())
    })
    .await
}

/// Flags the alliance as deleted; it stays in the stored array
pub async fn soft_delete_alliance(
    store: &dyn KeyValueStore,
    id: i64,
    now: DateTime<Utc>,
) -> Result<Option<Alliance>, StoreError> {
    store::update_collection::<Alliance, _, _>(store, |alliances| {
        let alliance = alliances.iter_mut().find(|a| a.id == id && !a.deleted)?;
        alliance.deleted = true;
        alliance.updated_at = Some(now.to_rfc3339());
        Some(alliance.clone())
    })
    .await
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
