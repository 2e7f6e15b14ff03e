use chrono::{DateTime, Utc};
use shared_types::{
    CreateVolunteerRequest, ListVolunteersRequest, UpdateVolunteerRequest, Volunteer,
};

use super::seeds;
use super::store::{self, KeyValueStore, StoreError, StoredCollection};

impl StoredCollection for Volunteer {
    const KEY: &'static str = store::VOLUNTEERS;

    fn seed() -> Vec<Self> {
        seeds::volunteers()
    }
}

pub fn filter_volunteers(
    volunteers: &[Volunteer],
    request: &ListVolunteersRequest,
) -> Vec<Volunteer> {
    let search = request
        .search
        .as_deref()
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty());

    volunteers
        .iter()
        .filter(|v| match &search {
            Some(term) => {
                v.name.to_lowercase().contains(term)
                    || v.role.to_lowercase().contains(term)
                    || v.email.to_lowercase().contains(term)
            }
            None => true,
        })
        .cloned()
        .collect()
}

pub async fn load_volunteers(store: &dyn KeyValueStore) -> Result<Vec<Volunteer>, StoreError> {
    Ok(store::load_collection::<Volunteer>(store).await?.items)
}

pub async fn insert_volunteer(
    store: &dyn KeyValueStore,
    request: &CreateVolunteerRequest,
    now: DateTime<Utc>,
) -> Result<Volunteer, StoreError> {
    store::update_collection::<Volunteer, _, _>(store, |volunteers| {
        let volunteer = Volunteer {
            id: store::next_id(volunteers.iter().map(|v| v.id), now.timestamp_millis()),
            name: request.name.trim().to_string(),
            role: request.role.trim().to_string(),
            status: request.status.unwrap_or_default(),
            email: request.email.trim().to_string(),
            join_date: now.format("%Y-%m-%d").to_string(),
        };
        volunteers.push(volunteer.clone());
        volunteer
    })
    .await
}

pub async fn update_volunteer(
    store: &dyn KeyValueStore,
    id: i64,
    request: &UpdateVolunteerRequest,
) -> Result<Option<Volunteer>, StoreError> {
    store::update_collection::<Volunteer, _, _>(store, |volunteers| {
        let volunteer = volunteers.iter_mut().find(|v| v.id == id)?;
        if let Some(name) = &request.name {
            volunteer.name = name.trim().to_string();
        }
        if let Some(role) = &request.role {
            volunteer.role = role.trim().to_string();
        }
        if let Some(email) = &request.email {
            volunteer.email = email.trim().to_string();
        }
        if let Some(status) = request.status {
            volunteer.status = status;
        }
        Some(volunteer.clone())
    })
    .await
}

/// Hard delete
pub async fn delete_volunteer(
    store: &dyn KeyValueStore,
    id: i64,
) -> Result<Option<Volunteer>, StoreError> {
    store::update_collection::<Volunteer, _, _>(store, |volunteers| {
        let position = volunteers.iter().position(|v| v.id == id)?;
        Some(volunteers.remove(position))
    })
    .await
}

/// Spreadsheet-friendly export with Spanish column names
pub fn export_csv(volunteers: &[Volunteer]) -> anyhow::Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(["ID", "Nombre", "Rol", "Estado", "Email", "Fecha de Ingreso"])?;

    for volunteer in volunteers {
        let id = volunteer.id.to_string();
        writer.write_record([
            id.as_str(),
            volunteer.name.as_str(),
            volunteer.role.as_str(),
            volunteer.status.as_str(),
            volunteer.email.as_str(),
            volunteer.join_date.as_str(),
        ])?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| anyhow::anyhow!("Failed to flush CSV writer: {}", e))?;
    Ok(String::from_utf8(bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::MemoryStore;
    use shared_types::VolunteerStatus;

    #[tokio::test]
    async fn test_crud_cycle() {
        let store = MemoryStore::new();
        let now = Utc::now();

        let created = insert_volunteer(
            &store,
            &CreateVolunteerRequest {
                name: "Rosa Quispe".to_string(),
                role: "Voluntaria".to_string(),
                email: "rosa@example.com".to_string(),
                status: None,
            },
            now,
        )
        .await
        .unwrap();
        assert_eq!(created.status, VolunteerStatus::Active);
        assert_eq!(load_volunteers(&store).await.unwrap().len(), 6);

        let updated = update_volunteer(
            &store,
            created.id,
            &UpdateVolunteerRequest {
                status: Some(VolunteerStatus::OnLeave),
                ..UpdateVolunteerRequest::default()
            },
        )
        .await
        .unwrap()
        .unwrap();
        assert_eq!(updated.status, VolunteerStatus::OnLeave);
        assert_eq!(updated.name, "Rosa Quispe");

        delete_volunteer(&store, created.id).await.unwrap();
        assert_eq!(load_volunteers(&store).await.unwrap().len(), 5);
    }

    #[test]
    fn test_search_matches_name_role_or_email() {
        let volunteers = seeds::volunteers();
        let request = |term: &str| ListVolunteersRequest {
            search: Some(term.to_string()),
        };

        assert_eq!(filter_volunteers(&volunteers, &request("garcia")).len(), 1);
        assert_eq!(filter_volunteers(&volunteers, &request("ENFERMERA")).len(), 1);
        assert_eq!(filter_volunteers(&volunteers, &request("example.com")).len(), 5);
        assert_eq!(filter_volunteers(&volunteers, &request("   ")).len(), 5);
    }

    #[test]
    fn test_export_quotes_fields_with_commas() {
        let mut volunteers = seeds::volunteers();
        volunteers[0].role = "Psicóloga, turno tarde".to_string();

        let csv = export_csv(&volunteers).unwrap();
        let lines: Vec<&str> = csv.lines().collect();

        assert_eq!(lines[0], "ID,Nombre,Rol,Estado,Email,Fecha de Ingreso");
        assert_eq!(lines.len(), 6);
        assert!(lines[1].contains("\"Psicóloga, turno tarde\""));
        assert!(lines[5].contains("On Leave"));
    }
}
