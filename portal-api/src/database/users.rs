use chrono::{DateTime, Utc};
use shared_types::{
    CreateUserRequest, ListUsersRequest, SessionUser, UpdateUserRequest, UserAccount, UserRole,
};

use super::store::{self, KeyValueStore, StoreError, StoredCollection};

impl StoredCollection for UserAccount {
    const KEY: &'static str = store::USERS;
}

#[derive(Debug, thiserror::Error)]
pub enum UserDbError {
    #[error("A user with email {0} already exists")]
    DuplicateEmail(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

pub fn filter_users(users: &[UserAccount], request: &ListUsersRequest) -> Vec<UserAccount> {
    let search = request
        .search
        .as_deref()
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty());

    users
        .iter()
        .filter(|u| match &search {
            Some(term) => {
                u.name.to_lowercase().contains(term) || u.email.to_lowercase().contains(term)
            }
            None => true,
        })
        .cloned()
        .collect()
}

pub async fn load_users(store: &dyn KeyValueStore) -> Result<Vec<UserAccount>, StoreError> {
    Ok(store::load_collection::<UserAccount>(store).await?.items)
}

pub async fn find_by_email(
    store: &dyn KeyValueStore,
    email: &str,
) -> Result<Option<UserAccount>, StoreError> {
    let email = email.trim();
    Ok(load_users(store)
        .await?
        .into_iter()
        .find(|u| u.email.eq_ignore_ascii_case(email)))
}

/// Emails are unique, compared case-insensitively
pub async fn insert_user(
    store: &dyn KeyValueStore,
    request: &CreateUserRequest,
    now: DateTime<Utc>,
) -> Result<UserAccount, UserDbError> {
    let email = request.email.trim().to_string();

    let inserted = store::update_collection::<UserAccount, _, _>(store, |users| {
        if users.iter().any(|u| u.email.eq_ignore_ascii_case(&email)) {
            return None;
        }
        let user = UserAccount {
            id: store::next_id(users.iter().map(|u| u.id), now.timestamp_millis()),
            name: request.name.trim().to_string(),
            email: email.clone(),
            password: request.password.clone().filter(|p| !p.is_empty()),
            role: request.role.unwrap_or(UserRole::User),
        };
        users.push(user.clone());
        Some(user)
    })
    .await?;

    inserted.ok_or(UserDbError::DuplicateEmail(email))
}

pub async fn update_user(
    store: &dyn KeyValueStore,
    id: i64,
    request: &UpdateUserRequest,
) -> Result<Option<UserAccount>, UserDbError> {
    let new_email = request.email.as_deref().map(str::trim).map(str::to_string);

    let outcome = store::update_collection::<UserAccount, _, _>(store, |users| {
        if let Some(email) = &new_email {
            let taken = users
                .iter()
                .any(|u| u.id != id && u.email.eq_ignore_ascii_case(email));
            if taken {
                return Err(email.clone());
            }
        }

        let Some(user) = users.iter_mut().find(|u| u.id == id) else {
            return Ok(None);
        };
        if let Some(name) = &request.name {
            user.name = name.trim().to_string();
        }
        if let Some(email) = &new_email {
            user.email = email.clone();
        }
        // An empty password leaves the current one in place
        if let Some(password) = request.password.as_ref().filter(|p| !p.is_empty()) {
            user.password = Some(password.clone());
        }
        if let Some(role) = request.role {
            user.role = role;
        }
        Ok(Some(user.clone()))
    })
    .await?;

    outcome.map_err(UserDbError::DuplicateEmail)
}

/// Hard delete
pub async fn delete_user(
    store: &dyn KeyValueStore,
    id: i64,
) -> Result<Option<UserAccount>, StoreError> {
    store::update_collection::<UserAccount, _, _>(store, |users| {
        let position = users.iter().position(|u| u.id == id)?;
        Some(users.remove(position))
    })
    .await
}

pub async fn load_session(store: &dyn KeyValueStore) -> Result<Option<SessionUser>, StoreError> {
    store::load_object(store, store::SESSION_USER).await
}

pub async fn save_session(store: &dyn KeyValueStore, user: &SessionUser) -> Result<(), StoreError> {
    store::save_object(store, store::SESSION_USER, user).await
}

pub async fn clear_session(store: &dyn KeyValueStore) -> Result<(), StoreError> {
    store.delete(store::SESSION_USER).await
}
