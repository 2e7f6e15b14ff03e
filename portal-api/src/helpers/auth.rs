use shared_types::{LoginRequest, SessionUser, UserRole};

use crate::config::LoginStrategy;
use crate::database::users as users_db;
use crate::database::{KeyValueStore, StoreError};
use crate::integrations::webhook::RemoteAuthenticator;

#[derive(Debug, thiserror::Error)]
pub enum LoginError {
    #[error("Credenciales incorrectas")]
    InvalidCredentials,
    #[error("{0}")]
    Rejected(String),
    #[error("Login service unavailable: {0}")]
    Upstream(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Generated avatar for users without one
pub fn avatar_url(name: &str) -> String {
    let encoded: String = url::form_urlencoded::byte_serialize(name.trim().as_bytes()).collect();
    format!("https://ui-avatars.com/api/?name={encoded}&background=E30613&color=fff")
}

/// Checks credentials with the configured strategy and builds the session
pub async fn authenticate(
    strategy: LoginStrategy,
    store: &dyn KeyValueStore,
    authenticator: &dyn RemoteAuthenticator,
    request: &LoginRequest,
) -> Result<SessionUser, LoginError> {
    let email = request.email.trim();
    if email.is_empty() {
        return Err(LoginError::InvalidCredentials);
    }

    match strategy {
        LoginStrategy::Open => Ok(SessionUser {
            id: "1".to_string(),
            name: "Admin User".to_string(),
            email: email.to_string(),
            role: UserRole::Admin,
            avatar: Some(avatar_url("Admin User")),
        }),
        LoginStrategy::Users => {
            let user = users_db::find_by_email(store, email)
                .await?
                .ok_or(LoginError::InvalidCredentials)?;

            if user.password.as_deref() != Some(request.password.as_str()) {
                return Err(LoginError::InvalidCredentials);
            }

            Ok(SessionUser {
                id: user.id.to_string(),
                avatar: Some(avatar_url(&user.name)),
                name: user.name,
                email: user.email,
                role: user.role,
            })
        }
        LoginStrategy::Webhook => {
            let login = authenticator
                .verify(email, &request.password)
                .await
                .map_err(|e| LoginError::Upstream(e.to_string()))?;

            if !login.is_success() {
                return Err(match login.message {
                    Some(message) if !message.trim().is_empty() => LoginError::Rejected(message),
                    _ => LoginError::InvalidCredentials,
                });
            }

            let name = login
                .name
                .filter(|n| !n.trim().is_empty())
                .unwrap_or_else(|| email.to_string());
            let id = match login.id {
                Some(serde_json::Value::String(id)) => id,
                Some(serde_json::Value::Null) | None => email.to_string(),
                Some(other) => other.to_string(),
            };
            let role = login
                .role
                .and_then(|r| r.parse().ok())
                .unwrap_or(UserRole::User);

            Ok(SessionUser {
                id,
                avatar: Some(avatar_url(&name)),
                name,
                email: email.to_string(),
                role,
            })
        }
    }
}
