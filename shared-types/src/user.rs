use serde::{Deserialize, Serialize};
use std::str::FromStr;
use ts_rs::TS;

use crate::{Notice, ParseLabelError};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    #[default]
    User,
    Admin,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::User => "user",
            UserRole::Admin => "admin",
        }
    }
}

impl FromStr for UserRole {
    type Err = ParseLabelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "user" | "usuario" | "" => Ok(UserRole::User),
            "admin" | "administrador" => Ok(UserRole::Admin),
            _ => Err(ParseLabelError::new("role", s)),
        }
    }
}

/// Stored account. The password is kept as entered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserAccount {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub password: Option<String>,
    pub role: UserRole,
}

/// Account as returned by the API, without the password
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct UserView {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub role: UserRole,
    pub has_password: bool,
}

impl From<&UserAccount> for UserView {
    fn from(account: &UserAccount) -> Self {
        Self {
            id: account.id,
            name: account.name.clone(),
            email: account.email.clone(),
            role: account.role,
            has_password: account.password.as_deref().is_some_and(|p| !p.is_empty()),
        }
    }
}

#[derive(Debug, Deserialize, TS)]
#[ts(export)]
pub struct CreateUserRequest {
    pub name: String,
    pub email: String,
    pub password: Option<String>,
    pub role: Option<UserRole>,
}

#[derive(Debug, Default, Deserialize, TS)]
#[ts(export)]
pub struct UpdateUserRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub role: Option<UserRole>,
}

#[derive(Debug, Default, Deserialize, TS)]
#[ts(export)]
pub struct ListUsersRequest {
    pub search: Option<String>,
}

#[derive(Debug, Serialize, TS)]
#[ts(export)]
pub struct UsersResponse {
    pub users: Vec<UserView>,
}

/// The logged-in user, persisted as a single object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SessionUser {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: UserRole,
    pub avatar: Option<String>,
}

#[derive(Debug, Deserialize, TS)]
#[ts(export)]
pub struct LoginRequest {
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Deserialize, TS)]
#[ts(export)]
pub struct SignupRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, TS)]
#[ts(export)]
pub struct SessionResponse {
    pub authenticated: bool,
    pub user: Option<SessionUser>,
    pub notice: Option<Notice>,
}

#[derive(Debug, Deserialize, TS)]
#[ts(export)]
pub struct UpdateProfileRequest {
    pub name: String,
    pub email: String,
    pub avatar: Option<String>,
}
