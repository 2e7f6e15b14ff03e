pub mod auth;
pub mod automations;
pub mod database;
pub mod notifications;
