pub mod config;
pub mod database;
pub mod handlers;
pub mod helpers;
pub mod integrations;
pub mod jobs;

#[cfg(test)]
pub mod testing;

pub use database::Database;
