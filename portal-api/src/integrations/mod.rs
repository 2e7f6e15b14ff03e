pub mod email_relay;
pub mod sheets_client;
pub mod webhook;
