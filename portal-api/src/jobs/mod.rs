pub mod outbox;
pub mod sheet_sync;
