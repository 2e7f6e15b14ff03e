use rusqlite::Connection;

/// Run all database migrations
pub fn run_migrations(conn: &Connection) -> anyhow::Result<()> {
    // One row per fixed store key; `value` holds the JSON document
    conn.execute(
        "CREATE TABLE IF NOT EXISTS kv_store (
            key VARCHAR PRIMARY KEY,
            value VARCHAR NOT NULL,
            version BIGINT NOT NULL DEFAULT 1,
            updated_at BIGINT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_kv_store_updated
            ON kv_store(updated_at)",
        [],
    )?;

    Ok(())
}

/// Check if database tables exist
pub fn has_schema(conn: &Connection) -> anyhow::Result<bool> {
    let mut stmt =
        conn.prepare("SELECT name FROM sqlite_master WHERE type='table' AND name='kv_store'")?;
    Ok(stmt.exists([])?)
}
