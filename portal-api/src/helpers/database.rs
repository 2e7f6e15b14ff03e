use std::path::PathBuf;

/// Returns the path to the portal database based on the operating system
///
/// # Platform-specific paths
///
/// - **macOS**: `~/Library/Application Support/aniquem/portal.db`
/// - **Linux**: `~/.local/share/aniquem/portal.db`
/// - **Windows**: `%LOCALAPPDATA%\aniquem\portal.db`
pub fn get_db_path() -> anyhow::Result<PathBuf> {
    let data_dir = dirs::data_local_dir()
        .ok_or_else(|| anyhow::anyhow!("Could not determine local data directory"))?;

    Ok(data_dir.join("aniquem").join("portal.db"))
}

/// Opens the database, creating it on first start. Existing data is kept.
pub fn initialize_database() -> anyhow::Result<std::sync::Arc<crate::database::Database>> {
    let db_path = get_db_path()?;
    let db = crate::database::Database::new(&db_path)?;
    Ok(std::sync::Arc::new(db))
}
