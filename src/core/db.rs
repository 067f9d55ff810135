use crate::core::error::BiopageError;
use crate::core::schemas;
use rusqlite::{Connection, OptionalExtension};
use std::fs;
use std::path::{Path, PathBuf};

pub fn db_connect(db_path: &str) -> Result<Connection, BiopageError> {
    let conn = Connection::open(db_path)?;
    conn.busy_timeout(std::time::Duration::from_secs(5))
        .map_err(BiopageError::RusqliteError)?;
    conn.query_row("PRAGMA journal_mode=WAL;", [], |_| Ok(()))
        .map_err(BiopageError::RusqliteError)?;
    conn.execute("PRAGMA foreign_keys=ON;", [])
        .map_err(BiopageError::RusqliteError)?;
    Ok(conn)
}

pub fn pages_db_path(root: &Path) -> PathBuf {
    root.join(schemas::PAGES_DB_NAME)
}

/// Apply DDL idempotently and record the schema version. Safe to call on
/// every connection; a no-op once the recorded version is current.
pub fn ensure_schema(conn: &Connection) -> Result<(), BiopageError> {
    conn.execute(schemas::PAGES_DB_SCHEMA_META, [])?;

    let current: Option<String> = conn
        .query_row(
            "SELECT value FROM meta WHERE key = 'schema_version'",
            [],
            |row| row.get(0),
        )
        .optional()
        .map_err(BiopageError::RusqliteError)?;

    let current_version: u32 = current
        .as_deref()
        .and_then(|s| s.parse::<u32>().ok())
        .unwrap_or(0);

    if current_version >= schemas::PAGES_SCHEMA_VERSION {
        return Ok(());
    }

    conn.execute(schemas::PAGES_DB_SCHEMA_PROFILES, [])?;
    conn.execute(schemas::PAGES_DB_SCHEMA_SECTIONS, [])?;
    conn.execute(schemas::PAGES_DB_SCHEMA_INDEX_SECTIONS_PROFILE, [])?;
    conn.execute(schemas::PAGES_DB_SCHEMA_INDEX_SECTIONS_VISIBLE, [])?;

    conn.execute(
        "INSERT INTO meta(key, value) VALUES('schema_version', ?1)
         ON CONFLICT(key) DO UPDATE SET value=excluded.value",
        [schemas::PAGES_SCHEMA_VERSION.to_string()],
    )?;

    Ok(())
}

/// Create the store root and database, applying the schema once up front.
pub fn initialize_pages_db(root: &Path) -> Result<(), BiopageError> {
    fs::create_dir_all(root).map_err(BiopageError::IoError)?;
    let db_path = pages_db_path(root);
    let conn = db_connect(&db_path.to_string_lossy())?;
    ensure_schema(&conn)?;
    Ok(())
}
