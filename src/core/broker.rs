use crate::core::db;
use crate::core::error::BiopageError;
use crate::core::time;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// The store broker is the single entry point for database access.
/// It serializes connections behind an in-process lock and appends one
/// audit event per operation to `page.events.jsonl` in the store root.
pub struct StoreBroker {
    root: PathBuf,
    audit_log_path: PathBuf,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct BrokerEvent {
    pub ts: String,
    pub event_id: String,
    pub actor: String,
    pub op: String,
    pub status: String,
}

impl StoreBroker {
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
            audit_log_path: root.join(crate::core::schemas::AUDIT_EVENTS_NAME),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Execute a closure with a serialized connection to the pages database.
    /// The schema is ensured before the closure runs; the connection is
    /// mutable so callers can open transactions.
    pub fn with_conn<F, R>(&self, actor: &str, op_name: &str, f: F) -> Result<R, BiopageError>
    where
        F: FnOnce(&mut Connection) -> Result<R, BiopageError>,
    {
        static DB_LOCK: Mutex<()> = Mutex::new(());
        let _lock = DB_LOCK.lock().unwrap_or_else(|p| p.into_inner());

        std::fs::create_dir_all(&self.root).map_err(BiopageError::IoError)?;
        let db_path = db::pages_db_path(&self.root);
        let mut conn = db::db_connect(&db_path.to_string_lossy())?;
        db::ensure_schema(&conn)?;

        let result = f(&mut conn);

        let status = if result.is_ok() { "success" } else { "error" };
        self.log_event(actor, op_name, status)?;

        result
    }

    fn log_event(&self, actor: &str, op: &str, status: &str) -> Result<(), BiopageError> {
        use std::fs::OpenOptions;
        use std::io::Write;

        let ev = BrokerEvent {
            ts: time::now_epoch_z(),
            event_id: time::new_id(),
            actor: actor.to_string(),
            op: op.to_string(),
            status: status.to_string(),
        };

        let mut f = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.audit_log_path)
            .map_err(BiopageError::IoError)?;

        let line = serde_json::to_string(&ev).unwrap_or_default();
        writeln!(f, "{}", line).map_err(BiopageError::IoError)?;
        Ok(())
    }
}
