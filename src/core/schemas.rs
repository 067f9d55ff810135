//! Centralized database schema definitions.
//!
//! All state lives in a single SQLite database (`pages.db`) under the store
//! root. DDL is idempotent (`IF NOT EXISTS`) and applied by
//! `db::ensure_schema`; a `meta` table records the schema version so future
//! migrations have a hook.
//!
//! Uniqueness is enforced here, not by application-level check-then-insert:
//! `profiles.owner_id` (one profile per account) and `profiles.username`
//! (global, stored lowercase) both carry UNIQUE constraints. Sections are
//! cascade-deleted with their profile; `PRAGMA foreign_keys=ON` is set per
//! connection in `db::db_connect`.

pub const PAGES_DB_NAME: &str = "pages.db";
pub const AUDIT_EVENTS_NAME: &str = "page.events.jsonl";
pub const PAGES_SCHEMA_VERSION: u32 = 1;

pub const PAGES_DB_SCHEMA_META: &str = "
CREATE TABLE IF NOT EXISTS meta (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);";

pub const PAGES_DB_SCHEMA_PROFILES: &str = "
CREATE TABLE IF NOT EXISTS profiles (
    id TEXT PRIMARY KEY,
    owner_id TEXT NOT NULL UNIQUE,
    username TEXT NOT NULL UNIQUE,
    display_name TEXT NOT NULL,
    bio TEXT,
    avatar_url TEXT,
    banner_url TEXT,
    theme TEXT NOT NULL DEFAULT 'default',
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);";

pub const PAGES_DB_SCHEMA_SECTIONS: &str = "
CREATE TABLE IF NOT EXISTS sections (
    id TEXT PRIMARY KEY,
    profile_id TEXT NOT NULL REFERENCES profiles(id) ON DELETE CASCADE,
    title TEXT NOT NULL,
    kind TEXT NOT NULL,
    content TEXT NOT NULL,
    position INTEGER NOT NULL,
    visible INTEGER NOT NULL DEFAULT 1,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);";

pub const PAGES_DB_SCHEMA_INDEX_SECTIONS_PROFILE: &str =
    "CREATE INDEX IF NOT EXISTS idx_sections_profile ON sections(profile_id, position);";

pub const PAGES_DB_SCHEMA_INDEX_SECTIONS_VISIBLE: &str =
    "CREATE INDEX IF NOT EXISTS idx_sections_visible ON sections(profile_id, visible);";
