//! Profile store: identity records keyed by a globally unique username.
//!
//! Usernames are normalized to lowercase before anything else happens and
//! the lowercase form carries a UNIQUE constraint, as does `owner_id` (one
//! profile per account). The pre-insert lookups below only exist to produce
//! friendly errors; correctness under concurrent creates rests on the
//! constraints, with `SqliteFailure` mapped back to the domain taxonomy.
//! That also makes profile creation idempotent in effect: a retried signup
//! deterministically fails `ProfileAlreadyExists` instead of duplicating.

use crate::core::access::{self, Action, Actor};
use crate::core::broker::StoreBroker;
use crate::core::error::BiopageError;
use crate::core::time;
use regex::Regex;
use rusqlite::{Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

pub const DEFAULT_THEME: &str = "default";

const PROFILE_COLUMNS: &str =
    "id, owner_id, username, display_name, bio, avatar_url, banner_url, theme, created_at, updated_at";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Profile {
    pub id: String,
    pub owner_id: String,
    pub username: String,
    pub display_name: String,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    pub banner_url: Option<String>,
    pub theme: String,
    pub created_at: String,
    pub updated_at: String,
}

/// Partial update for the owner-editable fields. `None` leaves a field
/// unchanged; username is immutable through this path (no rename).
#[derive(Debug, Clone, Default)]
pub struct ProfilePatch {
    pub display_name: Option<String>,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    pub banner_url: Option<String>,
    pub theme: Option<String>,
}

impl ProfilePatch {
    pub fn is_empty(&self) -> bool {
        self.display_name.is_none()
            && self.bio.is_none()
            && self.avatar_url.is_none()
            && self.banner_url.is_none()
            && self.theme.is_none()
    }
}

pub struct ProfileStore<'a> {
    broker: &'a StoreBroker,
}

impl<'a> ProfileStore<'a> {
    pub fn new(broker: &'a StoreBroker) -> Self {
        Self { broker }
    }

    /// Create the actor's profile. Fails `UsernameInvalid` on a bad name,
    /// `UsernameTaken` on a case-insensitive collision, and
    /// `ProfileAlreadyExists` when the actor already owns a profile.
    pub fn create_profile(
        &self,
        actor: &Actor,
        username: &str,
        display_name: Option<&str>,
    ) -> Result<Profile, BiopageError> {
        let username = normalize_username(username)?;
        let display_name = match display_name {
            Some(name) if !name.trim().is_empty() => name.to_string(),
            _ => username.clone(),
        };

        self.broker
            .with_conn(actor.audit_label(), "profile.create", |conn| {
                let existing = match actor.id() {
                    Some(owner_id) => get_by_owner_conn(conn, owner_id)?,
                    None => None,
                };
                access::authorize(
                    actor,
                    &Action::CreateProfile {
                        existing: existing.as_ref(),
                    },
                )?;
                let owner_id = actor.id().ok_or(BiopageError::Unauthenticated)?;

                let taken: Option<String> = conn
                    .query_row(
                        "SELECT username FROM profiles WHERE username = ?1",
                        [&username],
                        |row| row.get(0),
                    )
                    .optional()?;
                if taken.is_some() {
                    return Err(BiopageError::UsernameTaken(username.clone()));
                }

                let profile = Profile {
                    id: time::new_id(),
                    owner_id: owner_id.to_string(),
                    username: username.clone(),
                    display_name: display_name.clone(),
                    bio: None,
                    avatar_url: None,
                    banner_url: None,
                    theme: DEFAULT_THEME.to_string(),
                    created_at: time::now_epoch_z(),
                    updated_at: time::now_epoch_z(),
                };

                conn.execute(
                    "INSERT INTO profiles(id, owner_id, username, display_name, bio, avatar_url, banner_url, theme, created_at, updated_at)
                     VALUES(?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                    rusqlite::params![
                        profile.id,
                        profile.owner_id,
                        profile.username,
                        profile.display_name,
                        profile.bio,
                        profile.avatar_url,
                        profile.banner_url,
                        profile.theme,
                        profile.created_at,
                        profile.updated_at,
                    ],
                )
                .map_err(|e| map_profile_constraint(e, &username, owner_id))?;

                Ok(profile)
            })
    }

    /// Case-insensitive lookup by public username. Absence is `Ok(None)`,
    /// not an error — the caller decides whether that is a 404.
    pub fn get_by_username(&self, username: &str) -> Result<Option<Profile>, BiopageError> {
        let normalized = username.to_lowercase();
        self.broker
            .with_conn("anonymous", "profile.get_by_username", |conn| {
                get_by_username_conn(conn, &normalized)
            })
    }

    pub fn get_by_owner(&self, owner_id: &str) -> Result<Option<Profile>, BiopageError> {
        self.broker
            .with_conn(owner_id, "profile.get_by_owner", |conn| {
                get_by_owner_conn(conn, owner_id)
            })
    }

    /// Apply a patch to the profile owned by the actor. Refreshes
    /// `updated_at`; returns the updated profile.
    pub fn update_profile(
        &self,
        actor: &Actor,
        patch: &ProfilePatch,
    ) -> Result<Profile, BiopageError> {
        self.broker
            .with_conn(actor.audit_label(), "profile.update", |conn| {
                let owner_id = actor.id().ok_or(BiopageError::Unauthenticated)?;
                let profile = get_by_owner_conn(conn, owner_id)?.ok_or_else(|| {
                    BiopageError::NotFound(format!("no profile for owner {}", owner_id))
                })?;
                access::authorize(actor, &Action::UpdateProfile { profile: &profile })?;

                let mut sets: Vec<&str> = Vec::new();
                let mut params: Vec<Box<dyn rusqlite::types::ToSql>> = Vec::new();
                if let Some(v) = &patch.display_name {
                    sets.push("display_name = ?");
                    params.push(Box::new(v.clone()));
                }
                if let Some(v) = &patch.bio {
                    sets.push("bio = ?");
                    params.push(Box::new(v.clone()));
                }
                if let Some(v) = &patch.avatar_url {
                    sets.push("avatar_url = ?");
                    params.push(Box::new(v.clone()));
                }
                if let Some(v) = &patch.banner_url {
                    sets.push("banner_url = ?");
                    params.push(Box::new(v.clone()));
                }
                if let Some(v) = &patch.theme {
                    sets.push("theme = ?");
                    params.push(Box::new(v.clone()));
                }
                sets.push("updated_at = ?");
                params.push(Box::new(time::now_epoch_z()));
                params.push(Box::new(profile.id.clone()));

                let sql = format!("UPDATE profiles SET {} WHERE id = ?", sets.join(", "));
                let params_as_dyn: Vec<&dyn rusqlite::types::ToSql> =
                    params.iter().map(|p| p.as_ref()).collect();
                conn.execute(&sql, rusqlite::params_from_iter(params_as_dyn))?;

                get_by_owner_conn(conn, owner_id)?.ok_or_else(|| {
                    BiopageError::NotFound(format!("no profile for owner {}", owner_id))
                })
            })
    }
}

/// Lowercase and validate: 3-20 chars of `[A-Za-z0-9_]`.
pub fn normalize_username(username: &str) -> Result<String, BiopageError> {
    let normalized = username.trim().to_lowercase();
    if normalized.len() < 3 || normalized.len() > 20 {
        return Err(BiopageError::UsernameInvalid(format!(
            "`{}` must be 3-20 characters",
            normalized
        )));
    }
    if !username_re().is_match(&normalized) {
        return Err(BiopageError::UsernameInvalid(format!(
            "`{}` may only contain letters, digits, and underscores",
            normalized
        )));
    }
    Ok(normalized)
}

fn username_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z0-9_]+$").expect("valid username regex"))
}

fn map_profile_constraint(e: rusqlite::Error, username: &str, owner_id: &str) -> BiopageError {
    if let rusqlite::Error::SqliteFailure(f, Some(msg)) = &e {
        if f.code == rusqlite::ErrorCode::ConstraintViolation {
            if msg.contains("profiles.username") {
                return BiopageError::UsernameTaken(username.to_string());
            }
            if msg.contains("profiles.owner_id") {
                return BiopageError::ProfileAlreadyExists(owner_id.to_string());
            }
        }
    }
    BiopageError::RusqliteError(e)
}

pub(crate) fn get_by_owner_conn(
    conn: &Connection,
    owner_id: &str,
) -> Result<Option<Profile>, BiopageError> {
    conn.query_row(
        &format!("SELECT {} FROM profiles WHERE owner_id = ?1", PROFILE_COLUMNS),
        [owner_id],
        row_to_profile,
    )
    .optional()
    .map_err(BiopageError::RusqliteError)
}

pub(crate) fn get_by_username_conn(
    conn: &Connection,
    normalized: &str,
) -> Result<Option<Profile>, BiopageError> {
    conn.query_row(
        &format!("SELECT {} FROM profiles WHERE username = ?1", PROFILE_COLUMNS),
        [normalized],
        row_to_profile,
    )
    .optional()
    .map_err(BiopageError::RusqliteError)
}

pub(crate) fn get_by_id_conn(
    conn: &Connection,
    profile_id: &str,
) -> Result<Option<Profile>, BiopageError> {
    conn.query_row(
        &format!("SELECT {} FROM profiles WHERE id = ?1", PROFILE_COLUMNS),
        [profile_id],
        row_to_profile,
    )
    .optional()
    .map_err(BiopageError::RusqliteError)
}

fn row_to_profile(row: &Row) -> Result<Profile, rusqlite::Error> {
    Ok(Profile {
        id: row.get(0)?,
        owner_id: row.get(1)?,
        username: row.get(2)?,
        display_name: row.get(3)?,
        bio: row.get(4)?,
        avatar_url: row.get(5)?,
        banner_url: row.get(6)?,
        theme: row.get(7)?,
        created_at: row.get(8)?,
        updated_at: row.get(9)?,
    })
}
