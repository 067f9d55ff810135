//! Section store: ordered, typed content blocks under a profile.
//!
//! Display order is `position ASC` with ties broken by creation order
//! (SQLite rowid reflects insertion order, which is exactly the tie-break
//! we want — epoch-second timestamps collide too easily). Positions are not
//! required to be contiguous or unique; `reorder` rewrites them as 0..n
//! inside one transaction so a failed reorder leaves every position
//! untouched.
//!
//! Every mutation resolves the section's parent profile first and consults
//! `access::authorize` with it; a section can never be mutated through a
//! mismatched profile context — that is `Unauthorized`, never a silent
//! no-op.

use crate::core::access::{self, Action, Actor};
use crate::core::broker::StoreBroker;
use crate::core::content::{ContentRegistry, SectionContent, SectionKind};
use crate::core::error::BiopageError;
use crate::core::profile::{self, Profile};
use crate::core::time;
use rusqlite::{Connection, OptionalExtension, Row};
use serde::Serialize;
use serde_json::Value as JsonValue;
use std::collections::HashSet;

const SECTION_COLUMNS: &str =
    "id, profile_id, title, kind, content, position, visible, created_at, updated_at";

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct Section {
    pub id: String,
    pub profile_id: String,
    pub title: String,
    #[serde(rename = "type")]
    pub kind: SectionKind,
    pub content: SectionContent,
    pub position: i64,
    pub visible: bool,
    pub created_at: String,
    pub updated_at: String,
}

/// Partial update for the owner-editable fields. Kind is immutable after
/// creation — there is no variant migration, so `content` is always
/// revalidated under the section's existing kind.
#[derive(Debug, Clone, Default)]
pub struct SectionPatch {
    pub title: Option<String>,
    pub content: Option<JsonValue>,
    pub visible: Option<bool>,
}

pub struct SectionStore<'a> {
    broker: &'a StoreBroker,
    registry: ContentRegistry,
}

impl<'a> SectionStore<'a> {
    pub fn new(broker: &'a StoreBroker, registry: ContentRegistry) -> Self {
        Self { broker, registry }
    }

    /// Visible sections in display order. This is the public-read path and
    /// performs no authorization.
    pub fn list_visible(&self, profile_id: &str) -> Result<Vec<Section>, BiopageError> {
        self.broker
            .with_conn("anonymous", "section.list_visible", |conn| {
                query_sections(
                    conn,
                    &self.registry,
                    profile_id,
                    "profile_id = ?1 AND visible = 1",
                )
            })
    }

    /// All sections regardless of visibility, owner-only. Used by the
    /// dashboard surface.
    pub fn list_all(&self, actor: &Actor, profile_id: &str) -> Result<Vec<Section>, BiopageError> {
        self.broker
            .with_conn(actor.audit_label(), "section.list_all", |conn| {
                let owner = require_profile(conn, profile_id)?;
                access::authorize(actor, &Action::ReadProfilePrivate { profile: &owner })?;
                query_sections(conn, &self.registry, profile_id, "profile_id = ?1")
            })
    }

    /// Create a section under the actor's profile. Content is validated and
    /// normalized through the registry, or seeded from `default_content`
    /// when omitted. Position defaults to the current section count
    /// (append).
    pub fn create_section(
        &self,
        actor: &Actor,
        profile_id: &str,
        title: &str,
        kind: SectionKind,
        content: Option<&JsonValue>,
        position: Option<i64>,
    ) -> Result<Section, BiopageError> {
        let content = match content {
            Some(raw) => self.registry.validate(kind, raw)?,
            None => self.registry.default_content(kind),
        };

        self.broker
            .with_conn(actor.audit_label(), "section.create", |conn| {
                let owner = require_profile(conn, profile_id)?;
                access::authorize(actor, &Action::CreateSection { owner: &owner })?;

                let position = match position {
                    Some(p) => p,
                    None => conn.query_row(
                        "SELECT COUNT(*) FROM sections WHERE profile_id = ?1",
                        [profile_id],
                        |row| row.get(0),
                    )?,
                };

                let section = Section {
                    id: time::new_id(),
                    profile_id: profile_id.to_string(),
                    title: title.to_string(),
                    kind,
                    content: content.clone(),
                    position,
                    visible: true,
                    created_at: time::now_epoch_z(),
                    updated_at: time::now_epoch_z(),
                };

                conn.execute(
                    "INSERT INTO sections(id, profile_id, title, kind, content, position, visible, created_at, updated_at)
                     VALUES(?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                    rusqlite::params![
                        section.id,
                        section.profile_id,
                        section.title,
                        section.kind.as_str(),
                        section.content.to_json().to_string(),
                        section.position,
                        section.visible,
                        section.created_at,
                        section.updated_at,
                    ],
                )?;

                Ok(section)
            })
    }

    /// Apply a patch to one section. Refreshes `updated_at`; returns the
    /// updated section.
    pub fn update_section(
        &self,
        actor: &Actor,
        section_id: &str,
        patch: &SectionPatch,
    ) -> Result<Section, BiopageError> {
        self.broker
            .with_conn(actor.audit_label(), "section.update", |conn| {
                let section = require_section(conn, &self.registry, section_id)?;
                let owner = require_profile(conn, &section.profile_id)?;
                access::authorize(actor, &Action::UpdateSection { owner: &owner })?;

                let content = match &patch.content {
                    Some(raw) => Some(self.registry.validate(section.kind, raw)?),
                    None => None,
                };

                let mut sets: Vec<&str> = Vec::new();
                let mut params: Vec<Box<dyn rusqlite::types::ToSql>> = Vec::new();
                if let Some(v) = &patch.title {
                    sets.push("title = ?");
                    params.push(Box::new(v.clone()));
                }
                if let Some(v) = &content {
                    sets.push("content = ?");
                    params.push(Box::new(v.to_json().to_string()));
                }
                if let Some(v) = patch.visible {
                    sets.push("visible = ?");
                    params.push(Box::new(v));
                }
                sets.push("updated_at = ?");
                params.push(Box::new(time::now_epoch_z()));
                params.push(Box::new(section_id.to_string()));

                let sql = format!("UPDATE sections SET {} WHERE id = ?", sets.join(", "));
                let params_as_dyn: Vec<&dyn rusqlite::types::ToSql> =
                    params.iter().map(|p| p.as_ref()).collect();
                conn.execute(&sql, rusqlite::params_from_iter(params_as_dyn))?;

                require_section(conn, &self.registry, section_id)
            })
    }

    /// Hard delete. A second delete of the same id is `NotFound`.
    pub fn delete_section(&self, actor: &Actor, section_id: &str) -> Result<(), BiopageError> {
        self.broker
            .with_conn(actor.audit_label(), "section.delete", |conn| {
                let section = require_section(conn, &self.registry, section_id)?;
                let owner = require_profile(conn, &section.profile_id)?;
                access::authorize(actor, &Action::DeleteSection { owner: &owner })?;

                conn.execute("DELETE FROM sections WHERE id = ?1", [section_id])?;
                Ok(())
            })
    }

    /// Reassign positions to match `ordered_ids`, which must contain exactly
    /// the profile's full current set of section ids — no partial reorders,
    /// no foreign ids, no duplicates. All-or-nothing: a mismatch leaves
    /// existing positions untouched, and calling twice with the same ids is
    /// idempotent.
    pub fn reorder(
        &self,
        actor: &Actor,
        profile_id: &str,
        ordered_ids: &[String],
    ) -> Result<(), BiopageError> {
        self.broker
            .with_conn(actor.audit_label(), "section.reorder", |conn| {
                let owner = require_profile(conn, profile_id)?;
                access::authorize(actor, &Action::ReorderSections { owner: &owner })?;

                let tx = conn.transaction()?;
                let current: HashSet<String> = {
                    let mut stmt =
                        tx.prepare("SELECT id FROM sections WHERE profile_id = ?1")?;
                    let rows = stmt.query_map([profile_id], |row| row.get::<_, String>(0))?;
                    rows.collect::<Result<_, _>>()?
                };

                let given: HashSet<&str> = ordered_ids.iter().map(String::as_str).collect();
                if given.len() != ordered_ids.len() {
                    return Err(BiopageError::ReorderMismatch(
                        "duplicate section ids in requested order".to_string(),
                    ));
                }
                if given.len() != current.len()
                    || !current.iter().all(|id| given.contains(id.as_str()))
                {
                    return Err(BiopageError::ReorderMismatch(format!(
                        "requested order names {} sections but the profile has {}",
                        given.len(),
                        current.len()
                    )));
                }

                let ts = time::now_epoch_z();
                for (position, id) in ordered_ids.iter().enumerate() {
                    tx.execute(
                        "UPDATE sections SET position = ?1, updated_at = ?2 WHERE id = ?3 AND profile_id = ?4",
                        rusqlite::params![position as i64, ts, id, profile_id],
                    )?;
                }
                tx.commit()?;
                Ok(())
            })
    }
}

fn require_profile(conn: &Connection, profile_id: &str) -> Result<Profile, BiopageError> {
    profile::get_by_id_conn(conn, profile_id)?
        .ok_or_else(|| BiopageError::NotFound(format!("no profile with id {}", profile_id)))
}

fn require_section(
    conn: &Connection,
    registry: &ContentRegistry,
    section_id: &str,
) -> Result<Section, BiopageError> {
    let row = conn
        .query_row(
            &format!("SELECT {} FROM sections WHERE id = ?1", SECTION_COLUMNS),
            [section_id],
            row_to_raw_section,
        )
        .optional()
        .map_err(BiopageError::RusqliteError)?;
    match row {
        Some(raw) => raw.into_section(registry),
        None => Err(BiopageError::NotFound(format!(
            "no section with id {}",
            section_id
        ))),
    }
}

fn query_sections(
    conn: &Connection,
    registry: &ContentRegistry,
    profile_id: &str,
    predicate: &str,
) -> Result<Vec<Section>, BiopageError> {
    let sql = format!(
        "SELECT {} FROM sections WHERE {} ORDER BY position ASC, rowid ASC",
        SECTION_COLUMNS, predicate
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map([profile_id], row_to_raw_section)?;
    let mut out = Vec::new();
    for raw in rows {
        out.push(raw.map_err(BiopageError::RusqliteError)?.into_section(registry)?);
    }
    Ok(out)
}

/// Row image before the content column is parsed back through the registry.
struct RawSection {
    id: String,
    profile_id: String,
    title: String,
    kind: String,
    content: String,
    position: i64,
    visible: bool,
    created_at: String,
    updated_at: String,
}

impl RawSection {
    fn into_section(self, registry: &ContentRegistry) -> Result<Section, BiopageError> {
        let kind = SectionKind::parse(&self.kind)?;
        let raw: JsonValue = serde_json::from_str(&self.content)
            .map_err(|e| BiopageError::invalid_content("content", e.to_string()))?;
        let content = registry.validate(kind, &raw)?;
        Ok(Section {
            id: self.id,
            profile_id: self.profile_id,
            title: self.title,
            kind,
            content,
            position: self.position,
            visible: self.visible,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

fn row_to_raw_section(row: &Row) -> Result<RawSection, rusqlite::Error> {
    Ok(RawSection {
        id: row.get(0)?,
        profile_id: row.get(1)?,
        title: row.get(2)?,
        kind: row.get(3)?,
        content: row.get(4)?,
        position: row.get(5)?,
        visible: row.get(6)?,
        created_at: row.get(7)?,
        updated_at: row.get(8)?,
    })
}
