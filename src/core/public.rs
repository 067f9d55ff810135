//! Public resolution: the sole anonymous read path.
//!
//! Maps a username to the profile plus its visible sections in display
//! order. The public DTOs are deliberately narrower than the store types:
//! no `owner_id`, no hidden sections, no visibility flags.

use crate::core::content::{SectionContent, SectionKind};
use crate::core::error::BiopageError;
use crate::core::profile::{Profile, ProfileStore};
use crate::core::section::{Section, SectionStore};
use serde::Serialize;

#[derive(Serialize, Debug, Clone)]
pub struct PublicProfile {
    pub username: String,
    pub display_name: String,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    pub banner_url: Option<String>,
    pub theme: String,
}

#[derive(Serialize, Debug, Clone)]
pub struct PublicSection {
    pub id: String,
    pub title: String,
    #[serde(rename = "type")]
    pub kind: SectionKind,
    pub content: SectionContent,
    pub position: i64,
}

#[derive(Serialize, Debug, Clone)]
pub struct PublicPage {
    pub profile: PublicProfile,
    pub sections: Vec<PublicSection>,
}

impl From<Profile> for PublicProfile {
    fn from(p: Profile) -> Self {
        PublicProfile {
            username: p.username,
            display_name: p.display_name,
            bio: p.bio,
            avatar_url: p.avatar_url,
            banner_url: p.banner_url,
            theme: p.theme,
        }
    }
}

impl From<Section> for PublicSection {
    fn from(s: Section) -> Self {
        PublicSection {
            id: s.id,
            title: s.title,
            kind: s.kind,
            content: s.content,
            position: s.position,
        }
    }
}

/// Resolve a public username (case-insensitively) to its page. `NotFound`
/// when no profile matches; hidden sections never appear.
pub fn resolve_public(
    profiles: &ProfileStore,
    sections: &SectionStore,
    username: &str,
) -> Result<PublicPage, BiopageError> {
    let profile = profiles.get_by_username(username)?.ok_or_else(|| {
        BiopageError::NotFound(format!("no profile for username `{}`", username.to_lowercase()))
    })?;
    let visible = sections.list_visible(&profile.id)?;
    Ok(PublicPage {
        profile: PublicProfile::from(profile),
        sections: visible.into_iter().map(PublicSection::from).collect(),
    })
}
