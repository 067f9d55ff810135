//! Ownership & access control.
//!
//! Every mutating store operation routes through [`authorize`] — ownership
//! rules live here and nowhere else. The function is a pure decision over
//! already-loaded resources; it never touches the database.
//!
//! Denials keep two distinct shapes so callers can choose between a login
//! prompt and a permission error: `Unauthenticated` (no verified actor) and
//! `Unauthorized` (verified actor, not the owner).

use crate::core::error::BiopageError;
use crate::core::profile::Profile;

/// The caller's identity as established by the (external) identity provider.
/// The core only ever sees an opaque, already-verified actor id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Actor {
    Anonymous,
    User(String),
}

impl Actor {
    pub fn user(id: impl Into<String>) -> Self {
        Actor::User(id.into())
    }

    pub fn id(&self) -> Option<&str> {
        match self {
            Actor::Anonymous => None,
            Actor::User(id) => Some(id),
        }
    }

    /// Label used for audit events.
    pub fn audit_label(&self) -> &str {
        self.id().unwrap_or("anonymous")
    }
}

/// An operation paired with the resource context needed to decide it.
/// Section mutations carry the section's *parent profile* — resolving that
/// parent before authorizing is the store's job.
#[derive(Debug)]
pub enum Action<'a> {
    CreateProfile { existing: Option<&'a Profile> },
    ReadProfilePublic,
    ReadProfilePrivate { profile: &'a Profile },
    UpdateProfile { profile: &'a Profile },
    CreateSection { owner: &'a Profile },
    UpdateSection { owner: &'a Profile },
    DeleteSection { owner: &'a Profile },
    ReorderSections { owner: &'a Profile },
}

/// Pure allow/deny decision. `Ok(())` is Allow; every Deny is a typed error.
pub fn authorize(actor: &Actor, action: &Action) -> Result<(), BiopageError> {
    match action {
        Action::ReadProfilePublic => Ok(()),
        Action::CreateProfile { existing } => {
            let id = actor.id().ok_or(BiopageError::Unauthenticated)?;
            if existing.is_some() {
                return Err(BiopageError::ProfileAlreadyExists(id.to_string()));
            }
            Ok(())
        }
        Action::ReadProfilePrivate { profile } | Action::UpdateProfile { profile } => {
            require_owner(actor, profile, "profile")
        }
        Action::CreateSection { owner }
        | Action::UpdateSection { owner }
        | Action::DeleteSection { owner }
        | Action::ReorderSections { owner } => require_owner(actor, owner, "section"),
    }
}

fn require_owner(
    actor: &Actor,
    profile: &Profile,
    resource: &'static str,
) -> Result<(), BiopageError> {
    let id = actor.id().ok_or(BiopageError::Unauthenticated)?;
    if id != profile.owner_id {
        return Err(BiopageError::Unauthorized(resource));
    }
    Ok(())
}
