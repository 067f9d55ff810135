//! CLI struct definitions and dispatch for the biopage binary.
//!
//! This layer is the presentation collaborator: it parses arguments,
//! forwards the opaque verified actor id into the core, and renders results
//! as text or JSON. No ownership or validation rules live here.

use biopage::core::access::Actor;
use biopage::core::broker::StoreBroker;
use biopage::core::content::{ContentRegistry, SectionKind};
use biopage::core::db;
use biopage::core::error::BiopageError;
use biopage::core::profile::{Profile, ProfilePatch, ProfileStore};
use biopage::core::public;
use biopage::core::section::{Section, SectionPatch, SectionStore};
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use serde::Serialize;
use serde_json::Value as JsonValue;
use std::path::PathBuf;

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub(crate) enum OutputFormat {
    Text,
    Json,
}

#[derive(Parser, Debug)]
#[clap(
    name = "biopage",
    version = env!("CARGO_PKG_VERSION"),
    about = "Publish a personal profile page: one profile per account, ordered content sections, anonymous resolution by username."
)]
pub(crate) struct Cli {
    /// Store root directory.
    #[clap(long, global = true, default_value = ".biopage/data")]
    pub root: PathBuf,
    /// Verified actor id (defaults to the BIOPAGE_ACTOR environment
    /// variable; omit entirely for anonymous reads).
    #[clap(long, global = true)]
    pub actor: Option<String>,
    /// Output format for this invocation.
    #[clap(long, global = true, value_enum, default_value = "text")]
    pub format: OutputFormat,
    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub(crate) enum Command {
    /// Initialize the store database under the store root.
    Init,
    /// Create, show, or update your profile.
    Profile {
        #[clap(subcommand)]
        command: ProfileCommand,
    },
    /// Manage the sections on your page.
    Section {
        #[clap(subcommand)]
        command: SectionCommand,
    },
    /// Resolve a public page by username (anonymous read).
    Resolve {
        #[clap(value_name = "USERNAME")]
        username: String,
    },
}

#[derive(Subcommand, Debug)]
pub(crate) enum ProfileCommand {
    /// Claim a username and create your profile.
    Create {
        #[clap(value_name = "USERNAME")]
        username: String,
        #[clap(long)]
        display_name: Option<String>,
    },
    /// Show your own profile (including private fields).
    Show,
    /// Update profile fields. Username is immutable.
    Update {
        #[clap(long)]
        display_name: Option<String>,
        #[clap(long)]
        bio: Option<String>,
        #[clap(long)]
        avatar_url: Option<String>,
        #[clap(long)]
        banner_url: Option<String>,
        #[clap(long)]
        theme: Option<String>,
    },
}

#[derive(Subcommand, Debug)]
pub(crate) enum SectionCommand {
    /// Add a section to your page.
    Add {
        #[clap(long)]
        title: String,
        /// Section type: text_list, links, or gallery.
        #[clap(long)]
        kind: String,
        /// JSON payload for the section; seeded with defaults when omitted.
        #[clap(long)]
        content: Option<String>,
        /// Display position; appends when omitted.
        #[clap(long)]
        position: Option<i64>,
    },
    /// List all of your sections, hidden ones included.
    List,
    /// Edit a section's title, content, or visibility.
    Edit {
        #[clap(long)]
        id: String,
        #[clap(long)]
        title: Option<String>,
        #[clap(long)]
        content: Option<String>,
        #[clap(long)]
        visible: Option<bool>,
    },
    /// Delete a section.
    Rm {
        #[clap(long)]
        id: String,
    },
    /// Reorder sections; pass the full set of section ids in display order.
    Reorder {
        #[clap(value_name = "SECTION_ID", required = true)]
        ids: Vec<String>,
    },
}

pub(crate) fn run(cli: Cli) -> Result<(), BiopageError> {
    let Cli {
        root,
        actor,
        format,
        command,
    } = cli;

    let actor = match actor.or_else(|| std::env::var("BIOPAGE_ACTOR").ok()) {
        Some(id) if !id.trim().is_empty() => Actor::user(id),
        _ => Actor::Anonymous,
    };

    let broker = StoreBroker::new(&root);
    let profiles = ProfileStore::new(&broker);
    let sections = SectionStore::new(&broker, ContentRegistry::new());

    match command {
        Command::Init => {
            db::initialize_pages_db(&root)?;
            if format == OutputFormat::Json {
                println!(
                    "{}",
                    serde_json::json!({"status": "ok", "root": root.display().to_string()})
                );
            } else {
                println!("Store initialized at {}", root.display());
            }
            Ok(())
        }
        Command::Profile { command } => run_profile(format, &actor, &profiles, command),
        Command::Section { command } => run_section(format, &actor, &profiles, &sections, command),
        Command::Resolve { username } => {
            let page = public::resolve_public(&profiles, &sections, &username)?;
            match format {
                OutputFormat::Json => emit_json(&page),
                OutputFormat::Text => {
                    println!(
                        "{} {}",
                        format!("@{}", page.profile.username).bold(),
                        page.profile.display_name
                    );
                    if let Some(bio) = &page.profile.bio {
                        println!("{}", bio);
                    }
                    for section in &page.sections {
                        println!("  {} {}", section.kind.as_str().cyan(), section.title);
                    }
                }
            }
            Ok(())
        }
    }
}

fn run_profile(
    format: OutputFormat,
    actor: &Actor,
    profiles: &ProfileStore,
    command: ProfileCommand,
) -> Result<(), BiopageError> {
    match command {
        ProfileCommand::Create {
            username,
            display_name,
        } => {
            let profile = profiles.create_profile(actor, &username, display_name.as_deref())?;
            match format {
                OutputFormat::Json => emit_json(&profile),
                OutputFormat::Text => println!(
                    "{} Created profile {}",
                    "✨".green(),
                    format!("@{}", profile.username).bold()
                ),
            }
            Ok(())
        }
        ProfileCommand::Show => {
            let profile = require_own_profile(actor, profiles)?;
            match format {
                OutputFormat::Json => emit_json(&profile),
                OutputFormat::Text => print_profile_text(&profile),
            }
            Ok(())
        }
        ProfileCommand::Update {
            display_name,
            bio,
            avatar_url,
            banner_url,
            theme,
        } => {
            let patch = ProfilePatch {
                display_name,
                bio,
                avatar_url,
                banner_url,
                theme,
            };
            let profile = profiles.update_profile(actor, &patch)?;
            match format {
                OutputFormat::Json => emit_json(&profile),
                OutputFormat::Text => println!(
                    "{} Updated profile {}",
                    "🔄".green(),
                    format!("@{}", profile.username).bold()
                ),
            }
            Ok(())
        }
    }
}

fn run_section(
    format: OutputFormat,
    actor: &Actor,
    profiles: &ProfileStore,
    sections: &SectionStore,
    command: SectionCommand,
) -> Result<(), BiopageError> {
    let profile = require_own_profile(actor, profiles)?;
    match command {
        SectionCommand::Add {
            title,
            kind,
            content,
            position,
        } => {
            let kind = SectionKind::parse(&kind)?;
            let content = content.as_deref().map(parse_content_arg).transpose()?;
            let section = sections.create_section(
                actor,
                &profile.id,
                &title,
                kind,
                content.as_ref(),
                position,
            )?;
            match format {
                OutputFormat::Json => emit_json(&section),
                OutputFormat::Text => println!(
                    "{} Added {} section {} ({})",
                    "✨".green(),
                    section.kind.as_str().cyan(),
                    section.title.bold(),
                    section.id
                ),
            }
            Ok(())
        }
        SectionCommand::List => {
            let all = sections.list_all(actor, &profile.id)?;
            match format {
                OutputFormat::Json => emit_json(&all),
                OutputFormat::Text => {
                    for section in &all {
                        print_section_line(section);
                    }
                }
            }
            Ok(())
        }
        SectionCommand::Edit {
            id,
            title,
            content,
            visible,
        } => {
            let content = content.as_deref().map(parse_content_arg).transpose()?;
            let patch = SectionPatch {
                title,
                content,
                visible,
            };
            let section = sections.update_section(actor, &id, &patch)?;
            match format {
                OutputFormat::Json => emit_json(&section),
                OutputFormat::Text => {
                    println!("{} Updated section {}", "🔄".green(), section.title.bold())
                }
            }
            Ok(())
        }
        SectionCommand::Rm { id } => {
            sections.delete_section(actor, &id)?;
            match format {
                OutputFormat::Json => {
                    println!("{}", serde_json::json!({"status": "ok", "deleted": id}))
                }
                OutputFormat::Text => println!("Deleted section {}", id),
            }
            Ok(())
        }
        SectionCommand::Reorder { ids } => {
            sections.reorder(actor, &profile.id, &ids)?;
            match format {
                OutputFormat::Json => println!(
                    "{}",
                    serde_json::json!({"status": "ok", "order": ids})
                ),
                OutputFormat::Text => println!("Reordered {} sections", ids.len()),
            }
            Ok(())
        }
    }
}

fn require_own_profile(
    actor: &Actor,
    profiles: &ProfileStore,
) -> Result<Profile, BiopageError> {
    let owner_id = actor.id().ok_or(BiopageError::Unauthenticated)?;
    profiles
        .get_by_owner(owner_id)?
        .ok_or_else(|| BiopageError::NotFound(format!("no profile for owner {}", owner_id)))
}

fn parse_content_arg(raw: &str) -> Result<JsonValue, BiopageError> {
    serde_json::from_str(raw)
        .map_err(|e| BiopageError::invalid_content("content", format!("not valid JSON: {}", e)))
}

fn emit_json<T: Serialize>(value: &T) {
    println!(
        "{}",
        serde_json::to_string_pretty(value).unwrap_or_else(|_| "{}".to_string())
    );
}

fn print_profile_text(profile: &Profile) {
    println!(
        "{} {}",
        format!("@{}", profile.username).bold(),
        profile.display_name
    );
    if let Some(bio) = &profile.bio {
        println!("{}", bio);
    }
    println!("theme: {}", profile.theme);
}

fn print_section_line(section: &Section) {
    let visibility = if section.visible {
        String::new()
    } else {
        format!(" {}", "(hidden)".dimmed())
    };
    println!(
        "{:>3}. [{}] {}{} ({})",
        section.position,
        section.kind.as_str().cyan(),
        section.title,
        visibility,
        section.id
    );
}
