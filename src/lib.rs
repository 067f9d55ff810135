//! Biopage: a local-first core for publishing personal profile pages.
//!
//! Authenticated users own exactly one profile, keyed by a globally unique
//! case-insensitive username, and attach an ordered list of typed content
//! sections (text lists, link collections, image galleries). Anonymous
//! visitors resolve a username to the profile plus its visible sections.
//!
//! # Architecture
//!
//! - `core::content` — closed content-variant registry; validates and
//!   normalizes raw section payloads before persistence
//! - `core::access` — the single pure authorization function; every
//!   mutating store operation consults it
//! - `core::profile` / `core::section` — SQLite-backed stores; uniqueness
//!   and cascade rules live in the schema, not in application checks
//! - `core::public` — anonymous username resolution, the only
//!   unauthenticated read path
//! - `core::broker` — serialized connection access plus a JSONL mutation
//!   audit log (the thin waist all state access routes through)
//!
//! The `biopage` binary is a thin clap surface over these modules;
//! authentication itself is an external collaborator — the core only sees
//! an opaque, already-verified actor id.

pub mod core;
