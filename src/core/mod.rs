//! Core modules: the storage, validation, and authorization engine.
//!
//! The calling surface (CLI today, HTTP tomorrow) is a thin collaborator;
//! everything that has to be correct lives here.

pub mod access;
pub mod broker;
pub mod content;
pub mod db;
pub mod error;
pub mod profile;
pub mod public;
pub mod schemas;
pub mod section;
pub mod time;
