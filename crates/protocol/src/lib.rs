//! Data types shared across the tfs-rs workspace.
//!
//! This crate contains the serde-serializable shapes used to configure a
//! server session and to describe change sets and workspaces as they come
//! back from a Team Foundation Server.
//!
//! # Design Philosophy
//!
//! Types in this crate are:
//! * Pure data: No behavior beyond serialization and small accessors
//! * Immutable once built: Sessions read them, never write them
//! * Stable: Changes only when the configuration format changes
//!
//! Session management, credential and proxy resolution live in `tfs-rs`.

pub mod changeset;
pub mod config;
pub mod secret;
pub mod workspace;

pub use changeset::*;
pub use config::*;
pub use secret::*;
pub use workspace::*;
