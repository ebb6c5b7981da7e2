//! Storage Layer - SQLite-backed persistence
//!
//! System of record is SQLite with tables:
//! - prefixes(guild_id, prefix)
//! - languages(guild_id, language)
//! - tags(id, site, tag)
//! - roles(id, guild_id, role)

pub mod schema;
pub mod sqlite;

pub use sqlite::{GuildStore, StoreStats};
