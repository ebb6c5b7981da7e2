//! # Guildstore - Per-guild configuration and tag store
//!
//! SQLite-backed persistence for a chat bot's per-guild state:
//! - Command prefixes and preferred languages (one value per guild,
//!   last-write-wins)
//! - Assigned role lists (deduplicated, insertion-ordered)
//! - Content-classification tags per site (duplicates allowed,
//!   insertion-ordered) with substring-based fuzzy lookup
//!
//! The [`GuildStore`] owns the single connection to the backing file.
//! Absence of a value is a normal `None` return, never an error.

pub mod config;
pub mod storage;

// Re-exports for convenient access
pub use storage::{GuildStore, StoreStats};

/// Result type alias for guildstore operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for guildstore operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The backing file could not be opened or a write could not be committed
    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    /// Operation invoked after the store was closed
    #[error("Store is closed")]
    Closed,

    /// A caller-supplied identifier violated the documented contract
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
