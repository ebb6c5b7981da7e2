//! SQLite storage implementation

use std::path::Path;

use rusqlite::{Connection, OptionalExtension, params};
use tracing::debug;

use super::schema;
use crate::{Error, Result};

/// SQLite-backed store for per-guild configuration and content tags.
///
/// Owns the single connection to the backing file. The store is `Send`
/// but not `Sync`; access from multiple threads must be serialized by
/// ownership. Every public method commits its change immediately.
///
/// Scope identifiers (`guild_id`, `site`) must be non-empty; an empty
/// identifier yields [`Error::InvalidArgument`]. No other validation or
/// normalization is performed: identifiers and values are case-sensitive
/// exact-match strings stored verbatim.
pub struct GuildStore {
    conn: Option<Connection>,
}

impl GuildStore {
    /// Open a database file (creates if doesn't exist).
    ///
    /// Idempotent: reopening an existing file keeps its data and is not
    /// an error when the schema already exists.
    pub fn open(path: &Path) -> Result<Self> {
        debug!(path = %path.display(), "opening guild store");
        let conn = Connection::open(path)?;
        let store = Self { conn: Some(conn) };
        store.initialize_schema()?;
        Ok(store)
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self { conn: Some(conn) };
        store.initialize_schema()?;
        Ok(store)
    }

    /// Release the underlying connection.
    ///
    /// Any operation after close fails with [`Error::Closed`]. Closing an
    /// already-closed store is a no-op.
    pub fn close(&mut self) -> Result<()> {
        if let Some(conn) = self.conn.take() {
            conn.close().map_err(|(_, e)| Error::Storage(e))?;
            debug!("guild store closed");
        }
        Ok(())
    }

    /// Whether the store has been closed
    pub fn is_closed(&self) -> bool {
        self.conn.is_none()
    }

    /// Initialize the database schema
    fn initialize_schema(&self) -> Result<()> {
        for stmt in schema::all_schema_statements() {
            self.conn()?.execute(stmt, [])?;
        }
        Ok(())
    }

    fn conn(&self) -> Result<&Connection> {
        self.conn.as_ref().ok_or(Error::Closed)
    }

    fn ensure_key(name: &str, value: &str) -> Result<()> {
        if value.is_empty() {
            return Err(Error::InvalidArgument(format!("{name} must be non-empty")));
        }
        Ok(())
    }

    // ========== Prefix Operations ==========

    /// Set the command prefix for a guild, overwriting any prior value
    pub fn set_prefix(&self, guild_id: &str, prefix: &str) -> Result<()> {
        Self::ensure_key("guild_id", guild_id)?;
        self.conn()?.execute(
            "INSERT OR REPLACE INTO prefixes (guild_id, prefix) VALUES (?1, ?2)",
            params![guild_id, prefix],
        )?;
        Ok(())
    }

    /// Get the command prefix for a guild, or `None` if unset
    pub fn get_prefix(&self, guild_id: &str) -> Result<Option<String>> {
        Self::ensure_key("guild_id", guild_id)?;
        self.conn()?
            .query_row(
                "SELECT prefix FROM prefixes WHERE guild_id = ?1",
                [guild_id],
                |row| row.get(0),
            )
            .optional()
            .map_err(Into::into)
    }

    // ========== Language Operations ==========

    /// Set the preferred language for a guild, overwriting any prior value
    pub fn set_language(&self, guild_id: &str, language: &str) -> Result<()> {
        Self::ensure_key("guild_id", guild_id)?;
        self.conn()?.execute(
            "INSERT OR REPLACE INTO languages (guild_id, language) VALUES (?1, ?2)",
            params![guild_id, language],
        )?;
        Ok(())
    }

    /// Get the preferred language for a guild, or `None` if unset
    pub fn get_language(&self, guild_id: &str) -> Result<Option<String>> {
        Self::ensure_key("guild_id", guild_id)?;
        self.conn()?
            .query_row(
                "SELECT language FROM languages WHERE guild_id = ?1",
                [guild_id],
                |row| row.get(0),
            )
            .optional()
            .map_err(Into::into)
    }

    // ========== Tag Operations ==========

    /// Append one tag for a site. Duplicates are allowed and preserved.
    pub fn write_tag(&self, site: &str, tag: &str) -> Result<()> {
        Self::ensure_key("site", site)?;
        self.conn()?.execute(
            "INSERT INTO tags (site, tag) VALUES (?1, ?2)",
            params![site, tag],
        )?;
        Ok(())
    }

    /// Append each tag in order; equivalent to one `write_tag` per element
    pub fn write_tag_list(&self, site: &str, tags: &[String]) -> Result<()> {
        Self::ensure_key("site", site)?;
        let conn = self.conn()?;
        let tx = conn.unchecked_transaction()?;
        {
            let mut stmt = tx.prepare("INSERT INTO tags (site, tag) VALUES (?1, ?2)")?;
            for tag in tags {
                stmt.execute(params![site, tag])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    /// All tags for a site in insertion order, repeats included
    pub fn get_tags(&self, site: &str) -> Result<Vec<String>> {
        Self::ensure_key("site", site)?;
        let conn = self.conn()?;
        let mut stmt = conn.prepare("SELECT tag FROM tags WHERE site = ?1 ORDER BY id")?;
        let tags = stmt
            .query_map([site], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(tags)
    }

    /// Exact-match check: true iff `tag` was written for `site`.
    /// Case-sensitive equality, not fuzzy.
    pub fn tag_in_db(&self, site: &str, tag: &str) -> Result<bool> {
        Self::ensure_key("site", site)?;
        let found = self
            .conn()?
            .query_row(
                "SELECT 1 FROM tags WHERE site = ?1 AND tag = ?2 LIMIT 1",
                params![site, tag],
                |_| Ok(()),
            )
            .optional()?;
        Ok(found.is_some())
    }

    /// Find the first stored tag for `site` that contains `query` as a
    /// contiguous substring (prefix, interior, suffix, or full match).
    ///
    /// The scan runs in insertion order, so ties break deterministically
    /// toward the oldest tag. Matching is byte-wise and case-sensitive;
    /// done in Rust rather than SQL `LIKE`, which is case-insensitive for
    /// ASCII and would change which tag wins. Returns `None` when the site
    /// has no tags or no tag contains `query`.
    pub fn fuzzy_match_tag(&self, site: &str, query: &str) -> Result<Option<String>> {
        Self::ensure_key("site", site)?;
        let conn = self.conn()?;
        let mut stmt = conn.prepare("SELECT tag FROM tags WHERE site = ?1 ORDER BY id")?;
        let rows = stmt.query_map([site], |row| row.get::<_, String>(0))?;
        for tag in rows {
            let tag = tag?;
            if tag.contains(query) {
                return Ok(Some(tag));
            }
        }
        Ok(None)
    }

    // ========== Role Operations ==========

    /// Add a role to a guild's list.
    ///
    /// No-op if the role is already present: the existing entry keeps its
    /// position and no second entry is created.
    pub fn add_role(&self, guild_id: &str, role: &str) -> Result<()> {
        Self::ensure_key("guild_id", guild_id)?;
        self.conn()?.execute(
            "INSERT OR IGNORE INTO roles (guild_id, role) VALUES (?1, ?2)",
            params![guild_id, role],
        )?;
        Ok(())
    }

    /// Remove a role from a guild's list.
    ///
    /// No-op (not an error) if the guild or the role is absent; other
    /// guilds' lists are never affected.
    pub fn remove_role(&self, guild_id: &str, role: &str) -> Result<()> {
        Self::ensure_key("guild_id", guild_id)?;
        self.conn()?.execute(
            "DELETE FROM roles WHERE guild_id = ?1 AND role = ?2",
            params![guild_id, role],
        )?;
        Ok(())
    }

    /// All roles for a guild in first-insertion order.
    /// Empty sequence (never `None`) when the guild has no roles.
    pub fn get_role_list(&self, guild_id: &str) -> Result<Vec<String>> {
        Self::ensure_key("guild_id", guild_id)?;
        let conn = self.conn()?;
        let mut stmt = conn.prepare("SELECT role FROM roles WHERE guild_id = ?1 ORDER BY id")?;
        let roles = stmt
            .query_map([guild_id], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(roles)
    }

    // ========== Maintenance Operations ==========

    /// Delete all data from every table
    pub fn clear_all(&self) -> Result<()> {
        let conn = self.conn()?;
        conn.execute("DELETE FROM prefixes", [])?;
        conn.execute("DELETE FROM languages", [])?;
        conn.execute("DELETE FROM tags", [])?;
        conn.execute("DELETE FROM roles", [])?;
        debug!("guild store cleared");
        Ok(())
    }

    /// Get database statistics
    pub fn stats(&self) -> Result<StoreStats> {
        Ok(StoreStats {
            prefixes: self.count_rows("prefixes")?,
            languages: self.count_rows("languages")?,
            tags: self.count_rows("tags")?,
            roles: self.count_rows("roles")?,
        })
    }

    fn count_rows(&self, table: &str) -> Result<usize> {
        // `table` is one of the fixed schema names, never caller input
        let sql = format!("SELECT COUNT(*) FROM {table}");
        let count: i64 = self.conn()?.query_row(&sql, [], |row| row.get(0))?;
        Ok(count as usize)
    }
}

/// Database statistics
#[derive(Debug, Clone)]
pub struct StoreStats {
    pub prefixes: usize,
    pub languages: usize,
    pub tags: usize,
    pub roles: usize,
}

impl std::fmt::Display for StoreStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Store Statistics:")?;
        writeln!(f, "  Prefixes: {}", self.prefixes)?;
        writeln!(f, "  Languages: {}", self.languages)?;
        writeln!(f, "  Tags: {}", self.tags)?;
        writeln!(f, "  Roles: {}", self.roles)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_prefix_set_get() {
        let store = GuildStore::open_in_memory().unwrap();

        store.set_prefix("foo", "bar").unwrap();
        assert_eq!(store.get_prefix("foo").unwrap(), Some("bar".to_string()));
    }

    #[test]
    fn test_prefix_not_found() {
        let store = GuildStore::open_in_memory().unwrap();

        store.set_prefix("bar", "baz").unwrap();
        assert_eq!(store.get_prefix("foo").unwrap(), None);
    }

    #[test]
    fn test_prefix_overwrite() {
        let store = GuildStore::open_in_memory().unwrap();

        store.set_prefix("foo", "bar").unwrap();
        store.set_prefix("foo", "baz").unwrap();
        assert_eq!(store.get_prefix("foo").unwrap(), Some("baz".to_string()));
    }

    #[test]
    fn test_prefix_case_sensitive_guild() {
        let store = GuildStore::open_in_memory().unwrap();

        store.set_prefix("Foo", "!").unwrap();
        assert_eq!(store.get_prefix("foo").unwrap(), None);
    }

    #[test]
    fn test_language_set_get() {
        let store = GuildStore::open_in_memory().unwrap();

        store.set_language("foo", "en").unwrap();
        assert_eq!(store.get_language("foo").unwrap(), Some("en".to_string()));
    }

    #[test]
    fn test_language_not_found() {
        let store = GuildStore::open_in_memory().unwrap();

        assert_eq!(store.get_language("foo").unwrap(), None);
        store.set_language("foo", "en").unwrap();
        assert_eq!(store.get_language("baz").unwrap(), None);
    }

    #[test]
    fn test_language_overwrite() {
        let store = GuildStore::open_in_memory().unwrap();

        store.set_language("foo", "en").unwrap();
        store.set_language("foo", "fr").unwrap();
        assert_eq!(store.get_language("foo").unwrap(), Some("fr".to_string()));
    }

    #[test]
    fn test_write_tag() {
        let store = GuildStore::open_in_memory().unwrap();

        store.write_tag("foo", "bar").unwrap();
        assert_eq!(store.get_tags("foo").unwrap(), strings(&["bar"]));
    }

    #[test]
    fn test_write_tag_list_round_trip() {
        let store = GuildStore::open_in_memory().unwrap();

        let tags = strings(&["bar", "baz"]);
        store.write_tag_list("foo", &tags).unwrap();
        assert_eq!(store.get_tags("foo").unwrap(), tags);
    }

    #[test]
    fn test_write_tag_list_keeps_duplicates() {
        let store = GuildStore::open_in_memory().unwrap();

        let tags = strings(&["bar", "bar", "baz", "bar"]);
        store.write_tag_list("foo", &tags).unwrap();
        assert_eq!(store.get_tags("foo").unwrap(), tags);
    }

    #[test]
    fn test_tag_in_db_true() {
        let store = GuildStore::open_in_memory().unwrap();

        store.write_tag("bar", "foo").unwrap();
        assert!(store.tag_in_db("bar", "foo").unwrap());
    }

    #[test]
    fn test_tag_in_db_wrong_site() {
        let store = GuildStore::open_in_memory().unwrap();

        store.write_tag("bar", "foo").unwrap();
        assert!(!store.tag_in_db("baz", "foo").unwrap());
    }

    #[test]
    fn test_tag_in_db_wrong_tag() {
        let store = GuildStore::open_in_memory().unwrap();

        store.write_tag("bar", "foo").unwrap();
        assert!(!store.tag_in_db("bar", "baz").unwrap());
    }

    #[test]
    fn test_tag_in_db_is_exact_not_fuzzy() {
        let store = GuildStore::open_in_memory().unwrap();

        store.write_tag("bar", "category").unwrap();
        assert!(!store.tag_in_db("bar", "cat").unwrap());
    }

    #[test]
    fn test_fuzzy_match_tag_front() {
        let store = GuildStore::open_in_memory().unwrap();

        store.write_tag("bar", "foo").unwrap();
        assert_eq!(
            store.fuzzy_match_tag("bar", "f").unwrap(),
            Some("foo".to_string())
        );
    }

    #[test]
    fn test_fuzzy_match_tag_middle() {
        let store = GuildStore::open_in_memory().unwrap();

        store.write_tag("bar", "bar").unwrap();
        assert_eq!(
            store.fuzzy_match_tag("bar", "a").unwrap(),
            Some("bar".to_string())
        );
    }

    #[test]
    fn test_fuzzy_match_tag_end() {
        let store = GuildStore::open_in_memory().unwrap();

        store.write_tag("foo", "bar").unwrap();
        assert_eq!(
            store.fuzzy_match_tag("foo", "ar").unwrap(),
            Some("bar".to_string())
        );
    }

    #[test]
    fn test_fuzzy_match_tag_full() {
        let store = GuildStore::open_in_memory().unwrap();

        store.write_tag("foo", "bar").unwrap();
        assert_eq!(
            store.fuzzy_match_tag("foo", "bar").unwrap(),
            Some("bar".to_string())
        );
    }

    #[test]
    fn test_fuzzy_match_tag_wrong_site() {
        let store = GuildStore::open_in_memory().unwrap();

        store.write_tag("foo", "baz").unwrap();
        assert_eq!(store.fuzzy_match_tag("bar", "baz").unwrap(), None);
    }

    #[test]
    fn test_fuzzy_match_tag_no_match() {
        let store = GuildStore::open_in_memory().unwrap();

        store.write_tag("foo", "bar").unwrap();
        assert_eq!(store.fuzzy_match_tag("foo", "baz").unwrap(), None);
    }

    #[test]
    fn test_fuzzy_match_tag_first_insertion_wins() {
        let store = GuildStore::open_in_memory().unwrap();

        store.write_tag("foo", "scatter").unwrap();
        store.write_tag("foo", "cat").unwrap();
        // Both contain "cat"; the older entry must win, every time
        for _ in 0..3 {
            assert_eq!(
                store.fuzzy_match_tag("foo", "cat").unwrap(),
                Some("scatter".to_string())
            );
        }
    }

    #[test]
    fn test_fuzzy_match_tag_case_sensitive() {
        let store = GuildStore::open_in_memory().unwrap();

        store.write_tag("foo", "Bar").unwrap();
        assert_eq!(store.fuzzy_match_tag("foo", "bar").unwrap(), None);
        assert_eq!(
            store.fuzzy_match_tag("foo", "Bar").unwrap(),
            Some("Bar".to_string())
        );
    }

    #[test]
    fn test_add_role() {
        let store = GuildStore::open_in_memory().unwrap();

        store.add_role("foo", "bar").unwrap();
        assert_eq!(store.get_role_list("foo").unwrap(), strings(&["bar"]));
    }

    #[test]
    fn test_add_role_idempotent() {
        let store = GuildStore::open_in_memory().unwrap();

        store.add_role("foo", "bar").unwrap();
        store.add_role("foo", "baz").unwrap();
        store.add_role("foo", "bar").unwrap();
        assert_eq!(
            store.get_role_list("foo").unwrap(),
            strings(&["bar", "baz"])
        );
    }

    #[test]
    fn test_remove_role_preserves_order() {
        let store = GuildStore::open_in_memory().unwrap();

        for role in ["r", "baz", "qux"] {
            store.add_role("foo", role).unwrap();
        }
        store.remove_role("foo", "r").unwrap();
        assert_eq!(
            store.get_role_list("foo").unwrap(),
            strings(&["baz", "qux"])
        );
    }

    #[test]
    fn test_remove_role_no_guild() {
        let store = GuildStore::open_in_memory().unwrap();

        store.add_role("foo", "baz").unwrap();
        store.add_role("foo", "qux").unwrap();
        store.remove_role("bar", "baz").unwrap();
        assert_eq!(
            store.get_role_list("foo").unwrap(),
            strings(&["baz", "qux"])
        );
    }

    #[test]
    fn test_remove_role_no_role() {
        let store = GuildStore::open_in_memory().unwrap();

        store.add_role("foo", "baz").unwrap();
        store.add_role("foo", "qux").unwrap();
        store.remove_role("foo", "bar").unwrap();
        assert_eq!(
            store.get_role_list("foo").unwrap(),
            strings(&["baz", "qux"])
        );
    }

    #[test]
    fn test_removed_role_readded_at_end() {
        let store = GuildStore::open_in_memory().unwrap();

        for role in ["a", "b", "c"] {
            store.add_role("foo", role).unwrap();
        }
        store.remove_role("foo", "a").unwrap();
        store.add_role("foo", "a").unwrap();
        assert_eq!(
            store.get_role_list("foo").unwrap(),
            strings(&["b", "c", "a"])
        );
    }

    #[test]
    fn test_get_role_list_empty() {
        let store = GuildStore::open_in_memory().unwrap();

        store.add_role("baz", "foo").unwrap();
        assert_eq!(store.get_role_list("qux").unwrap(), Vec::<String>::new());
    }

    #[test]
    fn test_roles_isolated_per_guild() {
        let store = GuildStore::open_in_memory().unwrap();

        store.add_role("g1", "mod").unwrap();
        store.add_role("g2", "mod").unwrap();
        store.remove_role("g1", "mod").unwrap();
        assert_eq!(store.get_role_list("g1").unwrap(), Vec::<String>::new());
        assert_eq!(store.get_role_list("g2").unwrap(), strings(&["mod"]));
    }

    #[test]
    fn test_operations_after_close() {
        let mut store = GuildStore::open_in_memory().unwrap();

        store.set_prefix("foo", "!").unwrap();
        store.close().unwrap();
        assert!(store.is_closed());
        assert!(matches!(store.set_prefix("foo", "?"), Err(Error::Closed)));
        assert!(matches!(store.get_prefix("foo"), Err(Error::Closed)));
        assert!(matches!(store.get_role_list("foo"), Err(Error::Closed)));

        // Double close is a no-op
        store.close().unwrap();
    }

    #[test]
    fn test_empty_scope_identifier_rejected() {
        let store = GuildStore::open_in_memory().unwrap();

        assert!(matches!(
            store.set_prefix("", "!"),
            Err(Error::InvalidArgument(_))
        ));
        assert!(matches!(
            store.write_tag("", "bar"),
            Err(Error::InvalidArgument(_))
        ));
        assert!(matches!(
            store.get_role_list(""),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_reopen_preserves_data() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("guildstore.db");

        {
            let mut store = GuildStore::open(&path).unwrap();
            store.set_prefix("foo", "!").unwrap();
            store.set_language("foo", "en").unwrap();
            store.write_tag_list("site", &strings(&["bar", "baz"])).unwrap();
            store.add_role("foo", "mod").unwrap();
            store.close().unwrap();
        }

        let store = GuildStore::open(&path).unwrap();
        assert_eq!(store.get_prefix("foo").unwrap(), Some("!".to_string()));
        assert_eq!(store.get_language("foo").unwrap(), Some("en".to_string()));
        assert_eq!(store.get_tags("site").unwrap(), strings(&["bar", "baz"]));
        assert_eq!(store.get_role_list("foo").unwrap(), strings(&["mod"]));
    }

    #[test]
    fn test_clear_all() {
        let store = GuildStore::open_in_memory().unwrap();

        store.set_prefix("foo", "!").unwrap();
        store.set_language("foo", "en").unwrap();
        store.write_tag("site", "bar").unwrap();
        store.add_role("foo", "mod").unwrap();

        store.clear_all().unwrap();

        assert_eq!(store.get_prefix("foo").unwrap(), None);
        assert_eq!(store.get_language("foo").unwrap(), None);
        assert_eq!(store.get_tags("site").unwrap(), Vec::<String>::new());
        assert_eq!(store.get_role_list("foo").unwrap(), Vec::<String>::new());
    }

    #[test]
    fn test_stats() {
        let store = GuildStore::open_in_memory().unwrap();

        store.set_prefix("g1", "!").unwrap();
        store.set_prefix("g2", "?").unwrap();
        store.set_language("g1", "en").unwrap();
        store.write_tag_list("site", &strings(&["a", "b", "c"])).unwrap();
        store.add_role("g1", "mod").unwrap();

        let stats = store.stats().unwrap();
        assert_eq!(stats.prefixes, 2);
        assert_eq!(stats.languages, 1);
        assert_eq!(stats.tags, 3);
        assert_eq!(stats.roles, 1);
    }
}
