//! Database schema definitions

/// SQL to create the prefixes table
/// One command prefix per guild, last write wins
pub const CREATE_PREFIXES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS prefixes (
    guild_id TEXT PRIMARY KEY,
    prefix TEXT NOT NULL
)
"#;

/// SQL to create the languages table
/// Same shape and lifecycle as prefixes
pub const CREATE_LANGUAGES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS languages (
    guild_id TEXT PRIMARY KEY,
    language TEXT NOT NULL
)
"#;

/// SQL to create the tags table
/// Duplicates are allowed and meaningful; `id` carries insertion order
pub const CREATE_TAGS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS tags (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    site TEXT NOT NULL,
    tag TEXT NOT NULL
)
"#;

/// SQL to create the roles table
/// `id` carries first-insertion order; the UNIQUE constraint makes
/// re-adds no-ops that keep the original row
pub const CREATE_ROLES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS roles (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    guild_id TEXT NOT NULL,
    role TEXT NOT NULL,
    UNIQUE(guild_id, role)
)
"#;

/// SQL to create indexes
pub const CREATE_INDEXES: &[&str] = &[
    "CREATE INDEX IF NOT EXISTS idx_tags_site ON tags(site)",
    "CREATE INDEX IF NOT EXISTS idx_roles_guild ON roles(guild_id)",
];

/// All schema creation statements
pub fn all_schema_statements() -> Vec<&'static str> {
    let mut stmts = vec![
        CREATE_PREFIXES_TABLE,
        CREATE_LANGUAGES_TABLE,
        CREATE_TAGS_TABLE,
        CREATE_ROLES_TABLE,
    ];
    stmts.extend(CREATE_INDEXES.iter().copied());
    stmts
}
