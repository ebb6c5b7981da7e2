use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Bot-level store settings, loaded from `guildstore.toml`.
///
/// `default_prefix` and `default_language` are fallbacks applied by
/// consumers (the CLI, the bot's command layer) when a guild has no
/// stored value; the store itself never applies them.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StoreConfig {
    pub database: Option<String>,
    pub default_prefix: Option<String>,
    pub default_language: Option<String>,
}

pub fn default_config_path() -> PathBuf {
    PathBuf::from("guildstore.toml")
}

pub fn default_database_path() -> PathBuf {
    PathBuf::from("guildstore.db")
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<Option<StoreConfig>> {
    let path = path.map(Path::to_path_buf).unwrap_or_else(default_config_path);
    if !path.exists() {
        return Ok(None);
    }

    let contents = std::fs::read_to_string(&path)?;
    let config: StoreConfig = toml::from_str(&contents)?;
    Ok(Some(config))
}

pub fn write_config(path: &Path, config: &StoreConfig, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        anyhow::bail!("config already exists at {} (use --force to overwrite)", path.display());
    }

    let contents = toml::to_string_pretty(config)?;
    std::fs::write(path, contents)?;
    Ok(())
}

pub fn ensure_db_dir(db_path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}
