//! Guildstore CLI - inspect and administer a bot's guild configuration store

use clap::{Parser, Subcommand};
use guildstore::config::{self, StoreConfig};
use guildstore::storage::GuildStore;
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser)]
#[command(name = "guildstore")]
#[command(version = "0.1.0")]
#[command(about = "Per-guild configuration and content-tag store for chat bots")]
#[command(long_about = r#"
Guildstore manages the SQLite file backing a chat bot's per-guild state:
  • Command prefixes and preferred languages (one per guild)
  • Assigned role lists (deduplicated, insertion-ordered)
  • Content tags per site, searchable by substring

Example usage:
  guildstore init --default-prefix "~"
  guildstore set-prefix --guild 1234 --prefix "!"
  guildstore find-tag --site danbooru --query cat
"#)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to the config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Path to the database file (overrides the config file)
    #[arg(short, long, global = true)]
    database: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a config file with database path and per-guild fallbacks
    Init {
        /// Where to write the config file
        #[arg(short, long, default_value = "guildstore.toml")]
        path: PathBuf,

        /// Fallback command prefix for guilds without one
        #[arg(long)]
        default_prefix: Option<String>,

        /// Fallback language for guilds without one
        #[arg(long)]
        default_language: Option<String>,

        /// Overwrite an existing config file
        #[arg(short, long)]
        force: bool,
    },

    /// Set the command prefix for a guild (overwrites any prior value)
    SetPrefix {
        /// Guild identifier
        #[arg(short, long)]
        guild: String,

        /// The prefix to store
        #[arg(short, long)]
        prefix: String,
    },

    /// Show the command prefix for a guild
    GetPrefix {
        /// Guild identifier
        #[arg(short, long)]
        guild: String,
    },

    /// Set the preferred language for a guild (overwrites any prior value)
    SetLanguage {
        /// Guild identifier
        #[arg(short, long)]
        guild: String,

        /// Language code to store
        #[arg(short, long)]
        language: String,
    },

    /// Show the preferred language for a guild
    GetLanguage {
        /// Guild identifier
        #[arg(short, long)]
        guild: String,
    },

    /// Append one or more tags for a site (order preserved, duplicates kept)
    AddTag {
        /// Site identifier (tag namespace)
        #[arg(short, long)]
        site: String,

        /// Tags to append, in order
        #[arg(required = true)]
        tags: Vec<String>,
    },

    /// List all tags for a site in insertion order
    Tags {
        /// Site identifier
        #[arg(short, long)]
        site: String,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Check whether an exact tag exists for a site
    HasTag {
        /// Site identifier
        #[arg(short, long)]
        site: String,

        /// Tag to check (exact, case-sensitive)
        #[arg(short, long)]
        tag: String,
    },

    /// Find the first stored tag containing the query as a substring
    FindTag {
        /// Site identifier
        #[arg(short, long)]
        site: String,

        /// Substring to search for
        #[arg(short, long)]
        query: String,
    },

    /// Add a role to a guild's list (no-op if already present)
    AddRole {
        /// Guild identifier
        #[arg(short, long)]
        guild: String,

        /// Role to add
        #[arg(short, long)]
        role: String,
    },

    /// Remove a role from a guild's list (no-op if absent)
    RemoveRole {
        /// Guild identifier
        #[arg(short, long)]
        guild: String,

        /// Role to remove
        #[arg(short, long)]
        role: String,
    },

    /// List a guild's roles in first-insertion order
    Roles {
        /// Guild identifier
        #[arg(short, long)]
        guild: String,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Show row counts for every table
    Stats,

    /// Delete all data from every table
    Clear {
        /// Actually wipe the store
        #[arg(long)]
        force: bool,
    },
}

fn resolve_database(cli: Option<PathBuf>, config: Option<&StoreConfig>) -> PathBuf {
    cli.or_else(|| {
        config
            .and_then(|c| c.database.as_ref())
            .map(PathBuf::from)
    })
    .unwrap_or_else(config::default_database_path)
}

fn open_store(cli: Option<PathBuf>, config: Option<&StoreConfig>) -> anyhow::Result<GuildStore> {
    let database = resolve_database(cli, config);
    config::ensure_db_dir(&database)?;
    Ok(GuildStore::open(&database)?)
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    let config = config::load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Init { path, default_prefix, default_language, force } => {
            let new_config = StoreConfig {
                database: cli.database.map(|p| p.display().to_string()),
                default_prefix,
                default_language,
            };
            config::write_config(&path, &new_config, force)?;
            println!("Config written to {:?}", path);
        }

        Commands::SetPrefix { guild, prefix } => {
            let store = open_store(cli.database, config.as_ref())?;
            store.set_prefix(&guild, &prefix)?;
            println!("Prefix for guild {} set to '{}'", guild, prefix);
        }

        Commands::GetPrefix { guild } => {
            let store = open_store(cli.database, config.as_ref())?;
            let fallback = config.as_ref().and_then(|c| c.default_prefix.clone());
            match store.get_prefix(&guild)? {
                Some(prefix) => println!("{}", prefix),
                None => match fallback {
                    Some(prefix) => println!("{} (default)", prefix),
                    None => println!("No prefix set for guild {}", guild),
                },
            }
        }

        Commands::SetLanguage { guild, language } => {
            let store = open_store(cli.database, config.as_ref())?;
            store.set_language(&guild, &language)?;
            println!("Language for guild {} set to '{}'", guild, language);
        }

        Commands::GetLanguage { guild } => {
            let store = open_store(cli.database, config.as_ref())?;
            let fallback = config.as_ref().and_then(|c| c.default_language.clone());
            match store.get_language(&guild)? {
                Some(language) => println!("{}", language),
                None => match fallback {
                    Some(language) => println!("{} (default)", language),
                    None => println!("No language set for guild {}", guild),
                },
            }
        }

        Commands::AddTag { site, tags } => {
            let store = open_store(cli.database, config.as_ref())?;
            let count = tags.len();
            store.write_tag_list(&site, &tags)?;
            println!("Appended {} tag(s) to site {}", count, site);
        }

        Commands::Tags { site, format } => {
            let store = open_store(cli.database, config.as_ref())?;
            let tags = store.get_tags(&site)?;

            if format == "json" {
                println!("{}", serde_json::to_string_pretty(&tags)?);
            } else if tags.is_empty() {
                println!("No tags for site {}", site);
            } else {
                for tag in tags {
                    println!("- {}", tag);
                }
            }
        }

        Commands::HasTag { site, tag } => {
            let store = open_store(cli.database, config.as_ref())?;
            println!("{}", store.tag_in_db(&site, &tag)?);
        }

        Commands::FindTag { site, query } => {
            let store = open_store(cli.database, config.as_ref())?;
            match store.fuzzy_match_tag(&site, &query)? {
                Some(tag) => println!("{}", tag),
                None => println!("No tag in site {} contains '{}'", site, query),
            }
        }

        Commands::AddRole { guild, role } => {
            let store = open_store(cli.database, config.as_ref())?;
            store.add_role(&guild, &role)?;
            println!("Role '{}' added to guild {}", role, guild);
        }

        Commands::RemoveRole { guild, role } => {
            let store = open_store(cli.database, config.as_ref())?;
            store.remove_role(&guild, &role)?;
            println!("Role '{}' removed from guild {}", role, guild);
        }

        Commands::Roles { guild, format } => {
            let store = open_store(cli.database, config.as_ref())?;
            let roles = store.get_role_list(&guild)?;

            if format == "json" {
                println!("{}", serde_json::to_string_pretty(&roles)?);
            } else if roles.is_empty() {
                println!("No roles for guild {}", guild);
            } else {
                for role in roles {
                    println!("- {}", role);
                }
            }
        }

        Commands::Stats => {
            let database = resolve_database(cli.database, config.as_ref());
            let store = GuildStore::open(&database)?;
            let stats = store.stats()?;

            println!("Guildstore Statistics ({:?})", database);
            println!("------------------------------------");
            println!("{}", stats);
        }

        Commands::Clear { force } => {
            if !force {
                anyhow::bail!("refusing to wipe the store without --force");
            }
            let store = open_store(cli.database, config.as_ref())?;
            store.clear_all()?;
            println!("Store cleared");
        }
    }

    Ok(())
}
