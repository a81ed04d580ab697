//! SnipVault CLI library

pub mod audit;
pub mod collection;
pub mod invite;
pub mod notify;
pub mod share;
pub mod snippet;
pub mod social;
pub mod team;
pub mod user;

// Re-export CLI types for testing
pub use clap::{Parser, Subcommand};

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use sv_core::SnipVault;
use sv_local_db::{TeamRecord, UserRecord};

#[derive(Parser)]
#[command(name = "sv")]
#[command(about = "SnipVault - code snippet sharing from the terminal")]
#[command(version, author, long_about = None)]
pub struct Cli {
    /// Database file (defaults to SNIPVAULT_DB_PATH or the platform state dir)
    #[arg(long = "db", value_name = "PATH", global = true)]
    pub db: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long = "log-level", value_name = "LEVEL", default_value = "warn", global = true)]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// User registration and lookup
    User {
        #[command(subcommand)]
        subcommand: user::UserCommands,
    },
    /// Team management
    Team {
        #[command(subcommand)]
        subcommand: team::TeamCommands,
    },
    /// Team invitations
    Invite {
        #[command(subcommand)]
        subcommand: invite::InviteCommands,
    },
    /// Snippet lifecycle
    Snippet {
        #[command(subcommand)]
        subcommand: snippet::SnippetCommands,
    },
    /// Share grants
    Share {
        #[command(subcommand)]
        subcommand: share::ShareCommands,
    },
    /// Favorites, follows and comments
    Social {
        #[command(subcommand)]
        subcommand: social::SocialCommands,
    },
    /// Snippet collections
    Collection {
        #[command(subcommand)]
        subcommand: collection::CollectionCommands,
    },
    /// Notification feed
    Notify {
        #[command(subcommand)]
        subcommand: notify::NotifyCommands,
    },
    /// Audit trail
    Audit {
        #[command(subcommand)]
        subcommand: audit::AuditCommands,
    },
}

/// Open the vault for a command invocation.
pub fn open_vault(db: Option<&Path>) -> Result<SnipVault> {
    match db {
        Some(path) => SnipVault::open(path)
            .with_context(|| format!("failed to open database at {}", path.display())),
        None => SnipVault::open_default().context("failed to open the default database"),
    }
}

/// Resolve the `--as` username to a user record.
pub fn resolve_user(vault: &SnipVault, username: &str) -> Result<UserRecord> {
    vault
        .users()
        .get_by_username(username)
        .with_context(|| format!("unknown user: {}", username))
}

/// Resolve a team argument, accepting a slug or a numeric id.
pub fn resolve_team(vault: &SnipVault, team: &str) -> Result<TeamRecord> {
    let teams = vault.teams();
    let record = match team.parse::<i64>() {
        Ok(id) => teams.get(id),
        Err(_) => teams.get_by_slug(team),
    };
    record.with_context(|| format!("unknown team: {}", team))
}

pub fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
