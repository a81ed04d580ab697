use anyhow::Result;
use clap::{Args, Subcommand};
use sv_core::SnipVault;

use crate::{print_json, resolve_user};

/// Notification feed commands
#[derive(Subcommand)]
pub enum NotifyCommands {
    /// List notifications, newest first
    List(NotifyListArgs),
    /// Mark one notification read
    Read(NotifyReadArgs),
    /// Mark every notification read
    ReadAll(NotifyReadAllArgs),
}

#[derive(Args)]
pub struct NotifyListArgs {
    /// Acting user
    #[arg(long = "as", value_name = "USERNAME")]
    pub acting_user: String,

    /// Cap on returned rows
    #[arg(long = "limit", value_name = "N", default_value = "20")]
    pub limit: i64,

    /// Output as JSON
    #[arg(long = "json")]
    pub json: bool,
}

#[derive(Args)]
pub struct NotifyReadArgs {
    /// Notification id
    #[arg(value_name = "ID")]
    pub id: i64,

    /// Acting user
    #[arg(long = "as", value_name = "USERNAME")]
    pub acting_user: String,
}

#[derive(Args)]
pub struct NotifyReadAllArgs {
    /// Acting user
    #[arg(long = "as", value_name = "USERNAME")]
    pub acting_user: String,
}

impl NotifyCommands {
    pub fn run(self, vault: &SnipVault) -> Result<()> {
        match self {
            NotifyCommands::List(args) => {
                let user = resolve_user(vault, &args.acting_user)?;
                let feed = vault.notifications().list(user.id, args.limit)?;
                if args.json {
                    return print_json(&feed);
                }
                let unread = vault.notifications().unread_count(user.id)?;
                println!("{} notifications ({} unread)", feed.len(), unread);
                for notification in feed {
                    let marker = if notification.read_at.is_some() { " " } else { "*" };
                    println!(
                        "{} #{} [{}] {}",
                        marker, notification.id, notification.kind, notification.subject
                    );
                }
                Ok(())
            }
            NotifyCommands::Read(args) => {
                let user = resolve_user(vault, &args.acting_user)?;
                if vault.notifications().mark_read(user.id, args.id)? {
                    println!("Marked notification {} read", args.id);
                } else {
                    println!("Nothing to mark");
                }
                Ok(())
            }
            NotifyCommands::ReadAll(args) => {
                let user = resolve_user(vault, &args.acting_user)?;
                let flipped = vault.notifications().mark_all_read(user.id)?;
                println!("Marked {} notifications read", flipped);
                Ok(())
            }
        }
    }
}
