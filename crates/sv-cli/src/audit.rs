use anyhow::Result;
use clap::{Args, Subcommand};
use sv_core::SnipVault;

use crate::print_json;

/// Audit trail commands
#[derive(Subcommand)]
pub enum AuditCommands {
    /// Show recent audit entries
    Recent(AuditRecentArgs),
    /// Show the audit entries for one entity
    Entity(AuditEntityArgs),
}

#[derive(Args)]
pub struct AuditRecentArgs {
    /// Cap on returned rows
    #[arg(long = "limit", value_name = "N", default_value = "20")]
    pub limit: i64,

    /// Output as JSON
    #[arg(long = "json")]
    pub json: bool,
}

#[derive(Args)]
pub struct AuditEntityArgs {
    /// Entity kind (snippet, team, invitation, share)
    #[arg(value_name = "KIND")]
    pub kind: String,

    /// Entity id
    #[arg(value_name = "ID")]
    pub id: i64,

    /// Output as JSON
    #[arg(long = "json")]
    pub json: bool,
}

impl AuditCommands {
    pub fn run(self, vault: &SnipVault) -> Result<()> {
        match self {
            AuditCommands::Recent(args) => {
                let entries = vault.audit().recent(args.limit)?;
                if args.json {
                    return print_json(&entries);
                }
                print_entries(entries);
                Ok(())
            }
            AuditCommands::Entity(args) => {
                let entries = vault.audit().for_entity(&args.kind, args.id)?;
                if args.json {
                    return print_json(&entries);
                }
                print_entries(entries);
                Ok(())
            }
        }
    }
}

fn print_entries(entries: Vec<sv_local_db::AuditLogRecord>) {
    for entry in entries {
        let actor = entry
            .actor_id
            .map(|id| format!("user {}", id))
            .unwrap_or_else(|| "system".to_string());
        let detail = entry.detail.as_deref().unwrap_or("");
        println!(
            "{} {} {} {} {} {}",
            entry.created_at, actor, entry.action, entry.entity_kind, entry.entity_id, detail
        );
    }
}
