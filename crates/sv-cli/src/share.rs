use anyhow::Result;
use chrono::{Duration, Utc};
use clap::{Args, Subcommand};
use sv_core::{NewShare, ShareGrant, SharePermission, SnipVault};

use crate::{print_json, resolve_team, resolve_user};

/// Share grant commands
#[derive(Subcommand)]
pub enum ShareCommands {
    /// Grant access to a snippet
    Create(ShareCreateArgs),
    /// Resolve a share token to its snippet
    Resolve(ShareResolveArgs),
    /// Revoke a share
    Revoke(ShareRevokeArgs),
    /// Reactivate a revoked share
    Reactivate(ShareReactivateArgs),
    /// List a snippet's shares
    List(ShareListArgs),
}

#[derive(Args)]
pub struct ShareCreateArgs {
    /// Snippet id to share
    #[arg(value_name = "SNIPPET")]
    pub snippet: i64,

    /// Create an anyone-with-the-link share
    #[arg(long = "link")]
    pub link: bool,

    /// Grant to a registered user
    #[arg(long = "user", value_name = "USERNAME")]
    pub user: Option<String>,

    /// Grant to a whole team
    #[arg(long = "team", value_name = "TEAM")]
    pub team: Option<String>,

    /// Grant to an email address
    #[arg(long = "email", value_name = "EMAIL")]
    pub email: Option<String>,

    /// Permission carried by the grant (view or edit)
    #[arg(long = "permission", value_name = "PERM", default_value = "view")]
    pub permission: String,

    /// Hours until the share lapses (never when omitted)
    #[arg(long = "expires-in", value_name = "HOURS")]
    pub expires_in: Option<i64>,

    /// Acting user
    #[arg(long = "as", value_name = "USERNAME")]
    pub acting_user: String,
}

#[derive(Args)]
pub struct ShareResolveArgs {
    /// Share token
    #[arg(value_name = "TOKEN")]
    pub token: String,

    /// Output as JSON
    #[arg(long = "json")]
    pub json: bool,
}

#[derive(Args)]
pub struct ShareRevokeArgs {
    /// Share id
    #[arg(value_name = "ID")]
    pub id: i64,

    /// Acting user
    #[arg(long = "as", value_name = "USERNAME")]
    pub acting_user: String,
}

#[derive(Args)]
pub struct ShareReactivateArgs {
    /// Share id
    #[arg(value_name = "ID")]
    pub id: i64,

    /// Acting user
    #[arg(long = "as", value_name = "USERNAME")]
    pub acting_user: String,
}

#[derive(Args)]
pub struct ShareListArgs {
    /// Snippet id
    #[arg(value_name = "SNIPPET")]
    pub snippet: i64,

    /// Acting user
    #[arg(long = "as", value_name = "USERNAME")]
    pub acting_user: String,

    /// Output as JSON
    #[arg(long = "json")]
    pub json: bool,
}

impl ShareCommands {
    pub fn run(self, vault: &SnipVault) -> Result<()> {
        match self {
            ShareCommands::Create(args) => args.run(vault),
            ShareCommands::Resolve(args) => args.run(vault),
            ShareCommands::Revoke(args) => args.run(vault),
            ShareCommands::Reactivate(args) => args.run(vault),
            ShareCommands::List(args) => args.run(vault),
        }
    }
}

impl ShareCreateArgs {
    pub fn run(self, vault: &SnipVault) -> Result<()> {
        let granter = resolve_user(vault, &self.acting_user)?;
        let permission: SharePermission = self.permission.parse()?;

        let chosen = [self.link, self.user.is_some(), self.team.is_some(), self.email.is_some()];
        if chosen.iter().filter(|flag| **flag).count() != 1 {
            anyhow::bail!("Error: use exactly one of --link, --user, --team, or --email");
        }
        let grant = if self.link {
            ShareGrant::Link
        } else if let Some(username) = &self.user {
            ShareGrant::User(resolve_user(vault, username)?.id)
        } else if let Some(team) = &self.team {
            ShareGrant::Team(resolve_team(vault, team)?.id)
        } else {
            ShareGrant::Email(self.email.clone().unwrap_or_default())
        };

        let expires_at = self.expires_in.map(|hours| Utc::now() + Duration::hours(hours));
        let share = vault.shares().create(
            granter.id,
            NewShare {
                snippet_id: self.snippet,
                grant,
                permission,
                expires_at,
            },
        )?;

        println!("Created {} share {} on snippet {}", share.share_type, share.id, self.snippet);
        if let Some(token) = &share.token {
            println!("Token: {}", token);
        }
        if let Some(expires_at) = &share.expires_at {
            println!("Expires: {}", expires_at);
        }
        Ok(())
    }
}

impl ShareResolveArgs {
    pub fn run(self, vault: &SnipVault) -> Result<()> {
        let (share, snippet) = vault.shares().resolve_token(&self.token)?;
        if self.json {
            return print_json(&serde_json::json!({ "share": share, "snippet": snippet }));
        }
        println!("Snippet: {} (id {})", snippet.title, snippet.id);
        println!("Permission: {}", share.permission);
        println!("Accesses: {}", share.access_count);
        println!("---");
        print!("{}", snippet.code);
        if !snippet.code.ends_with('\n') {
            println!();
        }
        Ok(())
    }
}

impl ShareRevokeArgs {
    pub fn run(self, vault: &SnipVault) -> Result<()> {
        let actor = resolve_user(vault, &self.acting_user)?;
        vault.shares().revoke(self.id, actor.id)?;
        println!("Revoked share {}", self.id);
        Ok(())
    }
}

impl ShareReactivateArgs {
    pub fn run(self, vault: &SnipVault) -> Result<()> {
        let actor = resolve_user(vault, &self.acting_user)?;
        vault.shares().reactivate(self.id, actor.id)?;
        println!("Reactivated share {}", self.id);
        Ok(())
    }
}

impl ShareListArgs {
    pub fn run(self, vault: &SnipVault) -> Result<()> {
        let actor = resolve_user(vault, &self.acting_user)?;
        let shares = vault.shares().list_for_snippet(self.snippet, actor.id)?;
        if self.json {
            return print_json(&shares);
        }
        for share in shares {
            let state = if share.is_active == 0 {
                "revoked"
            } else if vault.shares().is_valid(&share)? {
                "active"
            } else {
                "expired"
            };
            let expiry = share.expires_at.as_deref().unwrap_or("never");
            println!(
                "share {} [{}] {} {} accesses {} expires {}",
                share.id, state, share.share_type, share.permission, share.access_count, expiry
            );
        }
        Ok(())
    }
}
