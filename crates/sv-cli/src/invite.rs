use anyhow::Result;
use chrono::{Duration, Utc};
use clap::{Args, Subcommand};
use sv_core::{SnipVault, TeamRole};

use crate::{print_json, resolve_team, resolve_user};

/// Invitation commands
#[derive(Subcommand)]
pub enum InviteCommands {
    /// Invite an email address to a team
    Send(InviteSendArgs),
    /// Accept an invitation by token
    Accept(InviteAcceptArgs),
    /// Decline an invitation by token
    Decline(InviteDeclineArgs),
    /// Show an invitation by token
    Show(InviteShowArgs),
    /// List a team's invitations
    List(InviteListArgs),
}

#[derive(Args)]
pub struct InviteSendArgs {
    /// Team slug or id
    #[arg(value_name = "TEAM")]
    pub team: String,

    /// Email address to invite
    #[arg(value_name = "EMAIL")]
    pub email: String,

    /// Role granted on acceptance (admin, member, viewer)
    #[arg(long = "role", value_name = "ROLE", default_value = "member")]
    pub role: String,

    /// Hours until the invitation lapses
    #[arg(long = "expires-in", value_name = "HOURS", default_value = "168")]
    pub expires_in: i64,

    /// Acting user
    #[arg(long = "as", value_name = "USERNAME")]
    pub acting_user: String,
}

#[derive(Args)]
pub struct InviteAcceptArgs {
    /// Invitation token
    #[arg(value_name = "TOKEN")]
    pub token: String,

    /// Acting user
    #[arg(long = "as", value_name = "USERNAME")]
    pub acting_user: String,
}

#[derive(Args)]
pub struct InviteDeclineArgs {
    /// Invitation token
    #[arg(value_name = "TOKEN")]
    pub token: String,

    /// Acting user
    #[arg(long = "as", value_name = "USERNAME")]
    pub acting_user: String,
}

#[derive(Args)]
pub struct InviteShowArgs {
    /// Invitation token
    #[arg(value_name = "TOKEN")]
    pub token: String,

    /// Output as JSON
    #[arg(long = "json")]
    pub json: bool,
}

#[derive(Args)]
pub struct InviteListArgs {
    /// Team slug or id
    #[arg(value_name = "TEAM")]
    pub team: String,

    /// Output as JSON
    #[arg(long = "json")]
    pub json: bool,
}

impl InviteCommands {
    pub fn run(self, vault: &SnipVault) -> Result<()> {
        match self {
            InviteCommands::Send(args) => args.run(vault),
            InviteCommands::Accept(args) => args.run(vault),
            InviteCommands::Decline(args) => args.run(vault),
            InviteCommands::Show(args) => args.run(vault),
            InviteCommands::List(args) => args.run(vault),
        }
    }
}

impl InviteSendArgs {
    pub fn run(self, vault: &SnipVault) -> Result<()> {
        let team = resolve_team(vault, &self.team)?;
        let inviter = resolve_user(vault, &self.acting_user)?;
        let role: TeamRole = self.role.parse()?;

        if let Some(pending) = vault.invitations().pending_for(team.id, &self.email)? {
            anyhow::bail!(
                "{} already has a pending invitation to {} (token {})",
                self.email,
                team.name,
                pending.token
            );
        }

        let expires_at = Utc::now() + Duration::hours(self.expires_in);
        let invitation =
            vault
                .invitations()
                .invite(team.id, inviter.id, &self.email, role, expires_at)?;
        println!("Invited {} to {} as {}", invitation.email, team.name, invitation.role);
        println!("Token: {}", invitation.token);
        println!("Expires: {}", invitation.expires_at);
        Ok(())
    }
}

impl InviteAcceptArgs {
    pub fn run(self, vault: &SnipVault) -> Result<()> {
        let user = resolve_user(vault, &self.acting_user)?;
        let membership = vault.invitations().accept(&self.token, user.id)?;
        println!(
            "{} joined team {} as {}",
            user.username, membership.team_id, membership.role
        );
        Ok(())
    }
}

impl InviteDeclineArgs {
    pub fn run(self, vault: &SnipVault) -> Result<()> {
        let user = resolve_user(vault, &self.acting_user)?;
        vault.invitations().decline(&self.token, user.id)?;
        println!("Declined invitation {}", self.token);
        Ok(())
    }
}

impl InviteShowArgs {
    pub fn run(self, vault: &SnipVault) -> Result<()> {
        let invitation = vault.invitations().get_by_token(&self.token)?;
        if self.json {
            return print_json(&invitation);
        }
        println!("Invitation for {} (team {})", invitation.email, invitation.team_id);
        println!("Role: {}", invitation.role);
        println!("Status: {}", invitation.status);
        println!("Expires: {}", invitation.expires_at);
        if let Some(accepted_at) = &invitation.accepted_at {
            println!("Accepted: {}", accepted_at);
        }
        Ok(())
    }
}

impl InviteListArgs {
    pub fn run(self, vault: &SnipVault) -> Result<()> {
        let team = resolve_team(vault, &self.team)?;
        let invitations = vault.invitations().list_for_team(team.id)?;
        if self.json {
            return print_json(&invitations);
        }
        for invitation in invitations {
            println!(
                "{} as {} [{}] expires {}",
                invitation.email, invitation.role, invitation.status, invitation.expires_at
            );
        }
        Ok(())
    }
}
