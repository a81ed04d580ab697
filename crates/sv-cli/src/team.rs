use anyhow::Result;
use clap::{Args, Subcommand};
use sv_core::{NewTeam, Privacy, SnipVault, TeamRole};

use crate::{print_json, resolve_team, resolve_user};

/// Team management commands
#[derive(Subcommand)]
pub enum TeamCommands {
    /// Create a new team
    Create(TeamCreateArgs),
    /// Show a team
    Show(TeamShowArgs),
    /// List a team's membership rows
    Members(TeamMembersArgs),
    /// Add a member directly
    AddMember(TeamAddMemberArgs),
    /// Remove a member
    RemoveMember(TeamRemoveMemberArgs),
    /// Change a member's role
    SetRole(TeamSetRoleArgs),
    /// Leave a team
    Leave(TeamLeaveArgs),
    /// Delete a team
    Delete(TeamDeleteArgs),
    /// List the teams a user participates in
    List(TeamListArgs),
}

#[derive(Args)]
pub struct TeamCreateArgs {
    /// Team name
    #[arg(value_name = "NAME")]
    pub name: String,

    /// URL slug (derived from the name when omitted)
    #[arg(long = "slug", value_name = "SLUG")]
    pub slug: Option<String>,

    /// Team privacy (public or private)
    #[arg(long = "privacy", value_name = "PRIVACY", default_value = "private")]
    pub privacy: String,

    /// Team description
    #[arg(long = "description", value_name = "TEXT")]
    pub description: Option<String>,

    /// Acting user
    #[arg(long = "as", value_name = "USERNAME")]
    pub acting_user: String,
}

#[derive(Args)]
pub struct TeamShowArgs {
    /// Team slug or id
    #[arg(value_name = "TEAM")]
    pub team: String,

    /// Output as JSON
    #[arg(long = "json")]
    pub json: bool,
}

#[derive(Args)]
pub struct TeamMembersArgs {
    /// Team slug or id
    #[arg(value_name = "TEAM")]
    pub team: String,

    /// Output as JSON
    #[arg(long = "json")]
    pub json: bool,
}

#[derive(Args)]
pub struct TeamAddMemberArgs {
    /// Team slug or id
    #[arg(value_name = "TEAM")]
    pub team: String,

    /// Username to add
    #[arg(value_name = "USERNAME")]
    pub username: String,

    /// Role (admin, member, viewer)
    #[arg(long = "role", value_name = "ROLE", default_value = "member")]
    pub role: String,

    /// Acting user
    #[arg(long = "as", value_name = "USERNAME")]
    pub acting_user: String,
}

#[derive(Args)]
pub struct TeamRemoveMemberArgs {
    /// Team slug or id
    #[arg(value_name = "TEAM")]
    pub team: String,

    /// Username to remove
    #[arg(value_name = "USERNAME")]
    pub username: String,

    /// Acting user
    #[arg(long = "as", value_name = "USERNAME")]
    pub acting_user: String,
}

#[derive(Args)]
pub struct TeamSetRoleArgs {
    /// Team slug or id
    #[arg(value_name = "TEAM")]
    pub team: String,

    /// Username whose role changes
    #[arg(value_name = "USERNAME")]
    pub username: String,

    /// New role (admin, member, viewer)
    #[arg(value_name = "ROLE")]
    pub role: String,

    /// Acting user
    #[arg(long = "as", value_name = "USERNAME")]
    pub acting_user: String,
}

#[derive(Args)]
pub struct TeamLeaveArgs {
    /// Team slug or id
    #[arg(value_name = "TEAM")]
    pub team: String,

    /// Acting user
    #[arg(long = "as", value_name = "USERNAME")]
    pub acting_user: String,
}

#[derive(Args)]
pub struct TeamDeleteArgs {
    /// Team slug or id
    #[arg(value_name = "TEAM")]
    pub team: String,

    /// Acting user
    #[arg(long = "as", value_name = "USERNAME")]
    pub acting_user: String,
}

#[derive(Args)]
pub struct TeamListArgs {
    /// User whose teams to list
    #[arg(long = "as", value_name = "USERNAME")]
    pub acting_user: String,

    /// Output as JSON
    #[arg(long = "json")]
    pub json: bool,
}

impl TeamCommands {
    pub fn run(self, vault: &SnipVault) -> Result<()> {
        match self {
            TeamCommands::Create(args) => args.run(vault),
            TeamCommands::Show(args) => args.run(vault),
            TeamCommands::Members(args) => args.run(vault),
            TeamCommands::AddMember(args) => args.run(vault),
            TeamCommands::RemoveMember(args) => args.run(vault),
            TeamCommands::SetRole(args) => args.run(vault),
            TeamCommands::Leave(args) => args.run(vault),
            TeamCommands::Delete(args) => args.run(vault),
            TeamCommands::List(args) => args.run(vault),
        }
    }
}

impl TeamCreateArgs {
    pub fn run(self, vault: &SnipVault) -> Result<()> {
        let owner = resolve_user(vault, &self.acting_user)?;
        let privacy: Privacy = self.privacy.parse()?;
        let team = vault.teams().create_team(
            owner.id,
            NewTeam {
                name: self.name,
                slug: self.slug,
                privacy,
                description: self.description,
            },
        )?;
        println!("Created team {} (slug {}, id {})", team.name, team.slug, team.id);
        Ok(())
    }
}

impl TeamShowArgs {
    pub fn run(self, vault: &SnipVault) -> Result<()> {
        let team = resolve_team(vault, &self.team)?;
        if self.json {
            return print_json(&team);
        }
        println!("Team: {} (id {})", team.name, team.id);
        println!("Slug: {}", team.slug);
        println!("Privacy: {}", team.privacy);
        if let Some(description) = &team.description {
            println!("Description: {}", description);
        }
        println!("Members: {}", team.member_count);
        println!("Snippets: {}", team.snippet_count);
        Ok(())
    }
}

impl TeamMembersArgs {
    pub fn run(self, vault: &SnipVault) -> Result<()> {
        let team = resolve_team(vault, &self.team)?;
        let members = vault.teams().members(team.id)?;
        if self.json {
            return print_json(&members);
        }
        println!("Members of {} (the owner is implicit):", team.name);
        for member in members {
            println!("  user {} as {} since {}", member.user_id, member.role, member.joined_at);
        }
        Ok(())
    }
}

impl TeamAddMemberArgs {
    pub fn run(self, vault: &SnipVault) -> Result<()> {
        let team = resolve_team(vault, &self.team)?;
        let user = resolve_user(vault, &self.username)?;
        let actor = resolve_user(vault, &self.acting_user)?;
        let role: TeamRole = self.role.parse()?;
        let membership = vault.teams().add_member(team.id, user.id, role, actor.id)?;
        println!("Added {} to {} as {}", user.username, team.name, membership.role);
        Ok(())
    }
}

impl TeamRemoveMemberArgs {
    pub fn run(self, vault: &SnipVault) -> Result<()> {
        let team = resolve_team(vault, &self.team)?;
        let user = resolve_user(vault, &self.username)?;
        let actor = resolve_user(vault, &self.acting_user)?;
        vault.teams().remove_member(team.id, user.id, actor.id)?;
        println!("Removed {} from {}", user.username, team.name);
        Ok(())
    }
}

impl TeamSetRoleArgs {
    pub fn run(self, vault: &SnipVault) -> Result<()> {
        let team = resolve_team(vault, &self.team)?;
        let user = resolve_user(vault, &self.username)?;
        let actor = resolve_user(vault, &self.acting_user)?;
        let role: TeamRole = self.role.parse()?;
        let membership = vault.teams().change_role(team.id, user.id, role, actor.id)?;
        println!("{} is now {} in {}", user.username, membership.role, team.name);
        Ok(())
    }
}

impl TeamLeaveArgs {
    pub fn run(self, vault: &SnipVault) -> Result<()> {
        let team = resolve_team(vault, &self.team)?;
        let user = resolve_user(vault, &self.acting_user)?;
        vault.teams().leave(team.id, user.id)?;
        println!("{} left {}", user.username, team.name);
        Ok(())
    }
}

impl TeamDeleteArgs {
    pub fn run(self, vault: &SnipVault) -> Result<()> {
        let team = resolve_team(vault, &self.team)?;
        let actor = resolve_user(vault, &self.acting_user)?;
        vault.teams().delete_team(team.id, actor.id)?;
        println!("Deleted team {}", team.name);
        Ok(())
    }
}

impl TeamListArgs {
    pub fn run(self, vault: &SnipVault) -> Result<()> {
        let user = resolve_user(vault, &self.acting_user)?;
        let teams = vault.teams().teams_for_user(user.id)?;
        if self.json {
            return print_json(&teams);
        }
        for team in teams {
            println!("{} (slug {}, {} members)", team.name, team.slug, team.member_count);
        }
        Ok(())
    }
}
