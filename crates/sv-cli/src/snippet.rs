use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use sv_core::{NewSnippet, Privacy, SnipVault};

use crate::{print_json, resolve_team, resolve_user};

/// Snippet lifecycle commands
#[derive(Subcommand)]
pub enum SnippetCommands {
    /// Create a new snippet
    Create(SnippetCreateArgs),
    /// Show a snippet
    Show(SnippetShowArgs),
    /// Save a new version of a snippet's code
    Edit(SnippetEditArgs),
    /// Fork a snippet into your own
    Fork(SnippetForkArgs),
    /// Delete a snippet
    Delete(SnippetDeleteArgs),
    /// Restore a deleted snippet
    Restore(SnippetRestoreArgs),
    /// Show a snippet's version history
    History(SnippetHistoryArgs),
    /// Roll a snippet back to an earlier version
    Revert(SnippetRevertArgs),
    /// Count a view of a snippet
    View(SnippetViewArgs),
    /// Change a snippet's privacy
    SetPrivacy(SnippetSetPrivacyArgs),
    /// Replace, add to, or remove from a snippet's tags
    Tag(SnippetTagArgs),
    /// List snippets
    List(SnippetListArgs),
}

#[derive(Args)]
pub struct SnippetCreateArgs {
    /// Snippet title
    #[arg(value_name = "TITLE")]
    pub title: String,

    /// Language of the code
    #[arg(long = "language", value_name = "LANG")]
    pub language: String,

    /// Use STRING as the snippet code (direct input)
    #[arg(long = "code", value_name = "TEXT")]
    pub code: Option<String>,

    /// Read the snippet code from FILE
    #[arg(long = "code-file", value_name = "FILE")]
    pub code_file: Option<PathBuf>,

    /// Snippet description
    #[arg(long = "description", value_name = "TEXT")]
    pub description: Option<String>,

    /// Privacy (public, private, team, unlisted)
    #[arg(long = "privacy", value_name = "PRIVACY", default_value = "private")]
    pub privacy: String,

    /// Team slug or id for team-scoped snippets
    #[arg(long = "team", value_name = "TEAM")]
    pub team: Option<String>,

    /// Tags to attach (repeatable)
    #[arg(long = "tag", value_name = "NAME")]
    pub tags: Vec<String>,

    /// Acting user
    #[arg(long = "as", value_name = "USERNAME")]
    pub acting_user: String,
}

#[derive(Args)]
pub struct SnippetShowArgs {
    /// Snippet id
    #[arg(value_name = "ID")]
    pub id: i64,

    /// Acting user (omit for anonymous access)
    #[arg(long = "as", value_name = "USERNAME")]
    pub acting_user: Option<String>,

    /// Show a historic version instead of the current code
    #[arg(long = "version", value_name = "N")]
    pub version: Option<i64>,

    /// Output as JSON
    #[arg(long = "json")]
    pub json: bool,
}

#[derive(Args)]
pub struct SnippetEditArgs {
    /// Snippet id
    #[arg(value_name = "ID")]
    pub id: i64,

    /// Use STRING as the new code (direct input)
    #[arg(long = "code", value_name = "TEXT")]
    pub code: Option<String>,

    /// Read the new code from FILE
    #[arg(long = "code-file", value_name = "FILE")]
    pub code_file: Option<PathBuf>,

    /// Change summary recorded with the version
    #[arg(long = "summary", value_name = "TEXT")]
    pub summary: Option<String>,

    /// Acting user
    #[arg(long = "as", value_name = "USERNAME")]
    pub acting_user: String,
}

#[derive(Args)]
pub struct SnippetForkArgs {
    /// Snippet id to fork
    #[arg(value_name = "ID")]
    pub id: i64,

    /// Acting user
    #[arg(long = "as", value_name = "USERNAME")]
    pub acting_user: String,
}

#[derive(Args)]
pub struct SnippetDeleteArgs {
    /// Snippet id
    #[arg(value_name = "ID")]
    pub id: i64,

    /// Acting user
    #[arg(long = "as", value_name = "USERNAME")]
    pub acting_user: String,
}

#[derive(Args)]
pub struct SnippetRestoreArgs {
    /// Snippet id
    #[arg(value_name = "ID")]
    pub id: i64,

    /// Acting user
    #[arg(long = "as", value_name = "USERNAME")]
    pub acting_user: String,
}

#[derive(Args)]
pub struct SnippetHistoryArgs {
    /// Snippet id
    #[arg(value_name = "ID")]
    pub id: i64,

    /// Output as JSON
    #[arg(long = "json")]
    pub json: bool,
}

#[derive(Args)]
pub struct SnippetRevertArgs {
    /// Snippet id
    #[arg(value_name = "ID")]
    pub id: i64,

    /// Version number to roll back to
    #[arg(long = "to", value_name = "VERSION")]
    pub version: i64,

    /// Acting user
    #[arg(long = "as", value_name = "USERNAME")]
    pub acting_user: String,
}

#[derive(Args)]
pub struct SnippetViewArgs {
    /// Snippet id
    #[arg(value_name = "ID")]
    pub id: i64,

    /// Opaque viewer fingerprint used for unique-view dedup
    #[arg(long = "fingerprint", value_name = "FP")]
    pub fingerprint: String,

    /// Acting user, when the viewer is signed in
    #[arg(long = "as", value_name = "USERNAME")]
    pub acting_user: Option<String>,
}

#[derive(Args)]
pub struct SnippetSetPrivacyArgs {
    /// Snippet id
    #[arg(value_name = "ID")]
    pub id: i64,

    /// New privacy (public, private, team, unlisted)
    #[arg(value_name = "PRIVACY")]
    pub privacy: String,

    /// Team slug or id for team privacy
    #[arg(long = "team", value_name = "TEAM")]
    pub team: Option<String>,

    /// Acting user
    #[arg(long = "as", value_name = "USERNAME")]
    pub acting_user: String,
}

#[derive(Args)]
pub struct SnippetTagArgs {
    /// Snippet id
    #[arg(value_name = "ID")]
    pub id: i64,

    /// Replace the snippet's tags with this set (repeatable)
    #[arg(long = "set", value_name = "NAME")]
    pub set: Vec<String>,

    /// Attach a single tag
    #[arg(long = "add", value_name = "NAME")]
    pub add: Option<String>,

    /// Detach a single tag
    #[arg(long = "remove", value_name = "NAME")]
    pub remove: Option<String>,

    /// Acting user
    #[arg(long = "as", value_name = "USERNAME")]
    pub acting_user: String,
}

#[derive(Args)]
pub struct SnippetListArgs {
    /// List a user's own snippets
    #[arg(long = "owner", value_name = "USERNAME")]
    pub owner: Option<String>,

    /// List a team's snippets
    #[arg(long = "team", value_name = "TEAM")]
    pub team: Option<String>,

    /// Acting user (required for team listings)
    #[arg(long = "as", value_name = "USERNAME")]
    pub acting_user: Option<String>,

    /// Cap on public listings
    #[arg(long = "limit", value_name = "N", default_value = "20")]
    pub limit: i64,

    /// Output as JSON
    #[arg(long = "json")]
    pub json: bool,
}

impl SnippetCommands {
    pub fn run(self, vault: &SnipVault) -> Result<()> {
        match self {
            SnippetCommands::Create(args) => args.run(vault),
            SnippetCommands::Show(args) => args.run(vault),
            SnippetCommands::Edit(args) => args.run(vault),
            SnippetCommands::Fork(args) => args.run(vault),
            SnippetCommands::Delete(args) => args.run(vault),
            SnippetCommands::Restore(args) => args.run(vault),
            SnippetCommands::History(args) => args.run(vault),
            SnippetCommands::Revert(args) => args.run(vault),
            SnippetCommands::View(args) => args.run(vault),
            SnippetCommands::SetPrivacy(args) => args.run(vault),
            SnippetCommands::Tag(args) => args.run(vault),
            SnippetCommands::List(args) => args.run(vault),
        }
    }
}

/// Resolve the code argument pair shared by create and edit.
fn read_code(code: Option<String>, code_file: Option<PathBuf>) -> Result<String> {
    if code.is_some() && code_file.is_some() {
        anyhow::bail!("Error: --code and --code-file are mutually exclusive");
    }
    match (code, code_file) {
        (Some(code), None) => Ok(code),
        (None, Some(path)) => std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display())),
        (None, None) => anyhow::bail!("Error: provide the code with --code or --code-file"),
        (Some(_), Some(_)) => unreachable!(),
    }
}

impl SnippetCreateArgs {
    pub fn run(self, vault: &SnipVault) -> Result<()> {
        let owner = resolve_user(vault, &self.acting_user)?;
        let privacy: Privacy = self.privacy.parse()?;
        let team_id = match &self.team {
            Some(team) => Some(resolve_team(vault, team)?.id),
            None => None,
        };
        let code = read_code(self.code, self.code_file)?;

        let snippet = vault.snippets().create(
            owner.id,
            NewSnippet {
                title: self.title,
                description: self.description,
                language: self.language,
                code,
                privacy,
                team_id,
                tags: self.tags,
            },
        )?;
        println!("Created snippet {} (id {})", snippet.title, snippet.id);
        Ok(())
    }
}

impl SnippetShowArgs {
    pub fn run(self, vault: &SnipVault) -> Result<()> {
        let acting_user = match &self.acting_user {
            Some(username) => Some(resolve_user(vault, username)?.id),
            None => None,
        };
        let snippet = vault.snippets().get_visible(self.id, acting_user)?;
        if let Some(number) = self.version {
            let version = vault.versions().get_version(snippet.id, number)?;
            if self.json {
                return print_json(&version);
            }
            println!(
                "Snippet: {} (id {}), version {} ({})",
                snippet.title, snippet.id, version.version_number, version.change_type
            );
            println!("Lines: +{} -{}", version.lines_added, version.lines_removed);
            if let Some(summary) = &version.summary {
                println!("Summary: {}", summary);
            }
            println!("---");
            print!("{}", version.code);
            if !version.code.ends_with('\n') {
                println!();
            }
            return Ok(());
        }
        if self.json {
            return print_json(&snippet);
        }
        println!("Snippet: {} (id {})", snippet.title, snippet.id);
        println!("Language: {}", snippet.language);
        println!("Privacy: {}", snippet.privacy);
        println!("Version: {}", snippet.version_number);
        if let Some(description) = &snippet.description {
            println!("Description: {}", description);
        }
        if let Some(parent_id) = snippet.parent_id {
            println!("Forked from: {}", parent_id);
        }
        println!(
            "Views: {} ({} unique), forks: {}, favorites: {}, comments: {}",
            snippet.view_count,
            snippet.unique_view_count,
            snippet.fork_count,
            snippet.favorite_count,
            snippet.comment_count
        );
        let tags = vault.tags().for_snippet(snippet.id)?;
        if !tags.is_empty() {
            let names: Vec<&str> = tags.iter().map(|tag| tag.name.as_str()).collect();
            println!("Tags: {}", names.join(", "));
        }
        println!("---");
        print!("{}", snippet.code);
        if !snippet.code.ends_with('\n') {
            println!();
        }
        Ok(())
    }
}

impl SnippetEditArgs {
    pub fn run(self, vault: &SnipVault) -> Result<()> {
        let author = resolve_user(vault, &self.acting_user)?;
        let snippet = vault.snippets().get_visible(self.id, Some(author.id))?;
        if !vault.visibility().can_edit(&snippet, Some(author.id))? {
            anyhow::bail!("{} may not edit snippet {}", author.username, self.id);
        }

        let code = read_code(self.code, self.code_file)?;
        let version = vault
            .versions()
            .record_change(self.id, Some(author.id), &code, self.summary.as_deref())?;
        if version.version_number == snippet.version_number {
            println!("No changes; head untouched");
        } else {
            println!(
                "Saved version {} (+{} -{})",
                version.version_number, version.lines_added, version.lines_removed
            );
        }
        Ok(())
    }
}

impl SnippetRevertArgs {
    pub fn run(self, vault: &SnipVault) -> Result<()> {
        let author = resolve_user(vault, &self.acting_user)?;
        let snippet = vault.snippets().get_visible(self.id, Some(author.id))?;
        if !vault.visibility().can_edit(&snippet, Some(author.id))? {
            anyhow::bail!("{} may not edit snippet {}", author.username, self.id);
        }

        let version = vault
            .versions()
            .restore_version(self.id, Some(author.id), self.version)?;
        if version.version_number == snippet.version_number {
            println!("Head already matches version {}", self.version);
        } else {
            println!(
                "Restored version {}; head is now version {}",
                self.version, version.version_number
            );
        }
        Ok(())
    }
}

impl SnippetForkArgs {
    pub fn run(self, vault: &SnipVault) -> Result<()> {
        let user = resolve_user(vault, &self.acting_user)?;
        let fork = vault.snippets().fork(self.id, user.id)?;
        println!("Forked snippet {} into {} (id {})", self.id, fork.title, fork.id);
        Ok(())
    }
}

impl SnippetDeleteArgs {
    pub fn run(self, vault: &SnipVault) -> Result<()> {
        let user = resolve_user(vault, &self.acting_user)?;
        vault.snippets().delete(self.id, user.id)?;
        println!("Deleted snippet {}", self.id);
        Ok(())
    }
}

impl SnippetRestoreArgs {
    pub fn run(self, vault: &SnipVault) -> Result<()> {
        let user = resolve_user(vault, &self.acting_user)?;
        let snippet = vault.snippets().restore(self.id, user.id)?;
        println!("Restored snippet {} (id {})", snippet.title, snippet.id);
        Ok(())
    }
}

impl SnippetHistoryArgs {
    pub fn run(self, vault: &SnipVault) -> Result<()> {
        let history = vault.versions().history(self.id)?;
        if self.json {
            return print_json(&history);
        }
        for version in history {
            let summary = version.summary.as_deref().unwrap_or("-");
            println!(
                "v{} [{}] +{} -{} {} {}",
                version.version_number,
                version.change_type,
                version.lines_added,
                version.lines_removed,
                version.created_at,
                summary
            );
        }
        Ok(())
    }
}

impl SnippetViewArgs {
    pub fn run(self, vault: &SnipVault) -> Result<()> {
        let actor = match &self.acting_user {
            Some(name) => Some(resolve_user(vault, name)?.id),
            None => None,
        };
        vault.snippets().record_view(self.id, actor, &self.fingerprint)?;
        println!("Recorded view of snippet {}", self.id);
        Ok(())
    }
}

impl SnippetSetPrivacyArgs {
    pub fn run(self, vault: &SnipVault) -> Result<()> {
        let user = resolve_user(vault, &self.acting_user)?;
        let privacy: Privacy = self.privacy.parse()?;
        let team_id = match &self.team {
            Some(team) => Some(resolve_team(vault, team)?.id),
            None => None,
        };
        let snippet = vault
            .snippets()
            .set_privacy(self.id, user.id, privacy, team_id)?;
        println!("Snippet {} is now {}", snippet.id, snippet.privacy);
        Ok(())
    }
}

impl SnippetTagArgs {
    pub fn run(self, vault: &SnipVault) -> Result<()> {
        let touched = [!self.set.is_empty(), self.add.is_some(), self.remove.is_some()];
        if touched.iter().filter(|flag| **flag).count() != 1 {
            anyhow::bail!("Error: use exactly one of --set, --add, or --remove");
        }

        let author = resolve_user(vault, &self.acting_user)?;
        let snippet = vault.snippets().get_visible(self.id, Some(author.id))?;
        if !vault.visibility().can_edit(&snippet, Some(author.id))? {
            anyhow::bail!("{} may not edit snippet {}", author.username, self.id);
        }

        let tags = vault.tags();
        if let Some(name) = self.add {
            let tag = tags.attach(self.id, &name)?;
            println!("Attached {} (used by {} snippets)", tag.name, tag.usage_count);
        } else if let Some(name) = self.remove {
            tags.detach(self.id, &name)?;
            println!("Detached {}", name);
        } else {
            let current = tags.retag(self.id, &self.set)?;
            let names: Vec<&str> = current.iter().map(|tag| tag.name.as_str()).collect();
            println!("Tags: {}", names.join(", "));
        }
        Ok(())
    }
}

impl SnippetListArgs {
    pub fn run(self, vault: &SnipVault) -> Result<()> {
        if self.owner.is_some() && self.team.is_some() {
            anyhow::bail!("Error: --owner and --team are mutually exclusive");
        }

        let snippets = if let Some(owner) = &self.owner {
            let user = resolve_user(vault, owner)?;
            vault.snippets().list_for_owner(user.id)?
        } else if let Some(team) = &self.team {
            let team = resolve_team(vault, team)?;
            let username = self
                .acting_user
                .as_deref()
                .ok_or_else(|| anyhow::anyhow!("Error: team listings need --as"))?;
            let user = resolve_user(vault, username)?;
            vault.snippets().list_for_team(team.id, user.id)?
        } else {
            vault.snippets().list_public(self.limit)?
        };

        if self.json {
            return print_json(&snippets);
        }
        for snippet in snippets {
            println!(
                "{} (id {}, {}, {}, v{})",
                snippet.title, snippet.id, snippet.language, snippet.privacy, snippet.version_number
            );
        }
        Ok(())
    }
}
