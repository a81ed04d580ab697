use anyhow::Result;
use clap::{Args, Subcommand};
use sv_core::SnipVault;

use crate::{print_json, resolve_user};

/// Collection commands
#[derive(Subcommand)]
pub enum CollectionCommands {
    /// Create a collection
    Create(CollectionCreateArgs),
    /// Add a snippet to a collection
    Add(CollectionEntryArgs),
    /// Remove a snippet from a collection
    Remove(CollectionEntryArgs),
    /// Show a collection's entries
    Show(CollectionShowArgs),
    /// List a user's collections
    List(CollectionListArgs),
}

#[derive(Args)]
pub struct CollectionCreateArgs {
    /// Collection name
    #[arg(value_name = "NAME")]
    pub name: String,

    /// Collection description
    #[arg(long = "description", value_name = "TEXT")]
    pub description: Option<String>,

    /// Make the collection publicly listable
    #[arg(long = "public")]
    pub public: bool,

    /// Acting user
    #[arg(long = "as", value_name = "USERNAME")]
    pub acting_user: String,
}

#[derive(Args)]
pub struct CollectionEntryArgs {
    /// Collection id
    #[arg(value_name = "COLLECTION")]
    pub collection: i64,

    /// Snippet id
    #[arg(value_name = "SNIPPET")]
    pub snippet: i64,

    /// Acting user
    #[arg(long = "as", value_name = "USERNAME")]
    pub acting_user: String,
}

#[derive(Args)]
pub struct CollectionShowArgs {
    /// Collection id
    #[arg(value_name = "COLLECTION")]
    pub collection: i64,

    /// Acting user (omit for anonymous access)
    #[arg(long = "as", value_name = "USERNAME")]
    pub acting_user: Option<String>,

    /// Output as JSON
    #[arg(long = "json")]
    pub json: bool,
}

#[derive(Args)]
pub struct CollectionListArgs {
    /// Acting user
    #[arg(long = "as", value_name = "USERNAME")]
    pub acting_user: String,

    /// Output as JSON
    #[arg(long = "json")]
    pub json: bool,
}

impl CollectionCommands {
    pub fn run(self, vault: &SnipVault) -> Result<()> {
        match self {
            CollectionCommands::Create(args) => {
                let owner = resolve_user(vault, &args.acting_user)?;
                let collection = vault.collections().create(
                    owner.id,
                    &args.name,
                    args.description.as_deref(),
                    args.public,
                )?;
                println!("Created collection {} (id {})", collection.name, collection.id);
                Ok(())
            }
            CollectionCommands::Add(args) => {
                let actor = resolve_user(vault, &args.acting_user)?;
                vault
                    .collections()
                    .add_snippet(args.collection, actor.id, args.snippet)?;
                println!("Added snippet {} to collection {}", args.snippet, args.collection);
                Ok(())
            }
            CollectionCommands::Remove(args) => {
                let actor = resolve_user(vault, &args.acting_user)?;
                vault
                    .collections()
                    .remove_snippet(args.collection, actor.id, args.snippet)?;
                println!("Removed snippet {} from collection {}", args.snippet, args.collection);
                Ok(())
            }
            CollectionCommands::Show(args) => args.run(vault),
            CollectionCommands::List(args) => {
                let user = resolve_user(vault, &args.acting_user)?;
                let collections = vault.collections().list_for_owner(user.id)?;
                if args.json {
                    return print_json(&collections);
                }
                for collection in collections {
                    let scope = if collection.is_public == 1 { "public" } else { "private" };
                    println!("{} (id {}, {})", collection.name, collection.id, scope);
                }
                Ok(())
            }
        }
    }
}

impl CollectionShowArgs {
    pub fn run(self, vault: &SnipVault) -> Result<()> {
        let acting_user = match &self.acting_user {
            Some(username) => Some(resolve_user(vault, username)?.id),
            None => None,
        };
        let collection = vault.collections().get(self.collection)?;
        let entries = vault.collections().snippets_in(self.collection, acting_user)?;
        if self.json {
            return print_json(&serde_json::json!({ "collection": collection, "entries": entries }));
        }
        println!("Collection: {} (id {})", collection.name, collection.id);
        for entry in entries {
            println!("  {}. snippet {}", entry.position, entry.snippet_id);
        }
        Ok(())
    }
}
