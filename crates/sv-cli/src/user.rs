use anyhow::Result;
use clap::{Args, Subcommand};
use sv_core::SnipVault;

use crate::{print_json, resolve_user};

/// User-related commands
#[derive(Subcommand)]
pub enum UserCommands {
    /// Register a new user
    Register(UserRegisterArgs),
    /// Show a user's profile
    Show(UserShowArgs),
}

#[derive(Args)]
pub struct UserRegisterArgs {
    /// Username (unique)
    #[arg(value_name = "USERNAME")]
    pub username: String,

    /// Email address (unique)
    #[arg(value_name = "EMAIL")]
    pub email: String,

    /// Optional display name
    #[arg(long = "display-name", value_name = "NAME")]
    pub display_name: Option<String>,
}

#[derive(Args)]
pub struct UserShowArgs {
    /// Username to look up
    #[arg(value_name = "USERNAME")]
    pub username: String,

    /// Output as JSON
    #[arg(long = "json")]
    pub json: bool,
}

impl UserCommands {
    pub fn run(self, vault: &SnipVault) -> Result<()> {
        match self {
            UserCommands::Register(args) => args.run(vault),
            UserCommands::Show(args) => args.run(vault),
        }
    }
}

impl UserRegisterArgs {
    pub fn run(self, vault: &SnipVault) -> Result<()> {
        let user = vault
            .users()
            .register(&self.username, &self.email, self.display_name.as_deref())?;
        println!("Registered user {} (id {})", user.username, user.id);
        Ok(())
    }
}

impl UserShowArgs {
    pub fn run(self, vault: &SnipVault) -> Result<()> {
        let user = resolve_user(vault, &self.username)?;
        if self.json {
            return print_json(&user);
        }
        println!("User: {} (id {})", user.username, user.id);
        println!("Email: {}", user.email);
        if let Some(display_name) = &user.display_name {
            println!("Display name: {}", display_name);
        }
        println!("Registered: {}", user.created_at);
        Ok(())
    }
}
