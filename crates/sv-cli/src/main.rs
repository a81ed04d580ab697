use anyhow::Result;
use sv_cli::{open_vault, Cli, Commands, Parser};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let level = match cli.log_level.as_str() {
        "error" => tracing::Level::ERROR,
        "warn" => tracing::Level::WARN,
        "info" => tracing::Level::INFO,
        "debug" => tracing::Level::DEBUG,
        "trace" => tracing::Level::TRACE,
        _ => tracing::Level::WARN,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    let vault = open_vault(cli.db.as_deref())?;

    match cli.command {
        Commands::User { subcommand } => subcommand.run(&vault),
        Commands::Team { subcommand } => subcommand.run(&vault),
        Commands::Invite { subcommand } => subcommand.run(&vault),
        Commands::Snippet { subcommand } => subcommand.run(&vault),
        Commands::Share { subcommand } => subcommand.run(&vault),
        Commands::Social { subcommand } => subcommand.run(&vault),
        Commands::Collection { subcommand } => subcommand.run(&vault),
        Commands::Notify { subcommand } => subcommand.run(&vault),
        Commands::Audit { subcommand } => subcommand.run(&vault),
    }
}
