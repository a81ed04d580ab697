use sv_cli::{
    invite::InviteCommands, share::ShareCommands, snippet::SnippetCommands,
    social::SocialCommands, team::TeamCommands, user::UserCommands, Cli, Commands, Parser,
};

#[test]
fn test_cli_parsing_user_register() {
    let args = vec![
        "sv",
        "user",
        "register",
        "alice",
        "alice@example.com",
        "--display-name",
        "Alice",
    ];

    let cli = Cli::try_parse_from(args).unwrap();
    assert!(matches!(
        cli.command,
        Commands::User {
            subcommand: UserCommands::Register(_)
        }
    ));
}

#[test]
fn test_cli_parsing_team_add_member() {
    let args = vec![
        "sv",
        "team",
        "add-member",
        "rustaceans",
        "bob",
        "--role",
        "viewer",
        "--as",
        "alice",
    ];

    let cli = Cli::try_parse_from(args).unwrap();
    match cli.command {
        Commands::Team {
            subcommand: TeamCommands::AddMember(args),
        } => {
            assert_eq!(args.team, "rustaceans");
            assert_eq!(args.username, "bob");
            assert_eq!(args.role, "viewer");
            assert_eq!(args.acting_user, "alice");
        }
        _ => panic!("parsed into the wrong command"),
    }
}

#[test]
fn test_cli_parsing_snippet_create_with_tags() {
    let args = vec![
        "sv",
        "snippet",
        "create",
        "hello world",
        "--language",
        "rust",
        "--code",
        "fn main() {}",
        "--tag",
        "rust",
        "--tag",
        "beginner",
        "--privacy",
        "public",
        "--as",
        "alice",
    ];

    let cli = Cli::try_parse_from(args).unwrap();
    match cli.command {
        Commands::Snippet {
            subcommand: SnippetCommands::Create(args),
        } => {
            assert_eq!(args.title, "hello world");
            assert_eq!(args.tags, vec!["rust", "beginner"]);
            assert_eq!(args.privacy, "public");
        }
        _ => panic!("parsed into the wrong command"),
    }
}

#[test]
fn test_cli_parsing_snippet_edit_code_file() {
    let args = vec![
        "sv",
        "snippet",
        "edit",
        "42",
        "--code-file",
        "/tmp/new.rs",
        "--summary",
        "tighten loop",
        "--as",
        "alice",
    ];

    let cli = Cli::try_parse_from(args).unwrap();
    assert!(matches!(
        cli.command,
        Commands::Snippet {
            subcommand: SnippetCommands::Edit(_)
        }
    ));
}

#[test]
fn test_cli_parsing_snippet_show_version() {
    let args = vec!["sv", "snippet", "show", "42", "--version", "3", "--as", "alice"];

    let cli = Cli::try_parse_from(args).unwrap();
    match cli.command {
        Commands::Snippet {
            subcommand: SnippetCommands::Show(args),
        } => {
            assert_eq!(args.id, 42);
            assert_eq!(args.version, Some(3));
            assert_eq!(args.acting_user.as_deref(), Some("alice"));
        }
        _ => panic!("parsed into the wrong command"),
    }
}

#[test]
fn test_cli_parsing_invite_send() {
    let args = vec![
        "sv",
        "invite",
        "send",
        "rustaceans",
        "bob@example.com",
        "--role",
        "member",
        "--expires-in",
        "72",
        "--as",
        "alice",
    ];

    let cli = Cli::try_parse_from(args).unwrap();
    match cli.command {
        Commands::Invite {
            subcommand: InviteCommands::Send(args),
        } => {
            assert_eq!(args.email, "bob@example.com");
            assert_eq!(args.expires_in, 72);
        }
        _ => panic!("parsed into the wrong command"),
    }
}

#[test]
fn test_cli_parsing_share_create_link() {
    let args = vec![
        "sv",
        "share",
        "create",
        "7",
        "--link",
        "--permission",
        "view",
        "--expires-in",
        "24",
        "--as",
        "alice",
    ];

    let cli = Cli::try_parse_from(args).unwrap();
    match cli.command {
        Commands::Share {
            subcommand: ShareCommands::Create(args),
        } => {
            assert_eq!(args.snippet, 7);
            assert!(args.link);
            assert_eq!(args.expires_in, Some(24));
        }
        _ => panic!("parsed into the wrong command"),
    }
}

#[test]
fn test_cli_parsing_social_followers() {
    let args = vec!["sv", "social", "followers", "alice", "--json"];

    let cli = Cli::try_parse_from(args).unwrap();
    match cli.command {
        Commands::Social {
            subcommand: SocialCommands::Followers(args),
        } => {
            assert_eq!(args.username, "alice");
            assert!(args.json);
        }
        _ => panic!("parsed into the wrong command"),
    }
}

#[test]
fn test_cli_parsing_global_db_flag() {
    let args = vec![
        "sv",
        "snippet",
        "show",
        "3",
        "--db",
        "/tmp/vault.db",
    ];

    let cli = Cli::try_parse_from(args).unwrap();
    assert_eq!(cli.db.as_deref(), Some(std::path::Path::new("/tmp/vault.db")));
    assert!(matches!(
        cli.command,
        Commands::Snippet {
            subcommand: SnippetCommands::Show(_)
        }
    ));
}

#[test]
fn test_cli_rejects_unknown_subcommand() {
    let args = vec!["sv", "frobnicate"];
    assert!(Cli::try_parse_from(args).is_err());
}
