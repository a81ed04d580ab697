use anyhow::Result;
use clap::{Args, Subcommand};
use sv_core::SnipVault;

use crate::{print_json, resolve_user};

/// Favorites, follows and comments
#[derive(Subcommand)]
pub enum SocialCommands {
    /// Favorite a snippet
    Favorite(FavoriteArgs),
    /// Remove a favorite
    Unfavorite(FavoriteArgs),
    /// List a user's favorite snippets
    Favorites(SocialListArgs),
    /// Follow a user
    Follow(FollowArgs),
    /// Stop following a user
    Unfollow(FollowArgs),
    /// List the users someone follows
    Following(SocialListArgs),
    /// List a user's followers
    Followers(SocialListArgs),
    /// Comment on a snippet
    Comment(CommentArgs),
    /// List a snippet's comments
    Comments(CommentsArgs),
    /// Delete a comment
    DeleteComment(DeleteCommentArgs),
}

#[derive(Args)]
pub struct FavoriteArgs {
    /// Snippet id
    #[arg(value_name = "SNIPPET")]
    pub snippet: i64,

    /// Acting user
    #[arg(long = "as", value_name = "USERNAME")]
    pub acting_user: String,
}

#[derive(Args)]
pub struct FollowArgs {
    /// Username to follow
    #[arg(value_name = "USERNAME")]
    pub username: String,

    /// Acting user
    #[arg(long = "as", value_name = "USERNAME")]
    pub acting_user: String,
}

#[derive(Args)]
pub struct SocialListArgs {
    /// Username whose list to show
    #[arg(value_name = "USERNAME")]
    pub username: String,

    /// Output as JSON
    #[arg(long = "json")]
    pub json: bool,
}

#[derive(Args)]
pub struct CommentArgs {
    /// Snippet id
    #[arg(value_name = "SNIPPET")]
    pub snippet: i64,

    /// Comment body
    #[arg(long = "body", value_name = "TEXT")]
    pub body: String,

    /// Comment id this replies to
    #[arg(long = "reply-to", value_name = "ID")]
    pub reply_to: Option<i64>,

    /// Acting user
    #[arg(long = "as", value_name = "USERNAME")]
    pub acting_user: String,
}

#[derive(Args)]
pub struct CommentsArgs {
    /// Snippet id
    #[arg(value_name = "SNIPPET")]
    pub snippet: i64,

    /// Acting user (omit for anonymous access)
    #[arg(long = "as", value_name = "USERNAME")]
    pub acting_user: Option<String>,

    /// Output as JSON
    #[arg(long = "json")]
    pub json: bool,
}

#[derive(Args)]
pub struct DeleteCommentArgs {
    /// Comment id
    #[arg(value_name = "ID")]
    pub id: i64,

    /// Acting user
    #[arg(long = "as", value_name = "USERNAME")]
    pub acting_user: String,
}

impl SocialCommands {
    pub fn run(self, vault: &SnipVault) -> Result<()> {
        match self {
            SocialCommands::Favorite(args) => {
                let user = resolve_user(vault, &args.acting_user)?;
                vault.social().favorite(user.id, args.snippet)?;
                println!("Favorited snippet {}", args.snippet);
                Ok(())
            }
            SocialCommands::Unfavorite(args) => {
                let user = resolve_user(vault, &args.acting_user)?;
                vault.social().unfavorite(user.id, args.snippet)?;
                println!("Unfavorited snippet {}", args.snippet);
                Ok(())
            }
            SocialCommands::Favorites(args) => {
                let user = resolve_user(vault, &args.username)?;
                let ids = vault.social().favorites_of(user.id)?;
                if args.json {
                    return print_json(&ids);
                }
                println!("{} favorites {} snippets", user.username, ids.len());
                for id in ids {
                    println!("  snippet {}", id);
                }
                Ok(())
            }
            SocialCommands::Follow(args) => {
                let follower = resolve_user(vault, &args.acting_user)?;
                let followed = resolve_user(vault, &args.username)?;
                vault.social().follow(follower.id, followed.id)?;
                println!("{} now follows {}", follower.username, followed.username);
                Ok(())
            }
            SocialCommands::Unfollow(args) => {
                let follower = resolve_user(vault, &args.acting_user)?;
                let followed = resolve_user(vault, &args.username)?;
                vault.social().unfollow(follower.id, followed.id)?;
                println!("{} no longer follows {}", follower.username, followed.username);
                Ok(())
            }
            SocialCommands::Following(args) => {
                let user = resolve_user(vault, &args.username)?;
                let ids = vault.social().followed_by(user.id)?;
                if args.json {
                    return print_json(&ids);
                }
                println!("{} follows {} users", user.username, ids.len());
                for id in ids {
                    println!("  {}", vault.users().get(id)?.username);
                }
                Ok(())
            }
            SocialCommands::Followers(args) => {
                let user = resolve_user(vault, &args.username)?;
                let ids = vault.social().followers_of(user.id)?;
                if args.json {
                    return print_json(&ids);
                }
                println!("{} has {} followers", user.username, ids.len());
                for id in ids {
                    println!("  {}", vault.users().get(id)?.username);
                }
                Ok(())
            }
            SocialCommands::Comment(args) => args.run(vault),
            SocialCommands::Comments(args) => args.run(vault),
            SocialCommands::DeleteComment(args) => {
                let actor = resolve_user(vault, &args.acting_user)?;
                vault.social().delete_comment(args.id, actor.id)?;
                println!("Deleted comment {}", args.id);
                Ok(())
            }
        }
    }
}

impl CommentArgs {
    pub fn run(self, vault: &SnipVault) -> Result<()> {
        let author = resolve_user(vault, &self.acting_user)?;
        let comment = vault
            .social()
            .comment(author.id, self.snippet, &self.body, self.reply_to)?;
        println!("Comment {} added to snippet {}", comment.id, self.snippet);
        Ok(())
    }
}

impl CommentsArgs {
    pub fn run(self, vault: &SnipVault) -> Result<()> {
        let acting_user = match &self.acting_user {
            Some(username) => Some(resolve_user(vault, username)?.id),
            None => None,
        };
        let comments = vault.social().comments_on(self.snippet, acting_user)?;
        if self.json {
            return print_json(&comments);
        }
        for comment in comments {
            let reply = match comment.parent_id {
                Some(parent) => format!(" (reply to {})", parent),
                None => String::new(),
            };
            println!("#{} by user {}{}: {}", comment.id, comment.author_id, reply, comment.body);
        }
        Ok(())
    }
}
