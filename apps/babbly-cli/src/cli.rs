//! Command line definitions.

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "babbly", version, about = "Babbly micro-posting client")]
pub struct Cli {
    /// API Gateway base URL
    #[arg(long, env = "BABBLY_API_URL")]
    pub api_url: Option<String>,

    /// Access token for the gateway
    #[arg(long, env = "BABBLY_ACCESS_TOKEN", hide_env_values = true)]
    pub access_token: Option<String>,

    /// Identity-provider ID token; defaults to the access token
    #[arg(long, env = "BABBLY_ID_TOKEN", hide_env_values = true)]
    pub id_token: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show the feed
    Feed(FeedArgs),

    /// Keep the first feed page fresh and print changes until interrupted
    Watch,

    /// Work with a single post
    #[command(subcommand)]
    Post(PostCommand),

    /// Like a post (or unlike it with --undo)
    Like {
        post_id: String,
        #[arg(long)]
        undo: bool,
    },

    /// Show the comment thread of a post
    Comments {
        post_id: String,
        /// Number of pages to load
        #[arg(long, default_value_t = 1)]
        pages: u32,
    },

    /// Work with a comment
    #[command(subcommand)]
    Comment(CommentCommand),

    /// Show the signed-in user, syncing the profile first
    Whoami,

    /// Show a public profile; your own when neither a username nor --id is
    /// given
    Profile {
        /// Username to look up
        username: Option<String>,
        /// Look up by user id instead
        #[arg(long, conflicts_with = "username")]
        id: Option<String>,
        /// Page of the user's posts to include
        #[arg(long, default_value_t = 1)]
        posts_page: u32,
        #[arg(long, default_value_t = babbly_core::domain::DEFAULT_PAGE_SIZE)]
        posts_page_size: u32,
    },

    /// Show a user's application record by username
    User { username: String },

    /// Check whether you may perform an action on a resource
    Can {
        resource: String,
        #[arg(default_value = "read")]
        action: String,
    },

    /// Follow a user (or unfollow with --undo)
    Follow {
        user_id: String,
        #[arg(long)]
        undo: bool,
    },

    /// Edit the signed-in user's profile
    EditProfile(EditProfileArgs),
}

#[derive(Args, Debug)]
pub struct FeedArgs {
    /// Number of pages to load
    #[arg(long, default_value_t = 1)]
    pub pages: u32,

    /// Posts per page
    #[arg(long, default_value_t = babbly_core::domain::DEFAULT_PAGE_SIZE)]
    pub page_size: u32,
}

#[derive(Subcommand, Debug)]
pub enum PostCommand {
    Show { id: String },
    Create { content: String },
    Edit { id: String, content: String },
    Delete { id: String },
}

#[derive(Subcommand, Debug)]
pub enum CommentCommand {
    Add {
        post_id: String,
        content: String,
    },
    Edit {
        post_id: String,
        id: String,
        content: String,
    },
    Delete {
        post_id: String,
        id: String,
    },
    Like {
        post_id: String,
        id: String,
        #[arg(long)]
        undo: bool,
    },
}

#[derive(Args, Debug)]
pub struct EditProfileArgs {
    #[arg(long)]
    pub display_name: Option<String>,
    #[arg(long)]
    pub bio: Option<String>,
    #[arg(long)]
    pub location: Option<String>,
    #[arg(long)]
    pub website: Option<String>,
    #[arg(long)]
    pub picture: Option<String>,
}
