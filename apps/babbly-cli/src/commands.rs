//! Subcommand handlers. Results go to stdout as JSON.

use anyhow::{Context, bail};
use serde::Serialize;

use babbly_core::domain::{PageRequest, ProfileState};
use babbly_infra::{AppContext, CacheEvent, LikeOutcome};
use babbly_shared::dto::UpdateUserRequest;

use crate::cli::{Command, CommentCommand, EditProfileArgs, FeedArgs, PostCommand};

pub async fn run(ctx: &AppContext, command: Command) -> anyhow::Result<()> {
    match command {
        Command::Feed(args) => feed(ctx, args).await,
        Command::Watch => watch(ctx).await,
        Command::Post(cmd) => post(ctx, cmd).await,
        Command::Like { post_id, undo } => {
            let outcome = ctx.set_post_liked(&post_id, !undo).await?;
            print_like(outcome)
        }
        Command::Comments { post_id, pages } => {
            let thread = ctx.comments(&post_id).await;
            thread.load_first().await?;
            for _ in 1..pages {
                if !thread.load_more().await? {
                    break;
                }
            }
            print(&serde_json::json!({
                "items": thread.items().await,
                "total": thread.total().await,
                "hasMore": thread.has_more(),
            }))
        }
        Command::Comment(cmd) => comment(ctx, cmd).await,
        Command::Whoami => whoami(ctx).await,
        Command::Profile {
            username,
            id,
            posts_page,
            posts_page_size,
        } => {
            let posts = PageRequest::new(posts_page, posts_page_size);
            let profile = match (username, id) {
                (_, Some(id)) => ctx.profile_by_id(&id, posts).await?,
                (Some(username), None) => ctx.profile_by_username(&username, posts).await?,
                (None, None) => ctx.my_profile(posts).await?,
            };
            print(&profile)
        }
        Command::User { username } => print(&ctx.user_by_username(&username).await?),
        Command::Can { resource, action } => {
            let allowed = ctx.can(&resource, &action).await;
            print(&serde_json::json!({ "resource": resource, "action": action, "authorized": allowed }))
        }
        Command::Follow { user_id, undo } => {
            if undo {
                ctx.unfollow(&user_id).await?;
            } else {
                ctx.follow(&user_id).await?;
            }
            print(&serde_json::json!({ "userId": user_id, "following": !undo }))
        }
        Command::EditProfile(args) => edit_profile(ctx, args).await,
    }
}

async fn feed(ctx: &AppContext, args: FeedArgs) -> anyhow::Result<()> {
    let feed = ctx.feed_with_page_size(args.page_size).await;
    feed.load_first().await?;
    for _ in 1..args.pages {
        if !feed.load_more().await? {
            break;
        }
    }

    print(&serde_json::json!({
        "items": feed.items().await,
        "hasMore": feed.has_more(),
    }))
}

async fn watch(ctx: &AppContext) -> anyhow::Result<()> {
    let feed = ctx.feed().await;
    let mut events = ctx.feed_events();
    feed.load_first().await?;
    print(&feed.items().await)?;

    let Some(polling) = feed.start_polling() else {
        bail!("polling is disabled (BABBLY_REFRESH_MS=0)");
    };
    let first_page = feed.key(1);

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            event = events.recv() => match event {
                Ok(CacheEvent::Updated(key)) if key == first_page => {
                    print(&feed.items().await)?;
                }
                Ok(CacheEvent::Failed { key, error }) if key == first_page => {
                    tracing::warn!(%error, "Feed refresh failed");
                }
                Ok(_) => {}
                Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::debug!(skipped, "Missed feed events");
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            },
        }
    }

    ctx.end_session().await;
    polling.abort();
    Ok(())
}

async fn post(ctx: &AppContext, cmd: PostCommand) -> anyhow::Result<()> {
    match cmd {
        PostCommand::Show { id } => print(&ctx.post(&id).await?),
        PostCommand::Create { content } => print(&ctx.create_post(&content).await?),
        PostCommand::Edit { id, content } => print(&ctx.update_post(&id, &content).await?),
        PostCommand::Delete { id } => {
            ctx.delete_post(&id).await?;
            print(&serde_json::json!({ "deleted": id }))
        }
    }
}

async fn comment(ctx: &AppContext, cmd: CommentCommand) -> anyhow::Result<()> {
    match cmd {
        CommentCommand::Add { post_id, content } => {
            print(&ctx.create_comment(&post_id, &content).await?)
        }
        CommentCommand::Edit {
            post_id,
            id,
            content,
        } => print(&ctx.update_comment(&post_id, &id, &content).await?),
        CommentCommand::Delete { post_id, id } => {
            ctx.delete_comment(&post_id, &id).await?;
            print(&serde_json::json!({ "deleted": id }))
        }
        CommentCommand::Like { post_id, id, undo } => {
            let outcome = ctx.set_comment_liked(&post_id, &id, !undo).await?;
            print_like(outcome)
        }
    }
}

async fn whoami(ctx: &AppContext) -> anyhow::Result<()> {
    match ctx.profile().await {
        ProfileState::Anonymous => bail!("not signed in; set BABBLY_ACCESS_TOKEN"),
        ProfileState::Synced(profile) => print(&profile),
        ProfileState::Provisional { profile, error } => {
            eprintln!("Profile not synced: {error}");
            print(&profile)
        }
    }
}

async fn edit_profile(ctx: &AppContext, args: EditProfileArgs) -> anyhow::Result<()> {
    let changes = UpdateUserRequest {
        display_name: args.display_name,
        bio: args.bio,
        location: args.location,
        website: args.website,
        picture: args.picture,
        ..Default::default()
    };
    if changes.is_empty() {
        bail!("nothing to change");
    }
    print(&ctx.update_profile(&changes).await?)
}

fn print_like(outcome: LikeOutcome) -> anyhow::Result<()> {
    match outcome {
        LikeOutcome::Applied(response) => print(&response),
        LikeOutcome::Skipped => {
            eprintln!("A like for this target is already in progress");
            Ok(())
        }
    }
}

fn print<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(value).context("failed to render output")?;
    println!("{json}");
    Ok(())
}
