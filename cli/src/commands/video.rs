use super::{finish_mutation, resolve_video_id};
use crate::runtime::Runtime;
use crate::ux_error;
use anyhow::Result;
use clap::Args;
use sync::SyncError;

#[derive(Args)]
pub struct AddArgs {
    /// Video URL or id
    pub input: String,

    #[arg(long)]
    pub title: Option<String>,

    #[arg(long)]
    pub channel: Option<String>,

    /// Note attached at 0:00
    #[arg(long)]
    pub note: Option<String>
}

#[derive(Args)]
pub struct VideoArgs {
    /// Video URL or id
    pub video: String
}

pub async fn add(args: AddArgs, runtime: &Runtime, json: bool) -> Result<()> {
    let Some(video_id) = tn_core::extract_video_id(&args.input) else {
        let err = ux_error::no_video_id(&args.input);
        err.display();
        return Err(err.into());
    };

    let already_watched = runtime.manager.snapshot().await.history_entry(&video_id).is_some();
    let snapshot = runtime
        .manager
        .add_history_entry(
            &video_id,
            args.title.as_deref(),
            args.channel.as_deref(),
            args.note.as_deref()
        )
        .await?;

    let message = if already_watched {
        format!("{} is already in your history", video_id)
    } else {
        format!("Added {}", video_id)
    };
    finish_mutation(runtime, json, &video_id, &message, snapshot).await
}

pub async fn set_read(args: VideoArgs, runtime: &Runtime, json: bool, read: bool) -> Result<()> {
    let video_id = resolve_video_id(&args.video);
    let snapshot = runtime.manager.set_read(&video_id, read).await?;
    let state = if read { "read" } else { "unread" };
    finish_mutation(
        runtime,
        json,
        &video_id,
        &format!("Marked {} as {}", video_id, state),
        snapshot
    )
    .await
}

pub async fn toggle_read(args: VideoArgs, runtime: &Runtime, json: bool) -> Result<()> {
    let video_id = resolve_video_id(&args.video);
    let snapshot = runtime.manager.toggle_read(&video_id).await?;
    let read = snapshot.video(&video_id).is_some_and(|v| v.read);
    let state = if read { "read" } else { "unread" };
    finish_mutation(
        runtime,
        json,
        &video_id,
        &format!("Marked {} as {}", video_id, state),
        snapshot
    )
    .await
}

pub async fn delete(args: VideoArgs, runtime: &Runtime, json: bool) -> Result<()> {
    let video_id = resolve_video_id(&args.video);
    let snapshot = match runtime.manager.delete_video(&video_id).await {
        Ok(snapshot) => snapshot,
        Err(SyncError::Mutation(errors::MutationError::UnknownVideo { .. })) => {
            let err = ux_error::unknown_video(&video_id);
            err.display();
            return Err(err.into());
        }
        Err(e) => return Err(e.into())
    };
    finish_mutation(
        runtime,
        json,
        &video_id,
        &format!("Deleted {}", video_id),
        snapshot
    )
    .await
}
