use super::{finish_mutation, resolve_video_id};
use crate::runtime::Runtime;
use crate::ux_error;
use anyhow::Result;
use clap::{Args, Subcommand};
use tn_core::{format_note_time, parse_note_time};

#[derive(Subcommand)]
pub enum NoteCommand {
    #[command(about = "Add a note to a video")]
    Add(NoteAddArgs),

    #[command(about = "Delete a note by its index in `tubenotes show <video>`")]
    Delete(NoteDeleteArgs)
}

#[derive(Args)]
pub struct NoteAddArgs {
    /// Video URL or id
    pub video: String,

    pub text: String,

    /// Position in the video: seconds, m:ss or h:mm:ss
    #[arg(long)]
    pub at: Option<String>
}

#[derive(Args)]
pub struct NoteDeleteArgs {
    /// Video URL or id
    pub video: String,

    pub index: usize
}

pub async fn run(cmd: NoteCommand, runtime: &Runtime, json: bool) -> Result<()> {
    match cmd {
        NoteCommand::Add(args) => add(args, runtime, json).await,
        NoteCommand::Delete(args) => delete(args, runtime, json).await
    }
}

async fn add(args: NoteAddArgs, runtime: &Runtime, json: bool) -> Result<()> {
    let video_id = resolve_video_id(&args.video);
    let seconds = match args.at.as_deref() {
        None => 0.0,
        Some(raw) => match parse_note_time(raw) {
            Some(seconds) => seconds,
            None => {
                let err = ux_error::invalid_note_time(raw);
                err.display();
                return Err(err.into());
            }
        }
    };

    let snapshot = runtime
        .manager
        .add_note_at(&video_id, &args.text, seconds)
        .await?;
    finish_mutation(
        runtime,
        json,
        &video_id,
        &format!("Added note at {} to {}", format_note_time(seconds), video_id),
        snapshot
    )
    .await
}

async fn delete(args: NoteDeleteArgs, runtime: &Runtime, json: bool) -> Result<()> {
    let video_id = resolve_video_id(&args.video);
    let snapshot = runtime.manager.delete_note(&video_id, args.index).await?;
    finish_mutation(
        runtime,
        json,
        &video_id,
        &format!("Deleted note {} from {}", args.index, video_id),
        snapshot
    )
    .await
}
