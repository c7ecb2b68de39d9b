pub mod check;
pub mod note;
pub mod remote;
pub mod show;
pub mod status;
pub mod video;

use crate::output;
use crate::runtime::Runtime;
use crate::ux_error;
use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tn_core::Snapshot;

#[derive(Parser)]
#[command(
    name = "tubenotes",
    author,
    version,
    about = "tubenotes - YouTube watch history and timestamped notes",
    long_about = "Keeps a local watch history with notes and reconciles it with a JSON \
                  document in a GitHub repository.\n\nWorks offline; edits are merged with \
                  other devices on the next sync."
)]
pub struct Cli {
    /// Config file (TOML or YAML)
    #[arg(long, global = true, env = "TN_CONFIG")]
    pub config: Option<PathBuf>,

    /// Never contact the remote repository
    #[arg(long, global = true)]
    pub offline: bool,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Add a video to the watch history")]
    Add(video::AddArgs),

    #[command(about = "Mark a video as read")]
    Read(video::VideoArgs),

    #[command(about = "Mark a video as unread")]
    Unread(video::VideoArgs),

    #[command(about = "Flip the read flag of a video")]
    ToggleRead(video::VideoArgs),

    #[command(about = "Remove a video and its notes")]
    Delete(video::VideoArgs),

    #[command(subcommand, about = "Add or delete timestamped notes")]
    Note(note::NoteCommand),

    #[command(about = "Merge the remote copy into the local one")]
    Pull,

    #[command(about = "Write the local copy to the remote repository")]
    Push,

    #[command(about = "Pull, merge and push")]
    Sync,

    #[command(about = "Show cache, remote and sync status")]
    Status,

    #[command(about = "Show the watch history, or one video")]
    Show(show::ShowArgs),

    #[command(about = "Verify the token and repository settings")]
    Check
}

pub async fn run(command: Commands, runtime: &Runtime, json: bool) -> Result<()> {
    match command {
        Commands::Add(args) => video::add(args, runtime, json).await,
        Commands::Read(args) => video::set_read(args, runtime, json, true).await,
        Commands::Unread(args) => video::set_read(args, runtime, json, false).await,
        Commands::ToggleRead(args) => video::toggle_read(args, runtime, json).await,
        Commands::Delete(args) => video::delete(args, runtime, json).await,
        Commands::Note(cmd) => note::run(cmd, runtime, json).await,
        Commands::Pull => remote::pull(runtime, json).await,
        Commands::Push => remote::push(runtime, json).await,
        Commands::Sync => remote::sync(runtime, json).await,
        Commands::Status => status::run(runtime, json).await,
        Commands::Show(args) => show::run(args, runtime, json).await,
        Commands::Check => check::run(runtime, json).await
    }
}

/// Accepts a URL or a raw id. Ids already in the history need not be
/// canonical 11-character ids.
pub fn resolve_video_id(input: &str) -> String {
    tn_core::extract_video_id(input).unwrap_or_else(|| input.trim().to_string())
}

/// Common tail of every mutating command: report, then sync unless offline.
/// A failed sync is reported but not fatal since the edit is already cached.
pub async fn finish_mutation(
    runtime: &Runtime,
    json: bool,
    video_id: &str,
    message: &str,
    snapshot: Snapshot
) -> Result<()> {
    let synced = if runtime.offline || !runtime.manager.has_remote() {
        None
    } else {
        Some(runtime.manager.sync().await)
    };

    let (sync_status, sync_error) = match &synced {
        None => ("local", None),
        Some(Ok(_)) => ("synced", None),
        Some(Err(e)) => ("failed", Some(e.to_string()))
    };

    if json {
        let snapshot = match &synced {
            Some(Ok(report)) => &report.snapshot,
            _ => &snapshot
        };
        return output::json(&serde_json::json!({
            "videoId": video_id,
            "sync": sync_status,
            "syncError": sync_error,
            "video": snapshot.video(video_id),
            "stats": snapshot.stats()
        }));
    }

    output::success(message);
    match synced {
        None if runtime.offline => output::info("Saved locally (offline)"),
        None => {
            output::info("Saved locally");
            output::hint("Configure remote.owner and remote.token to sync across devices");
        }
        Some(Ok(report)) => output::info(&format!("Synced ({})", report.pushed)),
        Some(Err(e)) => {
            output::warn("Saved locally, but the sync failed");
            ux_error::sync_failed(&e).display();
        }
    }
    Ok(())
}
