use super::resolve_video_id;
use crate::output;
use crate::runtime::Runtime;
use crate::ux_error;
use anyhow::Result;
use clap::Args;
use colored::Colorize;
use tn_core::VideoRecord;

#[derive(Args)]
pub struct ShowArgs {
    /// Only this video, with its notes
    pub video: Option<String>,

    /// Only unread videos
    #[arg(long)]
    pub unread: bool
}

pub async fn run(args: ShowArgs, runtime: &Runtime, json: bool) -> Result<()> {
    let snapshot = runtime.manager.snapshot().await;

    if let Some(input) = &args.video {
        let video_id = resolve_video_id(input);
        let Some(video) = snapshot.video(&video_id) else {
            let err = ux_error::unknown_video(&video_id);
            err.display();
            return Err(err.into());
        };
        if json {
            return output::json(video);
        }
        print_video(video, true);
        return Ok(());
    }

    if json {
        return output::json(&snapshot);
    }

    if snapshot.watch_history.is_empty() {
        output::info("No videos yet");
        output::hint("tubenotes add <youtube url>");
        return Ok(());
    }

    output::header("Watch History");
    for entry in &snapshot.watch_history {
        match snapshot.video(&entry.video_id) {
            Some(video) if args.unread && video.read => {}
            Some(video) => print_video(video, false),
            None => println!(
                "  {} {}",
                entry.video_id.cyan(),
                "(no details)".dimmed()
            )
        }
    }
    Ok(())
}

fn print_video(video: &VideoRecord, with_notes: bool) {
    let mark = if video.read { "✓".green() } else { "•".yellow() };
    let title = if video.title.is_empty() {
        video.video_id.as_str()
    } else {
        video.title.as_str()
    };
    println!("{} {} {}", mark, title.bold(), video.video_id.dimmed());
    if !video.channel.is_empty() {
        println!("    {}", video.channel.dimmed());
    }

    if with_notes {
        if !video.url.is_empty() {
            println!("    {}", video.url.dimmed());
        }
        for (i, note) in video.notes.iter().enumerate() {
            println!("    [{}] {} {}", i, note.time_str.cyan(), note.text);
        }
    } else if !video.notes.is_empty() {
        println!("    {} notes", video.notes.len());
    }
}
