use crate::output;
use crate::runtime::Runtime;
use anyhow::Result;
use colored::Colorize;

pub async fn run(runtime: &Runtime, json: bool) -> Result<()> {
    let snapshot = runtime.manager.snapshot().await;
    let stats = snapshot.stats();
    let last_sync = runtime.manager.last_sync().await?;
    let remote = &runtime.config.remote;

    if json {
        return output::json(&serde_json::json!({
            "cacheDir": runtime.config.cache.dir,
            "remote": {
                "configured": runtime.config.has_remote(),
                "enabled": runtime.manager.has_remote(),
                "apiUrl": remote.api_url,
                "owner": remote.owner,
                "repo": remote.repo,
                "branch": remote.branch,
                "path": remote.path
            },
            "lastSync": last_sync.map(|t| t.to_rfc3339()),
            "phase": runtime.manager.phase(),
            "stats": stats
        }));
    }

    output::header("tubenotes Status");
    println!();

    println!("{}", "Library:".bold());
    println!("  {:<12} {}", "videos:", stats.watched.to_string().cyan());
    println!("  {:<12} {}", "unread:", stats.unread.to_string().cyan());
    println!("  {:<12} {}", "with notes:", stats.with_notes.to_string().cyan());
    println!("  {:<12} {}", "notes:", stats.total_notes.to_string().cyan());

    println!();
    println!("{}", "Sync:".bold());
    println!("  {:<12} {}", "cache:", runtime.config.cache.dir.dimmed());
    if runtime.config.has_remote() {
        println!("  {:<12} {}", "remote:", runtime.remote_label().cyan());
    } else {
        println!("  {:<12} {}", "remote:", "(not configured)".dimmed());
    }
    if runtime.offline {
        println!("  {:<12} {}", "mode:", "offline".yellow());
    }
    match last_sync {
        Some(t) => println!("  {:<12} {}", "last sync:", t.to_rfc3339().cyan()),
        None => println!("  {:<12} {}", "last sync:", "never".dimmed())
    }

    if !runtime.config.has_remote() {
        println!();
        output::hint("Set TN_OWNER and TN_TOKEN to enable sync");
    }
    Ok(())
}
