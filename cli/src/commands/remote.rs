//! Explicit remote commands. Unlike mutating commands these fail the
//! process when the remote cannot be reached.

use crate::output;
use crate::runtime::Runtime;
use crate::ux_error;
use anyhow::Result;
use sync::SyncError;

fn ensure_remote(runtime: &Runtime) -> Result<()> {
    if runtime.manager.has_remote() {
        return Ok(());
    }
    let err = if runtime.offline {
        ux_error::offline_mode()
    } else {
        ux_error::remote_not_configured()
    };
    err.display();
    Err(err.into())
}

fn report(err: SyncError) -> anyhow::Error {
    ux_error::sync_failed(&err).display();
    err.into()
}

pub async fn pull(runtime: &Runtime, json: bool) -> Result<()> {
    ensure_remote(runtime)?;
    let before = runtime.manager.snapshot().await.stats();
    let snapshot = runtime.manager.pull().await.map_err(report)?;
    let after = snapshot.stats();

    if json {
        return output::json(&serde_json::json!({
            "before": before,
            "after": after
        }));
    }
    output::success(&format!("Pulled from {}", runtime.remote_label()));
    println!(
        "  {} videos ({} new), {} notes ({} new)",
        after.watched,
        after.watched.saturating_sub(before.watched),
        after.total_notes,
        after.total_notes.saturating_sub(before.total_notes)
    );
    Ok(())
}

pub async fn push(runtime: &Runtime, json: bool) -> Result<()> {
    ensure_remote(runtime)?;
    let version = runtime.manager.push().await.map_err(report)?;

    if json {
        return output::json(&serde_json::json!({ "version": version }));
    }
    output::success(&format!("Pushed to {} ({})", runtime.remote_label(), version));
    Ok(())
}

pub async fn sync(runtime: &Runtime, json: bool) -> Result<()> {
    ensure_remote(runtime)?;
    let report = runtime.manager.sync().await.map_err(report)?;

    if json {
        return output::json(&serde_json::json!({
            "pulled": report.pulled,
            "pushed": report.pushed,
            "attempts": report.attempts,
            "stats": report.snapshot.stats()
        }));
    }
    let stats = report.snapshot.stats();
    output::success(&format!("Synced with {}", runtime.remote_label()));
    println!(
        "  {} videos, {} unread, {} notes",
        stats.watched, stats.unread, stats.total_notes
    );
    if report.attempts > 1 {
        output::info(&format!("Needed {} attempts", report.attempts));
    }
    Ok(())
}
