use colored::Colorize;
use errors::RemoteError;
use sync::SyncError;

#[derive(Debug)]
pub struct UxError {
    pub what: String,
    pub why: Option<String>,
    pub how_to_fix: Vec<String>,
    pub suggested_command: Option<String>
}

impl UxError {
    pub fn new(what: impl Into<String>) -> Self {
        Self {
            what: what.into(),
            why: None,
            how_to_fix: Vec::new(),
            suggested_command: None
        }
    }

    pub fn why(mut self, reason: impl Into<String>) -> Self {
        self.why = Some(reason.into());
        self
    }

    pub fn fix(mut self, suggestion: impl Into<String>) -> Self {
        self.how_to_fix.push(suggestion.into());
        self
    }

    pub fn suggest(mut self, cmd: impl Into<String>) -> Self {
        self.suggested_command = Some(cmd.into());
        self
    }

    pub fn display(&self) {
        eprintln!();
        eprintln!("{} {}", "error:".red().bold(), self.what.white().bold());

        if let Some(why) = &self.why {
            eprintln!("       {}", why.dimmed());
        }

        if !self.how_to_fix.is_empty() {
            eprintln!();
            eprintln!("{}", "How to fix:".yellow().bold());
            for (i, fix) in self.how_to_fix.iter().enumerate() {
                eprintln!("  {}. {}", i + 1, fix);
            }
        }

        if let Some(cmd) = &self.suggested_command {
            eprintln!();
            eprintln!("{}", "Try this:".green().bold());
            eprintln!("  $ {}", cmd.cyan());
        }
        eprintln!();
    }
}

impl std::fmt::Display for UxError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.what)
    }
}

impl std::error::Error for UxError {}

pub fn remote_not_configured() -> UxError {
    UxError::new("No remote repository configured")
        .why("Remote operations need a repository owner and a GitHub token")
        .fix("Set remote.owner and remote.token in your config file")
        .fix("Or export TN_OWNER and TN_TOKEN")
        .suggest("TN_OWNER=<user> TN_TOKEN=<token> tubenotes check")
}

pub fn offline_mode() -> UxError {
    UxError::new("Remote operations are disabled with --offline")
        .fix("Run the command again without --offline")
}

pub fn no_video_id(input: &str) -> UxError {
    UxError::new(format!("No YouTube video id found in '{}'", input))
        .why("Expected a watch, youtu.be or embed URL, or an 11-character video id")
        .suggest("tubenotes add https://youtu.be/dQw4w9WgXcQ")
}

pub fn invalid_note_time(input: &str) -> UxError {
    UxError::new(format!("Invalid note time '{}'", input))
        .why("Use seconds (90), m:ss (1:30) or h:mm:ss (1:02:03)")
}

pub fn unknown_video(video_id: &str) -> UxError {
    UxError::new(format!("Video '{}' is not in your history", video_id))
        .suggest("tubenotes show")
}

/// Maps a sync failure to guidance. Configuration failures get concrete
/// fixes, everything else is reported as-is.
pub fn sync_failed(err: &SyncError) -> UxError {
    let base = UxError::new(format!("Sync failed: {}", err));
    match err {
        SyncError::NoRemote => remote_not_configured(),
        SyncError::Remote(RemoteError::AuthFailure { .. }) => base
            .why("GitHub rejected the token")
            .fix("Create a token with contents read/write access to the repository")
            .suggest("tubenotes check"),
        SyncError::Remote(RemoteError::AccessFailure { .. }) => base
            .why("The token cannot reach the configured repository or path")
            .fix("Check remote.owner, remote.repo and remote.branch")
            .suggest("tubenotes check"),
        SyncError::Conflict { .. } => base
            .why("The remote kept changing while retrying")
            .suggest("tubenotes sync"),
        SyncError::SyncInProgress => base.why("Another sync is already running"),
        _ if err.is_retryable() => base
            .why("The failure looks temporary")
            .suggest("tubenotes sync"),
        _ => base
    }
}
