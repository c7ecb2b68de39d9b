//! Note timestamp formatting: `m:ss` below an hour, `h:mm:ss` above.

/// Formats whole seconds of `seconds`. Negative and non-finite values are
/// clamped to zero.
pub fn format_note_time(seconds: f64) -> String {
    let total = if seconds.is_finite() && seconds > 0.0 {
        seconds.floor() as u64
    } else {
        0
    };
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let secs = total % 60;

    if hours > 0 {
        format!("{hours}:{minutes:02}:{secs:02}")
    } else {
        format!("{minutes}:{secs:02}")
    }
}

/// Parses `"90"`, `"1:30"` or `"1:02:03"` into seconds.
pub fn parse_note_time(raw: &str) -> Option<f64> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if !raw.contains(':') {
        let value: f64 = raw.parse().ok()?;
        return (value.is_finite() && value >= 0.0).then_some(value);
    }

    let parts: Vec<&str> = raw.split(':').collect();
    if parts.len() > 3 {
        return None;
    }
    let mut total = 0u64;
    for (i, part) in parts.iter().enumerate() {
        let value: u64 = part.parse().ok()?;
        // every component after the leading one is a two-digit field
        if i > 0 && value >= 60 {
            return None;
        }
        total = total.checked_mul(60)?.checked_add(value)?;
    }
    Some(total as f64)
}
